//! Lifecycle transition guard.
//!
//! # Rules
//!
//! 1. Same-state is always legal. `from == to` is a no-op, permitted even
//!    for terminal statuses.
//! 2. Single-hop table lookup. Otherwise `to` must appear in the
//!    adjacency table entry for `from`. No multi-step path validation.
//! 3. Terminal statuses are sinks. An empty table entry means no
//!    outward transitions, including no way back.
//!
//! The guard holds no state. It is composed *before* the caller mutates and
//! persists a status; that write (and its transactional discipline) lives
//! with the caller.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

use thiserror::Error;

use crate::kind::EntityKind;
use crate::status::{FulfillmentStatus, ParseStatusError, QuotationStatus, SaleStatus};

/// A closed status enumeration with a constant transition table.
pub trait LifecycleStatus:
    Copy
    + Eq
    + Hash
    + fmt::Debug
    + fmt::Display
    + FromStr<Err = ParseStatusError>
    + Send
    + Sync
    + 'static
{
    /// Entity kind this enumeration belongs to.
    const KIND: EntityKind;

    /// Every status, in declaration order.
    const ALL: &'static [Self];

    /// Statuses directly reachable from `self`, in table order.
    fn transitions(self) -> &'static [Self];

    /// Canonical upper-case name (`IN_TRANSIT`).
    fn name(self) -> &'static str;
}

/// Returned by [`TransitionGuard::ensure_transition`] when the requested move
/// is neither a same-state no-op nor a table edge.
///
/// Always a caller-logic error; it is never retried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid {} transition: {from} -> {to}", .kind.noun())]
pub struct InvalidTransition<S: LifecycleStatus> {
    pub kind: EntityKind,
    pub from: S,
    pub to: S,
}

/// Query / validate / enforce over one entity kind's transition table.
///
/// Zero-sized; use the [`SALE_GUARD`], [`QUOTATION_GUARD`] and
/// [`FULFILLMENT_GUARD`] constants or `TransitionGuard::<S>::new()`.
pub struct TransitionGuard<S> {
    _status: PhantomData<fn() -> S>,
}

pub type SaleGuard = TransitionGuard<SaleStatus>;
pub type QuotationGuard = TransitionGuard<QuotationStatus>;
pub type FulfillmentGuard = TransitionGuard<FulfillmentStatus>;

pub const SALE_GUARD: SaleGuard = TransitionGuard::new();
pub const QUOTATION_GUARD: QuotationGuard = TransitionGuard::new();
pub const FULFILLMENT_GUARD: FulfillmentGuard = TransitionGuard::new();

impl<S> TransitionGuard<S> {
    pub const fn new() -> Self {
        Self {
            _status: PhantomData,
        }
    }
}

impl<S> Default for TransitionGuard<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for TransitionGuard<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for TransitionGuard<S> {}

impl<S: LifecycleStatus> fmt::Debug for TransitionGuard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionGuard")
            .field("kind", &S::KIND)
            .finish()
    }
}

impl<S: LifecycleStatus> TransitionGuard<S> {
    pub fn kind(&self) -> EntityKind {
        S::KIND
    }

    /// Full enumeration in declaration order.
    pub fn statuses(&self) -> &'static [S] {
        S::ALL
    }

    /// Statuses directly reachable from `from`, in table order.
    ///
    /// Empty (never an error) for terminal statuses.
    pub fn allowed_transitions(&self, from: S) -> &'static [S] {
        from.transitions()
    }

    /// `true` when `from == to`, otherwise `true` iff `to` is a table edge of `from`.
    pub fn can_transition(&self, from: S, to: S) -> bool {
        if from == to {
            return true;
        }
        self.allowed_transitions(from).contains(&to)
    }

    /// Guard to compose before persisting a status change.
    ///
    /// # Errors
    /// [`InvalidTransition`] naming the entity kind, `from` and `to`.
    pub fn ensure_transition(&self, from: S, to: S) -> Result<(), InvalidTransition<S>> {
        if self.can_transition(from, to) {
            Ok(())
        } else {
            Err(InvalidTransition {
                kind: S::KIND,
                from,
                to,
            })
        }
    }

    /// `true` if no outward transitions exist.
    pub fn is_terminal(&self, status: S) -> bool {
        self.allowed_transitions(status).is_empty()
    }

    /// Every table edge `(from, to)`, statuses in declaration order and
    /// targets in table order. Same-state no-ops are not edges.
    pub fn edges(&self) -> impl Iterator<Item = (S, S)> {
        S::ALL
            .iter()
            .flat_map(|&from| from.transitions().iter().map(move |&to| (from, to)))
    }
}

pub fn allowed_sale_transitions(from: SaleStatus) -> &'static [SaleStatus] {
    SALE_GUARD.allowed_transitions(from)
}

pub fn can_transition_sale(from: SaleStatus, to: SaleStatus) -> bool {
    SALE_GUARD.can_transition(from, to)
}

pub fn ensure_sale_transition(
    from: SaleStatus,
    to: SaleStatus,
) -> Result<(), InvalidTransition<SaleStatus>> {
    SALE_GUARD.ensure_transition(from, to)
}

pub fn allowed_quotation_transitions(from: QuotationStatus) -> &'static [QuotationStatus] {
    QUOTATION_GUARD.allowed_transitions(from)
}

pub fn can_transition_quotation(from: QuotationStatus, to: QuotationStatus) -> bool {
    QUOTATION_GUARD.can_transition(from, to)
}

pub fn ensure_quotation_transition(
    from: QuotationStatus,
    to: QuotationStatus,
) -> Result<(), InvalidTransition<QuotationStatus>> {
    QUOTATION_GUARD.ensure_transition(from, to)
}

pub fn allowed_fulfillment_transitions(from: FulfillmentStatus) -> &'static [FulfillmentStatus] {
    FULFILLMENT_GUARD.allowed_transitions(from)
}

pub fn can_transition_fulfillment(from: FulfillmentStatus, to: FulfillmentStatus) -> bool {
    FULFILLMENT_GUARD.can_transition(from, to)
}

pub fn ensure_fulfillment_transition(
    from: FulfillmentStatus,
    to: FulfillmentStatus,
) -> Result<(), InvalidTransition<FulfillmentStatus>> {
    FULFILLMENT_GUARD.ensure_transition(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_pending_to_approved_is_allowed() {
        assert!(can_transition_sale(SaleStatus::Pending, SaleStatus::Approved));
    }

    #[test]
    fn sale_fulfilled_cannot_go_back_to_pending() {
        assert!(!can_transition_sale(SaleStatus::Fulfilled, SaleStatus::Pending));
    }

    #[test]
    fn sale_paid_to_cancelled_passes_the_guard() {
        ensure_sale_transition(SaleStatus::Paid, SaleStatus::Cancelled).unwrap();
    }

    #[test]
    fn sale_cancelled_to_approved_names_kind_from_and_to() {
        let err = ensure_sale_transition(SaleStatus::Cancelled, SaleStatus::Approved).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                kind: EntityKind::Sale,
                from: SaleStatus::Cancelled,
                to: SaleStatus::Approved,
            }
        );
        assert_eq!(err.to_string(), "invalid sale transition: CANCELLED -> APPROVED");
    }

    #[test]
    fn quotation_has_no_back_edge_from_confirmed() {
        assert!(can_transition_quotation(
            QuotationStatus::Confirmed,
            QuotationStatus::Approved
        ));
        assert!(!can_transition_quotation(
            QuotationStatus::Confirmed,
            QuotationStatus::Sent
        ));
    }

    #[test]
    fn fulfillment_assigned_lists_targets_in_table_order() {
        assert_eq!(
            allowed_fulfillment_transitions(FulfillmentStatus::Assigned),
            &[FulfillmentStatus::InTransit, FulfillmentStatus::Cancelled]
        );
    }

    #[test]
    fn terminal_statuses_still_allow_self_transition() {
        assert!(FULFILLMENT_GUARD.is_terminal(FulfillmentStatus::Delivered));
        assert!(can_transition_fulfillment(
            FulfillmentStatus::Delivered,
            FulfillmentStatus::Delivered
        ));
        ensure_quotation_transition(QuotationStatus::Rejected, QuotationStatus::Rejected).unwrap();
    }

    #[test]
    fn edges_follow_declaration_then_table_order() {
        let edges: Vec<_> = QUOTATION_GUARD.edges().collect();
        use QuotationStatus::*;
        assert_eq!(
            edges,
            vec![
                (Draft, Sent),
                (Draft, Confirmed),
                (Draft, Rejected),
                (Sent, Confirmed),
                (Sent, Rejected),
                (Confirmed, Approved),
            ]
        );
    }

    #[test]
    fn guard_debug_shows_kind() {
        assert_eq!(
            format!("{:?}", SALE_GUARD),
            "TransitionGuard { kind: Sale }"
        );
    }
}
