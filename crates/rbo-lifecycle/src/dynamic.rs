//! Kind-dispatched entry points for callers holding statuses as text
//! (rows read from the database, CLI arguments).
//!
//! Every call parses the text into the kind's enum and delegates to the
//! typed [`TransitionGuard`]; nothing here adds rules of its own.

use thiserror::Error;
use tracing::debug;

use crate::guard::{InvalidTransition, LifecycleStatus, TransitionGuard};
use crate::kind::EntityKind;
use crate::status::{FulfillmentStatus, ParseStatusError, QuotationStatus, SaleStatus};

/// Failure of a text-keyed guard call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Parse(#[from] ParseStatusError),
    #[error("invalid {} transition: {from} -> {to}", .kind.noun())]
    InvalidTransition {
        kind: EntityKind,
        from: &'static str,
        to: &'static str,
    },
}

impl<S: LifecycleStatus> From<InvalidTransition<S>> for LifecycleError {
    fn from(e: InvalidTransition<S>) -> Self {
        LifecycleError::InvalidTransition {
            kind: e.kind,
            from: e.from.name(),
            to: e.to.name(),
        }
    }
}

/// Text-keyed facade over the three typed guards.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lifecycle;

impl Lifecycle {
    /// Canonical upper-case name of `status`, e.g. `"in-transit"` -> `"IN_TRANSIT"`.
    pub fn canonical(kind: EntityKind, status: &str) -> Result<&'static str, ParseStatusError> {
        match kind {
            EntityKind::Sale => canonical::<SaleStatus>(status),
            EntityKind::Quotation => canonical::<QuotationStatus>(status),
            EntityKind::Fulfillment => canonical::<FulfillmentStatus>(status),
        }
    }

    pub fn statuses(kind: EntityKind) -> Vec<&'static str> {
        match kind {
            EntityKind::Sale => names::<SaleStatus>(),
            EntityKind::Quotation => names::<QuotationStatus>(),
            EntityKind::Fulfillment => names::<FulfillmentStatus>(),
        }
    }

    pub fn allowed(kind: EntityKind, from: &str) -> Result<Vec<&'static str>, ParseStatusError> {
        match kind {
            EntityKind::Sale => allowed::<SaleStatus>(from),
            EntityKind::Quotation => allowed::<QuotationStatus>(from),
            EntityKind::Fulfillment => allowed::<FulfillmentStatus>(from),
        }
    }

    pub fn check(kind: EntityKind, from: &str, to: &str) -> Result<bool, ParseStatusError> {
        let ok = match kind {
            EntityKind::Sale => check::<SaleStatus>(from, to)?,
            EntityKind::Quotation => check::<QuotationStatus>(from, to)?,
            EntityKind::Fulfillment => check::<FulfillmentStatus>(from, to)?,
        };
        debug!(kind = %kind, from, to, allowed = ok, "lifecycle check");
        Ok(ok)
    }

    /// # Errors
    /// [`LifecycleError::Parse`] for unknown status text,
    /// [`LifecycleError::InvalidTransition`] when the guard refuses.
    pub fn ensure(kind: EntityKind, from: &str, to: &str) -> Result<(), LifecycleError> {
        match kind {
            EntityKind::Sale => ensure::<SaleStatus>(from, to),
            EntityKind::Quotation => ensure::<QuotationStatus>(from, to),
            EntityKind::Fulfillment => ensure::<FulfillmentStatus>(from, to),
        }
    }

    pub fn is_terminal(kind: EntityKind, status: &str) -> Result<bool, ParseStatusError> {
        Ok(Self::allowed(kind, status)?.is_empty())
    }

    pub fn edges(kind: EntityKind) -> Vec<(&'static str, &'static str)> {
        match kind {
            EntityKind::Sale => edges::<SaleStatus>(),
            EntityKind::Quotation => edges::<QuotationStatus>(),
            EntityKind::Fulfillment => edges::<FulfillmentStatus>(),
        }
    }
}

fn names<S: LifecycleStatus>() -> Vec<&'static str> {
    S::ALL.iter().map(|s| s.name()).collect()
}

fn canonical<S: LifecycleStatus>(status: &str) -> Result<&'static str, ParseStatusError> {
    Ok(status.parse::<S>()?.name())
}

fn allowed<S: LifecycleStatus>(from: &str) -> Result<Vec<&'static str>, ParseStatusError> {
    let from: S = from.parse()?;
    Ok(TransitionGuard::<S>::new()
        .allowed_transitions(from)
        .iter()
        .map(|s| s.name())
        .collect())
}

fn check<S: LifecycleStatus>(from: &str, to: &str) -> Result<bool, ParseStatusError> {
    let (from, to): (S, S) = (from.parse()?, to.parse()?);
    Ok(TransitionGuard::<S>::new().can_transition(from, to))
}

fn ensure<S: LifecycleStatus>(from: &str, to: &str) -> Result<(), LifecycleError> {
    let (from, to): (S, S) = (from.parse()?, to.parse()?);
    TransitionGuard::<S>::new().ensure_transition(from, to)?;
    Ok(())
}

fn edges<S: LifecycleStatus>() -> Vec<(&'static str, &'static str)> {
    TransitionGuard::<S>::new()
        .edges()
        .map(|(from, to)| (from.name(), to.name()))
        .collect()
}
