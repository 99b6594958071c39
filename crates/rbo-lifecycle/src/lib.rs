//! rbo-lifecycle
//!
//! Status lifecycles for the back-office entities (sale orders, quotations,
//! fulfillments) and the guard that decides which status changes are legal.
//!
//! - Each entity kind has a closed status enum and a constant adjacency table
//!   mapping every status to the statuses reachable in one step.
//! - `TransitionGuard<S>` is the single guard implementation, instantiated
//!   once per status enum.
//! - A same-state move is always legal, terminal statuses have no outward
//!   edges, and reachability is single-hop only.
//!
//! Pure deterministic logic. No IO, no clock, no shared mutable state.
//! Persisting the new status (and anything that follows from it) belongs to
//! the caller.

mod dynamic;
mod guard;
mod kind;
mod status;

pub use dynamic::{Lifecycle, LifecycleError};
pub use guard::{
    allowed_fulfillment_transitions, allowed_quotation_transitions, allowed_sale_transitions,
    can_transition_fulfillment, can_transition_quotation, can_transition_sale,
    ensure_fulfillment_transition, ensure_quotation_transition, ensure_sale_transition,
    FulfillmentGuard, InvalidTransition, LifecycleStatus, QuotationGuard, SaleGuard,
    TransitionGuard, FULFILLMENT_GUARD, QUOTATION_GUARD, SALE_GUARD,
};
pub use kind::EntityKind;
pub use status::{FulfillmentStatus, ParseStatusError, QuotationStatus, SaleStatus};
