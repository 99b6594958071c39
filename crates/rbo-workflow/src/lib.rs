//! rbo-workflow
//!
//! Fine-grained workflows layered under the coarse lifecycle statuses:
//!
//! - `fulfilment`: stock allocation, pick/pack, shipping, service visits,
//!   returns and refunds, plus the planner that turns a coarse
//!   `FulfillmentStatus` change into workflow events.
//! - `sale`: payment clearance of a sale order (payment method, capture,
//!   admin/credit overrides with expiry).
//!
//! Both machines are pure: the caller supplies the current workflow state,
//! the context and (for sale guards) the clock; nothing is persisted here.

mod error;
pub mod fulfilment;
pub mod sale;

pub use error::WorkflowError;
pub use fulfilment::{
    advance_fulfilment, events_for_fulfilment_transition, fulfilment_status_to_state,
    run_fulfilment, FulfilEvent, FulfilState, FulfilmentContext, FulfilmentMachine, FulfilmentRun,
};
pub use sale::{
    run_sale, sale_status_to_state, AdminOverride, CreditOverride, CreditPosition,
    OverrideStatus, Overrides, SaleContext, SaleEvent, SaleMachine, SaleStep, SaleWorkflowState,
};
