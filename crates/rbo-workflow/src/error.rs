use rbo_lifecycle::{FulfillmentStatus, InvalidTransition};
use thiserror::Error;

use crate::fulfilment::{FulfilEvent, FulfilState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The coarse status change itself is illegal.
    #[error(transparent)]
    Guard(#[from] InvalidTransition<FulfillmentStatus>),

    /// The status change is legal but the stored workflow state cannot
    /// absorb the planned event (workflow and status have drifted apart).
    #[error("fulfilment workflow in {state} does not accept {event}")]
    EventRejected { state: FulfilState, event: FulfilEvent },

    #[error("unknown workflow state: {input:?}")]
    UnknownState { input: String },
}
