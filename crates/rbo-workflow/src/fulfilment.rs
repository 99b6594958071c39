//! Fulfilment workflow.
//!
//! # State diagram
//!
//! ```text
//!  ALLOCATING_STOCK ──RESERVE_OK──► PICK_PACK ──FULFILMENT_STARTED──► READY_FOR_SHIPMENT
//!     │  │  └─RESERVE_MISS─► BACKORDERED ─RESERVE_OK─┘  │                    │
//!     │  └─FAIL─► FAILED (final)                         SERVICE_SCHEDULED    PACKAGE_SHIPPED
//!     │                                                  ▼                    ▼
//!     │                                             SCHEDULING           SHIPPED ──PACKAGE_DELIVERED──► DELIVERED
//!     │                                                  │                    │                            │
//!     │                                          SERVICE_COMPLETED     RETURN_REQUESTED      RETURN_REQUESTED / RETURN_RECEIVED
//!     │                                                  ▼                    ▼                            │
//!     │                                           COMPLETED (final)   RETURN_REQUESTED ──RETURN_RECEIVED──► RETURN_RECEIVED
//!     │                                                                       └──────REFUND_ISSUED──► REFUNDED (final) ◄──┘
//!     └─CANCEL─► CANCELLED (final)   (CANCEL also from BACKORDERED, PICK_PACK,
//!                                     READY_FOR_SHIPMENT, SHIPPED, SCHEDULING)
//! ```
//!
//! `IN_PROGRESS` accepts `SERVICE_COMPLETED` and `RETURN_REQUESTED` but no
//! event leads into it; it exists for workflow states written by older
//! service-visit flows.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rbo_lifecycle::{FulfillmentStatus, FULFILLMENT_GUARD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfilState {
    AllocatingStock,
    Backordered,
    PickPack,
    ReadyForShipment,
    Shipped,
    Delivered,
    Scheduling,
    InProgress,
    ReturnRequested,
    ReturnReceived,
    Refunded,
    Completed,
    Cancelled,
    Failed,
}

impl FulfilState {
    pub const ALL: &'static [FulfilState] = &[
        FulfilState::AllocatingStock,
        FulfilState::Backordered,
        FulfilState::PickPack,
        FulfilState::ReadyForShipment,
        FulfilState::Shipped,
        FulfilState::Delivered,
        FulfilState::Scheduling,
        FulfilState::InProgress,
        FulfilState::ReturnRequested,
        FulfilState::ReturnReceived,
        FulfilState::Refunded,
        FulfilState::Completed,
        FulfilState::Cancelled,
        FulfilState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FulfilState::AllocatingStock => "ALLOCATING_STOCK",
            FulfilState::Backordered => "BACKORDERED",
            FulfilState::PickPack => "PICK_PACK",
            FulfilState::ReadyForShipment => "READY_FOR_SHIPMENT",
            FulfilState::Shipped => "SHIPPED",
            FulfilState::Delivered => "DELIVERED",
            FulfilState::Scheduling => "SCHEDULING",
            FulfilState::InProgress => "IN_PROGRESS",
            FulfilState::ReturnRequested => "RETURN_REQUESTED",
            FulfilState::ReturnReceived => "RETURN_RECEIVED",
            FulfilState::Refunded => "REFUNDED",
            FulfilState::Completed => "COMPLETED",
            FulfilState::Cancelled => "CANCELLED",
            FulfilState::Failed => "FAILED",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            FulfilState::Refunded
                | FulfilState::Completed
                | FulfilState::Cancelled
                | FulfilState::Failed
        )
    }
}

impl fmt::Display for FulfilState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfilState {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        FulfilState::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| WorkflowError::UnknownState {
                input: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfilEvent {
    ReserveOk,
    ReserveMiss,
    FulfilmentStarted,
    PackageShipped,
    PackageDelivered,
    ServiceScheduled,
    ServiceCompleted,
    ReturnRequested,
    ReturnReceived,
    RefundIssued,
    Cancel,
    Fail,
}

impl FulfilEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfilEvent::ReserveOk => "RESERVE_OK",
            FulfilEvent::ReserveMiss => "RESERVE_MISS",
            FulfilEvent::FulfilmentStarted => "FULFILMENT_STARTED",
            FulfilEvent::PackageShipped => "PACKAGE_SHIPPED",
            FulfilEvent::PackageDelivered => "PACKAGE_DELIVERED",
            FulfilEvent::ServiceScheduled => "SERVICE_SCHEDULED",
            FulfilEvent::ServiceCompleted => "SERVICE_COMPLETED",
            FulfilEvent::ReturnRequested => "RETURN_REQUESTED",
            FulfilEvent::ReturnReceived => "RETURN_RECEIVED",
            FulfilEvent::RefundIssued => "REFUND_ISSUED",
            FulfilEvent::Cancel => "CANCEL",
            FulfilEvent::Fail => "FAIL",
        }
    }
}

impl fmt::Display for FulfilEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque caller data carried alongside the workflow state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulfilmentContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

/// The fulfilment event table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FulfilmentMachine;

impl FulfilmentMachine {
    pub const INITIAL: FulfilState = FulfilState::AllocatingStock;

    /// Target of `event` in `state`, or `None` when the event is not accepted.
    pub fn next(state: FulfilState, event: FulfilEvent) -> Option<FulfilState> {
        use FulfilEvent as E;
        use FulfilState as S;

        let target = match (state, event) {
            (S::AllocatingStock, E::ReserveOk) => S::PickPack,
            (S::AllocatingStock, E::ReserveMiss) => S::Backordered,
            (S::AllocatingStock, E::Fail) => S::Failed,

            (S::Backordered, E::ReserveOk) => S::PickPack,

            (S::PickPack, E::FulfilmentStarted) => S::ReadyForShipment,
            (S::PickPack, E::ServiceScheduled) => S::Scheduling,

            (S::ReadyForShipment, E::PackageShipped) => S::Shipped,

            (S::Shipped, E::PackageDelivered) => S::Delivered,
            (S::Shipped, E::ReturnRequested) => S::ReturnRequested,

            (S::Delivered, E::ReturnRequested) => S::ReturnRequested,
            (S::Delivered, E::ReturnReceived) => S::ReturnReceived,
            (S::Delivered, E::ServiceCompleted) => S::Completed,

            (S::ReturnRequested, E::ReturnReceived) => S::ReturnReceived,
            (S::ReturnRequested, E::RefundIssued) => S::Refunded,

            (S::ReturnReceived, E::RefundIssued) => S::Refunded,

            (S::Scheduling, E::ServiceCompleted) => S::Completed,

            (S::InProgress, E::ServiceCompleted) => S::Completed,
            (S::InProgress, E::ReturnRequested) => S::ReturnRequested,

            (
                S::AllocatingStock
                | S::Backordered
                | S::PickPack
                | S::ReadyForShipment
                | S::Shipped
                | S::Scheduling,
                E::Cancel,
            ) => S::Cancelled,

            _ => return None,
        };
        Some(target)
    }
}

/// Workflow state assumed for a record that only carries a coarse status.
pub fn fulfilment_status_to_state(status: FulfillmentStatus) -> FulfilState {
    match status {
        FulfillmentStatus::Pending => FulfilState::AllocatingStock,
        FulfillmentStatus::Assigned => FulfilState::ReadyForShipment,
        FulfillmentStatus::InTransit => FulfilState::Shipped,
        FulfillmentStatus::Delivered => FulfilState::Delivered,
        FulfillmentStatus::Cancelled => FulfilState::Cancelled,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FulfilmentRun {
    pub state: FulfilState,
    pub context: FulfilmentContext,
    /// `false` if no event was applied or any event was refused.
    pub changed: bool,
}

/// Apply `events` in order, starting from `workflow_state` when known and
/// from the status mapping otherwise.
///
/// Stops at the first refused event; the whole run then reports
/// `changed == false` with the state reached so far.
pub fn run_fulfilment(
    status: FulfillmentStatus,
    events: &[FulfilEvent],
    workflow_state: Option<FulfilState>,
    context: FulfilmentContext,
) -> FulfilmentRun {
    let mut state = workflow_state.unwrap_or_else(|| fulfilment_status_to_state(status));
    let mut changed = false;

    for &event in events {
        match FulfilmentMachine::next(state, event) {
            Some(next) if next != state => {
                state = next;
                changed = true;
            }
            _ => {
                debug!(state = %state, event = %event, "fulfilment event refused");
                return FulfilmentRun {
                    state,
                    context,
                    changed: false,
                };
            }
        }
    }

    FulfilmentRun {
        state,
        context,
        changed,
    }
}

/// Workflow events that realise a coarse status change.
///
/// Empty for same-status and for pairs the workflow has no path for.
pub fn events_for_fulfilment_transition(
    from: FulfillmentStatus,
    to: FulfillmentStatus,
) -> Vec<FulfilEvent> {
    use FulfillmentStatus::*;

    if from == to {
        return Vec::new();
    }
    if to == Cancelled {
        return vec![FulfilEvent::Cancel];
    }
    match (from, to) {
        (Pending, Assigned) => vec![FulfilEvent::ReserveOk, FulfilEvent::FulfilmentStarted],
        (Assigned, InTransit) => vec![FulfilEvent::PackageShipped],
        (InTransit, Delivered) => vec![FulfilEvent::PackageDelivered],
        _ => Vec::new(),
    }
}

/// Guarded coarse status change carried through the workflow.
///
/// 1. The lifecycle guard must accept `from -> to`.
/// 2. The planned events are applied from `workflow_state` (or the state
///    mapped from `from`); every one of them must be accepted.
///
/// # Errors
/// [`WorkflowError::Guard`] for an illegal status change,
/// [`WorkflowError::EventRejected`] when the stored workflow state has
/// drifted away from what the status implies.
pub fn advance_fulfilment(
    from: FulfillmentStatus,
    to: FulfillmentStatus,
    workflow_state: Option<FulfilState>,
    context: FulfilmentContext,
) -> Result<FulfilmentRun, WorkflowError> {
    FULFILLMENT_GUARD.ensure_transition(from, to)?;

    let mut state = workflow_state.unwrap_or_else(|| fulfilment_status_to_state(from));
    let events = events_for_fulfilment_transition(from, to);
    for &event in &events {
        state = FulfilmentMachine::next(state, event)
            .ok_or(WorkflowError::EventRejected { state, event })?;
    }

    debug!(from = %from, to = %to, state = %state, "fulfilment advanced");
    Ok(FulfilmentRun {
        state,
        context,
        changed: !events.is_empty(),
    })
}
