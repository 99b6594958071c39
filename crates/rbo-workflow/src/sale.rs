//! Sale payment workflow.
//!
//! Decides when a sale order is cleared for fulfilment: by captured payment
//! covering the grand total, or by an admin / credit override that is still
//! valid at `now`.
//!
//! ```text
//!  AWAITING_PAYMENT_METHOD ──SET_PAYMENT_METHOD──► PAYMENT_INITIATED ──PAYMENT_*──► PAYMENT_PENDING_CONFIRMATION
//!     │ override approved                              │ override approved            │ override approved
//!     ▼                                                ▼                              ▼
//!  CLEARED_FOR_FULFILMENT ◄──satisfied──────────── OVERRIDE_REVIEW ◄──────────────────┘
//!     │ RESET                                          │ denied / revoked ──► PAYMENT_PENDING_CONFIRMATION
//!     ▼
//!  AWAITING_PAYMENT_METHOD        PAYMENT_FAILED ──RESET──► AWAITING_PAYMENT_METHOD
//!                                 CANCEL from every non-final state ──► CANCELLED (final)
//! ```
//!
//! Amounts are integer minor units (cents). Guards read the clock only
//! through the `now` argument.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rbo_lifecycle::SaleStatus;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleWorkflowState {
    AwaitingPaymentMethod,
    PaymentInitiated,
    PaymentPendingConfirmation,
    OverrideReview,
    /// Final, but still accepts `RESET`.
    ClearedForFulfilment,
    PaymentFailed,
    Cancelled,
}

impl SaleWorkflowState {
    pub const ALL: &'static [SaleWorkflowState] = &[
        SaleWorkflowState::AwaitingPaymentMethod,
        SaleWorkflowState::PaymentInitiated,
        SaleWorkflowState::PaymentPendingConfirmation,
        SaleWorkflowState::OverrideReview,
        SaleWorkflowState::ClearedForFulfilment,
        SaleWorkflowState::PaymentFailed,
        SaleWorkflowState::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleWorkflowState::AwaitingPaymentMethod => "AWAITING_PAYMENT_METHOD",
            SaleWorkflowState::PaymentInitiated => "PAYMENT_INITIATED",
            SaleWorkflowState::PaymentPendingConfirmation => "PAYMENT_PENDING_CONFIRMATION",
            SaleWorkflowState::OverrideReview => "OVERRIDE_REVIEW",
            SaleWorkflowState::ClearedForFulfilment => "CLEARED_FOR_FULFILMENT",
            SaleWorkflowState::PaymentFailed => "PAYMENT_FAILED",
            SaleWorkflowState::Cancelled => "CANCELLED",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            SaleWorkflowState::ClearedForFulfilment | SaleWorkflowState::Cancelled
        )
    }
}

impl fmt::Display for SaleWorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleWorkflowState {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        SaleWorkflowState::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| WorkflowError::UnknownState {
                input: s.to_string(),
            })
    }
}

/// Workflow state assumed for a sale order that only carries a coarse status.
pub fn sale_status_to_state(status: SaleStatus) -> SaleWorkflowState {
    match status {
        SaleStatus::Pending => SaleWorkflowState::AwaitingPaymentMethod,
        SaleStatus::Approved => SaleWorkflowState::PaymentPendingConfirmation,
        SaleStatus::Paid | SaleStatus::Fulfilled => SaleWorkflowState::ClearedForFulfilment,
        SaleStatus::Cancelled => SaleWorkflowState::Cancelled,
    }
}

/// Events are JSON objects tagged by `type`, e.g.
/// `{"type":"PAYMENT_CAPTURED","amount":2500}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleEvent {
    SetPaymentMethod {
        #[serde(default)]
        method: Option<String>,
    },
    PaymentMethodSubmitted {
        #[serde(default)]
        method: Option<String>,
    },
    PaymentInitiated,
    PaymentConfirmed {
        #[serde(default)]
        amount: Option<i64>,
    },
    PaymentCaptured {
        #[serde(default)]
        amount: Option<i64>,
    },
    PaymentFailed,
    AdminOverrideApproved {
        #[serde(default)]
        expires_at: Option<DateTime<Utc>>,
    },
    CreditOverrideApproved {
        #[serde(default)]
        approved_amount: Option<i64>,
        #[serde(default)]
        expires_at: Option<DateTime<Utc>>,
    },
    AdminOverrideDenied,
    CreditOverrideDenied,
    OverrideRevoked,
    Reset,
    Cancel,
}

impl SaleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SaleEvent::SetPaymentMethod { .. } => "SET_PAYMENT_METHOD",
            SaleEvent::PaymentMethodSubmitted { .. } => "PAYMENT_METHOD_SUBMITTED",
            SaleEvent::PaymentInitiated => "PAYMENT_INITIATED",
            SaleEvent::PaymentConfirmed { .. } => "PAYMENT_CONFIRMED",
            SaleEvent::PaymentCaptured { .. } => "PAYMENT_CAPTURED",
            SaleEvent::PaymentFailed => "PAYMENT_FAILED",
            SaleEvent::AdminOverrideApproved { .. } => "ADMIN_OVERRIDE_APPROVED",
            SaleEvent::CreditOverrideApproved { .. } => "CREDIT_OVERRIDE_APPROVED",
            SaleEvent::AdminOverrideDenied => "ADMIN_OVERRIDE_DENIED",
            SaleEvent::CreditOverrideDenied => "CREDIT_OVERRIDE_DENIED",
            SaleEvent::OverrideRevoked => "OVERRIDE_REVOKED",
            SaleEvent::Reset => "RESET",
            SaleEvent::Cancel => "CANCEL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideStatus {
    Pending,
    Approved,
    Denied,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOverride {
    pub status: OverrideStatus,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditOverride {
    pub status: OverrideStatus,
    #[serde(default)]
    pub approved_amount: i64,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<CreditOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPosition {
    pub limit: i64,
    pub exposure: i64,
    #[serde(default)]
    pub overage: Option<i64>,
}

/// Persisted alongside the sale order's workflow state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleContext {
    pub order_id: String,
    pub grand_total: i64,
    pub captured_total: i64,
    pub credit: CreditPosition,
    pub overrides: Overrides,
    pub clear_to_fulfil: bool,
}

impl SaleContext {
    pub fn new(order_id: impl Into<String>, grand_total: i64) -> Self {
        Self {
            order_id: order_id.into(),
            grand_total,
            ..Self::default()
        }
    }

    /// Approved admin override with no expiry or an expiry after `now`.
    pub fn admin_override_valid(&self, now: DateTime<Utc>) -> bool {
        match &self.overrides.admin {
            Some(o) if o.status == OverrideStatus::Approved => {
                o.expires_at.map_or(true, |exp| exp > now)
            }
            _ => false,
        }
    }

    /// Approved credit override. Without an expiry it is valid as is; with one
    /// it must be unexpired and cover the current credit overage.
    pub fn credit_override_valid(&self, now: DateTime<Utc>) -> bool {
        match &self.overrides.credit {
            Some(o) if o.status == OverrideStatus::Approved => match o.expires_at {
                None => true,
                Some(exp) => exp > now && o.approved_amount >= self.credit.overage.unwrap_or(0),
            },
            _ => false,
        }
    }

    pub fn override_satisfied(&self, now: DateTime<Utc>) -> bool {
        self.admin_override_valid(now) || self.credit_override_valid(now)
    }

    pub fn payment_satisfied(&self, now: DateTime<Utc>) -> bool {
        self.clear_to_fulfil
            || self.captured_total >= self.grand_total
            || self.override_satisfied(now)
    }

    fn save_admin_override(&mut self, expires_at: Option<DateTime<Utc>>) {
        self.overrides.admin = Some(AdminOverride {
            status: OverrideStatus::Approved,
            expires_at,
        });
    }

    fn save_credit_override(&mut self, approved_amount: Option<i64>, expires_at: Option<DateTime<Utc>>) {
        let approved_amount = approved_amount.or(self.credit.overage).unwrap_or(0);
        self.overrides.credit = Some(CreditOverride {
            status: OverrideStatus::Approved,
            approved_amount,
            expires_at,
        });
    }

    fn mark_override(&mut self, admin: Option<OverrideStatus>, credit: Option<OverrideStatus>) {
        if let (Some(status), Some(o)) = (admin, self.overrides.admin.as_mut()) {
            o.status = status;
        }
        if let (Some(status), Some(o)) = (credit, self.overrides.credit.as_mut()) {
            o.status = status;
        }
    }

    fn reset_flags(&mut self) {
        self.overrides = Overrides::default();
        self.clear_to_fulfil = false;
    }
}

/// Outcome of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleStep {
    pub state: SaleWorkflowState,
    pub context: SaleContext,
    /// State or context differs from the input.
    pub changed: bool,
    /// The order entered `CLEARED_FOR_FULFILMENT` on this step.
    pub cleared: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SaleMachine;

impl SaleMachine {
    pub const INITIAL: SaleWorkflowState = SaleWorkflowState::AwaitingPaymentMethod;

    /// Apply one event. Events a state does not accept leave state and
    /// context untouched.
    pub fn step(
        state: SaleWorkflowState,
        context: &SaleContext,
        event: &SaleEvent,
        now: DateTime<Utc>,
    ) -> SaleStep {
        let mut ctx = context.clone();
        let next = Self::transition(state, &mut ctx, event, now).unwrap_or(state);

        let cleared = next == SaleWorkflowState::ClearedForFulfilment
            && state != SaleWorkflowState::ClearedForFulfilment;
        if cleared {
            ctx.clear_to_fulfil = true;
        }

        let changed = next != state || ctx != *context;
        if changed {
            debug!(
                order_id = %ctx.order_id,
                from = %state,
                to = %next,
                event = event.name(),
                cleared,
                "sale workflow step"
            );
        }

        SaleStep {
            state: next,
            context: ctx,
            changed,
            cleared,
        }
    }

    // Returns the target state, or None to stay. May update `ctx` either way.
    fn transition(
        state: SaleWorkflowState,
        ctx: &mut SaleContext,
        event: &SaleEvent,
        now: DateTime<Utc>,
    ) -> Option<SaleWorkflowState> {
        use SaleEvent as E;
        use SaleWorkflowState as S;

        match (state, event) {
            (S::Cancelled, _) => None,

            (S::ClearedForFulfilment, E::Reset) | (S::PaymentFailed, E::Reset) => {
                ctx.reset_flags();
                Some(S::AwaitingPaymentMethod)
            }
            (S::ClearedForFulfilment, _) => None,

            (_, E::Cancel) => Some(S::Cancelled),

            (
                S::AwaitingPaymentMethod | S::PaymentFailed,
                E::SetPaymentMethod { .. } | E::PaymentMethodSubmitted { .. },
            ) => Some(S::PaymentInitiated),

            (S::AwaitingPaymentMethod, E::AdminOverrideApproved { expires_at }) => {
                ctx.save_admin_override(*expires_at);
                Some(S::ClearedForFulfilment)
            }
            (
                S::AwaitingPaymentMethod,
                E::CreditOverrideApproved {
                    approved_amount,
                    expires_at,
                },
            ) => {
                ctx.save_credit_override(*approved_amount, *expires_at);
                Some(S::ClearedForFulfilment)
            }

            (
                S::PaymentInitiated | S::PaymentPendingConfirmation | S::OverrideReview,
                E::PaymentConfirmed { amount } | E::PaymentCaptured { amount },
            ) => {
                // Negative or overflowing amounts are refused; state and context stay.
                let amount = amount.unwrap_or(0);
                let total = (amount >= 0)
                    .then(|| ctx.captured_total.checked_add(amount))
                    .flatten();
                let Some(total) = total else {
                    warn!(order_id = %ctx.order_id, amount, "payment amount refused");
                    return None;
                };
                ctx.captured_total = total;
                if ctx.payment_satisfied(now) {
                    Some(S::ClearedForFulfilment)
                } else if state == S::PaymentInitiated {
                    Some(S::PaymentPendingConfirmation)
                } else {
                    None
                }
            }

            (
                S::PaymentInitiated | S::PaymentPendingConfirmation | S::OverrideReview,
                E::PaymentFailed,
            ) => Some(S::PaymentFailed),

            (
                S::PaymentInitiated | S::PaymentPendingConfirmation,
                E::AdminOverrideApproved { expires_at },
            ) => {
                ctx.save_admin_override(*expires_at);
                Some(S::OverrideReview)
            }
            (
                S::PaymentInitiated | S::PaymentPendingConfirmation,
                E::CreditOverrideApproved {
                    approved_amount,
                    expires_at,
                },
            ) => {
                ctx.save_credit_override(*approved_amount, *expires_at);
                Some(S::OverrideReview)
            }

            (S::OverrideReview, E::AdminOverrideApproved { expires_at }) => {
                ctx.save_admin_override(*expires_at);
                ctx.override_satisfied(now)
                    .then_some(S::ClearedForFulfilment)
            }
            (
                S::OverrideReview,
                E::CreditOverrideApproved {
                    approved_amount,
                    expires_at,
                },
            ) => {
                ctx.save_credit_override(*approved_amount, *expires_at);
                ctx.override_satisfied(now)
                    .then_some(S::ClearedForFulfilment)
            }

            (S::OverrideReview, E::AdminOverrideDenied) => {
                ctx.mark_override(Some(OverrideStatus::Denied), None);
                Some(S::PaymentPendingConfirmation)
            }
            (S::OverrideReview, E::CreditOverrideDenied) => {
                ctx.mark_override(None, Some(OverrideStatus::Denied));
                Some(S::PaymentPendingConfirmation)
            }
            (S::OverrideReview, E::OverrideRevoked) => {
                ctx.mark_override(Some(OverrideStatus::Revoked), Some(OverrideStatus::Revoked));
                Some(S::PaymentPendingConfirmation)
            }

            _ => None,
        }
    }
}

/// Run one event against a sale order, starting from `workflow_state` when
/// known and from the status mapping otherwise.
pub fn run_sale(
    status: SaleStatus,
    event: &SaleEvent,
    workflow_state: Option<SaleWorkflowState>,
    context: &SaleContext,
    now: DateTime<Utc>,
) -> SaleStep {
    let start = workflow_state.unwrap_or_else(|| sale_status_to_state(status));
    SaleMachine::step(start, context, event, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn ctx() -> SaleContext {
        SaleContext::new("so-1", 10_000)
    }

    #[test]
    fn full_capture_clears_from_initiated() {
        let step = SaleMachine::step(
            SaleWorkflowState::PaymentInitiated,
            &ctx(),
            &SaleEvent::PaymentCaptured {
                amount: Some(10_000),
            },
            now(),
        );
        assert_eq!(step.state, SaleWorkflowState::ClearedForFulfilment);
        assert!(step.cleared);
        assert!(step.context.clear_to_fulfil);
        assert_eq!(step.context.captured_total, 10_000);
    }

    #[test]
    fn partial_capture_waits_for_confirmation() {
        let first = SaleMachine::step(
            SaleWorkflowState::PaymentInitiated,
            &ctx(),
            &SaleEvent::PaymentCaptured { amount: Some(4_000) },
            now(),
        );
        assert_eq!(first.state, SaleWorkflowState::PaymentPendingConfirmation);
        assert!(!first.cleared);

        let second = SaleMachine::step(
            first.state,
            &first.context,
            &SaleEvent::PaymentCaptured { amount: Some(1_000) },
            now(),
        );
        assert_eq!(second.state, SaleWorkflowState::PaymentPendingConfirmation);
        assert!(second.changed, "captured total moved");
        assert_eq!(second.context.captured_total, 5_000);

        let third = SaleMachine::step(
            second.state,
            &second.context,
            &SaleEvent::PaymentConfirmed { amount: Some(5_000) },
            now(),
        );
        assert_eq!(third.state, SaleWorkflowState::ClearedForFulfilment);
        assert!(third.cleared);
    }

    #[test]
    fn out_of_range_amounts_leave_sale_untouched() {
        let mut start = ctx();
        start.captured_total = 5;

        for amount in [i64::MAX, -1_000] {
            for event in [
                SaleEvent::PaymentCaptured { amount: Some(amount) },
                SaleEvent::PaymentConfirmed { amount: Some(amount) },
            ] {
                let step = SaleMachine::step(
                    SaleWorkflowState::PaymentInitiated,
                    &start,
                    &event,
                    now(),
                );
                assert_eq!(step.state, SaleWorkflowState::PaymentInitiated, "{amount}");
                assert_eq!(step.context, start);
                assert!(!step.changed);
                assert!(!step.cleared);
            }
        }
    }

    #[test]
    fn admin_override_from_awaiting_clears_immediately() {
        let step = SaleMachine::step(
            SaleWorkflowState::AwaitingPaymentMethod,
            &ctx(),
            &SaleEvent::AdminOverrideApproved { expires_at: None },
            now(),
        );
        assert_eq!(step.state, SaleWorkflowState::ClearedForFulfilment);
        assert!(step.cleared);
        assert_eq!(
            step.context.overrides.admin,
            Some(AdminOverride {
                status: OverrideStatus::Approved,
                expires_at: None
            })
        );
    }

    #[test]
    fn expired_admin_override_stays_in_review() {
        let step = SaleMachine::step(
            SaleWorkflowState::OverrideReview,
            &ctx(),
            &SaleEvent::AdminOverrideApproved {
                expires_at: Some(now() - Duration::minutes(1)),
            },
            now(),
        );
        assert_eq!(step.state, SaleWorkflowState::OverrideReview);
        assert!(step.changed, "override saved even though not yet satisfied");
        assert!(!step.cleared);
    }

    #[test]
    fn credit_override_with_expiry_must_cover_overage() {
        let mut c = ctx();
        c.credit.overage = Some(3_000);

        let short = SaleMachine::step(
            SaleWorkflowState::OverrideReview,
            &c,
            &SaleEvent::CreditOverrideApproved {
                approved_amount: Some(2_000),
                expires_at: Some(now() + Duration::hours(1)),
            },
            now(),
        );
        assert_eq!(short.state, SaleWorkflowState::OverrideReview);

        let covering = SaleMachine::step(
            SaleWorkflowState::OverrideReview,
            &c,
            &SaleEvent::CreditOverrideApproved {
                approved_amount: None,
                expires_at: Some(now() + Duration::hours(1)),
            },
            now(),
        );
        assert_eq!(covering.state, SaleWorkflowState::ClearedForFulfilment);
        assert_eq!(
            covering.context.overrides.credit.as_ref().map(|o| o.approved_amount),
            Some(3_000),
            "approved amount defaults to the overage"
        );
    }

    #[test]
    fn revoked_override_no_longer_satisfies_payment() {
        let review = SaleMachine::step(
            SaleWorkflowState::PaymentInitiated,
            &ctx(),
            &SaleEvent::AdminOverrideApproved { expires_at: None },
            now(),
        );
        assert_eq!(review.state, SaleWorkflowState::OverrideReview);

        let revoked = SaleMachine::step(review.state, &review.context, &SaleEvent::OverrideRevoked, now());
        assert_eq!(revoked.state, SaleWorkflowState::PaymentPendingConfirmation);
        assert!(!revoked.context.override_satisfied(now()));

        let confirm = SaleMachine::step(
            revoked.state,
            &revoked.context,
            &SaleEvent::PaymentConfirmed { amount: None },
            now(),
        );
        assert_eq!(confirm.state, SaleWorkflowState::PaymentPendingConfirmation);
        assert!(!confirm.changed);
    }

    #[test]
    fn reset_from_cleared_drops_overrides_and_flag() {
        let cleared = SaleMachine::step(
            SaleWorkflowState::AwaitingPaymentMethod,
            &ctx(),
            &SaleEvent::AdminOverrideApproved { expires_at: None },
            now(),
        );
        let reset = SaleMachine::step(cleared.state, &cleared.context, &SaleEvent::Reset, now());
        assert_eq!(reset.state, SaleWorkflowState::AwaitingPaymentMethod);
        assert_eq!(reset.context.overrides, Overrides::default());
        assert!(!reset.context.clear_to_fulfil);
    }

    #[test]
    fn cancelled_and_cleared_ignore_other_events() {
        for state in [SaleWorkflowState::Cancelled, SaleWorkflowState::ClearedForFulfilment] {
            let step = SaleMachine::step(state, &ctx(), &SaleEvent::Cancel, now());
            assert_eq!(step.state, state);
            assert!(!step.changed);
        }
    }

    #[test]
    fn unhandled_event_is_not_a_change() {
        let step = SaleMachine::step(
            SaleWorkflowState::AwaitingPaymentMethod,
            &ctx(),
            &SaleEvent::PaymentInitiated,
            now(),
        );
        assert!(!step.changed);
        assert_eq!(step.state, SaleWorkflowState::AwaitingPaymentMethod);
    }

    #[test]
    fn run_sale_starts_from_status_mapping() {
        let step = run_sale(
            SaleStatus::Approved,
            &SaleEvent::PaymentFailed,
            None,
            &ctx(),
            now(),
        );
        assert_eq!(step.state, SaleWorkflowState::PaymentFailed);
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let ev: SaleEvent =
            serde_json::from_str(r#"{"type":"PAYMENT_CAPTURED","amount":2500}"#).unwrap();
        assert_eq!(ev, SaleEvent::PaymentCaptured { amount: Some(2_500) });
        let ev: SaleEvent = serde_json::from_str(r#"{"type":"CANCEL"}"#).unwrap();
        assert_eq!(ev, SaleEvent::Cancel);
    }
}
