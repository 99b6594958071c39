//! Sale payment clearance, end to end through persisted JSON context.
//!
//! GREEN when:
//! - A sale paid in two captures is cleared exactly once, on the capture
//!   that covers the grand total.
//! - A context persisted as JSON and reloaded continues the same workflow.
//! - A credit override that has expired by the time it is evaluated does
//!   not clear the order.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rbo_lifecycle::SaleStatus;
use rbo_workflow::{run_sale, SaleContext, SaleEvent, SaleMachine, SaleWorkflowState};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
}

#[test]
fn two_captures_clear_once() {
    let ctx = SaleContext::new("so-7", 12_000);

    let s1 = run_sale(
        SaleStatus::Pending,
        &SaleEvent::SetPaymentMethod {
            method: Some("MOBILE_MONEY".to_string()),
        },
        None,
        &ctx,
        t0(),
    );
    assert_eq!(s1.state, SaleWorkflowState::PaymentInitiated);

    let s2 = SaleMachine::step(
        s1.state,
        &s1.context,
        &SaleEvent::PaymentCaptured { amount: Some(7_000) },
        t0(),
    );
    assert_eq!(s2.state, SaleWorkflowState::PaymentPendingConfirmation);
    assert!(!s2.cleared);

    // Persist + reload between events, as the service layer does.
    let stored = serde_json::to_value(&s2.context).unwrap();
    let reloaded: SaleContext = serde_json::from_value(stored).unwrap();
    let state: SaleWorkflowState = s2.state.as_str().parse().unwrap();

    let s3 = SaleMachine::step(
        state,
        &reloaded,
        &SaleEvent::PaymentCaptured { amount: Some(5_000) },
        t0(),
    );
    assert_eq!(s3.state, SaleWorkflowState::ClearedForFulfilment);
    assert!(s3.cleared);
    assert_eq!(s3.context.captured_total, 12_000);

    let s4 = SaleMachine::step(
        s3.state,
        &s3.context,
        &SaleEvent::PaymentCaptured { amount: Some(1) },
        t0(),
    );
    assert!(!s4.changed, "cleared sale ignores further captures");
    assert!(!s4.cleared);
}

#[test]
fn expired_credit_override_does_not_clear() {
    let mut ctx = SaleContext::new("so-8", 50_000);
    ctx.credit.overage = Some(20_000);

    let review = SaleMachine::step(
        SaleWorkflowState::PaymentPendingConfirmation,
        &ctx,
        &SaleEvent::CreditOverrideApproved {
            approved_amount: Some(25_000),
            expires_at: Some(t0() + Duration::minutes(30)),
        },
        t0(),
    );
    assert_eq!(review.state, SaleWorkflowState::OverrideReview);
    assert!(review.context.credit_override_valid(t0()));

    // Evaluated after expiry: the payment guard no longer passes.
    let later = t0() + Duration::hours(2);
    let confirm = SaleMachine::step(
        review.state,
        &review.context,
        &SaleEvent::PaymentConfirmed { amount: None },
        later,
    );
    assert_eq!(confirm.state, SaleWorkflowState::OverrideReview);
    assert!(!confirm.cleared);
}

#[test]
fn context_json_uses_snake_case_fields() {
    let ctx = SaleContext::new("so-9", 100);
    let v = serde_json::to_value(&ctx).unwrap();
    assert_eq!(v["order_id"], "so-9");
    assert_eq!(v["grand_total"], 100);
    assert_eq!(v["clear_to_fulfil"], false);

    let partial: SaleContext = serde_json::from_str(r#"{"order_id":"so-10"}"#).unwrap();
    assert_eq!(partial.grand_total, 0);
}
