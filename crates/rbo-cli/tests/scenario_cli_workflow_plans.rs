//! `rbo fulfilment-plan` and `rbo sale-step`.
//!
//! GREEN when:
//! - A legal status change prints its workflow events and the landing state.
//! - An illegal status change is refused before any event is planned.
//! - A drifted workflow state is reported instead of silently advanced.
//! - A covering capture clears the sale and the context is printed as JSON.

use predicates::prelude::*;

fn rbo() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("rbo").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn plan_prints_events_and_state() {
    rbo()
        .args(["fulfilment-plan", "PENDING", "ASSIGNED"])
        .assert()
        .success()
        .stdout("event=RESERVE_OK\nevent=FULFILMENT_STARTED\nstate=READY_FOR_SHIPMENT\nchanged=true\n");
}

#[test]
fn plan_refuses_illegal_status_change() {
    rbo()
        .args(["fulfilment-plan", "DELIVERED", "PENDING"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid fulfillment transition"));
}

#[test]
fn plan_reports_drifted_workflow_state() {
    rbo()
        .args([
            "fulfilment-plan",
            "ASSIGNED",
            "IN_TRANSIT",
            "--workflow-state",
            "ALLOCATING_STOCK",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not accept PACKAGE_SHIPPED"));
}

#[test]
fn covering_capture_clears_sale() {
    let assert = rbo()
        .args([
            "sale-step",
            "--status",
            "APPROVED",
            "--event",
            r#"{"type":"PAYMENT_CAPTURED","amount":5000}"#,
            "--context",
            r#"{"order_id":"so-1","grand_total":5000}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("state=CLEARED_FOR_FULFILMENT\n"))
        .stdout(predicate::str::contains("cleared=true\n"));

    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let ctx_line = out.lines().last().unwrap();
    let ctx: serde_json::Value = serde_json::from_str(ctx_line).unwrap();
    assert_eq!(ctx["captured_total"], 5000);
    assert_eq!(ctx["clear_to_fulfil"], true);
}

#[test]
fn malformed_event_is_rejected() {
    rbo()
        .args(["sale-step", "--status", "PENDING", "--event", "{\"type\":\"TELEPORT\"}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--event must be a sale event JSON object"));
}
