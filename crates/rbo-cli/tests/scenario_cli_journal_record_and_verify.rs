//! `rbo journal record` / `rbo journal verify` against a temp journal.
//!
//! GREEN when:
//! - Legal transitions are appended and the journal verifies.
//! - An illegal transition is refused and nothing is written.
//! - A same-state write without event is skipped (NOOP).
//! - The journal path comes from layered config when --journal is absent.
//! - A tampered journal fails verification.

use predicates::prelude::*;
use std::path::Path;

fn rbo() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("rbo").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn record(journal: &Path, kind: &str, id: &str, from: &str, to: &str) -> assert_cmd::assert::Assert {
    rbo()
        .args(["journal", "record", "--kind", kind, "--entity-id", id])
        .args(["--from", from, "--to", to])
        .arg("--journal")
        .arg(journal)
        .assert()
}

#[test]
fn legal_moves_are_journaled_and_verify() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("transitions.jsonl");

    record(&journal, "sale", "so-1", "pending", "approved")
        .success()
        .stdout(predicate::str::contains("journaled=true"))
        .stdout(predicate::str::contains("seq=0"));
    record(&journal, "sale", "so-1", "approved", "paid")
        .success()
        .stdout(predicate::str::contains("seq=1"))
        .stdout(predicate::str::contains("hash_self="));

    rbo()
        .args(["journal", "verify"])
        .arg(&journal)
        .assert()
        .success()
        .stdout("valid=true lines=2\n");

    let content = std::fs::read_to_string(&journal).unwrap();
    let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(first["record"]["from_state"], "PENDING");
    assert_eq!(first["record"]["to_state"], "APPROVED");
    assert_eq!(first["record"]["entity_kind"], "SALE");
}

#[test]
fn illegal_move_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("transitions.jsonl");

    record(&journal, "fulfillment", "ff-1", "delivered", "pending")
        .failure()
        .stderr(predicate::str::contains("invalid fulfillment transition"));
    assert!(!journal.exists());
}

#[test]
fn same_state_without_event_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("transitions.jsonl");

    record(&journal, "quotation", "q-1", "sent", "sent")
        .success()
        .stdout(predicate::str::contains("journaled=false reason=NOOP"));

    rbo()
        .args(["journal", "record", "--kind", "quotation", "--entity-id", "q-1"])
        .args(["--from", "sent", "--to", "sent", "--event", "quotation.resent"])
        .arg("--journal")
        .arg(&journal)
        .assert()
        .success()
        .stdout(predicate::str::contains("journaled=true"));
}

#[test]
fn journal_path_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("from-config.jsonl");
    let cfg = dir.path().join("rbo.yaml");
    std::fs::write(
        &cfg,
        format!(
            "journal:\n  path: {:?}\n  hash_chain: true\nlogging:\n  filter: warn\n",
            journal.to_str().unwrap()
        ),
    )
    .unwrap();

    rbo()
        .args(["journal", "record", "--kind", "fulfillment", "--entity-id", "ff-2"])
        .args(["--from", "pending", "--to", "assigned"])
        .args(["--metadata", r#"{"rider":"r-1"}"#])
        .arg("--config")
        .arg(&cfg)
        .assert()
        .success();

    assert!(journal.exists());
    rbo()
        .args(["journal", "verify"])
        .arg(&journal)
        .assert()
        .success()
        .stdout("valid=true lines=1\n");
}

#[test]
fn tampered_journal_fails_verify() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("transitions.jsonl");
    record(&journal, "sale", "so-2", "pending", "paid").success();
    record(&journal, "sale", "so-2", "paid", "fulfilled").success();

    let content = std::fs::read_to_string(&journal).unwrap();
    std::fs::write(&journal, content.replace("FULFILLED", "CANCELLED")).unwrap();

    rbo()
        .args(["journal", "verify"])
        .arg(&journal)
        .assert()
        .failure()
        .stdout("valid=false line=2\n")
        .stderr(predicate::str::contains("JOURNAL_CHAIN_BROKEN"));
}
