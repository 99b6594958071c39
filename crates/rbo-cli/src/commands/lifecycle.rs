//! Read-only guard queries: statuses, allowed, check, ensure, graph.

use anyhow::Result;
use rbo_lifecycle::Lifecycle;
use tracing::warn;

use super::parse_kind;

pub fn statuses(kind: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    for s in Lifecycle::statuses(kind) {
        println!("{}", s);
    }
    Ok(())
}

pub fn allowed(kind: &str, from: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    for s in Lifecycle::allowed(kind, from)? {
        println!("{}", s);
    }
    Ok(())
}

pub fn check(kind: &str, from: &str, to: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let ok = Lifecycle::check(kind, from, to)?;
    println!("allowed={}", ok);
    Ok(())
}

pub fn ensure(kind: &str, from: &str, to: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    if let Err(e) = Lifecycle::ensure(kind, from, to) {
        warn!(error = %e, "transition refused");
        return Err(e.into());
    }
    println!(
        "ensured=true kind={} from={} to={}",
        kind,
        Lifecycle::canonical(kind, from)?,
        Lifecycle::canonical(kind, to)?
    );
    Ok(())
}

/// One `FROM -> TO` line per edge, then one `TERMINAL <STATUS>` line per
/// status with no way out.
pub fn graph(kind: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    for (from, to) in Lifecycle::edges(kind) {
        println!("{} -> {}", from, to);
    }
    for s in Lifecycle::statuses(kind) {
        if Lifecycle::is_terminal(kind, s)? {
            println!("TERMINAL {}", s);
        }
    }
    Ok(())
}
