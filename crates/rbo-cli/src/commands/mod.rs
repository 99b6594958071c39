//! Command handler modules for the `rbo` binary.
//!
//! Shared helpers live here; command-specific logic lives in the submodules.

pub mod journal;
pub mod lifecycle;
pub mod workflow;

use anyhow::{Context, Result};
use rbo_lifecycle::EntityKind;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` wins over the
/// config filter, which wins over `info`.
pub fn init_tracing(config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn parse_kind(kind: &str) -> Result<EntityKind> {
    kind.parse::<EntityKind>()
        .context("expected one of: SALE | QUOTATION | FULFILLMENT")
}
