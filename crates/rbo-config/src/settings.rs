use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_JOURNAL_PATH: &str = "exports/transitions.jsonl";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Typed view over the merged config. Unknown sections are ignored here and
/// surfaced by [`crate::report_unused_keys`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RboConfig {
    pub journal: JournalConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub path: String,
    pub hash_chain: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_JOURNAL_PATH.to_string(),
            hash_chain: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl RboConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        serde_json::from_value(config_json.clone()).context("config does not match RboConfig")
    }
}
