//! `rbo journal record` and `rbo journal verify`.

use anyhow::{bail, Context, Result};
use rbo_audit::{verify_journal, JournalWriter, TransitionRecord, VerifyResult};
use rbo_config::{report_unused_keys, UnusedKeyPolicy};
use rbo_lifecycle::Lifecycle;
use serde_json::Value;
use tracing::warn;

use super::{init_tracing, parse_kind};

pub struct RecordArgs {
    pub kind: String,
    pub entity_id: String,
    pub from: String,
    pub to: String,
    pub event: Option<String>,
    pub metadata: Option<String>,
    pub config_paths: Vec<String>,
    pub journal: Option<String>,
}

pub fn record(args: RecordArgs) -> Result<()> {
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = rbo_config::load_layered_yaml(&path_refs)?;
    let settings = loaded.settings()?;
    init_tracing(Some(&settings.logging.filter));

    // Logged by the config layer; recording proceeds.
    report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;

    let kind = parse_kind(&args.kind)?;
    if let Err(e) = Lifecycle::ensure(kind, &args.from, &args.to) {
        warn!(entity_id = %args.entity_id, error = %e, "transition refused; not journaled");
        return Err(e.into());
    }

    let metadata = args
        .metadata
        .as_deref()
        .map(|raw| serde_json::from_str::<Value>(raw.trim()))
        .transpose()
        .context("--metadata must be valid JSON")?;

    let mut record = TransitionRecord::new(
        kind,
        args.entity_id,
        Some(Lifecycle::canonical(kind, &args.from)?),
        Lifecycle::canonical(kind, &args.to)?,
    );
    if let Some(event) = args.event {
        record = record.with_event(event);
    }
    if let Some(metadata) = metadata {
        record = record.with_metadata(metadata);
    }

    let path = args.journal.unwrap_or(settings.journal.path);
    let mut writer = JournalWriter::resume(&path, settings.journal.hash_chain)?;

    match writer.record(record)? {
        Some(entry) => {
            println!("journaled=true path={}", path);
            println!("seq={}", entry.seq);
            println!("entry_id={}", entry.entry_id);
            if let Some(h) = entry.hash_self {
                println!("hash_self={}", h);
            }
        }
        None => println!("journaled=false reason=NOOP path={}", path),
    }
    Ok(())
}

pub fn verify(path: &str) -> Result<()> {
    match verify_journal(path)? {
        VerifyResult::Valid { lines } => {
            println!("valid=true lines={}", lines);
            Ok(())
        }
        VerifyResult::Broken { line, reason } => {
            println!("valid=false line={}", line);
            bail!("JOURNAL_CHAIN_BROKEN line={} reason={}", line, reason)
        }
    }
}
