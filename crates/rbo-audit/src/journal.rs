use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::record::TransitionRecord;

/// Namespace for deterministic journal entry ids.
const ENTRY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_53c2_8d4e_4b7a_9e10_2c5d_7f3b_e941);

/// Append-only journal writer. Writes JSON Lines (one entry per line).
/// Optional hash chain: each entry can include hash_prev + hash_self.
pub struct JournalWriter {
    path: PathBuf,
    hash_chain: bool,
    last_hash: Option<String>,
    /// Number of entries already in the journal; the next entry's `seq`.
    seq: u64,
}

impl JournalWriter {
    /// Creates the writer for a fresh journal and ensures parent dirs exist.
    pub fn new(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {:?}", parent))?;
        }

        Ok(Self {
            path,
            hash_chain,
            last_hash: None,
            seq: 0,
        })
    }

    /// Reopen an existing journal, restoring the chain head and sequence.
    ///
    /// Refuses to continue a journal whose chain is already broken, or a
    /// chained journal with `hash_chain == false`. A missing file is treated
    /// as an empty journal.
    pub fn resume(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let mut writer = Self::new(path, hash_chain)?;
        if !writer.path.exists() {
            return Ok(writer);
        }

        let content = fs::read_to_string(&writer.path)
            .with_context(|| format!("read journal {:?}", writer.path))?;
        if let VerifyResult::Broken { line, reason } = verify_journal_str(&content)? {
            bail!(
                "JOURNAL_CHAIN_BROKEN path={:?} line={} reason={}",
                writer.path,
                line,
                reason
            );
        }

        let entries = parse_entries(&content)?;
        if let Some(tail) = entries.last() {
            // An unchained line after a chained tail would break the chain.
            if tail.hash_self.is_some() && !hash_chain {
                bail!(
                    "JOURNAL_CHAIN_MODE_MISMATCH path={:?} seq={}: journal is hash-chained \
                    but hash_chain=false",
                    writer.path,
                    tail.seq
                );
            }
        }
        writer.seq = entries.len() as u64;
        writer.last_hash = entries.last().and_then(|e| e.hash_self.clone());
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_hash(&self) -> Option<String> {
        self.last_hash.clone()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append one record unconditionally.
    pub fn append(&mut self, record: TransitionRecord) -> Result<JournalEntry> {
        let ts_utc = Utc::now();
        let entry_id = derive_entry_id(self.last_hash.as_deref(), &record, self.seq)?;

        let mut entry = JournalEntry {
            entry_id,
            seq: self.seq,
            ts_utc,
            record,
            hash_prev: None,
            hash_self: None,
        };

        if self.hash_chain {
            entry.hash_prev = self.last_hash.clone();
            entry.hash_self = Some(compute_entry_hash(&entry)?);
        }

        // Chain head only advances once the line is on disk.
        let line = canonical_json_line(&entry)?;
        append_line(&self.path, &line)?;
        if self.hash_chain {
            self.last_hash = entry.hash_self.clone();
        }
        self.seq += 1;

        info!(
            kind = %entry.record.entity_kind,
            entity_id = %entry.record.entity_id,
            from = entry.record.from_state.as_deref().unwrap_or("-"),
            to = %entry.record.to_state,
            seq = entry.seq,
            "transition journaled"
        );
        Ok(entry)
    }

    /// Append only if the record carries something worth logging
    /// (see [`crate::should_record`]).
    pub fn record(&mut self, record: TransitionRecord) -> Result<Option<JournalEntry>> {
        if !record.is_worth_recording() {
            return Ok(None);
        }
        self.append(record).map(Some)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: Uuid,
    pub seq: u64,
    pub ts_utc: DateTime<Utc>,
    pub record: TransitionRecord,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Entry id derived from chain head, sequence and record content. No RNG,
/// so replaying the same records into a fresh journal yields the same ids.
fn derive_entry_id(prev_hash: Option<&str>, record: &TransitionRecord, seq: u64) -> Result<Uuid> {
    let canonical = canonical_json_line(record)?;
    let name = format!("{}|{}|{}", prev_hash.unwrap_or(""), seq, canonical);
    Ok(Uuid::new_v5(&ENTRY_ID_NAMESPACE, name.as_bytes()))
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open journal {:?}", path))?;
    writeln!(f, "{line}").with_context(|| format!("append to journal {:?}", path))
}

/// Compact JSON with object keys in sorted order. Going through `Value`
/// does the sorting: serde_json's map is ordered by key.
fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let value = serde_json::to_value(v).context("serialize journal entry failed")?;
    serde_json::to_string(&value).context("json stringify failed")
}

/// Everything an entry's `hash_self` covers.
#[derive(Serialize)]
struct HashedFields<'a> {
    entry_id: &'a Uuid,
    seq: u64,
    ts_utc: &'a DateTime<Utc>,
    record: &'a TransitionRecord,
    hash_prev: Option<&'a str>,
}

/// SHA-256 (hex) over the canonical line of every field but `hash_self`.
pub fn compute_entry_hash(entry: &JournalEntry) -> Result<String> {
    let view = HashedFields {
        entry_id: &entry.entry_id,
        seq: entry.seq,
        ts_utc: &entry.ts_utc,
        record: &entry.record,
        hash_prev: entry.hash_prev.as_deref(),
    };
    let digest = Sha256::digest(canonical_json_line(&view)?.as_bytes());
    Ok(hex::encode(digest))
}

/// Non-blank lines as `(1-based line number, entry)`.
fn parse_lines(content: &str) -> Result<Vec<(usize, JournalEntry)>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line.trim())
                .map(|entry| (i + 1, entry))
                .with_context(|| format!("parse journal entry at line {}", i + 1))
        })
        .collect()
}

fn parse_entries(content: &str) -> Result<Vec<JournalEntry>> {
    Ok(parse_lines(content)?.into_iter().map(|(_, e)| e).collect())
}

/// Read every entry of a journal file, in order.
pub fn read_journal(path: impl AsRef<Path>) -> Result<Vec<JournalEntry>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read journal {:?}", path.as_ref()))?;
    parse_entries(&content)
}

/// Verify hash chain and sequence integrity of a journal file.
pub fn verify_journal(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read journal {:?}", path.as_ref()))?;
    verify_journal_str(&content)
}

/// Same checks as [`verify_journal`] over in-memory JSONL content.
///
/// Per entry, in order: `seq` counts up from 0, `hash_prev` names the
/// previous entry's `hash_self`, and a present `hash_self` matches the
/// recomputed hash.
pub fn verify_journal_str(content: &str) -> Result<VerifyResult> {
    let entries = parse_lines(content)?;
    let mut prev_hash: Option<&str> = None;

    for (expected_seq, (line, entry)) in entries.iter().enumerate() {
        if let Some(reason) = link_fault(expected_seq as u64, prev_hash, entry)? {
            return Ok(VerifyResult::Broken { line: *line, reason });
        }
        prev_hash = entry.hash_self.as_deref();
    }

    Ok(VerifyResult::Valid {
        lines: entries.len(),
    })
}

fn link_fault(
    expected_seq: u64,
    prev_hash: Option<&str>,
    entry: &JournalEntry,
) -> Result<Option<String>> {
    if entry.seq != expected_seq {
        return Ok(Some(format!(
            "seq mismatch: expected {}, got {}",
            expected_seq, entry.seq
        )));
    }
    if entry.hash_prev.as_deref() != prev_hash {
        return Ok(Some(format!(
            "hash_prev mismatch: expected {:?}, got {:?}",
            prev_hash, entry.hash_prev
        )));
    }
    if let Some(claimed) = entry.hash_self.as_deref() {
        let recomputed = compute_entry_hash(entry)?;
        if claimed != recomputed {
            return Ok(Some(format!(
                "hash_self mismatch: claimed {}, recomputed {}",
                claimed, recomputed
            )));
        }
    }
    Ok(None)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}
