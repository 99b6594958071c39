//! rbo-audit
//!
//! Append-only transition journal. One JSON line per recorded status or
//! workflow transition, optionally hash-chained so that edits, deletions and
//! reordering are detectable after the fact.

mod journal;
mod record;

pub use journal::{
    compute_entry_hash, read_journal, verify_journal, verify_journal_str, JournalEntry,
    JournalWriter, VerifyResult,
};
pub use record::{should_record, TransitionRecord};
