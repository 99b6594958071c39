use rbo_lifecycle::{EntityKind, LifecycleStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One transition as handed to the journal.
///
/// States are text so the same record carries coarse statuses
/// (`IN_TRANSIT`) and workflow states (`READY_FOR_SHIPMENT`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub from_state: Option<String>,
    pub to_state: String,
    pub event: Option<String>,
    pub metadata: Option<Value>,
}

impl TransitionRecord {
    pub fn new(
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        from_state: Option<&str>,
        to_state: impl Into<String>,
    ) -> Self {
        Self {
            entity_kind,
            entity_id: entity_id.into(),
            from_state: from_state.map(str::to_string),
            to_state: to_state.into(),
            event: None,
            metadata: None,
        }
    }

    /// Record for a coarse status change; the kind comes from the status type.
    pub fn status_change<S: LifecycleStatus>(entity_id: impl Into<String>, from: S, to: S) -> Self {
        Self::new(S::KIND, entity_id, Some(from.name()), to.name())
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_worth_recording(&self) -> bool {
        should_record(
            self.from_state.as_deref(),
            &self.to_state,
            self.event.as_deref(),
            self.metadata.as_ref(),
        )
    }
}

/// A transition is logged when the state moved, when it carries a non-empty
/// event name, or when it carries metadata. A bare same-state write is not.
pub fn should_record(
    from_state: Option<&str>,
    to_state: &str,
    event: Option<&str>,
    metadata: Option<&Value>,
) -> bool {
    from_state != Some(to_state)
        || event.is_some_and(|e| !e.is_empty())
        || metadata.is_some()
}
