//! Threadline Core - Conversation Data Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types and small pure helpers - no I/O,
//! no session logic.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicI64, Ordering};

mod error;
mod event;
mod files;
mod logs;
mod message;
mod template;

pub use error::{
    EventError, SessionError, ThreadlineError, ThreadlineResult, TransportError,
};
pub use event::{decode_event, ExecutionStatus, StreamEvent, StreamPayload};
pub use files::FileArtifact;
pub use logs::{partition_entries, LogCollections, LogEntry, LogKind, LogSource};
pub use message::{
    AttachedFile, Message, MessageIdent, MessageKind, SuggestionPriority, TaskSuggestion,
    UploadResult,
};
pub use template::PromptTemplate;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Conversation identifier. Owned by the backend (it is the task id of the
/// discussion thread), so it stays an opaque string on this side.
pub type ConversationId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Counter that keeps temp ids unique within one process even when two
/// messages are authored in the same millisecond.
static TEMP_ID_COUNTER: Lazy<AtomicI64> = Lazy::new(|| AtomicI64::new(0));

/// Temporary client-side message id, assigned optimistically before the
/// backend confirms a send.
///
/// The inner value is the creation time in unix milliseconds (plus a
/// uniqueness counter in the low bits), which makes temp ids directly
/// comparable with the id-derived ordering fallback used for display
/// sorting: an unconfirmed message sorts as if its timestamp were its
/// moment of creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub i64);

impl TempId {
    /// Allocate a fresh temp id for the current instant.
    pub fn next() -> Self {
        let millis = Utc::now().timestamp_millis();
        let salt = TEMP_ID_COUNTER.fetch_add(1, Ordering::Relaxed) % 1000;
        Self(millis * 1000 + salt)
    }

    /// Unix milliseconds this id was derived from.
    pub fn as_millis(&self) -> i64 {
        self.0 / 1000
    }
}

impl std::fmt::Display for TempId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "temp-{}", self.0)
    }
}

/// Extract the leading run of ascii digits from a backend message id
/// ("174-followup" -> 174, "m-9" -> 9). Used as the ordering tie-breaker
/// and as the timestamp fallback for ids with no confirmed timestamp.
pub fn numeric_id_component(id: &str) -> Option<i64> {
    let digits: String = id
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_ids_are_monotonic() {
        let a = TempId::next();
        let b = TempId::next();
        assert!(a < b);
    }

    #[test]
    fn test_temp_id_display() {
        let id = TempId(1234);
        assert_eq!(id.to_string(), "temp-1234");
    }

    #[test]
    fn test_numeric_id_component_plain() {
        assert_eq!(numeric_id_component("174"), Some(174));
    }

    #[test]
    fn test_numeric_id_component_prefixed() {
        assert_eq!(numeric_id_component("m-9"), Some(9));
        assert_eq!(numeric_id_component("temp-1234"), Some(1234));
    }

    #[test]
    fn test_numeric_id_component_missing() {
        assert_eq!(numeric_id_component("draft"), None);
        assert_eq!(numeric_id_component(""), None);
    }
}
