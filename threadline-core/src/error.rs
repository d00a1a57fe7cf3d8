//! Error types for Threadline operations.
//!
//! Every failure in this layer is terminal at the point of catch: callers
//! substitute a user-visible but non-fatal state (a synthetic system
//! message, a dropped event, a transient notice). Nothing here is allowed
//! to crash a view.

use crate::ConversationId;
use thiserror::Error;

/// Transport-boundary failures (message fetch/create, log fetch, upload).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to fetch messages for conversation {conversation_id}: {reason}")]
    FetchMessagesFailed {
        conversation_id: ConversationId,
        reason: String,
    },

    #[error("Failed to create message: {reason}")]
    CreateMessageFailed { reason: String },

    #[error("Failed to fetch execution logs for message {message_id}: {reason}")]
    FetchLogsFailed { message_id: String, reason: String },

    #[error("Failed to list templates: {reason}")]
    TemplateListFailed { reason: String },

    #[error("Upload failed for {name}: {reason}")]
    UploadFailed { name: String, reason: String },
}

/// Classification of rejected stream events. Diagnostic only; rejected
/// events are dropped, never surfaced to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("Malformed event: {reason}")]
    Malformed { reason: String },

    #[error("Stale event for {conversation_id}: seq {seq} <= last applied {last_applied}")]
    StaleSequence {
        conversation_id: ConversationId,
        seq: u64,
        last_applied: u64,
    },

    #[error("Event for inactive run in {conversation_id} ignored")]
    InactiveRun { conversation_id: ConversationId },
}

/// Session lifecycle failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No session for conversation {conversation_id}")]
    NotSubscribed { conversation_id: ConversationId },

    #[error("Fetch already in flight for {resource}")]
    FetchInFlight { resource: String },

    #[error("Unknown temp id temp-{temp_id}")]
    UnknownTempId { temp_id: i64 },
}

/// Master error type for all Threadline errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ThreadlineError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type alias for Threadline operations.
pub type ThreadlineResult<T> = Result<T, ThreadlineError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display_fetch_messages() {
        let err = TransportError::FetchMessagesFailed {
            conversation_id: "T1".to_string(),
            reason: "timeout".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("T1"));
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn test_event_error_display_stale_sequence() {
        let err = EventError::StaleSequence {
            conversation_id: "T1".to_string(),
            seq: 3,
            last_applied: 7,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("seq 3"));
        assert!(msg.contains("7"));
    }

    #[test]
    fn test_session_error_display_fetch_in_flight() {
        let err = SessionError::FetchInFlight {
            resource: "history:T1".to_string(),
        };
        assert!(format!("{}", err).contains("history:T1"));
    }

    #[test]
    fn test_threadline_error_from_variants() {
        let transport = ThreadlineError::from(TransportError::CreateMessageFailed {
            reason: "503".to_string(),
        });
        assert!(matches!(transport, ThreadlineError::Transport(_)));

        let event = ThreadlineError::from(EventError::Malformed {
            reason: "no seq".to_string(),
        });
        assert!(matches!(event, ThreadlineError::Event(_)));

        let session = ThreadlineError::from(SessionError::NotSubscribed {
            conversation_id: "T1".to_string(),
        });
        assert!(matches!(session, ThreadlineError::Session(_)));
    }
}
