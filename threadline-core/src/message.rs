//! Message entity structures.
//!
//! A message carries a tagged identity: `Local` while it only exists
//! optimistically on this client, `Persisted` once the backend has
//! acknowledged it. The two are never conflated in one string field;
//! reconciliation is an explicit step in the message store.

use crate::{numeric_id_component, ConversationId, TempId, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// MESSAGE IDENTITY
// ============================================================================

/// Identity of a message: optimistic client-side or backend-confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum MessageIdent {
    /// Assigned locally while the send is unacknowledged.
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    Local(#[serde(with = "temp_id_serde")] TempId),
    /// Canonical backend id.
    Persisted(String),
}

mod temp_id_serde {
    use super::TempId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(id: &TempId, s: S) -> Result<S::Ok, S::Error> {
        id.0.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TempId, D::Error> {
        i64::deserialize(d).map(TempId)
    }
}

impl MessageIdent {
    /// Numeric component used for ordering tie-breaks and as the timestamp
    /// fallback before confirmation.
    pub fn numeric(&self) -> Option<i64> {
        match self {
            MessageIdent::Local(temp) => Some(temp.0),
            MessageIdent::Persisted(id) => numeric_id_component(id),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, MessageIdent::Local(_))
    }
}

impl std::fmt::Display for MessageIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageIdent::Local(temp) => write!(f, "{temp}"),
            MessageIdent::Persisted(id) => write!(f, "{id}"),
        }
    }
}

// ============================================================================
// MESSAGE
// ============================================================================

/// Author category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Human,
    Ai,
    /// Synthetic, client-authored annotations (load failures, send
    /// failures). Never sent to the backend.
    System,
}

/// Attachment descriptor, set at creation time and immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttachedFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub url: String,
}

impl AttachedFile {
    /// Register an uploaded attachment under a fresh v7 id.
    pub fn new(
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            url: url.into(),
        }
    }
}

/// Result of uploading a binary attachment to file storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadResult {
    pub storage_key: String,
    pub url: String,
}

/// Priority of an agent-suggested task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    Low,
    Medium,
    High,
}

/// Structured task suggestion attached by the agent, rendered as an
/// actionable card under its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskSuggestion {
    pub name: String,
    pub priority: SuggestionPriority,
    pub project: String,
}

/// A single transcript entry.
///
/// `timestamp` is `None` for optimistic entries pending confirmation; the
/// view layer renders the "Just now" sentinel, ordering falls back to the
/// id-derived key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Message {
    pub ident: MessageIdent,
    pub conversation_id: ConversationId,
    pub kind: MessageKind,
    /// Mutable text body. For `Ai` messages this is replaced wholesale by
    /// each content delta while streaming is in progress.
    pub content: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub timestamp: Option<Timestamp>,
    /// Render as a preformatted code block instead of rich text.
    pub is_code: bool,
    pub attached_files: Vec<AttachedFile>,
    pub task_suggestion: Option<TaskSuggestion>,
    /// Transient flag while an optimistic message awaits acknowledgement.
    pub pending: bool,
}

impl Message {
    /// Create an optimistic human message with a fresh temp id.
    pub fn human(conversation_id: impl Into<ConversationId>, content: impl Into<String>) -> Self {
        Self {
            ident: MessageIdent::Local(TempId::next()),
            conversation_id: conversation_id.into(),
            kind: MessageKind::Human,
            content: content.into(),
            timestamp: None,
            is_code: false,
            attached_files: Vec::new(),
            task_suggestion: None,
            pending: true,
        }
    }

    /// Create an agent message (confirmed or in-progress).
    pub fn ai(
        conversation_id: impl Into<ConversationId>,
        ident: MessageIdent,
        content: impl Into<String>,
    ) -> Self {
        Self {
            ident,
            conversation_id: conversation_id.into(),
            kind: MessageKind::Ai,
            content: content.into(),
            timestamp: None,
            is_code: false,
            attached_files: Vec::new(),
            task_suggestion: None,
            pending: false,
        }
    }

    /// Create a synthetic system annotation. System messages are never
    /// reordered; they stay glued to the entry they annotate.
    pub fn system(conversation_id: impl Into<ConversationId>, content: impl Into<String>) -> Self {
        Self {
            ident: MessageIdent::Local(TempId::next()),
            conversation_id: conversation_id.into(),
            kind: MessageKind::System,
            content: content.into(),
            timestamp: Some(chrono::Utc::now()),
            is_code: false,
            attached_files: Vec::new(),
            task_suggestion: None,
            pending: false,
        }
    }

    pub fn with_attachments(mut self, files: Vec<AttachedFile>) -> Self {
        self.attached_files = files;
        self
    }

    pub fn with_code(mut self) -> Self {
        self.is_code = true;
        self
    }

    /// Dual-key display ordering: effective timestamp first, numeric id
    /// second. Unconfirmed messages substitute the creation millis embedded
    /// in their temp id, so optimistic entries interleave correctly with
    /// late-arriving remote ones before a real timestamp exists.
    pub fn order_key(&self) -> (i64, i64) {
        let secondary = self.ident.numeric().unwrap_or(i64::MAX);
        let primary = match (self.timestamp, &self.ident) {
            (Some(ts), _) => ts.timestamp_millis(),
            (None, MessageIdent::Local(temp)) => temp.as_millis(),
            (None, MessageIdent::Persisted(_)) => secondary,
        };
        (primary, secondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_human_message_is_optimistic() {
        let msg = Message::human("T1", "hello");
        assert!(msg.pending);
        assert!(msg.ident.is_local());
        assert!(msg.timestamp.is_none());
    }

    #[test]
    fn test_ident_numeric_persisted() {
        let ident = MessageIdent::Persisted("m-9".to_string());
        assert_eq!(ident.numeric(), Some(9));
    }

    #[test]
    fn test_order_key_prefers_confirmed_timestamp() {
        let mut msg = Message::ai("T1", MessageIdent::Persisted("10".into()), "hi");
        msg.timestamp = Some(chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let (primary, secondary) = msg.order_key();
        assert_eq!(primary, msg.timestamp.unwrap().timestamp_millis());
        assert_eq!(secondary, 10);
    }

    #[test]
    fn test_order_key_fallback_for_optimistic() {
        let msg = Message::human("T1", "hello");
        let (primary, _) = msg.order_key();
        if let MessageIdent::Local(temp) = msg.ident {
            assert_eq!(primary, temp.as_millis());
        } else {
            panic!("expected local ident");
        }
    }

    #[test]
    fn test_system_messages_carry_timestamp() {
        let msg = Message::system("T1", "Failed to load messages");
        assert_eq!(msg.kind, MessageKind::System);
        assert!(msg.timestamp.is_some());
    }
}
