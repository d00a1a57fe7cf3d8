//! Streamed execution events.
//!
//! One inbound `execution_result` frame from the live channel becomes one
//! `StreamEvent`. The payload enum is the routing key: every event is
//! dispatched to exactly one downstream handler. Decoding is deliberately
//! tolerant - the transport is unreliable and malformed frames are dropped,
//! never fatal.

use crate::{ConversationId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// EVENT TYPES
// ============================================================================

/// Terminal-ish run states carried on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    InProgress,
    Completed,
    Error,
}

/// Typed payload of a stream event. Determines which store the event
/// mutates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamPayload {
    /// Full accumulated agent text so far. Replaces the in-progress message
    /// content; it is NOT an incremental fragment.
    ContentDelta { text: String },
    /// Generated file artifact; upserts by path.
    File { path: String, content: String },
    /// Raw execution log line.
    Log { line: String },
    /// Summary log line.
    Summary { line: String },
    /// Agent-output log line.
    AgentOutput { line: String },
    /// Run status transition with no side-channel content.
    Status { status: ExecutionStatus },
}

/// A single event on the live channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StreamEvent {
    pub conversation_id: ConversationId,
    /// Per-conversation monotonic sequence number. An event is applied only
    /// if its sequence exceeds the last applied one, which makes reconnect
    /// replays and reordered delivery safe to drop.
    pub seq: u64,
    pub payload: StreamPayload,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub timestamp: Option<Timestamp>,
}

// ============================================================================
// WIRE DECODING
// ============================================================================

fn str_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| value.get(*k).and_then(Value::as_str))
}

/// Decode an inbound `execution_result` frame.
///
/// Returns `None` for frames missing required fields (conversation id,
/// sequence number, a recognizable status). Callers drop those silently;
/// the transport is expected to produce transient garbage.
pub fn decode_event(value: &Value) -> Option<StreamEvent> {
    let conversation_id = str_field(value, &["conversationId", "conversation_id"])?.to_string();
    let seq = value.get("seq").and_then(Value::as_u64)?;
    let status = str_field(value, &["status"])?;
    let message = value.get("message");

    let payload = match status {
        "in_progress" => match message.and_then(Value::as_str) {
            Some(text) => StreamPayload::ContentDelta {
                text: text.to_string(),
            },
            // A message-less in_progress frame is a bare run heartbeat.
            None => StreamPayload::Status {
                status: ExecutionStatus::InProgress,
            },
        },
        "file" => {
            let file = message?;
            StreamPayload::File {
                path: file.get("path").and_then(Value::as_str)?.to_string(),
                content: file.get("content").and_then(Value::as_str)?.to_string(),
            }
        }
        "log" => StreamPayload::Log {
            line: message.and_then(Value::as_str)?.to_string(),
        },
        "summary" => StreamPayload::Summary {
            // Some emitters put the text in `summary` instead of `message`.
            line: message
                .and_then(Value::as_str)
                .or_else(|| str_field(value, &["summary"]))?
                .to_string(),
        },
        "agent_output" => StreamPayload::AgentOutput {
            line: message.and_then(Value::as_str)?.to_string(),
        },
        "completed" => StreamPayload::Status {
            status: ExecutionStatus::Completed,
        },
        "error" => StreamPayload::Status {
            status: ExecutionStatus::Error,
        },
        _ => return None,
    };

    let timestamp = str_field(value, &["timestamp"])
        .and_then(|ts| ts.parse::<Timestamp>().ok());

    Some(StreamEvent {
        conversation_id,
        seq,
        payload,
        timestamp,
    })
}
