//! Streamed event routing.
//!
//! One event, one handler: content deltas go to the message store, file
//! events to the file registry, log-ish events to the log aggregator,
//! status events to the run state machine. Rejected events are dropped
//! with a debug log; nothing here is ever fatal.

use crate::session::ConversationState;
use crate::store::DeltaOutcome;
use chrono::Utc;
use threadline_core::{EventError, ExecutionStatus, LogKind, StreamEvent, StreamPayload};
use tracing::debug;

/// Result of routing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Applied,
    Dropped(EventError),
}

impl Routed {
    pub fn is_applied(&self) -> bool {
        matches!(self, Routed::Applied)
    }
}

/// Apply a stream event to its conversation's state.
///
/// The sequence gate runs first: an event at or below the last applied
/// sequence is stale (reordered delivery or reconnect replay) and must not
/// overwrite newer content.
pub fn route_event(state: &mut ConversationState, event: StreamEvent) -> Routed {
    debug_assert_eq!(event.conversation_id, state.conversation_id());

    if let Some(last) = state.last_seq {
        if event.seq <= last {
            debug!(
                conversation = state.conversation_id(),
                seq = event.seq,
                last_applied = last,
                "dropping stale stream event"
            );
            return Routed::Dropped(EventError::StaleSequence {
                conversation_id: event.conversation_id,
                seq: event.seq,
                last_applied: last,
            });
        }
    }
    state.last_seq = Some(event.seq);

    match event.payload {
        StreamPayload::ContentDelta { text } => {
            if !state.run.is_active() {
                debug!(
                    conversation = state.conversation_id(),
                    "content delta outside an active run ignored"
                );
                return Routed::Dropped(EventError::InactiveRun {
                    conversation_id: event.conversation_id,
                });
            }
            match state.store.apply_delta(&text) {
                DeltaOutcome::Applied | DeltaOutcome::Created => {
                    state.run.note_stream_activity();
                    Routed::Applied
                }
                DeltaOutcome::Ignored => Routed::Dropped(EventError::InactiveRun {
                    conversation_id: event.conversation_id,
                }),
            }
        }
        StreamPayload::File { path, content } => {
            let timestamp = event.timestamp.unwrap_or_else(Utc::now);
            state.files.upsert(path, content, timestamp);
            state.run.note_stream_activity();
            Routed::Applied
        }
        StreamPayload::Log { line } => {
            state.logs.append(LogKind::Execution, line);
            state.run.note_stream_activity();
            Routed::Applied
        }
        StreamPayload::Summary { line } => {
            state.logs.append(LogKind::Summary, line);
            state.run.note_stream_activity();
            Routed::Applied
        }
        StreamPayload::AgentOutput { line } => {
            state.logs.append(LogKind::AgentOutput, line);
            state.run.note_stream_activity();
            Routed::Applied
        }
        StreamPayload::Status { status } => {
            match status {
                ExecutionStatus::InProgress => state.run.note_stream_activity(),
                ExecutionStatus::Completed | ExecutionStatus::Error => state.run.complete(),
            }
            Routed::Applied
        }
    }
}
