//! Threadline Engine - Conversation Aggregation
//!
//! Merges a persisted message transcript with a live streamed event feed
//! into one ordered, de-duplicated conversation model:
//!
//! - `receiver`: routes each stream event to exactly one store, behind a
//!   per-conversation sequence gate.
//! - `files`: path-keyed registry of generated file artifacts.
//! - `logs`: the three append-only log collections plus read-only
//!   historical snapshots.
//! - `store`: the transcript, with optimistic/confirmed reconciliation
//!   and the dual-key display ordering.
//! - `session`: per-conversation state keyed by conversation id, the run
//!   state machine, and the async orchestration over the transport
//!   boundary.
//! - `view`: pure derivation of render flags from the stores.
//!
//! The engine is single-threaded and event-loop driven; no locking, just
//! "apply events in arrival order, drop stale ones".

mod files;
mod logs;
pub mod receiver;
mod session;
mod store;
mod transport;
mod view;

pub use files::FileRegistry;
pub use logs::LogAggregator;
pub use receiver::{route_event, Routed};
pub use session::{ConversationState, FetchKey, RunState, SessionManager};
pub use store::{DeltaOutcome, MessageStore};
pub use transport::{
    ChannelSink, ExecuteRequest, ExecutionLogApi, FileStorage, MessageApi, TemplateApi,
};
pub use view::{copy_agent_output, MessageView, Notice, TranscriptView};

// Re-export core types for convenience
pub use threadline_core::{
    decode_event, ConversationId, EventError, ExecutionStatus, FileArtifact, LogCollections,
    LogEntry, LogKind, LogSource, Message, MessageIdent, MessageKind, StreamEvent, StreamPayload,
    TempId, ThreadlineError, ThreadlineResult, Timestamp, TransportError,
};
