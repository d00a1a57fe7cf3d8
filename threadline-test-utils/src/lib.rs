//! Threadline Test Utilities
//!
//! Centralized test infrastructure for the Threadline workspace:
//! - Proptest generators for messages, events, and log entries
//! - Mock transports for the engine's boundary traits
//! - Fixtures for common conversation shapes

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use threadline_core::{
    LogEntry, LogSource, Message, MessageIdent, MessageKind, PromptTemplate, StreamEvent,
    StreamPayload, Timestamp, TransportError, UploadResult,
};
use threadline_engine::{
    ChannelSink, ConversationState, ExecuteRequest, ExecutionLogApi, FileStorage, MessageApi,
    TemplateApi,
};

// ============================================================================
// FIXTURES
// ============================================================================

/// Deterministic timestamp for fixtures: 2024-01-01 plus `seconds`.
pub fn ts(seconds: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(seconds as i64)
}

/// A confirmed message with a numeric server id.
pub fn confirmed_message(
    conversation_id: &str,
    id: u64,
    kind: MessageKind,
    content: &str,
    seconds: u32,
) -> Message {
    let mut msg = Message::ai(
        conversation_id,
        MessageIdent::Persisted(id.to_string()),
        content,
    );
    msg.kind = kind;
    msg.timestamp = Some(ts(seconds));
    msg.pending = false;
    msg
}

/// A conversation with `pairs` alternating human/agent exchanges.
pub fn conversation_with_pairs(conversation_id: &str, pairs: u32) -> ConversationState {
    let mut state = ConversationState::new(conversation_id);
    for pair in 0..pairs {
        let base = pair * 2;
        state.store.receive_remote(confirmed_message(
            conversation_id,
            (base + 1) as u64,
            MessageKind::Human,
            &format!("question {pair}"),
            base,
        ));
        state.store.receive_remote(confirmed_message(
            conversation_id,
            (base + 2) as u64,
            MessageKind::Ai,
            &format!("answer {pair}"),
            base + 1,
        ));
    }
    state
}

/// A stream event addressed to `conversation_id`.
pub fn stream_event(conversation_id: &str, seq: u64, payload: StreamPayload) -> StreamEvent {
    StreamEvent {
        conversation_id: conversation_id.to_string(),
        seq,
        payload,
        timestamp: None,
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub fn arb_message_kind() -> impl Strategy<Value = MessageKind> {
    prop_oneof![Just(MessageKind::Human), Just(MessageKind::Ai)]
}

/// Confirmed messages with ids and timestamps drawn independently, so the
/// generated transcripts exercise the dual-key ordering.
pub fn arb_confirmed_message(conversation_id: &'static str) -> impl Strategy<Value = Message> {
    (1u64..10_000, arb_message_kind(), 0u32..3600, "[a-z ]{0,20}").prop_map(
        move |(id, kind, seconds, content)| {
            confirmed_message(conversation_id, id, kind, &content, seconds)
        },
    )
}

pub fn arb_log_source() -> impl Strategy<Value = LogSource> {
    prop_oneof![
        Just(LogSource::Agent),
        Just(LogSource::Sandbox),
        Just(LogSource::AgentOutput),
        Just(LogSource::Summary),
    ]
}

pub fn arb_log_entry() -> impl Strategy<Value = LogEntry> {
    (arb_log_source(), "[a-z0-9 ]{1,30}").prop_map(|(source, content)| LogEntry {
        source,
        status: None,
        content,
    })
}

pub fn arb_stream_payload() -> impl Strategy<Value = StreamPayload> {
    prop_oneof![
        "[a-z ]{1,40}".prop_map(|text| StreamPayload::ContentDelta { text }),
        ("[a-z]{1,8}\\.rs", "[a-z ]{1,20}")
            .prop_map(|(path, content)| StreamPayload::File { path, content }),
        "[a-z ]{1,20}".prop_map(|line| StreamPayload::Log { line }),
        "[a-z ]{1,20}".prop_map(|line| StreamPayload::Summary { line }),
        "[a-z ]{1,20}".prop_map(|line| StreamPayload::AgentOutput { line }),
    ]
}

// ============================================================================
// MOCK TRANSPORTS
// ============================================================================

/// Mock persistence API. Confirms creates with sequential "m-N" ids, or
/// fails everything when `failing` is set.
pub struct MockMessageApi {
    history: Vec<Message>,
    failing: bool,
    next_id: AtomicU64,
    pub fetch_calls: AtomicU64,
}

impl MockMessageApi {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            failing: false,
            next_id: AtomicU64::new(1),
            fetch_calls: AtomicU64::new(0),
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }
}

impl Default for MockMessageApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageApi for MockMessageApi {
    async fn fetch_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if self.failing {
            return Err(TransportError::FetchMessagesFailed {
                conversation_id: conversation_id.to_string(),
                reason: "mock failure".to_string(),
            });
        }
        Ok(self.history.clone())
    }

    async fn create_message(&self, draft: &Message) -> Result<Message, TransportError> {
        if self.failing {
            return Err(TransportError::CreateMessageFailed {
                reason: "mock failure".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut confirmed = draft.clone();
        confirmed.ident = MessageIdent::Persisted(format!("m-{id}"));
        confirmed.timestamp = Some(Utc::now());
        confirmed.pending = false;
        Ok(confirmed)
    }
}

/// Mock log retrieval keyed by message id.
#[derive(Default)]
pub struct MockExecutionLogApi {
    entries: HashMap<String, Vec<LogEntry>>,
    failing: bool,
}

impl MockExecutionLogApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logs(mut self, message_id: &str, entries: Vec<LogEntry>) -> Self {
        self.entries.insert(message_id.to_string(), entries);
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ExecutionLogApi for MockExecutionLogApi {
    async fn fetch_logs(&self, message_id: &str) -> Result<Vec<LogEntry>, TransportError> {
        if self.failing {
            return Err(TransportError::FetchLogsFailed {
                message_id: message_id.to_string(),
                reason: "mock failure".to_string(),
            });
        }
        Ok(self.entries.get(message_id).cloned().unwrap_or_default())
    }
}

/// Mock channel sink recording every execute request.
#[derive(Default)]
pub struct MockChannelSink {
    pub sent: Mutex<Vec<ExecuteRequest>>,
    failing: bool,
}

impl MockChannelSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChannelSink for MockChannelSink {
    async fn execute(&self, request: &ExecuteRequest) -> Result<(), TransportError> {
        if self.failing {
            return Err(TransportError::CreateMessageFailed {
                reason: "channel down".to_string(),
            });
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }
        Ok(())
    }
}

/// Mock file storage deriving urls from the uploaded name.
#[derive(Default)]
pub struct MockFileStorage {
    failing: bool,
}

impl MockFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { failing: true }
    }
}

#[async_trait]
impl FileStorage for MockFileStorage {
    async fn upload(&self, name: &str, _bytes: &[u8]) -> Result<UploadResult, TransportError> {
        if self.failing {
            return Err(TransportError::UploadFailed {
                name: name.to_string(),
                reason: "storage unavailable".to_string(),
            });
        }
        Ok(UploadResult {
            storage_key: format!("uploads/{name}"),
            url: format!("https://storage.test/uploads/{name}"),
        })
    }
}

/// Mock template catalog.
#[derive(Default)]
pub struct MockTemplateApi {
    templates: Mutex<Vec<PromptTemplate>>,
}

impl MockTemplateApi {
    pub fn new(templates: Vec<PromptTemplate>) -> Self {
        Self {
            templates: Mutex::new(templates),
        }
    }
}

#[async_trait]
impl TemplateApi for MockTemplateApi {
    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, TransportError> {
        Ok(self.templates.lock().map(|t| t.clone()).unwrap_or_default())
    }

    async fn create_template(
        &self,
        template: &PromptTemplate,
    ) -> Result<PromptTemplate, TransportError> {
        if let Ok(mut templates) = self.templates.lock() {
            templates.push(template.clone());
        }
        Ok(template.clone())
    }

    async fn update_template(
        &self,
        template: &PromptTemplate,
    ) -> Result<PromptTemplate, TransportError> {
        if let Ok(mut templates) = self.templates.lock() {
            if let Some(slot) = templates.iter_mut().find(|t| t.id == template.id) {
                *slot = template.clone();
            }
        }
        Ok(template.clone())
    }
}
