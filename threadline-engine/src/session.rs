//! Per-conversation session state and the registry that owns it.
//!
//! Every piece of per-conversation state (transcript, file registry, log
//! collections, run state, last applied sequence) lives in one
//! `ConversationState`, keyed by conversation id in the `SessionManager`.
//! Independent views subscribe and unsubscribe explicitly; nothing is
//! ambient, so two mounted views can never leak state into each other.

use crate::files::FileRegistry;
use crate::logs::LogAggregator;
use crate::store::MessageStore;
use crate::transport::{
    ChannelSink, ExecuteRequest, ExecutionLogApi, FileStorage, MessageApi, TemplateApi,
};
use std::collections::{HashMap, HashSet};
use threadline_core::{
    AttachedFile, ConversationId, Message, PromptTemplate, TempId, TransportError,
};
use tracing::{debug, warn};

// ============================================================================
// RUN STATE MACHINE
// ============================================================================

/// Execution-run lifecycle for one conversation.
///
/// `Idle -> AwaitingExecution` on send with a bot mention,
/// `-> Streaming` on the first streamed activity,
/// `-> Idle` on a terminal status or disconnect. Re-triggering while
/// streaming passes through `AwaitingExecution` again after resetting
/// logs and cached files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    AwaitingExecution,
    Streaming,
}

impl RunState {
    /// Whether streamed content deltas should be applied to the transcript.
    pub fn is_active(&self) -> bool {
        !matches!(self, RunState::Idle)
    }

    /// First delta/log/file of a run moves awaiting to streaming.
    pub fn note_stream_activity(&mut self) {
        if *self == RunState::AwaitingExecution {
            *self = RunState::Streaming;
        }
    }

    pub fn complete(&mut self) {
        *self = RunState::Idle;
    }
}

// ============================================================================
// CONVERSATION STATE
// ============================================================================

/// Everything one conversation view owns.
#[derive(Debug, Clone)]
pub struct ConversationState {
    conversation_id: ConversationId,
    pub store: MessageStore,
    pub files: FileRegistry,
    pub logs: LogAggregator,
    pub run: RunState,
    /// Highest stream-event sequence applied so far. Events at or below it
    /// are stale and dropped, which makes reconnect replays harmless.
    pub last_seq: Option<u64>,
}

impl ConversationState {
    pub fn new(conversation_id: impl Into<ConversationId>) -> Self {
        let conversation_id = conversation_id.into();
        Self {
            store: MessageStore::new(conversation_id.clone()),
            files: FileRegistry::new(),
            logs: LogAggregator::new(),
            run: RunState::Idle,
            last_seq: None,
            conversation_id,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Explicit (re-)trigger of execution. Clears the previous run's logs
    /// and cached generated files before anything new is appended, then
    /// enters `AwaitingExecution`. This is the only path that resets logs.
    pub fn trigger_execution(&mut self) {
        self.logs.reset();
        self.files.clear();
        self.run = RunState::AwaitingExecution;
    }

    /// The live channel went away. The run stops; accumulated logs and
    /// files stay for display.
    pub fn disconnect(&mut self) {
        self.run = RunState::Idle;
    }
}

// ============================================================================
// SESSION MANAGER
// ============================================================================

/// Resource key for the duplicate-fetch guard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchKey {
    History(ConversationId),
    Logs(String),
    Templates,
}

/// Registry of conversation sessions plus the async orchestration around
/// the transport boundary. One manager per view tree; sessions for
/// conversations other than the active one are kept warm in the
/// background so their panels are populated on revisit.
#[derive(Default)]
pub struct SessionManager {
    sessions: HashMap<ConversationId, ConversationState>,
    active: Option<ConversationId>,
    in_flight: HashSet<FetchKey>,
    templates: Vec<PromptTemplate>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or re-open) a conversation view. Creates the session when it
    /// does not exist yet and marks it active.
    pub fn subscribe(&mut self, conversation_id: &str) -> &mut ConversationState {
        self.active = Some(conversation_id.to_string());
        self.sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| ConversationState::new(conversation_id))
    }

    /// Close a conversation view. The session itself is retained so its
    /// logs and files are warm when the user comes back; only the run is
    /// stopped and the active marker cleared.
    pub fn unsubscribe(&mut self, conversation_id: &str) {
        if self.active.as_deref() == Some(conversation_id) {
            self.active = None;
        }
        if let Some(state) = self.sessions.get_mut(conversation_id) {
            state.disconnect();
        }
    }

    pub fn active(&self) -> Option<&ConversationState> {
        self.sessions.get(self.active.as_deref()?)
    }

    pub fn session(&self, conversation_id: &str) -> Option<&ConversationState> {
        self.sessions.get(conversation_id)
    }

    pub fn session_mut(&mut self, conversation_id: &str) -> Option<&mut ConversationState> {
        self.sessions.get_mut(conversation_id)
    }

    /// Route one inbound event to the session it belongs to, creating a
    /// background session when needed. Events never touch any other
    /// conversation's transcript.
    pub fn handle_event(&mut self, event: threadline_core::StreamEvent) -> crate::receiver::Routed {
        let state = self
            .sessions
            .entry(event.conversation_id.clone())
            .or_insert_with(|| ConversationState::new(event.conversation_id.clone()));
        crate::receiver::route_event(state, event)
    }

    /// Decode and route a raw channel frame. Malformed frames are dropped
    /// silently; the transport is expected to produce transient garbage.
    pub fn handle_frame(&mut self, frame: &serde_json::Value) -> crate::receiver::Routed {
        match threadline_core::decode_event(frame) {
            Some(event) => self.handle_event(event),
            None => {
                debug!("dropping malformed stream frame");
                crate::receiver::Routed::Dropped(threadline_core::EventError::Malformed {
                    reason: "missing required fields".to_string(),
                })
            }
        }
    }

    pub fn templates(&self) -> &[PromptTemplate] {
        &self.templates
    }

    // ------------------------------------------------------------------
    // Async orchestration. Every failure is terminal here: the catch path
    // produces a visible substitute state, never a propagated error.
    // ------------------------------------------------------------------

    /// Fetch the persisted history for a conversation. Returns false when
    /// a fetch for the same conversation is already in flight (re-opening
    /// a conversation must not issue a second request).
    pub async fn load_history<A: MessageApi>(&mut self, api: &A, conversation_id: &str) -> bool {
        let key = FetchKey::History(conversation_id.to_string());
        if !self.in_flight.insert(key.clone()) {
            debug!(conversation = conversation_id, "history fetch already in flight");
            return false;
        }

        let result = api.fetch_messages(conversation_id).await;
        self.in_flight.remove(&key);

        let state = self.subscribe(conversation_id);
        match result {
            Ok(messages) => state.store.load_history(messages),
            Err(err) => {
                warn!(conversation = conversation_id, error = %err, "history fetch failed");
                state
                    .store
                    .push_system("Failed to load messages for this conversation.");
            }
        }
        true
    }

    /// Optimistically append a human message and reconcile with the
    /// backend. On failure the optimistic entry stays, annotated with a
    /// system follow-up.
    pub async fn send_message<A: MessageApi>(&mut self, api: &A, draft: Message) -> TempId {
        let conversation_id = draft.conversation_id.clone();
        let temp_id = self
            .subscribe(&conversation_id)
            .store
            .append_optimistic(draft.clone());

        match api.create_message(&draft).await {
            Ok(server_message) => {
                let state = self.subscribe(&conversation_id);
                state.store.confirm(temp_id, server_message);
            }
            Err(err) => {
                warn!(conversation = %conversation_id, error = %err, "message create failed");
                let state = self.subscribe(&conversation_id);
                state.store.confirm_failed(temp_id, &err.to_string());
            }
        }
        temp_id
    }

    /// Trigger an execution run on the live channel. Resets the previous
    /// run's logs and files first; this explicit path is the only one
    /// that resets.
    pub async fn trigger_execution<S: ChannelSink>(&mut self, sink: &S, request: ExecuteRequest) {
        let state = self.subscribe(&request.conversation_id);
        state.trigger_execution();

        if let Err(err) = sink.execute(&request).await {
            warn!(conversation = %request.conversation_id, error = %err, "execute failed");
            let state = self.subscribe(&request.conversation_id);
            state.run.complete();
            state
                .store
                .push_system("Failed to start execution. Mention the bot again to retry.");
        }
    }

    /// Fetch historical execution logs for a message, once. Duplicate
    /// concurrent fetches and refetches of an already-cached snapshot are
    /// both suppressed.
    pub async fn fetch_execution_logs<A: ExecutionLogApi>(
        &mut self,
        api: &A,
        conversation_id: &str,
        message_id: &str,
    ) -> bool {
        if self
            .session(conversation_id)
            .is_some_and(|s| s.logs.has_fetched(message_id))
        {
            return false;
        }
        let key = FetchKey::Logs(message_id.to_string());
        if !self.in_flight.insert(key.clone()) {
            debug!(message = message_id, "log fetch already in flight");
            return false;
        }

        let result = api.fetch_logs(message_id).await;
        self.in_flight.remove(&key);

        let state = self.subscribe(conversation_id);
        match result {
            Ok(entries) => state.logs.record_fetched(message_id, &entries),
            Err(err) => {
                warn!(message = message_id, error = %err, "log fetch failed");
                state
                    .store
                    .push_system("Failed to load execution logs for this message.");
            }
        }
        true
    }

    /// Populate the template picker.
    pub async fn load_templates<A: TemplateApi>(&mut self, api: &A) -> bool {
        if !self.in_flight.insert(FetchKey::Templates) {
            return false;
        }
        let result = api.list_templates().await;
        self.in_flight.remove(&FetchKey::Templates);

        match result {
            Ok(templates) => self.templates = templates,
            Err(err) => {
                // The picker just stays empty; there is no transcript to
                // annotate for a catalog failure.
                warn!(error = %err, "template list failed");
            }
        }
        true
    }

    /// Upload a binary attachment and produce the descriptor to hang off a
    /// draft message. Unlike the other transport calls this one propagates
    /// its error: the composer decides whether to retry or drop the file.
    pub async fn upload_attachment<S: FileStorage>(
        &self,
        storage: &S,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<AttachedFile, TransportError> {
        let result = storage.upload(name, bytes).await?;
        Ok(AttachedFile::new(
            name,
            bytes.len() as u64,
            mime_type,
            result.url,
        ))
    }
}
