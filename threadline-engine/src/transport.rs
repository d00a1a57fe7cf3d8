//! Transport boundary traits.
//!
//! The backend owns these protocols; the engine only conforms to them.
//! Implementations live outside this workspace (HTTP/WS clients in the
//! host application, mocks in threadline-test-utils).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use threadline_core::{
    ConversationId, LogEntry, Message, PromptTemplate, TransportError, UploadResult,
};

/// Outbound trigger for an execution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub conversation_id: ConversationId,
    /// Bot handle that was mentioned, e.g. "codebot".
    pub agent: String,
    pub message: String,
    pub mentions: Vec<String>,
}

/// Message persistence API.
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// Fetch the ordered persisted transcript for a conversation.
    async fn fetch_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, TransportError>;

    /// Persist a new message; the canonical form (server id, timestamp)
    /// comes back.
    async fn create_message(&self, draft: &Message) -> Result<Message, TransportError>;
}

/// Historical execution-log retrieval API.
#[async_trait]
pub trait ExecutionLogApi: Send + Sync {
    async fn fetch_logs(&self, message_id: &str) -> Result<Vec<LogEntry>, TransportError>;
}

/// Prompt-template catalog API.
#[async_trait]
pub trait TemplateApi: Send + Sync {
    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, TransportError>;
    async fn create_template(
        &self,
        template: &PromptTemplate,
    ) -> Result<PromptTemplate, TransportError>;
    async fn update_template(
        &self,
        template: &PromptTemplate,
    ) -> Result<PromptTemplate, TransportError>;
}

/// Outbound side of the live channel.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    async fn execute(&self, request: &ExecuteRequest) -> Result<(), TransportError>;
}

/// Binary attachment upload.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<UploadResult, TransportError>;
}
