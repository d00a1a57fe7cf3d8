//! Execution log collections and kind partitioning.
//!
//! Three independent ordered lists per conversation, append-only for the
//! lifetime of one run. The same partitioning routine serves the live
//! stream and historical fetched logs, so rendering code is uniform
//! between the two paths.

use serde::{Deserialize, Serialize};

// ============================================================================
// LOG TYPES
// ============================================================================

/// Which of the three collections a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Execution,
    Summary,
    AgentOutput,
}

/// Coarse source tag on historical log entries fetched by message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    Agent,
    Sandbox,
    AgentOutput,
    Summary,
}

impl LogSource {
    /// Partition rule shared by live and historical paths: summaries and
    /// agent output go to their own collections, everything else is a raw
    /// execution line.
    pub fn kind(&self) -> LogKind {
        match self {
            LogSource::Summary => LogKind::Summary,
            LogSource::AgentOutput => LogKind::AgentOutput,
            LogSource::Agent | LogSource::Sandbox => LogKind::Execution,
        }
    }
}

/// One typed entry from the execution-log retrieval API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub source: LogSource,
    pub status: Option<String>,
    pub content: String,
}

/// The three per-conversation log lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LogCollections {
    pub execution: Vec<String>,
    pub summary: Vec<String>,
    pub agent_output: Vec<String>,
}

impl LogCollections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line to the kind-specific list. Never truncates.
    pub fn append(&mut self, kind: LogKind, line: impl Into<String>) {
        let line = line.into();
        match kind {
            LogKind::Execution => self.execution.push(line),
            LogKind::Summary => self.summary.push(line),
            LogKind::AgentOutput => self.agent_output.push(line),
        }
    }

    /// Clear all three lists. Only called on explicit re-execution.
    pub fn reset(&mut self) {
        self.execution.clear();
        self.summary.clear();
        self.agent_output.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.execution.is_empty() && self.summary.is_empty() && self.agent_output.is_empty()
    }
}

/// Partition historical fetched entries through the same rule the live
/// stream uses. The result is treated as read-only by callers.
pub fn partition_entries(entries: &[LogEntry]) -> LogCollections {
    let mut collections = LogCollections::new();
    for entry in entries {
        collections.append(entry.source.kind(), entry.content.clone());
    }
    collections
}
