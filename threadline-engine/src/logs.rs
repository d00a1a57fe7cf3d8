//! Per-conversation log aggregation.
//!
//! The live run feeds one `LogCollections`; historical messages opened
//! after the fact get a read-only, partitioned snapshot keyed by message
//! id. Both go through the same partition rule in `threadline-core`.

use std::collections::HashMap;
use threadline_core::{partition_entries, LogCollections, LogEntry, LogKind};

#[derive(Debug, Clone, Default)]
pub struct LogAggregator {
    live: LogCollections,
    fetched: HashMap<String, LogCollections>,
}

impl LogAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a streamed line to the live run.
    pub fn append(&mut self, kind: LogKind, line: impl Into<String>) {
        self.live.append(kind, line);
    }

    /// Clear the live run. Only the explicit re-execution path calls this;
    /// passive reconnects keep whatever was accumulated.
    pub fn reset(&mut self) {
        self.live.reset();
    }

    pub fn live(&self) -> &LogCollections {
        &self.live
    }

    /// Store the partitioned snapshot of historically fetched entries for
    /// a message. The snapshot is never appended to afterwards.
    pub fn record_fetched(&mut self, message_id: impl Into<String>, entries: &[LogEntry]) {
        self.fetched
            .insert(message_id.into(), partition_entries(entries));
    }

    pub fn fetched(&self, message_id: &str) -> Option<&LogCollections> {
        self.fetched.get(message_id)
    }

    pub fn has_fetched(&self, message_id: &str) -> bool {
        self.fetched.contains_key(message_id)
    }
}
