//! Per-conversation registry of generated file artifacts.

use threadline_core::{FileArtifact, Timestamp};

/// Ordered, path-keyed registry with upsert semantics.
///
/// Paths are unique; re-receiving a path replaces content in place and
/// keeps the entry's position in the ordered list. The first-ever-inserted
/// path is the default selection until the user explicitly picks another.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    entries: Vec<FileArtifact>,
    selection: Option<String>,
    /// Bumped on every upsert so the renderer can tell that file-derived
    /// affordances became available without diffing the entries.
    generation: u64,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by path. Returns true when the path was new.
    pub fn upsert(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
        timestamp: Timestamp,
    ) -> bool {
        let path = path.into();
        let content = content.into();
        self.generation += 1;

        if let Some(existing) = self.entries.iter_mut().find(|f| f.path == path) {
            existing.content = content;
            existing.timestamp = timestamp;
            false
        } else {
            self.entries.push(FileArtifact {
                path,
                content,
                timestamp,
            });
            true
        }
    }

    /// The file to display: the explicit user selection when it still
    /// exists, else the first-ever-inserted entry.
    pub fn selected(&self) -> Option<&FileArtifact> {
        if let Some(path) = &self.selection {
            if let Some(found) = self.entries.iter().find(|f| &f.path == path) {
                return Some(found);
            }
        }
        self.entries.first()
    }

    /// Record an explicit user selection. Returns false for unknown paths.
    pub fn select(&mut self, path: &str) -> bool {
        if self.entries.iter().any(|f| f.path == path) {
            self.selection = Some(path.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Discard all cached files. Called when execution is re-triggered for
    /// the same human message.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.selection = None;
        self.generation += 1;
    }

    pub fn entries(&self) -> &[FileArtifact] {
        &self.entries
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
