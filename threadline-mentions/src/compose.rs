//! Compose-time buffer: one logical string, two presentations.
//!
//! The plain string is the single source of truth. The rich span view is
//! rebuilt deterministically from it on every change, so the two
//! representations cannot drift apart - there is no second mutable store.

use crate::scanner::tokenize;
use crate::token::{Bot, EntityCatalog, MentionSpan, Participant, ALL_BOTS};

// ============================================================================
// COMPLETIONS
// ============================================================================

/// A candidate offered while the user is typing after `@`.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Bot(Bot),
    User(Participant),
}

impl Completion {
    /// Label shown in the picker.
    pub fn label(&self) -> String {
        match self {
            Completion::Bot(bot) => bot.handle().to_string(),
            Completion::User(p) => p.name.clone(),
        }
    }

    /// Text inserted into the canonical string when selected.
    pub fn insert_text(&self) -> String {
        match self {
            Completion::Bot(bot) => bot.to_string(),
            Completion::User(p) => format!("@{}", p.name),
        }
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        match self {
            Completion::Bot(bot) => bot.handle().contains(&query),
            Completion::User(p) => {
                p.name.to_lowercase().contains(&query)
                    || p.email.to_lowercase().contains(&query)
                    || p.id.to_lowercase().contains(&query)
            }
        }
    }
}

/// The partial mention under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionQuery {
    /// Byte offset of the `@` in the canonical string.
    pub start: usize,
    /// Text typed after the `@`.
    pub query: String,
}

// ============================================================================
// COMPOSE BUFFER
// ============================================================================

/// Compose buffer holding the canonical plain string plus its derived
/// span view.
#[derive(Debug, Clone)]
pub struct ComposeBuffer {
    text: String,
    spans: Vec<MentionSpan>,
    roster: Vec<Participant>,
    catalog: EntityCatalog,
}

impl ComposeBuffer {
    pub fn new(roster: Vec<Participant>, catalog: EntityCatalog) -> Self {
        Self {
            text: String::new(),
            spans: Vec::new(),
            roster,
            catalog,
        }
    }

    /// Canonical plain-text value.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Rich span view, always derived from `text`.
    pub fn spans(&self) -> &[MentionSpan] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Direct user edit: the edited rich view yields the next plain string,
    /// and the span view is rebuilt from it.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.resync();
    }

    /// Programmatic write (suggestion insert, draft restore) that bypasses
    /// keystrokes. Same reconciliation path as user edits.
    pub fn insert_suggestion(&mut self, suggestion: &str) {
        if !self.text.is_empty() && !self.text.ends_with(' ') {
            self.text.push(' ');
        }
        self.text.push_str(suggestion);
        self.resync();
    }

    /// An empty buffer must fully clear the rich view - no leftover empty
    /// nodes.
    pub fn clear(&mut self) {
        self.text.clear();
        self.spans.clear();
    }

    /// Rebuild the span view from the canonical string.
    pub fn resync(&mut self) {
        if self.text.is_empty() {
            self.spans.clear();
        } else {
            self.spans = tokenize(&self.text, &self.roster, &self.catalog);
        }
    }

    /// Clamp a caller-supplied byte offset to the nearest char boundary at
    /// or before it. Host editors report raw offsets; a stale one must not
    /// split a multibyte character.
    fn clamp_cursor(&self, cursor: usize) -> usize {
        let mut cursor = cursor.min(self.text.len());
        while !self.text.is_char_boundary(cursor) {
            cursor -= 1;
        }
        cursor
    }

    /// Find the partial mention ending at `cursor` (a byte offset into the
    /// canonical string): the nearest `@` with no whitespace in between,
    /// sitting at a word boundary.
    pub fn mention_query(&self, cursor: usize) -> Option<MentionQuery> {
        let head = &self.text[..self.clamp_cursor(cursor)];
        let start = head.rfind('@')?;
        let query = &head[start + 1..];
        if query.chars().any(char::is_whitespace) {
            return None;
        }
        let boundary = head[..start]
            .chars()
            .next_back()
            .map_or(true, |p| !p.is_alphanumeric());
        if !boundary {
            return None;
        }
        Some(MentionQuery {
            start,
            query: query.to_string(),
        })
    }

    /// Candidate completions for a query: bots first, then roster users,
    /// filtered case-insensitively by substring.
    pub fn completions(&self, query: &str) -> Vec<Completion> {
        let mut out: Vec<Completion> = ALL_BOTS.iter().copied().map(Completion::Bot).collect();
        out.extend(self.roster.iter().cloned().map(Completion::User));
        out.retain(|c| c.matches(query));
        out
    }

    /// Replace the active partial mention at `cursor` with the selected
    /// candidate as one atomic token. Both representations update in the
    /// same step: the canonical string is edited, the span view is rebuilt
    /// from it. Returns the new cursor position.
    pub fn insert_completion(&mut self, cursor: usize, completion: &Completion) -> usize {
        let cursor = self.clamp_cursor(cursor);
        let Some(active) = self.mention_query(cursor) else {
            return cursor;
        };
        let mut inserted = completion.insert_text();
        inserted.push(' ');
        self.text.replace_range(active.start..cursor, &inserted);
        self.resync();
        active.start + inserted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::detokenize;

    fn buffer() -> ComposeBuffer {
        ComposeBuffer::new(
            vec![
                Participant {
                    id: "u-1".to_string(),
                    name: "alice".to_string(),
                    email: "alice@example.com".to_string(),
                },
                Participant {
                    id: "u-2".to_string(),
                    name: "bob".to_string(),
                    email: "bob@example.com".to_string(),
                },
            ],
            EntityCatalog::new(["Login"]),
        )
    }

    #[test]
    fn test_set_text_rebuilds_spans() {
        let mut buf = buffer();
        buf.set_text("hi @codebot");
        assert_eq!(buf.spans().len(), 2);
        assert_eq!(detokenize(buf.spans()), "hi @codebot");
    }

    #[test]
    fn test_clear_leaves_no_spans() {
        let mut buf = buffer();
        buf.set_text("hi @codebot");
        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.spans().is_empty());
    }

    #[test]
    fn test_mention_query_active() {
        let mut buf = buffer();
        buf.set_text("hey @ali");
        let q = buf.mention_query(8).unwrap();
        assert_eq!(q.start, 4);
        assert_eq!(q.query, "ali");
    }

    #[test]
    fn test_mention_query_none_after_whitespace() {
        let mut buf = buffer();
        buf.set_text("hey @alice done ");
        assert!(buf.mention_query(16).is_none());
    }

    #[test]
    fn test_completions_case_insensitive_substring() {
        let buf = buffer();
        let all = buf.completions("");
        assert_eq!(all.len(), 5); // 3 bots + 2 users

        let bots = buf.completions("BOT");
        assert!(bots.iter().all(|c| matches!(c, Completion::Bot(_))));
        assert_eq!(bots.len(), 3);

        let alice = buf.completions("ALI");
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].label(), "alice");
    }

    #[test]
    fn test_insert_completion_replaces_partial() {
        let mut buf = buffer();
        buf.set_text("hey @ali");
        let candidates = buf.completions("ali");
        let cursor = buf.insert_completion(8, &candidates[0]);
        assert_eq!(buf.text(), "hey @alice ");
        assert_eq!(cursor, buf.text().len());
        // The rich view holds the atomic token.
        assert!(buf
            .spans()
            .iter()
            .any(|s| matches!(s, MentionSpan::User { name, .. } if name == "alice")));
    }

    #[test]
    fn test_insert_suggestion_resyncs() {
        let mut buf = buffer();
        buf.set_text("look at");
        buf.insert_suggestion("Node:Login");
        assert_eq!(buf.text(), "look at Node:Login");
        assert!(buf
            .spans()
            .iter()
            .any(|s| matches!(s, MentionSpan::Entity { .. })));
    }

    #[test]
    fn test_mention_query_clamps_mid_char_cursor() {
        let mut buf = buffer();
        buf.set_text("é @ali");
        // Byte 1 is inside the two-byte 'é'; the clamp walks back to 0.
        assert!(buf.mention_query(1).is_none());
        assert_eq!(buf.mention_query(7).unwrap().query, "ali");
    }

    #[test]
    fn test_insert_completion_mid_char_cursor_is_safe() {
        let mut buf = buffer();
        buf.set_text("é @ali");
        let candidates = buf.completions("ali");
        let cursor = buf.insert_completion(1, &candidates[0]);
        assert_eq!(cursor, 0);
        assert_eq!(buf.text(), "é @ali");

        // A valid cursor past the multibyte char still completes normally.
        let cursor = buf.insert_completion(buf.text().len(), &candidates[0]);
        assert_eq!(buf.text(), "é @alice ");
        assert_eq!(cursor, buf.text().len());
    }

    #[test]
    fn test_insert_completion_without_active_query_is_noop() {
        let mut buf = buffer();
        buf.set_text("plain words");
        let candidates = buf.completions("");
        let cursor = buf.insert_completion(5, &candidates[0]);
        assert_eq!(cursor, 5);
        assert_eq!(buf.text(), "plain words");
    }
}
