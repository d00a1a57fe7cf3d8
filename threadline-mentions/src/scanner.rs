//! Mention scanner implementation.
//!
//! Converts a plain-text message body into a sequence of typed spans:
//! plain text, bot mentions, user mentions, and graph-entity references.
//! Anything that does not resolve against the rosters stays plain text;
//! the scanner never fails.

use crate::token::{Bot, EntityCatalog, EntityRef, MentionSpan, Participant};
use std::iter::Peekable;
use std::str::CharIndices;

// ============================================================================
// SCANNER IMPLEMENTATION
// ============================================================================

/// Scanner over one message body.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pos: usize,
    /// Character immediately before `pos`, for word-boundary checks.
    prev: Option<char>,
    roster: &'a [Participant],
    catalog: &'a EntityCatalog,
    spans: Vec<MentionSpan>,
    text_buf: String,
}

/// Tokenize a message body against the given participant roster and
/// entity catalog.
pub fn tokenize(
    source: &str,
    roster: &[Participant],
    catalog: &EntityCatalog,
) -> Vec<MentionSpan> {
    Scanner::new(source, roster, catalog).scan()
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, roster: &'a [Participant], catalog: &'a EntityCatalog) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            prev: None,
            roster,
            catalog,
            spans: Vec::new(),
            text_buf: String::new(),
        }
    }

    /// Scan the entire source into spans. Adjacent plain text is merged.
    pub fn scan(mut self) -> Vec<MentionSpan> {
        while let Some(c) = self.peek_char() {
            let at_boundary = self.prev.map_or(true, |p| !p.is_alphanumeric());
            match c {
                '@' if at_boundary => self.scan_mention(),
                'N' | 'C' | 'T' if at_boundary => self.scan_entity(),
                _ => self.consume_text(),
            }
        }
        self.flush_text();
        self.spans
    }

    // ------------------------------------------------------------------
    // Mentions
    // ------------------------------------------------------------------

    /// Scan `@handle` and resolve it against bots, then the roster.
    fn scan_mention(&mut self) {
        let start = self.pos;
        self.advance(); // consume '@'
        let handle_start = self.pos;

        while let Some(c) = self.peek_char() {
            if is_handle_char(c) {
                self.advance();
            } else {
                break;
            }
        }

        let handle = &self.source[handle_start..self.pos];
        if handle.is_empty() {
            self.text_buf.push('@');
            return;
        }

        if let Some(bot) = Bot::from_handle(handle) {
            self.push_span(MentionSpan::Bot { bot });
            return;
        }

        let user = self
            .roster
            .iter()
            .find(|p| p.matches(handle))
            .map(|p| (p.id.clone(), p.name.clone()));
        if let Some((id, name)) = user {
            self.push_span(MentionSpan::User { id, name });
            return;
        }

        // No match: the literal stays plain text.
        self.text_buf.push_str(&self.source[start..self.pos]);
    }

    // ------------------------------------------------------------------
    // Entity references
    // ------------------------------------------------------------------

    /// Scan `Node:<label>`, `Connection:<relation> -> <label>` or
    /// `Template:<name>` starting at the current position.
    fn scan_entity(&mut self) {
        let rest = &self.source[self.pos..];
        if rest.starts_with("Node:") {
            self.scan_node();
        } else if rest.starts_with("Connection:") {
            self.scan_connection();
        } else if rest.starts_with("Template:") {
            self.scan_template();
        } else {
            self.consume_text();
        }
    }

    fn scan_node(&mut self) {
        let start = self.pos;
        self.advance_str("Node:");
        let label = self.scan_label();

        // Node pills are validated against the catalog; unknown labels
        // stay plain text.
        if !label.is_empty() && self.catalog.contains(&label) {
            self.push_span(MentionSpan::Entity {
                entity: EntityRef::Node { label },
            });
        } else {
            self.text_buf.push_str(&self.source[start..self.pos]);
        }
    }

    fn scan_connection(&mut self) {
        let start = self.pos;
        self.advance_str("Connection:");
        let relation = self.scan_label();

        if relation.is_empty() || !self.scan_arrow() {
            self.text_buf.push_str(&self.source[start..self.pos]);
            return;
        }

        let label = self.scan_label();
        if !label.is_empty() && self.catalog.contains(&label) {
            self.push_span(MentionSpan::Entity {
                entity: EntityRef::Connection { relation, label },
            });
        } else {
            self.text_buf.push_str(&self.source[start..self.pos]);
        }
    }

    fn scan_template(&mut self) {
        let start = self.pos;
        self.advance_str("Template:");
        let name = self.scan_label();

        // Template pills are NOT validated against any catalog. Asymmetric
        // with Node/Connection on purpose; preserved as product behavior.
        if !name.is_empty() {
            self.push_span(MentionSpan::Entity {
                entity: EntityRef::Template { name },
            });
        } else {
            self.text_buf.push_str(&self.source[start..self.pos]);
        }
    }

    /// Scan a label: alphanumerics, `_` and `-`.
    fn scan_label(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                self.advance();
            } else {
                break;
            }
        }
        self.source[start..self.pos].to_string()
    }

    /// Scan `->` with flexible surrounding spaces. On failure the caller
    /// re-emits everything consumed so far as plain text.
    fn scan_arrow(&mut self) -> bool {
        while self.peek_char() == Some(' ') {
            self.advance();
        }
        if !self.source[self.pos..].starts_with("->") {
            return false;
        }
        self.advance();
        self.advance();
        while self.peek_char() == Some(' ') {
            self.advance();
        }
        true
    }

    // ------------------------------------------------------------------
    // Low-level helpers
    // ------------------------------------------------------------------

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        let (i, c) = self.chars.next()?;
        self.pos = i + c.len_utf8();
        self.prev = Some(c);
        Some(c)
    }

    /// Advance past a literal prefix known to be present.
    fn advance_str(&mut self, literal: &str) {
        for _ in literal.chars() {
            self.advance();
        }
    }

    fn consume_text(&mut self) {
        if let Some(c) = self.advance() {
            self.text_buf.push(c);
        }
    }

    fn flush_text(&mut self) {
        if !self.text_buf.is_empty() {
            self.spans.push(MentionSpan::Text {
                text: std::mem::take(&mut self.text_buf),
            });
        }
    }

    fn push_span(&mut self, span: MentionSpan) {
        self.flush_text();
        self.spans.push(span);
    }
}

fn is_handle_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '@' | '+')
}
