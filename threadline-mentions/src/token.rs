//! Mention span types and rosters.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ============================================================================
// BOT ROSTER
// ============================================================================

/// The fixed set of bot identifiers that can be mentioned to trigger an
/// execution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bot {
    /// Executes coding tasks in a sandbox.
    CodeBot,
    /// Reviews diffs and generated files.
    ReviewBot,
    /// Breaks work into task suggestions.
    PlanBot,
}

/// All mentionable bots, in picker order.
pub static ALL_BOTS: Lazy<Vec<Bot>> =
    Lazy::new(|| vec![Bot::CodeBot, Bot::ReviewBot, Bot::PlanBot]);

impl Bot {
    /// Handle as typed after `@`, lowercase.
    pub fn handle(&self) -> &'static str {
        match self {
            Bot::CodeBot => "codebot",
            Bot::ReviewBot => "reviewbot",
            Bot::PlanBot => "planbot",
        }
    }

    /// Case-insensitive lookup by handle.
    pub fn from_handle(handle: &str) -> Option<Self> {
        ALL_BOTS
            .iter()
            .copied()
            .find(|b| b.handle().eq_ignore_ascii_case(handle))
    }
}

impl fmt::Display for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.handle())
    }
}

// ============================================================================
// PARTICIPANTS AND ENTITY CATALOG
// ============================================================================

/// A chat participant that can be `@`-mentioned by name, email, or id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl Participant {
    /// Returns the canonical mention text when `handle` matches this
    /// participant's name, email, or id (case-insensitive).
    pub fn matches(&self, handle: &str) -> bool {
        self.name.eq_ignore_ascii_case(handle)
            || self.email.eq_ignore_ascii_case(handle)
            || self.id.eq_ignore_ascii_case(handle)
    }
}

/// Known-valid graph entity labels. `Node:`/`Connection:` references render
/// as pills only when their label is present here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityCatalog {
    labels: HashSet<String>,
}

impl EntityCatalog {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

// ============================================================================
// SPANS
// ============================================================================

/// A typed reference to a domain-graph entity inside message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityRef {
    Node { label: String },
    Connection { relation: String, label: String },
    Template { name: String },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Node { label } => write!(f, "Node:{label}"),
            EntityRef::Connection { relation, label } => {
                write!(f, "Connection:{relation} -> {label}")
            }
            EntityRef::Template { name } => write!(f, "Template:{name}"),
        }
    }
}

/// One rendered span of a message body. A message is a sequence of these;
/// adjacent plain text is always merged into a single `Text` span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MentionSpan {
    Text { text: String },
    Bot { bot: Bot },
    User { id: String, name: String },
    Entity { entity: EntityRef },
}

impl MentionSpan {
    /// Plain-text representation this span detokenizes to.
    pub fn as_plain(&self) -> String {
        match self {
            MentionSpan::Text { text } => text.clone(),
            MentionSpan::Bot { bot } => bot.to_string(),
            MentionSpan::User { name, .. } => format!("@{name}"),
            MentionSpan::Entity { entity } => entity.to_string(),
        }
    }
}

/// Rebuild the canonical plain string from a span sequence.
pub fn detokenize(spans: &[MentionSpan]) -> String {
    spans.iter().map(MentionSpan::as_plain).collect()
}
