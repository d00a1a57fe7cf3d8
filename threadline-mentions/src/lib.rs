//! Threadline Mentions - Mention/Entity Tokenizer
//!
//! Parses free-text message bodies into typed spans (plain text, bot
//! mentions, user mentions, graph-entity references) for rendering, and
//! provides the compose-time buffer that keeps the rich editable view and
//! the canonical plain string synchronized.
//!
//! # Validity rules
//!
//! - `@handle` resolves against the fixed bot set first, then the
//!   participant roster (name, email, or id, case-insensitive).
//! - `Node:<label>` and `Connection:<relation> -> <label>` render as pills
//!   only when the label exists in the entity catalog.
//! - `Template:<name>` always renders as a pill, catalog or not.
//!
//! Anything unresolved stays plain text; tokenizing never fails.

mod compose;
mod scanner;
mod token;

pub use compose::{Completion, ComposeBuffer, MentionQuery};
pub use scanner::{tokenize, Scanner};
pub use token::{
    detokenize, Bot, EntityCatalog, EntityRef, MentionSpan, Participant, ALL_BOTS,
};
