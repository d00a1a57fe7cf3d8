//! Transcript view derivation.
//!
//! Pure functions from conversation state to render flags. Nothing here
//! mutates; the view is recomputed from the stores on every render.

use crate::session::{ConversationState, RunState};
use threadline_core::{Message, MessageIdent, MessageKind};

/// Non-blocking transient notification, surfaced as a toast rather than
/// an error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoAgentOutput,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::NoAgentOutput => write!(f, "No agent output to copy yet"),
        }
    }
}

/// Render flags for one transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub ident: MessageIdent,
    pub kind: MessageKind,
    /// This is the most recent human message; it owns the live execution
    /// panels.
    pub is_latest_human: bool,
    /// This is the agent reply to the most recent human message; it owns
    /// the live log/summary panels and the suggestion prompts.
    pub is_following_agent: bool,
    /// Execution data (live or fetched) exists for this message, so
    /// retry/copy/feedback action buttons render under it.
    pub has_execution_data: bool,
    /// Generated files exist for this message's run, so the
    /// open-in-editor affordance renders.
    pub has_generated_files: bool,
}

/// Derived view state for a whole conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptView {
    pub items: Vec<MessageView>,
    pub latest_human_index: Option<usize>,
    pub following_agent_index: Option<usize>,
    /// Suggestion prompts are offered only immediately after the latest
    /// agent reply to the latest human message, and only once the run has
    /// settled.
    pub show_suggestions: bool,
    pub run_state: RunState,
    /// Path of the file the generated-file panel should display.
    pub selected_file: Option<String>,
}

impl TranscriptView {
    /// Derive the view from the current state. Older human/agent pairs get
    /// no live affordances; they only expose their fetched historical logs.
    pub fn derive(state: &ConversationState) -> Self {
        let ordered = state.store.ordered();

        let latest_human_index = ordered
            .iter()
            .rposition(|m| m.kind == MessageKind::Human);
        let following_agent_index = latest_human_index.and_then(|human| {
            ordered[human + 1..]
                .iter()
                .position(|m| m.kind == MessageKind::Ai)
                .map(|offset| human + 1 + offset)
        });

        let items = ordered
            .iter()
            .enumerate()
            .map(|(index, message)| {
                let is_latest_human = Some(index) == latest_human_index;
                let is_following_agent = Some(index) == following_agent_index;
                MessageView {
                    ident: message.ident.clone(),
                    kind: message.kind,
                    is_latest_human,
                    is_following_agent,
                    has_execution_data: has_execution_data(state, message, is_following_agent),
                    has_generated_files: is_following_agent && !state.files.is_empty(),
                }
            })
            .collect();

        let show_suggestions = following_agent_index.is_some() && state.run == RunState::Idle;

        Self {
            items,
            latest_human_index,
            following_agent_index,
            show_suggestions,
            run_state: state.run,
            selected_file: state.files.selected().map(|f| f.path.clone()),
        }
    }
}

/// Whether any execution data exists for a message: live agent-output or
/// summary for the current pair, or a fetched historical snapshot for
/// anything older.
fn has_execution_data(state: &ConversationState, message: &Message, is_following_agent: bool) -> bool {
    if is_following_agent {
        let live = state.logs.live();
        if !live.agent_output.is_empty() || !live.summary.is_empty() {
            return true;
        }
    }
    if let MessageIdent::Persisted(id) = &message.ident {
        if let Some(snapshot) = state.logs.fetched(id) {
            return !snapshot.agent_output.is_empty() || !snapshot.summary.is_empty();
        }
    }
    false
}

/// Copy-agent-output affordance. An empty output is a transient notice,
/// not an error.
pub fn copy_agent_output(state: &ConversationState) -> Result<String, Notice> {
    let output = &state.logs.live().agent_output;
    if output.is_empty() {
        Err(Notice::NoAgentOutput)
    } else {
        Ok(output.join("\n"))
    }
}
