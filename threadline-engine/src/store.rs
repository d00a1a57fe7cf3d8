//! Ordered message transcript with optimistic/confirmed reconciliation.
//!
//! Messages are kept in insertion order; display order is derived on
//! demand by the dual-key sort (effective timestamp, then numeric id).
//! System messages are excluded from the sort and stay glued to the entry
//! they annotate.

use threadline_core::{ConversationId, Message, MessageIdent, MessageKind, TempId};

/// Outcome of applying a content delta to the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// The existing in-progress agent message was updated.
    Applied,
    /// No in-progress message existed yet; one was created.
    Created,
    /// No human message to attach a reply to; delta dropped.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct MessageStore {
    conversation_id: ConversationId,
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new(conversation_id: impl Into<ConversationId>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Replace the transcript with the fetched history.
    pub fn load_history(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Insert a client-authored message immediately, before the backend has
    /// seen it. Returns the temp id used for later reconciliation.
    pub fn append_optimistic(&mut self, mut draft: Message) -> TempId {
        let temp_id = match draft.ident {
            MessageIdent::Local(temp) => temp,
            MessageIdent::Persisted(_) => {
                let temp = TempId::next();
                draft.ident = MessageIdent::Local(temp);
                temp
            }
        };
        draft.pending = true;
        draft.timestamp = None;
        self.messages.push(draft);
        temp_id
    }

    /// Replace the temporary message with the server-confirmed version,
    /// in place. The temp id ceases to exist. Returns false when no
    /// message carries the temp id.
    pub fn confirm(&mut self, temp_id: TempId, mut server_message: Message) -> bool {
        let Some(slot) = self
            .messages
            .iter_mut()
            .find(|m| m.ident == MessageIdent::Local(temp_id))
        else {
            return false;
        };
        server_message.pending = false;
        *slot = server_message;
        true
    }

    /// Confirmation failed: the optimistic message stays visible (the
    /// user's composed intent is preserved) and a synthetic system
    /// follow-up is inserted right after it.
    pub fn confirm_failed(&mut self, temp_id: TempId, reason: &str) -> bool {
        let Some(index) = self
            .messages
            .iter()
            .position(|m| m.ident == MessageIdent::Local(temp_id))
        else {
            return false;
        };
        self.messages[index].pending = false;
        let note = Message::system(
            self.conversation_id.clone(),
            format!("Message could not be sent: {reason}"),
        );
        self.messages.insert(index + 1, note);
        true
    }

    /// Insert a confirmed message that originated from another participant
    /// via the real-time channel. A message whose id already exists updates
    /// the existing entry instead of duplicating it (our own sends echo
    /// back on the channel). A persisted agent reply whose streamed copy
    /// came in under a local id adopts that entry instead of duplicating
    /// it.
    pub fn receive_remote(&mut self, message: Message) {
        if let Some(existing) = self
            .messages
            .iter_mut()
            .find(|m| m.ident == message.ident)
        {
            *existing = message;
            return;
        }
        if message.kind == MessageKind::Ai {
            if let Some(ident @ MessageIdent::Local(_)) = self.in_progress_ident() {
                if let Some(slot) = self.messages.iter_mut().find(|m| m.ident == ident) {
                    *slot = message;
                    return;
                }
            }
        }
        self.messages.push(message);
    }

    /// Append a synthetic system message at the end of the transcript.
    pub fn push_system(&mut self, content: impl Into<String>) {
        let note = Message::system(self.conversation_id.clone(), content.into());
        self.messages.push(note);
    }

    /// Replace the in-progress agent message's content with the full
    /// accumulated text of a streamed delta.
    ///
    /// The in-progress message is the most recently appended Ai message
    /// following the most recent Human message in display order; when it
    /// does not exist yet, it is created. Replacement, never append: the
    /// delta already carries everything streamed so far.
    pub fn apply_delta(&mut self, full_text: &str) -> DeltaOutcome {
        match self.in_progress_ident() {
            Some(ident) => {
                if let Some(msg) = self.messages.iter_mut().find(|m| m.ident == ident) {
                    msg.content = full_text.to_string();
                    return DeltaOutcome::Applied;
                }
                DeltaOutcome::Ignored
            }
            None => {
                if !self
                    .messages
                    .iter()
                    .any(|m| m.kind == MessageKind::Human)
                {
                    return DeltaOutcome::Ignored;
                }
                let reply = Message::ai(
                    self.conversation_id.clone(),
                    MessageIdent::Local(TempId::next()),
                    full_text,
                );
                self.messages.push(reply);
                DeltaOutcome::Created
            }
        }
    }

    /// Identity of the message currently receiving streamed content, if
    /// one exists: the last Ai message after the last Human message.
    pub fn in_progress_ident(&self) -> Option<MessageIdent> {
        let ordered = self.ordered();
        let latest_human = ordered
            .iter()
            .rposition(|m| m.kind == MessageKind::Human)?;
        ordered[latest_human + 1..]
            .iter()
            .filter(|m| m.kind == MessageKind::Ai)
            .next_back()
            .map(|m| m.ident.clone())
    }

    /// Messages in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Display order.
    ///
    /// Non-system messages sort by the dual key (effective timestamp,
    /// numeric id); the sort is stable, so equal keys keep insertion
    /// order. System messages do not participate: each one reattaches
    /// immediately after the non-system message that preceded it at
    /// insertion time (or at the front when none did).
    pub fn ordered(&self) -> Vec<&Message> {
        let mut sorted: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| m.kind != MessageKind::System)
            .collect();
        sorted.sort_by_key(|m| m.order_key());

        // Anchor each system message to its predecessor.
        let mut front: Vec<&Message> = Vec::new();
        let mut anchored: Vec<(MessageIdent, &Message)> = Vec::new();
        let mut last_anchor: Option<MessageIdent> = None;
        for msg in &self.messages {
            if msg.kind == MessageKind::System {
                match &last_anchor {
                    Some(anchor) => anchored.push((anchor.clone(), msg)),
                    None => front.push(msg),
                }
            } else {
                last_anchor = Some(msg.ident.clone());
            }
        }

        let mut out = front;
        for msg in sorted {
            let ident = msg.ident.clone();
            out.push(msg);
            for (anchor, note) in &anchored {
                if *anchor == ident {
                    out.push(note);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use threadline_core::Timestamp;

    fn confirmed(id: &str, kind: MessageKind, ts: Timestamp) -> Message {
        let mut msg = Message::ai("T1", MessageIdent::Persisted(id.to_string()), "x");
        msg.kind = kind;
        msg.timestamp = Some(ts);
        msg
    }

    fn at(seconds: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, seconds).unwrap()
    }

    #[test]
    fn test_optimistic_then_confirm_replaces_in_place() {
        let mut store = MessageStore::new("T1");
        let temp_id = store.append_optimistic(Message::human("T1", "hello"));
        assert_eq!(store.len(), 1);
        assert!(store.messages()[0].pending);

        let mut server = confirmed("m-9", MessageKind::Human, at(0));
        server.content = "hello".to_string();
        assert!(store.confirm(temp_id, server));

        assert_eq!(store.len(), 1);
        let msg = &store.messages()[0];
        assert_eq!(msg.ident, MessageIdent::Persisted("m-9".to_string()));
        assert!(!msg.pending);
        assert!(!store
            .messages()
            .iter()
            .any(|m| m.ident == MessageIdent::Local(temp_id)));
    }

    #[test]
    fn test_confirm_unknown_temp_id_is_noop() {
        let mut store = MessageStore::new("T1");
        assert!(!store.confirm(TempId(42), confirmed("m-1", MessageKind::Human, at(0))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_confirm_failed_keeps_message_and_adds_system_note() {
        let mut store = MessageStore::new("T1");
        let temp_id = store.append_optimistic(Message::human("T1", "hello"));
        assert!(store.confirm_failed(temp_id, "network down"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.messages()[0].content, "hello");
        assert_eq!(store.messages()[1].kind, MessageKind::System);

        // The note stays glued to its message in display order.
        let ordered = store.ordered();
        assert_eq!(ordered[0].content, "hello");
        assert_eq!(ordered[1].kind, MessageKind::System);
    }

    #[test]
    fn test_receive_remote_dedupes_by_ident() {
        let mut store = MessageStore::new("T1");
        store.receive_remote(confirmed("m-1", MessageKind::Human, at(0)));
        let mut updated = confirmed("m-1", MessageKind::Human, at(0));
        updated.content = "edited".to_string();
        store.receive_remote(updated);
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].content, "edited");
    }

    #[test]
    fn test_receive_remote_reconciles_streamed_reply() {
        let mut store = MessageStore::new("T1");
        store.receive_remote(confirmed("m-1", MessageKind::Human, at(0)));
        assert_eq!(store.apply_delta("partial answer"), DeltaOutcome::Created);

        // The persisted copy of the same reply arrives over the channel.
        let mut persisted = confirmed("m-2", MessageKind::Ai, at(1));
        persisted.content = "full answer".to_string();
        store.receive_remote(persisted);

        assert_eq!(store.len(), 2);
        assert!(!store.messages().iter().any(|m| m.ident.is_local()));
        assert_eq!(store.messages()[1].content, "full answer");
        assert_eq!(
            store.in_progress_ident(),
            Some(MessageIdent::Persisted("m-2".to_string()))
        );
    }

    #[test]
    fn test_receive_remote_from_other_author_does_not_steal_streamed_reply() {
        let mut store = MessageStore::new("T1");
        store.receive_remote(confirmed("m-1", MessageKind::Human, at(0)));
        store.apply_delta("partial answer");

        // A human message from another participant appends normally and
        // leaves the in-progress reply alone.
        let mut other = confirmed("m-3", MessageKind::Human, at(2));
        other.content = "also here".to_string();
        store.receive_remote(other);

        assert_eq!(store.len(), 3);
        assert!(store.messages().iter().any(|m| m.ident.is_local()));
    }

    #[test]
    fn test_system_note_follows_message_across_confirm() {
        let mut store = MessageStore::new("T1");
        let temp_id = store.append_optimistic(Message::human("T1", "hello"));
        store.confirm_failed(temp_id, "network down");

        // A later retry succeeds and swaps the ident out from under the
        // note's predecessor.
        let mut server = confirmed("m-9", MessageKind::Human, at(0));
        server.content = "hello".to_string();
        assert!(store.confirm(temp_id, server));

        let ordered = store.ordered();
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].ident, MessageIdent::Persisted("m-9".to_string()));
        assert_eq!(ordered[1].kind, MessageKind::System);
    }

    #[test]
    fn test_ordered_sorts_by_timestamp_then_numeric_id() {
        let mut store = MessageStore::new("T1");
        store.receive_remote(confirmed("m-2", MessageKind::Human, at(5)));
        store.receive_remote(confirmed("m-1", MessageKind::Human, at(2)));
        // Same timestamp as m-2: numeric id breaks the tie.
        store.receive_remote(confirmed("m-10", MessageKind::Ai, at(5)));

        let ids: Vec<String> = store.ordered().iter().map(|m| m.ident.to_string()).collect();
        assert_eq!(ids, vec!["m-1", "m-2", "m-10"]);
    }

    #[test]
    fn test_optimistic_interleaves_with_late_remote() {
        let mut store = MessageStore::new("T1");
        // Remote message with a confirmed timestamp far in the past.
        store.receive_remote(confirmed("m-1", MessageKind::Human, at(0)));
        // Optimistic message: no timestamp yet, falls back to the creation
        // millis in its temp id, which is "now" - well after 2024-01-01.
        store.append_optimistic(Message::human("T1", "mine"));
        // A remote message with a timestamp even later than "now" sorts last.
        let future = Utc::now() + chrono::Duration::hours(1);
        store.receive_remote(confirmed("m-3", MessageKind::Human, future));

        let contents: Vec<&str> = store.ordered().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents[0], "x"); // m-1
        assert_eq!(contents[1], "mine");
        assert_eq!(contents[2], "x"); // m-3
    }

    #[test]
    fn test_apply_delta_replaces_not_appends() {
        let mut store = MessageStore::new("T1");
        store.receive_remote(confirmed("m-1", MessageKind::Human, at(0)));

        assert_eq!(store.apply_delta("first chunk"), DeltaOutcome::Created);
        assert_eq!(store.apply_delta("first chunk, then more"), DeltaOutcome::Applied);

        let ai: Vec<&Message> = store
            .messages()
            .iter()
            .filter(|m| m.kind == MessageKind::Ai)
            .collect();
        assert_eq!(ai.len(), 1);
        assert_eq!(ai[0].content, "first chunk, then more");
    }

    #[test]
    fn test_apply_delta_without_human_is_ignored() {
        let mut store = MessageStore::new("T1");
        assert_eq!(store.apply_delta("orphan"), DeltaOutcome::Ignored);
        assert!(store.is_empty());
    }

    #[test]
    fn test_in_progress_is_last_ai_after_last_human() {
        let mut store = MessageStore::new("T1");
        store.receive_remote(confirmed("m-1", MessageKind::Human, at(0)));
        store.receive_remote(confirmed("m-2", MessageKind::Ai, at(1)));
        store.receive_remote(confirmed("m-3", MessageKind::Human, at(2)));
        store.receive_remote(confirmed("m-4", MessageKind::Ai, at(3)));

        assert_eq!(
            store.in_progress_ident(),
            Some(MessageIdent::Persisted("m-4".to_string()))
        );

        // A delta lands on m-4, never on the older reply m-2.
        store.apply_delta("updated");
        assert_eq!(store.messages()[3].content, "updated");
        assert_eq!(store.messages()[1].content, "x");
    }
}
