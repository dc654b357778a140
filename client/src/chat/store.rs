use swipe_common::Message;

/// Messages of the open conversation, in load/arrival order.
///
/// The store is a history prefix followed by live messages. Replacing the
/// history only swaps the prefix, so a message pushed live before history
/// arrived is never removed by it. No deduplication by id.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    history_len: usize,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_history(&mut self, history: Vec<Message>) {
        let live = self.messages.split_off(self.history_len);
        self.history_len = history.len();
        self.messages = history;
        self.messages.extend(live);
    }

    pub fn push_live(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.history_len = 0;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
