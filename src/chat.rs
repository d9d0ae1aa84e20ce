pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    /// Inline notices (reinitialization failures and the like) share the
    /// transcript instead of interrupting with a dialog.
    Notice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryState {
    /// Placeholder shown while the reply is in flight.
    Pending,
    Resolved,
    Failed { hint: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub id: RequestId,
    pub role: ChatRole,
    pub text: String,
    pub state: DeliveryState,
}

/// The in-memory chat log. Each send gets a pending assistant placeholder
/// tagged with a request id; a reply or error can only land on the
/// placeholder carrying the same id, so out-of-order resolutions cannot
/// clobber a newer exchange.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
    next_id: RequestId,
}

impl Transcript {
    /// Record an outgoing message and its pending placeholder; returns the
    /// id the eventual resolution must present.
    pub fn begin(&mut self, message: &str) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(ChatEntry {
            id,
            role: ChatRole::User,
            text: message.to_string(),
            state: DeliveryState::Resolved,
        });
        self.entries.push(ChatEntry {
            id,
            role: ChatRole::Assistant,
            text: String::new(),
            state: DeliveryState::Pending,
        });
        id
    }

    pub fn resolve(&mut self, id: RequestId, reply: &str) -> bool {
        match self.pending_mut(id) {
            Some(entry) => {
                entry.text = reply.to_string();
                entry.state = DeliveryState::Resolved;
                true
            }
            None => false,
        }
    }

    pub fn fail(&mut self, id: RequestId, error: &str, hint: Option<String>) -> bool {
        match self.pending_mut(id) {
            Some(entry) => {
                entry.text = error.to_string();
                entry.state = DeliveryState::Failed { hint };
                true
            }
            None => false,
        }
    }

    pub fn push_notice(&mut self, text: &str) {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(ChatEntry {
            id,
            role: ChatRole::Notice,
            text: text.to_string(),
            state: DeliveryState::Resolved,
        });
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    fn pending_mut(&mut self, id: RequestId) -> Option<&mut ChatEntry> {
        self.entries
            .iter_mut()
            .find(|v| v.id == id && v.role == ChatRole::Assistant && v.state == DeliveryState::Pending)
    }
}
