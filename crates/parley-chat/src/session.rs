//! Bounded dialogue history for one conversation.

use tracing::debug;
use uuid::Uuid;

use parley_core::types::Turn;

/// One conversation's history, bounded to the most recent
/// `window_limit` user/assistant pairs.
///
/// Turns are only ever appended as completed pairs, so the history length
/// stays even and the surviving window always starts with a user turn and
/// ends with an assistant turn. Eviction removes whole pairs, oldest first.
#[derive(Debug)]
pub struct DialogueSession {
    id: Uuid,
    history: Vec<Turn>,
    window_limit: usize,
}

impl DialogueSession {
    pub fn new(window_limit: usize) -> Self {
        let id = Uuid::new_v4();
        debug!(session_id = %id, window_limit, "Starting dialogue session");
        Self {
            id,
            history: Vec::new(),
            window_limit,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Record one completed exchange, evicting the oldest pairs while the
    /// history exceeds the window.
    pub fn append(&mut self, user_content: &str, assistant_content: &str) {
        self.history.push(Turn::user(user_content));
        self.history.push(Turn::assistant(assistant_content));
        while self.history.len() > 2 * self.window_limit {
            self.history.drain(..2);
        }
        debug_assert!(self.history.len() % 2 == 0, "history must hold whole pairs");
        debug_assert!(
            self.history.len() <= 2 * self.window_limit,
            "history must stay within the window"
        );
    }

    /// Clear the history. The session keeps its id.
    pub fn reset(&mut self) {
        debug!(session_id = %self.id, "Resetting dialogue history");
        self.history.clear();
    }

    /// The retained history, oldest turn first.
    pub fn snapshot(&self) -> &[Turn] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
