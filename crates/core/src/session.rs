use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flows::states::ConversationState;

/// Identity of one conversation: a user talking to the bot in one chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub chat_id: i64,
    pub user_id: i64,
}

impl ConversationKey {
    pub fn new(chat_id: i64, user_id: i64) -> Self {
        Self { chat_id, user_id }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chat_id, self.user_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub key: ConversationKey,
    pub state: ConversationState,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: ConversationKey, state: ConversationState) -> Self {
        Self { id: Uuid::new_v4(), key, state, started_at: Utc::now() }
    }
}

/// In-memory arena of live sessions. Each record is owned by its conversation;
/// the lock only guards the map itself and is never held across an await.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<ConversationKey, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh session, dropping whatever the conversation had before.
    pub fn open(&self, key: ConversationKey, state: ConversationState) -> Session {
        let session = Session::new(key, state);
        self.lock().insert(key, session.clone());
        session
    }

    pub fn get(&self, key: &ConversationKey) -> Option<Session> {
        self.lock().get(key).cloned()
    }

    /// Moves the session `expected` to `state`. Returns `false` when the
    /// conversation has no live session or a newer one replaced it.
    pub fn advance(
        &self,
        key: &ConversationKey,
        expected: Uuid,
        state: ConversationState,
    ) -> bool {
        match self.lock().get_mut(key) {
            Some(session) if session.id == expected => {
                session.state = state;
                true
            }
            _ => false,
        }
    }

    pub fn close(&self, key: &ConversationKey) -> Option<Session> {
        self.lock().remove(key)
    }

    /// Removes the session only while it is still `expected`.
    pub fn finish(&self, key: &ConversationKey, expected: Uuid) -> bool {
        let mut sessions = self.lock();
        match sessions.get(key) {
            Some(session) if session.id == expected => sessions.remove(key).is_some(),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConversationKey, Session>> {
        match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
