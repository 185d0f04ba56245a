use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

/// Turns kept per session
pub const HISTORY_LIMIT: usize = 10;

/// What the conversation was last about; drives follow-ups and suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Greeting,
    Products,
    Orders,
    Shipping,
    Returns,
    Support,
    Thanks,
    Skincare,
    Payment,
    Promotions,
    About,
    Ingredients,
    Navigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub messages: Vec<ChatTurn>,
    pub last_topic: Option<Topic>,
    pub user_info: Option<UserInfo>,
}

impl Session {
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.messages.push(ChatTurn {
            speaker,
            text: text.into(),
            at: Utc::now(),
        });
        if self.messages.len() > HISTORY_LIMIT {
            let excess = self.messages.len() - HISTORY_LIMIT;
            self.messages.drain(..excess);
        }
    }

    /// Last `n` turns, oldest first
    pub fn recent(&self, n: usize) -> &[ChatTurn] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }
}

struct Entry {
    session: Session,
    touched: Instant,
}

/// Per-session chat context with idle expiry and a capacity bound.
/// Over capacity, expired sessions go first, then the least recently used.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<DashMap<String, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Stored session, or a fresh one when absent or expired
    pub fn load(&self, key: &str) -> Session {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if now.duration_since(entry.touched) < self.ttl => entry.session.clone(),
            _ => Session::default(),
        }
    }

    pub fn save(&self, key: &str, session: Session) {
        self.entries.insert(
            key.to_string(),
            Entry {
                session,
                touched: Instant::now(),
            },
        );
        if self.entries.len() > self.capacity {
            self.evict(key);
        }
    }

    fn evict(&self, keep: &str) {
        self.purge_expired();
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .filter(|e| e.key() != keep)
                .min_by_key(|e| e.value().touched)
                .map(|e| e.key().clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Drops idle sessions; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.touched) < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
