//! Concurrent session store keyed by user id.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::turn::{Role, Session, Turn};

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    /// Idle time after which a session is expired.
    pub max_age: Duration,
    /// Turns kept per session; older ones are evicted.
    pub max_turns: usize,
    /// Turns rendered by `format_context`.
    pub context_turns: usize,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::minutes(30),
            max_turns: 20,
            context_turns: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub active_sessions: usize,
    pub total_sessions: usize,
    pub total_messages: usize,
    pub average_messages_per_session: usize,
}

/// Conversation memory as seen by the chat pipeline.
///
/// None of these operations fail: a missing or expired session reads as an
/// empty one.
pub trait ConversationStore: Send + Sync {
    fn append(&self, user_id: &str, role: Role, content: &str);
    fn history(&self, user_id: &str) -> Vec<Turn>;
    fn clear(&self, user_id: &str) -> bool;
    fn stats(&self) -> SessionStats;
    /// Drop expired sessions, returning how many were removed.
    fn sweep(&self) -> usize;
    fn format_context(&self, user_id: &str) -> String;
}

pub struct SessionStore {
    sessions: DashMap<String, Session>,
    config: SessionStoreConfig,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: SessionStoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &SessionStoreConfig {
        &self.config
    }

    /// Sessions currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionStoreConfig::default())
    }
}

impl ConversationStore for SessionStore {
    fn append(&self, user_id: &str, role: Role, content: &str) {
        let now = self.clock.now();
        let mut entry = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Session::new(user_id, now));

        // an expired session is replaced rather than revived
        if entry.is_expired(now, self.config.max_age) {
            *entry = Session::new(user_id, now);
        }
        entry.push(Turn::new(role, content, now), self.config.max_turns);
    }

    fn history(&self, user_id: &str) -> Vec<Turn> {
        let now = self.clock.now();
        let max_age = self.config.max_age;
        if let Some(session) = self.sessions.get(user_id) {
            if !session.is_expired(now, max_age) {
                return session.turns.iter().cloned().collect();
            }
        } else {
            return Vec::new();
        }
        if self
            .sessions
            .remove_if(user_id, |_, s| s.is_expired(now, max_age))
            .is_some()
        {
            debug!(user_id, "expired session removed on read");
        }
        Vec::new()
    }

    fn clear(&self, user_id: &str) -> bool {
        self.sessions.remove(user_id).is_some()
    }

    fn stats(&self) -> SessionStats {
        let now = self.clock.now();
        let mut stats = SessionStats {
            total_sessions: self.sessions.len(),
            ..Default::default()
        };
        for session in self.sessions.iter() {
            if !session.is_expired(now, self.config.max_age) {
                stats.active_sessions += 1;
                stats.total_messages += session.message_count();
            }
        }
        if stats.active_sessions > 0 {
            stats.average_messages_per_session =
                (stats.total_messages as f64 / stats.active_sessions as f64).round() as usize;
        }
        stats
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let max_age = self.config.max_age;
        // iter() read-locks one shard at a time; removal re-checks under the key's write lock
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|s| s.is_expired(now, max_age))
            .map(|s| s.key().clone())
            .collect();

        let removed = expired
            .iter()
            .filter(|key| {
                self.sessions
                    .remove_if(key.as_str(), |_, s| s.is_expired(now, max_age))
                    .is_some()
            })
            .count();
        if removed > 0 {
            debug!(removed, remaining = self.sessions.len(), "swept expired sessions");
        }
        removed
    }

    fn format_context(&self, user_id: &str) -> String {
        let turns = self.history(user_id);
        let skip = turns.len().saturating_sub(self.config.context_turns);
        turns[skip..]
            .iter()
            .map(|t| format!("{}: {}", t.role.label(), t.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
