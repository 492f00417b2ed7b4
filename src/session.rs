use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// What a targeted goal command does once it has an id (and a value, if it needs one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalAction {
    Edit,
    Delete,
    Complete,
    Prioritize,
    Deadline,
    Category,
}

impl GoalAction {
    pub fn needs_value(&self) -> bool {
        !matches!(self, GoalAction::Delete | GoalAction::Complete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodAction {
    Edit,
    Delete,
}

/// The free-text input a user still owes us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    NewGoal,
    GoalId(GoalAction),
    GoalValue(GoalAction, i64),
    NewMood,
    MoodId(MoodAction),
    MoodValue(i64),
}

/// Per-user pending input. Entries older than the ttl are treated as absent.
#[derive(Clone)]
pub struct Sessions {
    ttl: Duration,
    pending: Arc<RwLock<HashMap<String, (Pending, Instant)>>>,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Sessions {
        Sessions {
            ttl,
            pending: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn begin(&self, user: &str, pending: Pending) {
        log::debug!("user {} now awaiting {:?}", user, pending);
        let mut state = self.pending.write().await;
        // users who never come back would otherwise keep their entry forever
        state.retain(|_, (_, since)| since.elapsed() < self.ttl);
        state.insert(user.to_string(), (pending, Instant::now()));
    }

    /// Removes and returns the pending input, so it is consumed at most once.
    pub async fn take(&self, user: &str) -> Option<Pending> {
        let mut state = self.pending.write().await;
        match state.remove(user) {
            Some((pending, since)) if since.elapsed() < self.ttl => Some(pending),
            Some((pending, _)) => {
                log::debug!("pending {:?} for user {} expired", pending, user);
                None
            }
            None => None,
        }
    }

    pub async fn clear(&self, user: &str) {
        let mut state = self.pending.write().await;
        state.remove(user);
    }
}
