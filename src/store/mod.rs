//! Persistence of goals, moods and coaching sessions, always scoped by user id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoachResult;
use crate::model::{Goal, GoalFilter, GoalUpdate, Mood, MoodKind, Progress};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// How many mood entries `/progress` shows.
pub const RECENT_MOODS: i64 = 5;

/// Every call commits immediately. Updates and deletes on an id that is
/// absent or owned by another user fail with `CoachError::NotFound`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_goal(&self, user: &str, description: &str) -> CoachResult<i64>;

    async fn update_goal(&self, user: &str, goal_id: i64, update: GoalUpdate) -> CoachResult<()>;

    async fn delete_goal(&self, user: &str, goal_id: i64) -> CoachResult<()>;

    /// Ordered by creation time, oldest first.
    async fn list_goals(&self, user: &str, filter: GoalFilter) -> CoachResult<Vec<Goal>>;

    async fn create_mood(&self, user: &str, kind: MoodKind, note: &str) -> CoachResult<i64>;

    async fn update_mood(&self, user: &str, mood_id: i64, kind: MoodKind, note: &str)
        -> CoachResult<()>;

    async fn delete_mood(&self, user: &str, mood_id: i64) -> CoachResult<()>;

    /// Ordered by creation time, oldest first.
    async fn list_moods(&self, user: &str) -> CoachResult<Vec<Mood>>;

    /// Most recent first.
    async fn recent_moods(&self, user: &str, limit: i64) -> CoachResult<Vec<Mood>>;

    async fn record_coaching(&self, user: &str, prompt: &str, response: &str) -> CoachResult<()>;

    async fn last_coaching_at(&self, user: &str) -> CoachResult<Option<DateTime<Utc>>>;

    async fn progress(&self, user: &str) -> CoachResult<Progress> {
        let goals = self.list_goals(user, GoalFilter::All).await?;
        let moods = self.recent_moods(user, RECENT_MOODS).await?;
        Ok(Progress::new(goals, moods))
    }
}
