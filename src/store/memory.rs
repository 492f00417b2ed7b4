use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{CoachError, CoachResult, Entity};
use crate::model::{Goal, GoalFilter, GoalUpdate, Mood, MoodKind};
use crate::store::Store;

#[derive(Default)]
struct State {
    next_id: i64,
    goals: Vec<(String, Goal)>,
    moods: Vec<(String, Mood)>,
    coaching: Vec<(String, DateTime<Utc>)>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn matches(filter: GoalFilter, goal: &Goal) -> bool {
    filter
        .completed()
        .map_or(true, |completed| goal.completed == completed)
}

/// Process-local store with the same ownership rules as `PgStore`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Pretends a coaching session happened at `at`.
    pub async fn backdate_coaching(&self, user: &str, at: DateTime<Utc>) {
        let mut state = self.state.write().await;
        state.coaching.push((user.to_string(), at));
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_goal(&self, user: &str, description: &str) -> CoachResult<i64> {
        let mut state = self.state.write().await;
        let id = state.next_id();
        let goal = Goal {
            id,
            description: description.to_string(),
            priority: None,
            deadline: None,
            category: None,
            completed: false,
            created_at: Utc::now(),
        };
        state.goals.push((user.to_string(), goal));
        Ok(id)
    }

    async fn update_goal(&self, user: &str, goal_id: i64, update: GoalUpdate) -> CoachResult<()> {
        let mut state = self.state.write().await;
        let (_, goal) = state
            .goals
            .iter_mut()
            .find(|(owner, g)| g.id == goal_id && owner == user)
            .ok_or(CoachError::NotFound { entity: Entity::Goal, id: goal_id })?;

        match update {
            GoalUpdate::Description(text) => goal.description = text,
            GoalUpdate::Priority(priority) => goal.priority = Some(priority),
            GoalUpdate::Deadline(date) => goal.deadline = Some(date),
            GoalUpdate::Category(category) => goal.category = Some(category),
            GoalUpdate::Complete => goal.completed = true,
        }
        Ok(())
    }

    async fn delete_goal(&self, user: &str, goal_id: i64) -> CoachResult<()> {
        let mut state = self.state.write().await;
        let before = state.goals.len();
        state.goals.retain(|(owner, g)| !(g.id == goal_id && owner == user));
        match state.goals.len() == before {
            true => Err(CoachError::NotFound { entity: Entity::Goal, id: goal_id }),
            false => Ok(()),
        }
    }

    async fn list_goals(&self, user: &str, filter: GoalFilter) -> CoachResult<Vec<Goal>> {
        let state = self.state.read().await;
        Ok(state
            .goals
            .iter()
            .filter(|(owner, g)| owner == user && matches(filter, g))
            .map(|(_, g)| g.clone())
            .collect())
    }

    async fn create_mood(&self, user: &str, kind: MoodKind, note: &str) -> CoachResult<i64> {
        let mut state = self.state.write().await;
        let id = state.next_id();
        let mood = Mood {
            id,
            kind,
            note: note.to_string(),
            created_at: Utc::now(),
        };
        state.moods.push((user.to_string(), mood));
        Ok(id)
    }

    async fn update_mood(
        &self,
        user: &str,
        mood_id: i64,
        kind: MoodKind,
        note: &str,
    ) -> CoachResult<()> {
        let mut state = self.state.write().await;
        let (_, mood) = state
            .moods
            .iter_mut()
            .find(|(owner, m)| m.id == mood_id && owner == user)
            .ok_or(CoachError::NotFound { entity: Entity::Mood, id: mood_id })?;
        mood.kind = kind;
        mood.note = note.to_string();
        Ok(())
    }

    async fn delete_mood(&self, user: &str, mood_id: i64) -> CoachResult<()> {
        let mut state = self.state.write().await;
        let before = state.moods.len();
        state.moods.retain(|(owner, m)| !(m.id == mood_id && owner == user));
        match state.moods.len() == before {
            true => Err(CoachError::NotFound { entity: Entity::Mood, id: mood_id }),
            false => Ok(()),
        }
    }

    async fn list_moods(&self, user: &str) -> CoachResult<Vec<Mood>> {
        let state = self.state.read().await;
        Ok(state
            .moods
            .iter()
            .filter(|(owner, _)| owner == user)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn recent_moods(&self, user: &str, limit: i64) -> CoachResult<Vec<Mood>> {
        let mut moods = self.list_moods(user).await?;
        moods.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        moods.truncate(limit.max(0) as usize);
        Ok(moods)
    }

    async fn record_coaching(&self, user: &str, _prompt: &str, _response: &str) -> CoachResult<()> {
        let mut state = self.state.write().await;
        state.coaching.push((user.to_string(), Utc::now()));
        Ok(())
    }

    async fn last_coaching_at(&self, user: &str) -> CoachResult<Option<DateTime<Utc>>> {
        let state = self.state.read().await;
        Ok(state
            .coaching
            .iter()
            .filter(|(u, _)| u == user)
            .map(|(_, at)| *at)
            .max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    #[tokio::test]
    async fn created_goal_is_open_and_unprioritized() {
        let store = MemoryStore::new();
        let id = store.create_goal("alice", "Run a marathon").await.unwrap();

        let goals = store.list_goals("alice", GoalFilter::All).await.unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].id, id);
        assert_eq!(goals[0].description, "Run a marathon");
        assert!(!goals[0].completed);
        assert_eq!(goals[0].priority, None);
        assert_eq!(goals[0].deadline, None);
    }

    #[tokio::test]
    async fn other_users_cannot_touch_goals() {
        let store = MemoryStore::new();
        let id = store.create_goal("alice", "Read more").await.unwrap();

        assert!(matches!(
            store.delete_goal("bob", id).await,
            Err(CoachError::NotFound { entity: Entity::Goal, .. })
        ));
        assert!(matches!(
            store.update_goal("bob", id, GoalUpdate::Priority(Priority::High)).await,
            Err(CoachError::NotFound { .. })
        ));
        assert!(store.list_goals("bob", GoalFilter::All).await.unwrap().is_empty());
        assert_eq!(store.list_goals("alice", GoalFilter::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn filters_and_progress_counts() {
        let store = MemoryStore::new();
        let first = store.create_goal("alice", "a").await.unwrap();
        store.create_goal("alice", "b").await.unwrap();
        store.create_goal("alice", "c").await.unwrap();
        store.update_goal("alice", first, GoalUpdate::Complete).await.unwrap();
        store.create_mood("alice", MoodKind::Sad, "down").await.unwrap();
        let latest = store.create_mood("alice", MoodKind::Happy, "great").await.unwrap();

        let open = store.list_goals("alice", GoalFilter::Open).await.unwrap();
        assert_eq!(open.iter().map(|g| g.description.as_str()).collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(store.list_goals("alice", GoalFilter::Completed).await.unwrap().len(), 1);

        let progress = store.progress("alice").await.unwrap();
        assert_eq!(progress.total_goals, 3);
        assert_eq!(progress.completed_goals, 1);
        assert_eq!(progress.recent_moods.len(), 2);
        assert_eq!(progress.recent_moods[0].id, latest);
    }

    #[tokio::test]
    async fn mood_edit_and_delete() {
        let store = MemoryStore::new();
        let id = store.create_mood("alice", MoodKind::Neutral, "meh").await.unwrap();
        store.update_mood("alice", id, MoodKind::Angry, "frustrated").await.unwrap();

        let moods = store.list_moods("alice").await.unwrap();
        assert_eq!(moods[0].kind, MoodKind::Angry);
        assert_eq!(moods[0].note, "frustrated");

        assert!(store.delete_mood("bob", id).await.is_err());
        store.delete_mood("alice", id).await.unwrap();
        assert!(store.list_moods("alice").await.unwrap().is_empty());
    }
}
