use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgQueryResult};
use sqlx::FromRow;

use crate::error::{CoachError, CoachResult, Entity};
use crate::model::{Goal, GoalFilter, GoalUpdate, Mood, MoodKind, Priority};
use crate::store::Store;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS goals (
        goal_id     BIGSERIAL PRIMARY KEY,
        user_id     TEXT NOT NULL,
        description TEXT NOT NULL,
        priority    TEXT CHECK (priority IN ('high', 'medium', 'low')),
        deadline    DATE,
        category    TEXT,
        completed   BOOLEAN NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS goals_user_id_idx ON goals (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS moods (
        mood_id    BIGSERIAL PRIMARY KEY,
        user_id    TEXT NOT NULL,
        label      TEXT NOT NULL,
        note       TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS moods_user_id_idx ON moods (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS coaching_sessions (
        session_id BIGSERIAL PRIMARY KEY,
        user_id    TEXT NOT NULL,
        prompt     TEXT NOT NULL,
        response   TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS coaching_sessions_user_id_idx ON coaching_sessions (user_id)",
];

#[derive(Debug, FromRow)]
struct GoalRow {
    goal_id: i64,
    description: String,
    priority: Option<String>,
    deadline: Option<NaiveDate>,
    category: Option<String>,
    completed: bool,
    created_at: DateTime<Utc>,
}

impl From<GoalRow> for Goal {
    fn from(row: GoalRow) -> Self {
        let priority = row.priority.as_deref().and_then(|p| match p.parse::<Priority>() {
            Ok(p) => Some(p),
            Err(_) => {
                log::warn!("goal {} has unknown priority {:?}", row.goal_id, p);
                None
            }
        });

        Goal {
            id: row.goal_id,
            description: row.description,
            priority,
            deadline: row.deadline,
            category: row.category,
            completed: row.completed,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MoodRow {
    mood_id: i64,
    label: String,
    note: String,
    created_at: DateTime<Utc>,
}

impl From<MoodRow> for Mood {
    fn from(row: MoodRow) -> Self {
        Mood {
            id: row.mood_id,
            kind: MoodKind::from_label(&row.label).unwrap_or(MoodKind::Neutral),
            note: row.note,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> CoachResult<PgStore> {
        log::info!("connecting to postgres...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        log::info!("postgres connection pool established");
        Ok(PgStore { pool })
    }

    /// Creates the tables if they are missing. Safe to run on every start.
    pub async fn migrate(&self) -> CoachResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        log::info!("tables created/verified");
        Ok(())
    }
}

fn owned(result: PgQueryResult, entity: Entity, id: i64) -> CoachResult<()> {
    match result.rows_affected() {
        0 => Err(CoachError::NotFound { entity, id }),
        _ => Ok(()),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_goal(&self, user: &str, description: &str) -> CoachResult<i64> {
        let id = sqlx::query_scalar(
            "INSERT INTO goals (user_id, description) VALUES ($1, $2) RETURNING goal_id",
        )
        .bind(user)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_goal(&self, user: &str, goal_id: i64, update: GoalUpdate) -> CoachResult<()> {
        let query = match &update {
            GoalUpdate::Description(text) => {
                sqlx::query("UPDATE goals SET description = $1 WHERE goal_id = $2 AND user_id = $3")
                    .bind(text.as_str())
            }
            GoalUpdate::Priority(priority) => {
                sqlx::query("UPDATE goals SET priority = $1 WHERE goal_id = $2 AND user_id = $3")
                    .bind(priority.as_str())
            }
            GoalUpdate::Deadline(date) => {
                sqlx::query("UPDATE goals SET deadline = $1 WHERE goal_id = $2 AND user_id = $3")
                    .bind(*date)
            }
            GoalUpdate::Category(category) => {
                sqlx::query("UPDATE goals SET category = $1 WHERE goal_id = $2 AND user_id = $3")
                    .bind(category.as_str())
            }
            GoalUpdate::Complete => sqlx::query(
                "UPDATE goals SET completed = TRUE WHERE goal_id = $1 AND user_id = $2",
            ),
        };

        let result = query.bind(goal_id).bind(user).execute(&self.pool).await?;
        owned(result, Entity::Goal, goal_id)
    }

    async fn delete_goal(&self, user: &str, goal_id: i64) -> CoachResult<()> {
        let result = sqlx::query("DELETE FROM goals WHERE goal_id = $1 AND user_id = $2")
            .bind(goal_id)
            .bind(user)
            .execute(&self.pool)
            .await?;
        owned(result, Entity::Goal, goal_id)
    }

    async fn list_goals(&self, user: &str, filter: GoalFilter) -> CoachResult<Vec<Goal>> {
        let rows = sqlx::query_as::<_, GoalRow>(
            r#"
            SELECT goal_id, description, priority, deadline, category, completed, created_at
            FROM goals
            WHERE user_id = $1 AND ($2::BOOLEAN IS NULL OR completed = $2)
            ORDER BY created_at ASC, goal_id ASC
            "#,
        )
        .bind(user)
        .bind(filter.completed())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Goal::from).collect())
    }

    async fn create_mood(&self, user: &str, kind: MoodKind, note: &str) -> CoachResult<i64> {
        let id = sqlx::query_scalar(
            "INSERT INTO moods (user_id, label, note) VALUES ($1, $2, $3) RETURNING mood_id",
        )
        .bind(user)
        .bind(kind.as_str())
        .bind(note)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_mood(
        &self,
        user: &str,
        mood_id: i64,
        kind: MoodKind,
        note: &str,
    ) -> CoachResult<()> {
        let result = sqlx::query(
            "UPDATE moods SET label = $1, note = $2 WHERE mood_id = $3 AND user_id = $4",
        )
        .bind(kind.as_str())
        .bind(note)
        .bind(mood_id)
        .bind(user)
        .execute(&self.pool)
        .await?;
        owned(result, Entity::Mood, mood_id)
    }

    async fn delete_mood(&self, user: &str, mood_id: i64) -> CoachResult<()> {
        let result = sqlx::query("DELETE FROM moods WHERE mood_id = $1 AND user_id = $2")
            .bind(mood_id)
            .bind(user)
            .execute(&self.pool)
            .await?;
        owned(result, Entity::Mood, mood_id)
    }

    async fn list_moods(&self, user: &str) -> CoachResult<Vec<Mood>> {
        let rows = sqlx::query_as::<_, MoodRow>(
            r#"
            SELECT mood_id, label, note, created_at
            FROM moods
            WHERE user_id = $1
            ORDER BY created_at ASC, mood_id ASC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Mood::from).collect())
    }

    async fn recent_moods(&self, user: &str, limit: i64) -> CoachResult<Vec<Mood>> {
        let rows = sqlx::query_as::<_, MoodRow>(
            r#"
            SELECT mood_id, label, note, created_at
            FROM moods
            WHERE user_id = $1
            ORDER BY created_at DESC, mood_id DESC
            LIMIT $2
            "#,
        )
        .bind(user)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Mood::from).collect())
    }

    async fn record_coaching(&self, user: &str, prompt: &str, response: &str) -> CoachResult<()> {
        sqlx::query("INSERT INTO coaching_sessions (user_id, prompt, response) VALUES ($1, $2, $3)")
            .bind(user)
            .bind(prompt)
            .bind(response)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn last_coaching_at(&self, user: &str) -> CoachResult<Option<DateTime<Utc>>> {
        let at = sqlx::query_scalar("SELECT MAX(created_at) FROM coaching_sessions WHERE user_id = $1")
            .bind(user)
            .fetch_one(&self.pool)
            .await?;
        Ok(at)
    }
}

/// These run against a live database: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PgStore::connect(&url).await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    fn unique_user(name: &str) -> String {
        format!("{}-{}", name, Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    #[tokio::test]
    #[ignore = "needs a postgres at DATABASE_URL"]
    async fn goals_round_trip_with_filters_and_ownership() {
        let store = store().await;
        // a second run over existing tables is a no-op
        store.migrate().await.unwrap();
        let alice = unique_user("alice");
        let bob = unique_user("bob");

        let first = store.create_goal(&alice, "Run a marathon").await.unwrap();
        let second = store.create_goal(&alice, "Read more").await.unwrap();
        store.update_goal(&alice, first, GoalUpdate::Priority(Priority::High)).await.unwrap();
        let deadline = NaiveDate::from_ymd_opt(2030, 1, 31).unwrap();
        store.update_goal(&alice, first, GoalUpdate::Deadline(deadline)).await.unwrap();
        store
            .update_goal(&alice, first, GoalUpdate::Category("health".to_string()))
            .await
            .unwrap();
        store.update_goal(&alice, second, GoalUpdate::Complete).await.unwrap();

        let all = store.list_goals(&alice, GoalFilter::All).await.unwrap();
        assert_eq!(all.iter().map(|g| g.id).collect::<Vec<_>>(), [first, second]);
        assert_eq!(all[0].priority, Some(Priority::High));
        assert_eq!(all[0].deadline, Some(deadline));
        assert_eq!(all[0].category.as_deref(), Some("health"));

        let open = store.list_goals(&alice, GoalFilter::Open).await.unwrap();
        assert_eq!(open.iter().map(|g| g.id).collect::<Vec<_>>(), [first]);
        let completed = store.list_goals(&alice, GoalFilter::Completed).await.unwrap();
        assert_eq!(completed.iter().map(|g| g.id).collect::<Vec<_>>(), [second]);

        assert!(matches!(
            store.update_goal(&bob, first, GoalUpdate::Complete).await,
            Err(CoachError::NotFound { entity: Entity::Goal, .. })
        ));
        assert!(matches!(
            store.delete_goal(&bob, first).await,
            Err(CoachError::NotFound { entity: Entity::Goal, .. })
        ));
        assert!(store.list_goals(&bob, GoalFilter::All).await.unwrap().is_empty());

        store.delete_goal(&alice, first).await.unwrap();
        assert_eq!(store.list_goals(&alice, GoalFilter::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore = "needs a postgres at DATABASE_URL"]
    async fn moods_and_coaching_sessions() {
        let store = store().await;
        let alice = unique_user("alice");
        let bob = unique_user("bob");

        let first = store.create_mood(&alice, MoodKind::Sad, "down").await.unwrap();
        let second = store.create_mood(&alice, MoodKind::Happy, "great").await.unwrap();
        store.update_mood(&alice, first, MoodKind::Angry, "frustrated").await.unwrap();

        let moods = store.list_moods(&alice).await.unwrap();
        assert_eq!(moods.iter().map(|m| m.id).collect::<Vec<_>>(), [first, second]);
        assert_eq!(moods[0].kind, MoodKind::Angry);
        assert_eq!(moods[0].note, "frustrated");

        let recent = store.recent_moods(&alice, 1).await.unwrap();
        assert_eq!(recent.iter().map(|m| m.id).collect::<Vec<_>>(), [second]);

        assert!(matches!(
            store.update_mood(&bob, first, MoodKind::Happy, "mine now").await,
            Err(CoachError::NotFound { entity: Entity::Mood, .. })
        ));
        assert!(store.delete_mood(&bob, second).await.is_err());
        store.delete_mood(&alice, second).await.unwrap();
        assert_eq!(store.list_moods(&alice).await.unwrap().len(), 1);

        assert_eq!(store.last_coaching_at(&alice).await.unwrap(), None);
        store.record_coaching(&alice, "prompt", "response").await.unwrap();
        assert!(store.last_coaching_at(&alice).await.unwrap().is_some());
        assert_eq!(store.last_coaching_at(&bob).await.unwrap(), None);
    }
}
