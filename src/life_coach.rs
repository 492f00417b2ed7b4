use std::sync::Arc;
use std::time::Duration;

use crate::coach::Coach;
use crate::command::{self, split_target, Command, Invocation, ParseCommandError};
use crate::error::{CoachError, CoachResult, Entity};
use crate::model::{parse_deadline, GoalUpdate, MoodKind, Priority};
use crate::replies;
use crate::session::{GoalAction, MoodAction, Pending, Sessions};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub show_menu: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Reply {
        Reply {
            text: text.into(),
            show_menu: false,
        }
    }

    fn with_menu(text: impl Into<String>) -> Reply {
        Reply {
            text: text.into(),
            show_menu: true,
        }
    }
}

/// Turns one inbound message into one reply. Owns the pending-input table.
pub struct LifeCoach {
    store: Arc<dyn Store>,
    coach: Coach,
    sessions: Sessions,
}

fn parse_id(raw: &str, entity: Entity) -> CoachResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CoachError::invalid(match entity {
            Entity::Goal => "Invalid goal number. Please type a number.",
            Entity::Mood => "Invalid mood entry number. Please type a number.",
        })),
    }
}

fn required<'a>(value: &'a str, what: &str) -> CoachResult<&'a str> {
    match value.trim() {
        "" => Err(CoachError::invalid(format!("Please specify {}.", what))),
        value => Ok(value),
    }
}

impl LifeCoach {
    pub fn new(store: Arc<dyn Store>, coach: Coach, pending_ttl: Duration) -> LifeCoach {
        LifeCoach {
            store,
            coach,
            sessions: Sessions::new(pending_ttl),
        }
    }

    /// Never fails: every error becomes a user-readable reply.
    pub async fn handle(&self, user: &str, raw_text: &str) -> Reply {
        let text = raw_text.trim();

        let result = match command::parse(text) {
            Ok(invocation) => {
                // a new command abandons whatever input was pending
                self.sessions.clear(user).await;
                self.run(user, invocation).await
            }
            Err(ParseCommandError::Unrecognized(name)) => {
                log::info!("user {} sent unknown command /{}", user, name);
                self.sessions.clear(user).await;
                Ok(Reply::text(replies::UNRECOGNIZED))
            }
            Err(ParseCommandError::NotACommand) => match self.sessions.take(user).await {
                Some(pending) => self.resume(user, pending, text).await,
                None => self.coach.chat(user, text).await.map(Reply::text),
            },
        };

        result.unwrap_or_else(|e| {
            match &e {
                CoachError::Store(_) => log::error!("store failure for user {}: {}", user, e),
                _ => log::info!("user {}: {}", user, e),
            }
            Reply::text(replies::error_reply(&e))
        })
    }

    async fn run(&self, user: &str, invocation: Invocation) -> CoachResult<Reply> {
        let Invocation { command, args } = invocation;
        log::debug!("user {} runs {:?} {:?}", user, command, args);

        match command {
            Command::Start => Ok(Reply::with_menu(replies::WELCOME)),
            Command::Help => Ok(Reply::with_menu(replies::help())),
            Command::Goal => match args.is_empty() {
                true => self.ask(user, Pending::NewGoal, replies::ASK_GOAL).await,
                false => self.create_goal(user, &args).await,
            },
            Command::EditGoal => self.goal_command(user, GoalAction::Edit, &args).await,
            Command::DeleteGoal => self.goal_command(user, GoalAction::Delete, &args).await,
            Command::CompleteGoal => self.goal_command(user, GoalAction::Complete, &args).await,
            Command::Prioritize => self.goal_command(user, GoalAction::Prioritize, &args).await,
            Command::SetDeadline => self.goal_command(user, GoalAction::Deadline, &args).await,
            Command::SetCategory => self.goal_command(user, GoalAction::Category, &args).await,
            Command::Mood => match args.is_empty() {
                true => self.ask(user, Pending::NewMood, replies::ASK_MOOD).await,
                false => self.log_mood(user, &args).await,
            },
            Command::EditMood => self.mood_command(user, MoodAction::Edit, &args).await,
            Command::DeleteMood => self.mood_command(user, MoodAction::Delete, &args).await,
            Command::Progress => {
                let progress = self.store.progress(user).await?;
                Ok(Reply::text(replies::progress(&progress)))
            }
            Command::Coaching => self.coach.start_coaching(user).await.map(Reply::text),
        }
    }

    /// Consumes the awaited value. The pending state is already gone at this point,
    /// only a successful id step puts a new one in place.
    async fn resume(&self, user: &str, pending: Pending, text: &str) -> CoachResult<Reply> {
        log::debug!("user {} answers {:?}", user, pending);

        match pending {
            Pending::NewGoal => self.create_goal(user, text).await,
            Pending::GoalId(action) => {
                let (id, value) = split_target(text);
                self.goal_target(user, action, id.unwrap_or_default(), value).await
            }
            Pending::GoalValue(action, id) => self.apply_goal(user, action, id, text).await,
            Pending::NewMood => self.log_mood(user, text).await,
            Pending::MoodId(action) => {
                let (id, value) = split_target(text);
                self.mood_target(user, action, id.unwrap_or_default(), value).await
            }
            Pending::MoodValue(id) => self.edit_mood(user, id, text).await,
        }
    }

    async fn ask(&self, user: &str, pending: Pending, question: impl Into<String>) -> CoachResult<Reply> {
        self.sessions.begin(user, pending).await;
        Ok(Reply::text(question))
    }

    async fn goal_command(&self, user: &str, action: GoalAction, args: &str) -> CoachResult<Reply> {
        match split_target(args) {
            (None, _) => {
                self.ask(user, Pending::GoalId(action), replies::ask_goal_id(action))
                    .await
            }
            (Some(id), value) => self.goal_target(user, action, id, value).await,
        }
    }

    async fn goal_target(
        &self,
        user: &str,
        action: GoalAction,
        raw_id: &str,
        value: &str,
    ) -> CoachResult<Reply> {
        let id = parse_id(raw_id, Entity::Goal)?;

        if action.needs_value() && value.is_empty() {
            return self
                .ask(user, Pending::GoalValue(action, id), replies::ask_goal_value(action, id))
                .await;
        }
        self.apply_goal(user, action, id, value).await
    }

    async fn apply_goal(
        &self,
        user: &str,
        action: GoalAction,
        id: i64,
        value: &str,
    ) -> CoachResult<Reply> {
        let reply = match action {
            GoalAction::Delete => {
                self.store.delete_goal(user, id).await?;
                format!("✅ Goal {} deleted.", id)
            }
            GoalAction::Complete => {
                self.store.update_goal(user, id, GoalUpdate::Complete).await?;
                format!("🎉 Goal {} marked as completed!", id)
            }
            GoalAction::Edit => {
                let text = required(value, "the new goal text")?;
                self.store
                    .update_goal(user, id, GoalUpdate::Description(text.to_string()))
                    .await?;
                format!("✅ Goal {} updated.", id)
            }
            GoalAction::Prioritize => {
                let priority: Priority = value.parse()?;
                self.store.update_goal(user, id, GoalUpdate::Priority(priority)).await?;
                format!("✅ Priority of goal {} set to {}.", id, priority)
            }
            GoalAction::Deadline => {
                let deadline = parse_deadline(value)?;
                self.store.update_goal(user, id, GoalUpdate::Deadline(deadline)).await?;
                format!("✅ Deadline for goal {} set to {}.", id, deadline)
            }
            GoalAction::Category => {
                let category = required(value, "a category")?;
                self.store
                    .update_goal(user, id, GoalUpdate::Category(category.to_string()))
                    .await?;
                format!("✅ Category for goal {} set to '{}'.", id, category)
            }
        };
        Ok(Reply::text(reply))
    }

    async fn create_goal(&self, user: &str, text: &str) -> CoachResult<Reply> {
        let description = required(text, "a goal. Example: Exercise more")?;
        let id = self.store.create_goal(user, description).await?;
        log::info!("user {} created goal {}", user, id);
        Ok(Reply::text(format!("✅ New goal set (#{}): {}", id, description)))
    }

    async fn mood_command(&self, user: &str, action: MoodAction, args: &str) -> CoachResult<Reply> {
        match split_target(args) {
            (None, _) => {
                self.ask(user, Pending::MoodId(action), replies::ask_mood_id(action))
                    .await
            }
            (Some(id), value) => self.mood_target(user, action, id, value).await,
        }
    }

    async fn mood_target(
        &self,
        user: &str,
        action: MoodAction,
        raw_id: &str,
        value: &str,
    ) -> CoachResult<Reply> {
        let id = parse_id(raw_id, Entity::Mood)?;

        match action {
            MoodAction::Delete => {
                self.store.delete_mood(user, id).await?;
                Ok(Reply::text(format!("✅ Mood {} deleted.", id)))
            }
            MoodAction::Edit if value.is_empty() => {
                self.ask(user, Pending::MoodValue(id), replies::ask_mood_value(id))
                    .await
            }
            MoodAction::Edit => self.edit_mood(user, id, value).await,
        }
    }

    async fn log_mood(&self, user: &str, text: &str) -> CoachResult<Reply> {
        let note = required(text, "your mood")?;
        let kind = MoodKind::classify(note);
        self.store.create_mood(user, kind, note).await?;
        Ok(Reply::text(format!("✅ Mood logged: {}", note)))
    }

    async fn edit_mood(&self, user: &str, id: i64, text: &str) -> CoachResult<Reply> {
        let note = required(text, "the new mood text")?;
        self.store
            .update_mood(user, id, MoodKind::classify(note), note)
            .await?;
        Ok(Reply::text(format!("✅ Mood {} updated.", id)))
    }
}
