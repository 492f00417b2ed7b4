use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestMessageArgs, CreateChatCompletionRequestArgs, Role};
use async_openai::Client;
use async_trait::async_trait;
use chrono::Utc;

use crate::error::{CoachError, CoachResult};
use crate::model::{Goal, GoalFilter, Mood, DEADLINE_FORMAT};
use crate::replies;
use crate::store::{Store, RECENT_MOODS};

const SYSTEM_PROMPT: &str = "You are an empathetic and professional life coach.";
const MAX_PROMPT_GOALS: usize = 20;
/// Upper bound on any prompt sent to the provider.
const MAX_PROMPT_CHARS: usize = 4000;

/// Anything that turns a prompt into a completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> CoachResult<String>;
}

/// Deepseek speaks the OpenAI chat completion protocol, only the base url differs.
pub struct DeepseekProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl DeepseekProvider {
    pub fn new(api_key: &str, api_base: &str, model: &str) -> DeepseekProvider {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        DeepseekProvider {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for DeepseekProvider {
    async fn complete(&self, system: &str, prompt: &str) -> CoachResult<String> {
        let msgs = vec![
            ChatCompletionRequestMessageArgs::default()
                .role(Role::System)
                .content(system)
                .build()?,
            ChatCompletionRequestMessageArgs::default()
                .role(Role::User)
                .content(prompt)
                .build()?,
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .max_tokens(1000u16)
            .temperature(0.7f32)
            .model(self.model.as_str())
            .messages(msgs)
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| CoachError::ExternalService("completion without content".to_string()))
    }
}

/// Builds prompts from a user's history and relays the completion.
/// LLM failures never leave this type, they become the fallback reply.
#[derive(Clone)]
pub struct Coach {
    store: Arc<dyn Store>,
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
    cooldown: Duration,
}

impl Coach {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn CompletionProvider>,
        timeout: Duration,
        cooldown: Duration,
    ) -> Coach {
        Coach {
            store,
            provider,
            timeout,
            cooldown,
        }
    }

    /// Store failures are returned; LLM failures produce `replies::COACHING_FALLBACK`.
    pub async fn start_coaching(&self, user: &str) -> CoachResult<String> {
        if let Some(last) = self.store.last_coaching_at(user).await? {
            let since = (Utc::now() - last).to_std().unwrap_or_default();
            if since < self.cooldown {
                return Ok(replies::coaching_cooldown(self.cooldown - since));
            }
        }

        // open goals first so they are the ones kept when the goal budget runs out
        let mut goals = self.store.list_goals(user, GoalFilter::Open).await?;
        goals.extend(self.store.list_goals(user, GoalFilter::Completed).await?);
        let moods = self.store.recent_moods(user, RECENT_MOODS).await?;
        let prompt = coaching_prompt(&goals, &moods);

        match self.complete(&prompt).await {
            Ok(response) => {
                if let Err(e) = self.store.record_coaching(user, &prompt, &response).await {
                    log::error!("failed to record coaching session for {}: {}", user, e);
                }
                Ok(response)
            }
            Err(e) => {
                log::warn!("coaching for {} fell back: {}", user, e);
                Ok(replies::COACHING_FALLBACK.to_string())
            }
        }
    }

    /// Conversational answer to free text sent outside of any command.
    pub async fn chat(&self, user: &str, message: &str) -> CoachResult<String> {
        let goals = self.store.list_goals(user, GoalFilter::All).await?;
        let prompt = chat_prompt(&goals, message);

        match self.complete(&prompt).await {
            Ok(response) => Ok(response),
            Err(e) => {
                log::warn!("chat reply for {} fell back: {}", user, e);
                Ok(replies::COACHING_FALLBACK.to_string())
            }
        }
    }

    async fn complete(&self, prompt: &str) -> CoachResult<String> {
        debug_assert!(prompt.chars().count() <= MAX_PROMPT_CHARS);
        tokio::time::timeout(self.timeout, self.provider.complete(SYSTEM_PROMPT, prompt))
            .await
            .map_err(|_| CoachError::timeout(self.timeout))?
    }
}

/// Characters of a single goal description that make it into a prompt.
const MAX_DESCRIPTION_CHARS: usize = 200;
/// Budget of the goal section; the rest of the prompt is always appended.
const MAX_GOAL_SECTION_CHARS: usize = 2500;
const MAX_NOTE_CHARS: usize = 200;
const MAX_MESSAGE_CHARS: usize = 1000;

/// Cuts `text` to `max` characters on a char boundary, marking the cut.
fn clip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

fn goal_line(goal: &Goal) -> String {
    let status = if goal.completed { "completed" } else { "active" };
    let mut line = format!("- {} ({}", clip(&goal.description, MAX_DESCRIPTION_CHARS), status);
    if let Some(priority) = goal.priority {
        let _ = write!(line, ", priority {}", priority);
    }
    if let Some(deadline) = goal.deadline {
        let _ = write!(line, ", deadline {}", deadline.format(DEADLINE_FORMAT));
    }
    if let Some(category) = &goal.category {
        let _ = write!(line, ", category {}", clip(category, MAX_NOTE_CHARS));
    }
    line.push_str(")\n");
    line
}

fn render_goals(out: &mut String, goals: &[Goal]) {
    if goals.is_empty() {
        out.push_str("The user has not set any goals yet.\n");
        return;
    }

    out.push_str("The user's goals:\n");
    let mut used = 0;
    let mut shown = 0;
    for goal in goals.iter().take(MAX_PROMPT_GOALS) {
        let line = goal_line(goal);
        let len = line.chars().count();
        if used + len > MAX_GOAL_SECTION_CHARS {
            break;
        }
        out.push_str(&line);
        used += len;
        shown += 1;
    }
    if goals.len() > shown {
        let _ = writeln!(out, "...and {} more.", goals.len() - shown);
    }
}

pub fn coaching_prompt(goals: &[Goal], moods: &[Mood]) -> String {
    let mut out = String::new();
    render_goals(&mut out, goals);

    if moods.is_empty() {
        out.push_str("No moods have been logged recently.\n");
    } else {
        out.push_str("Recent moods, most recent first:\n");
        for mood in moods {
            let _ = writeln!(
                out,
                "- {} {}: \"{}\"",
                mood.created_at.format("%Y-%m-%d %H:%M"),
                mood.kind,
                clip(&mood.note, MAX_NOTE_CHARS)
            );
        }
    }

    out.push_str(
        "\nRun a short coaching session: reflect on the progress so far, \
        acknowledge how the user has been feeling and suggest one or two concrete next steps.",
    );
    out
}

pub fn chat_prompt(goals: &[Goal], message: &str) -> String {
    let mut out = String::new();
    render_goals(&mut out, goals);
    let _ = write!(
        out,
        "\nCurrent message: {}\n\nPlease respond as an empathetic life coach and refer to the user's goals.",
        clip(message, MAX_MESSAGE_CHARS)
    );
    out
}
