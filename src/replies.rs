//! User-facing texts.

use std::fmt::Write;
use std::time::Duration;

use teloxide::types::{KeyboardButton, KeyboardMarkup};
use teloxide::utils::command::BotCommands;

use crate::command::Command;
use crate::error::{CoachError, Entity};
use crate::model::{Progress, DEADLINE_FORMAT};
use crate::session::{GoalAction, MoodAction};

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

pub const WELCOME: &str = "👋 Welcome to your personal AI Life Coach!\n\n\
    I am here to help you achieve your goals and improve your life.\n\n\
    Tap a command button below or type /help for a full list of commands.";

pub const UNRECOGNIZED: &str =
    "I don't know that command. Type /help for a list of available commands.";

pub const COACHING_FALLBACK: &str =
    "Sorry, I'm currently experiencing technical difficulties. Please try again later.";

pub const STORE_FAILURE: &str = "Something went wrong on my side. Please try again later.";

pub const ASK_GOAL: &str = "Okay, what is your new goal? Please type it in.";
pub const ASK_MOOD: &str = "How are you feeling? Please describe your mood.";

pub fn help() -> String {
    Command::descriptions().to_string()
}

pub fn menu() -> KeyboardMarkup {
    let rows = [
        vec!["/goal", "/mood", "/progress"],
        vec!["/coaching", "/help"],
        vec!["/editgoal", "/deletegoal"],
        vec!["/editmood", "/deletemood"],
        vec!["/completegoal", "/prioritize", "/setdeadline", "/setcategory"],
    ];
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
    )
}

pub fn error_reply(err: &CoachError) -> String {
    match err {
        CoachError::NotFound { entity: Entity::Goal, .. } => {
            "Goal not found or does not belong to you.".to_string()
        }
        CoachError::NotFound { entity: Entity::Mood, .. } => {
            "Mood entry not found or does not belong to you.".to_string()
        }
        CoachError::InvalidArgument(msg) => msg.clone(),
        CoachError::ExternalService(_) => COACHING_FALLBACK.to_string(),
        CoachError::Store(_) => STORE_FAILURE.to_string(),
    }
}

pub fn ask_goal_id(action: GoalAction) -> String {
    let what = match action {
        GoalAction::Edit => "Which goal number do you want to edit?",
        GoalAction::Delete => "Which goal number do you want to delete?",
        GoalAction::Complete => "Which goal number do you want to complete?",
        GoalAction::Prioritize => "Which goal number do you want to prioritize?",
        GoalAction::Deadline => "For which goal number do you want to set a deadline?",
        GoalAction::Category => "For which goal number do you want to set a category?",
    };
    format!("{} Please type the number.", what)
}

pub fn ask_goal_value(action: GoalAction, id: i64) -> String {
    match action {
        GoalAction::Prioritize => format!(
            "Okay, goal number {}. What priority do you want to set (high, medium, low)?",
            id
        ),
        GoalAction::Deadline => format!(
            "Okay, goal number {}. What deadline do you want to set? Please use YYYY-MM-DD format.",
            id
        ),
        GoalAction::Category => format!(
            "Okay, goal number {}. What category do you want to set? Please type the category name.",
            id
        ),
        GoalAction::Edit | GoalAction::Delete | GoalAction::Complete => format!(
            "Okay, you want to edit goal number {}. What is the new text for this goal?",
            id
        ),
    }
}

pub fn ask_mood_id(action: MoodAction) -> String {
    match action {
        MoodAction::Edit => "Which mood entry number do you want to edit? Please type the number.",
        MoodAction::Delete => {
            "Which mood entry number do you want to delete? Please type the number."
        }
    }
    .to_string()
}

pub fn ask_mood_value(id: i64) -> String {
    format!(
        "Okay, you want to edit mood entry number {}. What is the new text for this mood?",
        id
    )
}

pub fn coaching_cooldown(wait: Duration) -> String {
    let minutes = (wait.as_secs() + 59) / 60;
    format!(
        "You had a coaching session recently. The next one is available in about {} minute(s).",
        minutes.max(1)
    )
}

pub fn progress(progress: &Progress) -> String {
    let mut out = String::from("📊 Your Progress:\n\n");

    if progress.goals.is_empty() {
        out.push_str("No goals set yet.\n\n");
    } else {
        let _ = writeln!(
            out,
            "🎯 Goals ({} of {} completed):",
            progress.completed_goals, progress.total_goals
        );
        for goal in &progress.goals {
            let (emoji, status) = match goal.completed {
                true => ("✅", "Completed"),
                false => ("⏳", "Active"),
            };
            let priority = goal
                .priority
                .map(|p| format!("Priority: {}", p))
                .unwrap_or_else(|| "No Priority".to_string());
            let deadline = goal
                .deadline
                .map(|d| format!("Deadline: {}", d.format(DEADLINE_FORMAT)))
                .unwrap_or_else(|| "No Deadline".to_string());
            let category = goal
                .category
                .as_ref()
                .map(|c| format!("Category: {}", c))
                .unwrap_or_else(|| "No Category".to_string());

            let _ = writeln!(out, "  {} Goal {}: {}", emoji, goal.id, goal.description);
            let _ = writeln!(
                out,
                "     Status: {}, {}, {}, {}",
                status, priority, deadline, category
            );
        }
        out.push('\n');
    }

    if progress.recent_moods.is_empty() {
        out.push_str("No mood entries logged yet.\n");
    } else {
        let _ = writeln!(
            out,
            "😊 Recent Moods (last {} entries):",
            progress.recent_moods.len()
        );
        for mood in &progress.recent_moods {
            let _ = writeln!(
                out,
                "  {} Mood {} ({}): {} - '{}'",
                mood.kind.emoji(),
                mood.id,
                mood.created_at.format("%Y-%m-%d %H:%M"),
                mood.kind,
                mood.note
            );
        }
    }

    out
}

/// Splits `text` into chunks of at most `limit` characters, breaking after a
/// newline where possible and inside a line only when the line alone is too long.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = vec![];
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        for piece in chars.chunks(limit) {
            if current_len == limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.extend(piece);
            current_len += piece.len();
        }
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
