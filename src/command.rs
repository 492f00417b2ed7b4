use teloxide::utils::command::BotCommands;
use thiserror::Error;

#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Here are the available commands:")]
pub enum Command {
    #[command(description = "start over and show the command keyboard")]
    Start,
    #[command(description = "set a new goal")]
    Goal,
    #[command(description = "edit a goal")]
    EditGoal,
    #[command(description = "delete a goal")]
    DeleteGoal,
    #[command(description = "mark a goal as completed")]
    CompleteGoal,
    #[command(description = "prioritize a goal (high, medium, low)")]
    Prioritize,
    #[command(description = "set a deadline for a goal (YYYY-MM-DD)")]
    SetDeadline,
    #[command(description = "set a category for a goal")]
    SetCategory,
    #[command(description = "log your mood")]
    Mood,
    #[command(description = "edit a mood entry")]
    EditMood,
    #[command(description = "delete a mood entry")]
    DeleteMood,
    #[command(description = "show your progress")]
    Progress,
    #[command(description = "show this message")]
    Help,
    #[command(description = "start a coaching session")]
    Coaching,
}

/// A recognized command plus whatever followed it on the same line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub args: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("message is not a command")]
    NotACommand,
    #[error("unrecognized command /{0}")]
    Unrecognized(String),
}

/// Parses `/name[@bot] args...`. The name is matched case-insensitively.
pub fn parse(text: &str) -> Result<Invocation, ParseCommandError> {
    let body = text
        .trim()
        .strip_prefix('/')
        .ok_or(ParseCommandError::NotACommand)?;

    let (head, args) = match body.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (body, ""),
    };
    let name = head.split('@').next().unwrap_or_default().to_lowercase();

    if name.is_empty() {
        return Err(ParseCommandError::Unrecognized(name));
    }

    let command = Command::parse(&format!("/{}", name), "")
        .map_err(|_| ParseCommandError::Unrecognized(name.clone()))?;

    Ok(Invocation {
        command,
        args: args.to_string(),
    })
}

/// Splits `"<id> <value...>"` into the id token and the trimmed rest.
pub fn split_target(args: &str) -> (Option<&str>, &str) {
    let args = args.trim();
    if args.is_empty() {
        return (None, "");
    }
    match args.split_once(char::is_whitespace) {
        Some((id, rest)) => (Some(id), rest.trim()),
        None => (Some(args), ""),
    }
}
