use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::CoachError;

pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(CoachError::invalid(
                "Invalid priority value. Please provide: high, medium, or low.",
            )),
        }
    }
}

/// Parses a `YYYY-MM-DD` calendar date. Dates in the past are accepted.
pub fn parse_deadline(s: &str) -> Result<NaiveDate, CoachError> {
    NaiveDate::parse_from_str(s.trim(), DEADLINE_FORMAT)
        .map_err(|_| CoachError::invalid("Invalid date format. Please use YYYY-MM-DD."))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: i64,
    pub description: String,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub category: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A single field change applied to an existing goal.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalUpdate {
    Description(String),
    Priority(Priority),
    Deadline(NaiveDate),
    Category(String),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoalFilter {
    #[default]
    All,
    Open,
    Completed,
}

impl GoalFilter {
    /// The `completed` value a goal must have, `None` meaning any.
    pub fn completed(&self) -> Option<bool> {
        match self {
            GoalFilter::All => None,
            GoalFilter::Open => Some(false),
            GoalFilter::Completed => Some(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodKind {
    Happy,
    Sad,
    Neutral,
    Angry,
}

const MOOD_SYNONYMS: &[(MoodKind, &[&str])] = &[
    (
        MoodKind::Happy,
        &[
            "happy", "joyful", "great", "good", "glücklich", "froh", "very good", "verygood",
            "awesome", "awesom",
        ],
    ),
    (
        MoodKind::Sad,
        &["sad", "depressed", "down", "traurig", "niedergeschlagen"],
    ),
    (MoodKind::Neutral, &["neutral", "okay", "meh", "normal"]),
    (
        MoodKind::Angry,
        &["angry", "frustrated", "irritated", "wütend", "verärgert"],
    ),
];

impl MoodKind {
    /// Maps free text onto one of the standard moods. Only whole-message
    /// synonyms count; anything else is neutral.
    pub fn classify(text: &str) -> MoodKind {
        let text = text.trim().to_lowercase();
        MOOD_SYNONYMS
            .iter()
            .find(|(_, words)| words.contains(&text.as_str()))
            .map(|(kind, _)| *kind)
            .unwrap_or(MoodKind::Neutral)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodKind::Happy => "happy",
            MoodKind::Sad => "sad",
            MoodKind::Neutral => "neutral",
            MoodKind::Angry => "angry",
        }
    }

    pub fn from_label(label: &str) -> Option<MoodKind> {
        match label {
            "happy" => Some(MoodKind::Happy),
            "sad" => Some(MoodKind::Sad),
            "neutral" => Some(MoodKind::Neutral),
            "angry" => Some(MoodKind::Angry),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            MoodKind::Happy => "😄",
            MoodKind::Sad => "😔",
            MoodKind::Neutral => "😐",
            MoodKind::Angry => "😠",
        }
    }
}

impl fmt::Display for MoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mood {
    pub id: i64,
    pub kind: MoodKind,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot rendered by `/progress`.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub total_goals: usize,
    pub completed_goals: usize,
    pub goals: Vec<Goal>,
    /// Most recent first.
    pub recent_moods: Vec<Mood>,
}

impl Progress {
    pub fn new(goals: Vec<Goal>, recent_moods: Vec<Mood>) -> Self {
        Progress {
            total_goals: goals.len(),
            completed_goals: goals.iter().filter(|g| g.completed).count(),
            goals,
            recent_moods,
        }
    }
}
