use std::fmt;
use std::time::Duration;

use async_openai::error::OpenAIError;
use thiserror::Error;

/// The kind of user-owned record an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Goal,
    Mood,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Goal => f.write_str("goal"),
            Entity::Mood => f.write_str("mood entry"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoachError {
    /// The id does not exist or belongs to another user.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    /// The message carries a human readable explanation and is shown to the user as is.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("external service failure: {0}")]
    ExternalService(String),

    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

impl CoachError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CoachError::InvalidArgument(msg.into())
    }

    pub fn timeout(after: Duration) -> Self {
        CoachError::ExternalService(format!("no completion after {:?}", after))
    }
}

impl From<OpenAIError> for CoachError {
    fn from(e: OpenAIError) -> Self {
        CoachError::ExternalService(e.to_string())
    }
}

pub type CoachResult<T> = Result<T, CoachError>;
