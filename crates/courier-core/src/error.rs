use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unrecognized timestamp (expected `dd.MM.yyyy hh:mm`): {0}")]
    InvalidTimestamp(String),

    #[error("Scheduled time {at} is in the past")]
    PastTimestamp { at: DateTime<Utc> },
}

pub type Result<T> = std::result::Result<T, CoreError>;
