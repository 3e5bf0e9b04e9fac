//! Error types for famcal-schedule

use thiserror::Error;

/// famcal-schedule error type
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Cron parse error in schedule '{name}': {source}")]
    CronParse {
        name: String,
        #[source]
        source: cron::error::Error,
    },

    #[error("Invalid schedule '{0}': {1}")]
    InvalidSchedule(String, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ScheduleError>;
