//! Unified error type for `ClassroomBuddy`.
//!
//! Every layer (core, ai, bot) returns [`Result`], so a failure from the
//! database, the AI service or Discord can be propagated with `?` and
//! reported in one place.

use thiserror::Error;

/// All errors that can occur in `ClassroomBuddy`.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration, malformed stored values or rejected input.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// No student with the given code (or id) exists
    #[error("Student not found: {code}")]
    StudentNotFound {
        /// Student code or id that was looked up
        code: String,
    },

    /// A student with this code already exists
    #[error("Student code already exists: {code}")]
    DuplicateStudent {
        /// The conflicting student code
        code: String,
    },

    /// No violation rule with the given name (or id) exists
    #[error("Violation rule not found: {name}")]
    RuleNotFound {
        /// Rule name or id that was looked up
        name: String,
    },

    /// A violation rule with this name already exists
    #[error("Violation rule already exists: {name}")]
    DuplicateRule {
        /// The conflicting rule name
        name: String,
    },

    /// No violation record with the given id exists
    #[error("Violation not found: {id}")]
    ViolationNotFound {
        /// Violation id
        id: i64,
    },

    /// Rule points must be strictly positive
    #[error("Invalid points: {points} (must be greater than zero)")]
    InvalidPoints {
        /// The rejected point value
        points: i32,
    },

    /// No subject with the given code (or id) exists
    #[error("Subject not found: {code}")]
    SubjectNotFound {
        /// Subject code or id that was looked up
        code: String,
    },

    /// A subject with this code already exists
    #[error("Subject code already exists: {code}")]
    DuplicateSubject {
        /// The conflicting subject code
        code: String,
    },

    /// No grade with the given id exists
    #[error("Grade not found: {id}")]
    GradeNotFound {
        /// Grade id
        id: i64,
    },

    /// Grade scores must lie within 0–10
    #[error("Invalid grade score: {score} (must be between 0 and 10)")]
    InvalidGrade {
        /// The rejected score
        score: f64,
    },

    /// Another process recorded a rollover for this calendar week first
    #[error("Rollover for {week_id} was already applied by another process")]
    RolloverConflict {
        /// ISO week identifier that was already marked
        week_id: String,
    },

    /// The AI completion service failed or returned something unusable
    #[error("AI service error: {message}")]
    Ai {
        /// Human-readable description
        message: String,
    },

    /// HTTP transport error talking to the AI service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing into a `String` failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Numeric conversion out of range
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    /// Missing or invalid environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error
    #[error("Discord framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
