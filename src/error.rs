//! Error types for gator.

use thiserror::Error;

/// Common error type for gator.
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong number of arguments, or an argument that could not be parsed.
    #[error("{0}")]
    Usage(String),

    /// No handler is registered under the given command name.
    #[error("command {0} not found")]
    CommandNotFound(String),

    /// A command needing a current user was run without one.
    #[error("not logged in")]
    NotLoggedIn,

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    ///
    /// Post ingestion treats this as an already-seen item rather than a failure.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The scheduler found no feed to fetch.
    #[error("no feeds to fetch")]
    NoFeeds,

    /// HTTP transport failure or non-success status.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The response body was not a readable feed.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(#[from] humantime::DurationError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any database failure other than a uniqueness violation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// Convert a sqlx error, mapping unique-constraint violations on
    /// `what` to [`Error::AlreadyExists`].
    pub fn from_insert(err: sqlx::Error, what: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::AlreadyExists(what.into())
            }
            _ => Error::Database(err),
        }
    }
}

/// Result type alias for gator operations.
pub type Result<T> = std::result::Result<T, Error>;
