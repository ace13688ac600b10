use std::path::PathBuf;

/// Core error type for the wrapper.
///
/// Adapter crates map their specific errors into this type so callers can tell
/// a rejected request (`Api`) from a broken transport (`External`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("a bot instance already exists in this process")]
    AlreadyInitialized,

    #[error("telegram bot token was rejected: {0}")]
    InvalidToken(String),

    #[error("not initialized: {0}")]
    NotInitialized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("telegram api error in {method}: {description}")]
    Api {
        method: String,
        code: Option<i64>,
        description: String,
    },

    #[error("store error: {path}: {reason}")]
    Store { path: PathBuf, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True when the remote API answered with `ok: false`.
    pub fn is_api_rejection(&self) -> bool {
        matches!(self, Error::Api { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
