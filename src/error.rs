//! Error types for autosubmit

use thiserror::Error;

/// Errors raised while evaluating or submitting changes
#[derive(Debug, Error)]
pub enum Error {
    /// Change or account not found, or not readable
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The bot account lacks rights on the change
    ///
    /// The readiness oracle maps this to [`Error::Lookup`] before it
    /// reaches callers.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Remote submit call failed
    #[error("failed to submit change {change}: {message}")]
    Submit {
        /// Change number
        change: u64,
        /// Underlying failure
        message: String,
    },

    /// Remote comment/label call failed
    #[error("failed to update review on change {change}: {message}")]
    ReviewUpdate {
        /// Change number
        change: u64,
        /// Underlying failure
        message: String,
    },

    /// No account matches the configured bot email
    #[error("no account found with email: {0}")]
    NoBotAccount(String),

    /// More than one account matches the configured bot email
    #[error("{count} accounts found with email: {email}")]
    AmbiguousBotAccount {
        /// Configured bot email
        email: String,
        /// Number of matching accounts
        count: usize,
    },

    /// Gerrit REST API error
    #[error("Gerrit API error: {0}")]
    GerritApi(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// Event feed line could not be decoded
    #[error("invalid event: {0}")]
    Event(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is a bot-account configuration error
    ///
    /// These must surface loudly instead of being logged and skipped.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoBotAccount(_) | Self::AmbiguousBotAccount { .. } | Self::Config(_)
        )
    }
}

/// Result type alias for autosubmit
pub type Result<T> = std::result::Result<T, Error>;
