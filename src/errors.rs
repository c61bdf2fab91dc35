//! Error types for the wager engine
//!
//! Every rejected wager operation is reported through [`WagerError`]. Client
//! errors are detected before any ledger mutation; backend failures are
//! surfaced as retryable.

use crate::games::types::UserId;
use thiserror::Error;

/// Root error type for wager operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WagerError {
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: u64, required: u64 },

    /// Below minimum, non-positive, or above the configured maximum
    #[error("Invalid bet: {0}")]
    InvalidBet(String),

    /// Unknown variant, difficulty, risk or row count
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Step or cashout on a non-active or nonexistent session
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    #[error("Position {0} already revealed")]
    AlreadyRevealed(u32),

    #[error("Position {position} out of range (valid: 0..{limit})")]
    OutOfRange { position: u32, limit: u32 },

    #[error("Nothing to cash out")]
    NothingToCashOut,

    #[error("Daily spin limit of {limit} reached")]
    DailyLimitReached { limit: u32 },

    /// Store unreachable or malformed
    #[error("Configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    /// Lost an optimistic write race that is safe to retry
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl WagerError {
    /// Stable machine-readable code used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            WagerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            WagerError::InvalidBet(_) => "INVALID_BET",
            WagerError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            WagerError::InvalidSessionState(_) => "INVALID_SESSION_STATE",
            WagerError::AlreadyRevealed(_) => "ALREADY_REVEALED",
            WagerError::OutOfRange { .. } => "OUT_OF_RANGE",
            WagerError::NothingToCashOut => "NOTHING_TO_CASH_OUT",
            WagerError::DailyLimitReached { .. } => "DAILY_LIMIT_REACHED",
            WagerError::ConfigurationUnavailable(_) => "CONFIGURATION_UNAVAILABLE",
            WagerError::UnknownUser(_) => "UNKNOWN_USER",
            WagerError::Conflict(_) => "CONFLICT",
            WagerError::Unavailable(_) => "UNAVAILABLE",
        }
    }

    /// Whether the caller may retry the whole operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WagerError::ConfigurationUnavailable(_) | WagerError::Conflict(_) | WagerError::Unavailable(_)
        )
    }

    /// Whether the failure was caused by the request rather than the backend
    pub fn is_client_error(&self) -> bool {
        !self.is_retryable()
    }
}

/// Convenience type alias for Results
pub type WagerResult<T> = Result<T, WagerError>;

/// Application configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Missing required field: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue { field: String, value: String, reason: String },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(e: serde_json::Error) -> Self {
        ConfigurationError::LoadFailed(e.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
