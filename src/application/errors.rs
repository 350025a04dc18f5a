//! Application layer errors

use std::time::Duration;
use thiserror::Error;

/// General service errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Carrier error: {0}")]
    Carrier(#[from] CarrierError),

    #[error("Log error: {0}")]
    Log(#[from] LogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rejected input at the service boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No message body")]
    EmptyBody,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Phone number must start with '+': {0}")]
    InvalidPhone(String),
}

impl ValidationError {
    /// Stable machine-readable reason for API callers
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::EmptyBody => "empty_body",
            ValidationError::MissingField(_) => "missing_field",
            ValidationError::InvalidPhone(_) => "invalid_phone",
        }
    }
}

/// Outbound delivery errors
#[derive(Error, Debug)]
pub enum CarrierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Carrier API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Carrier not configured: {0}")]
    NotConfigured(String),
}

/// Log persistence errors
#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
