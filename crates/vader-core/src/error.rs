//! Error types shared across Vader crates.
//!
//! Every variant carries a short `user_message()` for the error banner; the
//! `Display` text keeps the underlying detail for logs.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Weather provider failures, mapped from the weather crate by callers.
    #[error("Weather service error: {message}")]
    Weather {
        message: String,
        user_message: &'static str,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Weather { user_message, .. } => user_message,
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Durable key-value storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored content exists but cannot be parsed.
    #[error("Stored record {key} is corrupt: {message}")]
    Corrupt { key: String, message: String },

    #[error("Failed to serialize record {key}: {message}")]
    Serialize { key: String, message: String },
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "Unable to save local data. Changes may not persist.",
            StorageError::Corrupt { .. } => "Local data was unreadable and has been reset.",
            StorageError::Serialize { .. } => "Unable to save local data. Changes may not persist.",
        }
    }
}
