//! Error types for profile loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for profile operations
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that can occur while loading a capability profile
#[derive(Error, Debug)]
pub enum ProfileError {
    /// No declarative record exists for the id
    #[error("Profile not found: {id}")]
    NotFound { id: String },

    /// The record exists but cannot be used
    #[error("Invalid profile '{id}': {reason}")]
    Invalid { id: String, reason: String },

    /// The profile directory or file could not be read
    #[error("IO error for {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl ProfileError {
    pub(crate) fn invalid(id: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Get the error code for CLI output
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "PROFILE_NOT_FOUND",
            Self::Invalid { .. } => "PROFILE_INVALID",
            Self::Io { .. } => "IO_ERROR",
        }
    }
}
