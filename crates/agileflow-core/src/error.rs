//! Error types for transformation, hook merging and installation

use crate::util::PathError;
use agileflow_profiles::ProfileError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for transformer construction
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for hook file operations
pub type HookResult<T> = Result<T, HookError>;

/// Result type for installer operations
pub type InstallResult<T> = Result<T, InstallError>;

/// Errors raised while compiling rewrite rules for a profile pair
#[derive(Debug, Error)]
pub enum TransformError {
    /// A rewrite pattern built from profile values did not compile
    #[error("Invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The canonical or target profile could not be loaded
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl TransformError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pattern(_) => "TRANSFORM_PATTERN",
            Self::Profile(e) => e.code(),
        }
    }
}

/// Errors raised while reading or writing a hook configuration file
#[derive(Debug, Error)]
pub enum HookError {
    /// The file exists but cannot be read
    #[error("Cannot read hook file {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// The file is not valid JSON, or not a JSON object
    #[error("Corrupt hook file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The JSON is valid but the `hooks` section has an unexpected shape
    #[error("Unexpected hook layout: {0}")]
    Shape(String),

    /// The merged file could not be written
    #[error("Cannot write hook file {path}: {message}")]
    Write { path: PathBuf, message: String },
}

impl HookError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "HOOK_READ",
            Self::Corrupt { .. } | Self::Shape(_) => "HOOK_CORRUPT",
            Self::Write { .. } => "HOOK_WRITE",
        }
    }
}

/// Errors that abort one target's install pipeline
#[derive(Debug, Error)]
pub enum InstallError {
    /// File system failure while reading sources or writing artifacts
    #[error("I/O error for {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// A profile path or artifact name escaped the project root
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl InstallError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Get the error code for CLI output
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "WRITE_FAILURE",
            Self::Path(_) => "PATH_REJECTED",
            Self::Hook(e) => e.code(),
            Self::Profile(e) => e.code(),
            Self::Transform(e) => e.code(),
        }
    }
}
