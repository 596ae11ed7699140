//! Unified error type and error codes for quire.
//!
//! Each subsystem has its own error enum. [`QuireError`] bridges them into a
//! single type for JSON output and process exit codes.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad config, unknown theme, malformed input)
//! - `3`: Not found (entity or template missing)
//! - `4`: Render failed (template failure, output could not be written)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::diff::DiffError;
use crate::reflection::ReflectionError;
use crate::render::{RenderError, TemplateError, ThemeError};
use crate::store::StoreError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes for JSON output and CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed configuration).
    InvalidArguments = 2,
    /// A named entity, theme or template does not exist.
    NotFound = 3,
    /// Rendering failed or output could not be written.
    RenderFailed = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum QuireError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Entity, theme or template not found.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Rendering aborted.
    #[error("render failed: {message}")]
    RenderFailed {
        message: String,
        path: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&QuireError> for OutputErrorCode {
    fn from(err: &QuireError) -> Self {
        match err {
            QuireError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            QuireError::NotFound { .. } => OutputErrorCode::NotFound,
            QuireError::RenderFailed { .. } => OutputErrorCode::RenderFailed,
            QuireError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<QuireError> for OutputErrorCode {
    fn from(err: QuireError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<ConfigError> for QuireError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io { path, source } => QuireError::NotFound {
                what: format!("config {} ({})", path.display(), source),
            },
            err @ ConfigError::Parse { .. } => QuireError::invalid_args(err.to_string()),
        }
    }
}

impl From<ReflectionError> for QuireError {
    fn from(err: ReflectionError) -> Self {
        QuireError::invalid_args(err.to_string())
    }
}

impl From<StoreError> for QuireError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, name } => QuireError::NotFound {
                what: format!("{} {}", kind, name),
            },
            StoreError::Reflection(err) => QuireError::from(err),
            other => QuireError::internal(other.to_string()),
        }
    }
}

impl From<DiffError> for QuireError {
    fn from(err: DiffError) -> Self {
        match err {
            DiffError::Io { path, source } => QuireError::RenderFailed {
                message: format!("failed to write snapshot: {}", source),
                path: Some(path.display().to_string()),
            },
            other => QuireError::internal(other.to_string()),
        }
    }
}

impl From<ThemeError> for QuireError {
    fn from(err: ThemeError) -> Self {
        match err {
            ThemeError::NotFound { name } => QuireError::NotFound {
                what: format!("theme {}", name),
            },
            other => QuireError::invalid_args(other.to_string()),
        }
    }
}

impl From<TemplateError> for QuireError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound { template } => QuireError::NotFound {
                what: format!("template {}", template),
            },
            other => QuireError::RenderFailed {
                message: other.to_string(),
                path: None,
            },
        }
    }
}

impl From<RenderError> for QuireError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Theme(err) => QuireError::from(err),
            RenderError::Template(err) => QuireError::from(err),
            RenderError::Diff(err) => QuireError::from(err),
            RenderError::Reflection(err) => QuireError::from(err),
            RenderError::TemplateDirMissing { theme, path } => QuireError::NotFound {
                what: format!("template directory {} of theme {}", path.display(), theme),
            },
            RenderError::Io { path, source } => QuireError::RenderFailed {
                message: source.to_string(),
                path: Some(path.display().to_string()),
            },
            RenderError::Json(err) => QuireError::internal(format!("JSON error: {}", err)),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl QuireError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        QuireError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        QuireError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        QuireError::NotFound { what: what.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        QuireError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
