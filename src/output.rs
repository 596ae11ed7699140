//! JSON output types for CLI responses.
//!
//! Every command prints exactly one pretty-printed JSON document on stdout.
//! `status` is always the first field; failures use [`ErrorResponse`].

use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use quire_core::diff::DiffSummary;
use quire_core::error::{OutputErrorCode, QuireError};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Errors
// ============================================================================

/// Error information carried by [`ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, also used as the process exit code.
    pub code: u8,
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn from_error(err: &QuireError) -> Self {
        let details = match err {
            QuireError::InvalidArguments { details, .. } => details.clone(),
            QuireError::RenderFailed {
                path: Some(path), ..
            } => Some(serde_json::json!({ "path": path })),
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &QuireError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Command Responses
// ============================================================================

/// Response for `quire import`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub status: String,
    pub schema_version: String,
    pub classes: usize,
    pub functions: usize,
    /// Stored entities removed because the import no longer contains them.
    pub removed: usize,
    pub store_dir: String,
}

impl ImportResponse {
    pub fn new(classes: usize, functions: usize, removed: usize, store_dir: &Path) -> Self {
        ImportResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            classes,
            functions,
            removed,
            store_dir: store_dir.display().to_string(),
        }
    }
}

/// Response for `quire render` and `quire status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResponse {
    pub status: String,
    pub schema_version: String,
    /// Whether pages were written by this command.
    pub rendered: bool,
    pub already_rendered: bool,
    pub modified_classes: usize,
    pub removed_classes: usize,
    pub modified_functions: usize,
    pub removed_functions: usize,
    pub modified_namespaces: usize,
    pub removed_namespaces: usize,
    pub build_dir: String,
}

impl DiffResponse {
    pub fn new(summary: &DiffSummary, rendered: bool, build_dir: &Path) -> Self {
        DiffResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            rendered,
            already_rendered: summary.already_rendered,
            modified_classes: summary.modified_classes,
            removed_classes: summary.removed_classes,
            modified_functions: summary.modified_functions,
            removed_functions: summary.removed_functions,
            modified_namespaces: summary.modified_namespaces,
            removed_namespaces: summary.removed_namespaces,
            build_dir: build_dir.display().to_string(),
        }
    }
}

/// Response for `quire clean`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanResponse {
    pub status: String,
    pub schema_version: String,
    pub store_cleaned: bool,
    pub build_cleaned: bool,
}

impl CleanResponse {
    pub fn new(store_cleaned: bool, build_cleaned: bool) -> Self {
        CleanResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            store_cleaned,
            build_cleaned,
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_first_field() {
        let response = CleanResponse::new(true, false);
        let mut out = Vec::new();
        emit_response(&response, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.trim_start().starts_with("{\n  \"status\": \"ok\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_error_response_carries_code() {
        let err = QuireError::not_found("theme dark");
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.status, "error");
        assert_eq!(response.error.code, 3);
        assert_eq!(response.error.message, "not found: theme dark");

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_render_failure_details_include_path() {
        let err = QuireError::RenderFailed {
            message: "disk full".to_string(),
            path: Some("build/index.html".to_string()),
        };
        let info = ErrorInfo::from_error(&err);
        assert_eq!(info.code, 4);
        assert_eq!(info.details.unwrap()["path"], "build/index.html");
    }
}
