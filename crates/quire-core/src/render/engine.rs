//! The template engine seam.
//!
//! The renderer never interprets templates itself. It configures an engine
//! (cache directory, search path, globals) and asks it to turn a template
//! name plus a flat variable map into text.

use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reported by a template engine.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No directory on the search path holds the template.
    #[error("template not found: {template}")]
    NotFound { template: String },

    /// The template exists but rendering it failed.
    #[error("failed to render template {template}: {message}")]
    Render { template: String, message: String },

    /// File system failure while loading a template or using the cache.
    #[error("template I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TemplateError {
    pub fn render(template: impl Into<String>, message: impl Into<String>) -> Self {
        TemplateError::Render {
            template: template.into(),
            message: message.into(),
        }
    }
}

/// A string-template renderer with file-system-backed template resolution.
pub trait TemplateEngine {
    /// Directory the engine may use to cache compiled templates.
    fn set_cache_dir(&mut self, dir: &Path) -> Result<(), TemplateError>;

    /// Directories searched for templates, in priority order.
    fn set_search_paths(&mut self, paths: Vec<PathBuf>);

    /// Variable visible to every template rendered afterwards.
    fn add_global(&mut self, name: &str, value: Value);

    /// Render `template` with `context` (a JSON object of named variables).
    fn render(&mut self, template: &str, context: &Value) -> Result<String, TemplateError>;
}

impl<E: TemplateEngine + ?Sized> TemplateEngine for Box<E> {
    fn set_cache_dir(&mut self, dir: &Path) -> Result<(), TemplateError> {
        (**self).set_cache_dir(dir)
    }

    fn set_search_paths(&mut self, paths: Vec<PathBuf>) {
        (**self).set_search_paths(paths)
    }

    fn add_global(&mut self, name: &str, value: Value) {
        (**self).add_global(name, value)
    }

    fn render(&mut self, template: &str, context: &Value) -> Result<String, TemplateError> {
        (**self).render(template, context)
    }
}
