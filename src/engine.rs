//! A minimal file-system template engine.
//!
//! Templates are plain text files resolved against the search path. The only
//! syntax is `{{ path.to.value }}`, optionally followed by a filter:
//!
//! - `{{ class.short_desc | desc }}` renders the value with [`describe`]
//! - `{{ class.long_desc | snippet }}` renders the value with [`snippet`]
//!
//! Paths resolve against the render context first and the engine globals
//! second. Missing values render as the empty string. Strings render as-is,
//! scalars with their JSON text and arrays/objects as compact JSON.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use quire_core::render::{describe, snippet, TemplateEngine, TemplateError};

/// `{{ path }}` or `{{ path | filter }}`.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*(?:\|\s*([a-z_]+)\s*)?\}\}").unwrap()
});

#[derive(Debug, Default)]
pub struct PlaceholderEngine {
    cache_dir: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    globals: BTreeMap<String, Value>,
    /// Loaded template sources keyed by resolved path.
    sources: HashMap<PathBuf, String>,
}

impl PlaceholderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// First directory on the search path holding `template`.
    pub fn resolve(&self, template: &str) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|dir| dir.join(template))
            .find(|path| path.is_file())
    }

    fn source(&mut self, template: &str) -> Result<String, TemplateError> {
        let path = self.resolve(template).ok_or_else(|| TemplateError::NotFound {
            template: template.to_string(),
        })?;
        if let Some(source) = self.sources.get(&path) {
            return Ok(source.clone());
        }
        let source = fs::read_to_string(&path)?;
        debug!(template, path = %path.display(), "loaded template");
        self.sources.insert(path, source.clone());
        Ok(source)
    }

    fn lookup<'v>(&'v self, context: &'v Value, path: &str) -> Option<&'v Value> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        let mut value = context.get(head).or_else(|| self.globals.get(head))?;
        for segment in segments {
            value = match value {
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                other => other.get(segment)?,
            };
        }
        Some(value)
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TemplateEngine for PlaceholderEngine {
    fn set_cache_dir(&mut self, dir: &Path) -> Result<(), TemplateError> {
        fs::create_dir_all(dir)?;
        // Called at the start of every render, including forced ones.
        self.sources.clear();
        self.cache_dir = Some(dir.to_path_buf());
        Ok(())
    }

    fn set_search_paths(&mut self, paths: Vec<PathBuf>) {
        if paths != self.search_paths {
            self.sources.clear();
        }
        self.search_paths = paths;
    }

    fn add_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    fn render(&mut self, template: &str, context: &Value) -> Result<String, TemplateError> {
        let source = self.source(template)?;

        let mut unknown_filter = None;
        let output = PLACEHOLDER.replace_all(&source, |caps: &Captures<'_>| {
            let text = self.lookup(context, &caps[1]).map(display).unwrap_or_default();
            match caps.get(2).map(|m| m.as_str()) {
                None => text,
                Some("desc") => describe(&text),
                Some("snippet") => snippet(&text),
                Some(other) => {
                    unknown_filter.get_or_insert_with(|| other.to_string());
                    String::new()
                }
            }
        });

        if let Some(filter) = unknown_filter {
            return Err(TemplateError::render(
                template,
                format!("unknown filter '{}'", filter),
            ));
        }
        Ok(output.into_owned())
    }
}
