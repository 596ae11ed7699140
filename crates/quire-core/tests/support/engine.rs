//! Template engine that records every render.
//!
//! Templates are resolved against the search path like a real engine, but
//! their content is ignored: each page is written as a JSON document holding
//! the template name, the link globals and the full context, so tests can
//! inspect exactly what a template would have received.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use quire_core::render::{TemplateEngine, TemplateError};

/// One recorded render call.
#[derive(Debug, Clone)]
pub struct RenderCall {
    pub template: String,
    pub root_path: String,
    pub context: Value,
}

#[derive(Debug, Default)]
pub struct RecordingEngine {
    cache_dir: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    globals: BTreeMap<String, Value>,
    calls: Vec<RenderCall>,
    fail_on: Option<String>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose renders of `template` fail.
    pub fn failing_on(template: &str) -> Self {
        RecordingEngine {
            fail_on: Some(template.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    /// Forget recorded calls, e.g. between two renders.
    pub fn reset(&mut self) {
        self.calls.clear();
    }

    pub fn stop_failing(&mut self) {
        self.fail_on = None;
    }

    /// Class names of every class template rendered so far.
    pub fn rendered_classes(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| c.context["class"]["name"].as_str().map(str::to_string))
            .collect()
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }
}

impl TemplateEngine for RecordingEngine {
    fn set_cache_dir(&mut self, dir: &Path) -> Result<(), TemplateError> {
        fs::create_dir_all(dir)?;
        self.cache_dir = Some(dir.to_path_buf());
        Ok(())
    }

    fn set_search_paths(&mut self, paths: Vec<PathBuf>) {
        self.search_paths = paths;
    }

    fn add_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    fn render(&mut self, template: &str, context: &Value) -> Result<String, TemplateError> {
        if !self
            .search_paths
            .iter()
            .any(|dir| dir.join(template).is_file())
        {
            return Err(TemplateError::NotFound {
                template: template.to_string(),
            });
        }
        if self.fail_on.as_deref() == Some(template) {
            return Err(TemplateError::render(template, "forced failure"));
        }

        let root_path = self
            .globals
            .get("root_path")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.calls.push(RenderCall {
            template: template.to_string(),
            root_path: root_path.clone(),
            context: context.clone(),
        });
        Ok(json!({
            "template": template,
            "root_path": root_path,
            "context": context,
        })
        .to_string())
    }
}
