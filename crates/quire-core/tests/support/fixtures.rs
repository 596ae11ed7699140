//! On-disk fixtures: a temp workspace with a theme, build and cache dirs.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use quire_core::config::ProjectConfig;
use quire_core::project::Project;
use quire_core::reflection::{ClassEntity, MethodEntity, Reflection};
use quire_core::render::{Renderer, ThemeSet, MANIFEST_FILE_NAME};

use super::engine::RecordingEngine;

/// Manifest of the theme every workspace starts with.
pub const DEFAULT_MANIFEST: &str = r#"{
    "name": "default",
    "static": { "css/main.css": "css/main.css" },
    "global": { "index.tpl": "index.html", "classes.tpl": "classes.html" },
    "namespace": { "namespace.tpl": "%s.html" },
    "class": { "class.tpl": "%s.html" }
}"#;

/// Write a theme directory holding `manifest` and the given files.
pub fn write_theme(root: &Path, dir: &str, manifest: &str, files: &[&str]) -> PathBuf {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).expect("create theme dir");
    fs::write(dir.join(MANIFEST_FILE_NAME), manifest).expect("write manifest");
    for file in files {
        let path = dir.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create template dir");
        }
        fs::write(&path, format!("template {}", file)).expect("write template");
    }
    dir
}

/// A temp directory with `themes/`, `build/` and `cache/`.
pub struct Workspace {
    pub temp: TempDir,
}

impl Workspace {
    /// Workspace with the default theme installed.
    pub fn create() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        write_theme(
            &temp.path().join("themes"),
            "default",
            DEFAULT_MANIFEST,
            &[
                "index.tpl",
                "classes.tpl",
                "namespace.tpl",
                "class.tpl",
                "css/main.css",
            ],
        );
        Workspace { temp }
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.temp.path().join("themes")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.temp.path().join("build")
    }

    pub fn config(&self) -> ProjectConfig {
        ProjectConfig::new(self.build_dir(), self.temp.path().join("cache"))
    }

    pub fn project(&self, classes: Vec<ClassEntity>) -> Project {
        let mut project = Project::new(self.config());
        for class in classes {
            project.add_class(class);
        }
        project
    }

    pub fn renderer(&self) -> Renderer<RecordingEngine> {
        self.renderer_with(RecordingEngine::new())
    }

    pub fn renderer_with(&self, engine: RecordingEngine) -> Renderer<RecordingEngine> {
        let themes = ThemeSet::discover(&[self.themes_dir()]).expect("discover themes");
        Renderer::new(engine, themes)
    }

    /// Path of a rendered file relative to the build dir.
    pub fn output(&self, rel: &str) -> PathBuf {
        self.build_dir().join(rel)
    }

    /// Parse a page written by the recording engine.
    pub fn page(&self, rel: &str) -> Value {
        let content = fs::read_to_string(self.output(rel)).expect("read page");
        serde_json::from_str(&content).expect("parse page")
    }
}

/// A class with one documented method.
pub fn class(name: &str) -> ClassEntity {
    let mut class = ClassEntity::new(name, 1);
    class.set_short_desc(format!("The {} class.", name));
    let mut method = MethodEntity::new("run", 2);
    method.set_short_desc("Run it.");
    class.add_method(method);
    class
}
