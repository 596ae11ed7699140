//! CLI operations behind the `quire` binary.
//!
//! Provides one function per subcommand:
//! - [`run_import`] - synchronize the entity store with an analyzer dump
//! - [`run_render`] - render the stale parts of the project
//! - [`run_status`] - report the pending diff without rendering
//! - [`run_clean`] - remove the store and/or the build output
//!
//! ## Configuration
//!
//! Every operation takes a resolved [`ProjectConfig`]. [`CliSettings`]
//! carries the global flags and turns them into one with
//! [`CliSettings::resolve`]: an explicit `--config` file, else `quire.json`
//! in the current directory, else defaults; command-line values win.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, QuireError>`. The `QuireError` type
//! provides stable error codes for JSON output and process exit codes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use quire_core::config::{ProjectConfig, CONFIG_FILE_NAME};
use quire_core::diff::Diff;
use quire_core::error::QuireError;
use quire_core::project::Project;
use quire_core::reflection::{Entity, EntityKind};
use quire_core::render::{RenderProgress, Renderer, ThemeSet};
use quire_core::store::{JsonStore, Store};

use crate::engine::PlaceholderEngine;
use crate::output::{CleanResponse, DiffResponse, ImportResponse};

/// Directory searched for themes when no `--themes-dir` is given.
pub const DEFAULT_THEMES_DIR: &str = "themes";

// ============================================================================
// Settings
// ============================================================================

/// Global command-line settings.
#[derive(Debug, Clone, Default)]
pub struct CliSettings {
    /// Configuration file; `quire.json` in `base_dir` when absent.
    pub config: Option<PathBuf>,
    pub theme: Option<String>,
    pub build_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    /// Theme roots, later ones overriding earlier ones.
    pub themes_dirs: Vec<PathBuf>,
    /// Directory relative defaults resolve against.
    pub base_dir: PathBuf,
}

impl CliSettings {
    /// Build the project configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(ProjectConfig)` - file values overridden by flags
    /// * `Err(QuireError::NotFound)` - an explicit `--config` file is missing
    /// * `Err(QuireError::InvalidArguments)` - the config file does not parse
    pub fn resolve(&self) -> Result<ProjectConfig, QuireError> {
        let default_file = self.base_dir.join(CONFIG_FILE_NAME);
        let mut config = match &self.config {
            Some(path) => ProjectConfig::load(path)?,
            None if default_file.is_file() => ProjectConfig::load(&default_file)?,
            None => ProjectConfig::new(self.base_dir.join("build"), self.base_dir.join("cache")),
        };

        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
        if let Some(dir) = &self.build_dir {
            config.build_dir = dir.clone();
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        Ok(config)
    }

    /// Theme roots to discover themes in.
    pub fn theme_roots(&self) -> Vec<PathBuf> {
        if self.themes_dirs.is_empty() {
            vec![self.base_dir.join(DEFAULT_THEMES_DIR)]
        } else {
            self.themes_dirs.clone()
        }
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Import analyzer output into the store.
///
/// The input is a JSON array of entity records; each may carry an
/// `"entity": "class" | "function"` marker (class when absent). The store
/// ends up holding exactly the imported entities.
///
/// # Arguments
///
/// * `config` - Resolved project configuration (provides the store dir)
/// * `input` - Path of the JSON entity dump
///
/// # Returns
///
/// * `Ok(ImportResponse)` - counts of imported and removed entities
/// * `Err(QuireError::InvalidArguments)` - the dump is not a JSON array of entities
pub fn run_import(config: &ProjectConfig, input: &Path) -> Result<ImportResponse, QuireError> {
    let content = fs::read_to_string(input).map_err(|e| QuireError::NotFound {
        what: format!("input {} ({})", input.display(), e),
    })?;
    let records: Vec<serde_json::Value> = serde_json::from_str(&content).map_err(|e| {
        QuireError::invalid_args_with_details(
            format!("{} is not a JSON array of entities", input.display()),
            serde_json::json!({ "reason": e.to_string() }),
        )
    })?;

    let mut project = Project::new(config.clone());
    for record in records {
        project.add_entity(Entity::from_tagged_value(record)?);
    }

    let mut store = JsonStore::new(config.store_dir());
    let removed = store
        .list_all()?
        .iter()
        .filter(|entity| match entity.kind() {
            EntityKind::Class => project.class(entity.name()).is_none(),
            EntityKind::Function => project.function(entity.name()).is_none(),
        })
        .count();
    project.persist(&mut store)?;

    let classes = project.classes().count();
    let functions = project.functions().count();
    info!(classes, functions, removed, "imported entities");
    Ok(ImportResponse::new(classes, functions, removed, store.dir()))
}

/// Render the project held in the store.
///
/// # Arguments
///
/// * `config` - Resolved project configuration
/// * `theme_roots` - Directories to discover themes in
/// * `force` - Flush the template cache first
///
/// # Returns
///
/// * `Ok(DiffResponse)` - counts of what was rendered
/// * `Err(QuireError)` - theme lookup or rendering failed; no snapshot is committed
pub fn run_render(
    config: &ProjectConfig,
    theme_roots: &[PathBuf],
    force: bool,
) -> Result<DiffResponse, QuireError> {
    let project = load_project(config)?;
    let themes = ThemeSet::discover(theme_roots)?;
    let mut renderer = Renderer::new(PlaceholderEngine::new(), themes);

    let mut log_progress = |progress: &RenderProgress<'_>| {
        info!(
            stage = %progress.stage,
            subject = progress.subject,
            step = progress.step,
            total = progress.total,
            "render progress"
        );
    };
    let diff = renderer.render(&project, Some(&mut log_progress), force)?;

    Ok(DiffResponse::new(
        &diff.summary(),
        !diff.is_empty(),
        &config.build_dir,
    ))
}

/// Report the pending diff without rendering.
pub fn run_status(config: &ProjectConfig) -> Result<DiffResponse, QuireError> {
    let project = load_project(config)?;
    let diff = Diff::compute(&project)?;
    Ok(DiffResponse::new(&diff.summary(), false, &config.build_dir))
}

/// Remove the store and/or the build output. Both when neither is requested.
pub fn run_clean(
    config: &ProjectConfig,
    store: bool,
    build: bool,
) -> Result<CleanResponse, QuireError> {
    let clean_store = store || !build;
    let clean_build = build || !store;

    if clean_store {
        JsonStore::new(config.store_dir()).clear()?;
    }
    if clean_build && config.build_dir.exists() {
        fs::remove_dir_all(&config.build_dir).map_err(|e| QuireError::RenderFailed {
            message: format!("failed to remove build output: {}", e),
            path: Some(config.build_dir.display().to_string()),
        })?;
    }
    info!(store = clean_store, build = clean_build, "cleaned");
    Ok(CleanResponse::new(clean_store, clean_build))
}

fn load_project(config: &ProjectConfig) -> Result<Project, QuireError> {
    let store = JsonStore::new(config.store_dir());
    Ok(Project::load(config.clone(), &store)?)
}
