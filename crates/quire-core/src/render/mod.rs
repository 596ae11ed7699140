//! Render orchestration.
//!
//! [`Renderer::render`] turns a project into an output tree, touching only
//! what the [`Diff`] against the last committed snapshot says is stale:
//!
//! 1. with `force`, the engine's template cache is flushed
//! 2. the diff is computed; an empty diff returns without writing anything
//! 3. static assets are copied from the theme
//! 4. global templates are rendered once
//! 5. namespace templates are rendered per modified namespace
//! 6. class templates are rendered per modified class
//! 7. pages of removed classes and namespaces are deleted
//! 8. the new snapshot is committed
//!
//! A template failure aborts the run before the snapshot is committed, so
//! the next run sees every page of this run as stale again.

mod context;
mod engine;
mod helpers;
mod index;
mod theme;
mod tree;

pub use engine::{TemplateEngine, TemplateError};
pub use helpers::{abbr_class, describe, name_to_path, root_path, snippet, LinkHelper};
pub use index::{items_index, IndexItem, SearchEntry, SearchIndex, SearchIndexer};
pub use theme::{
    TemplateScope, Theme, ThemeError, ThemeManifest, ThemeResult, ThemeSet, MANIFEST_FILE_NAME,
};
pub use tree::{NamespaceTreeBuilder, TreeBuilder, TreeNode, TreeNodeKind};

use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::diff::{Diff, DiffError};
use crate::fsutil::{remove_path, write_with_parents};
use crate::project::Project;
use crate::reflection::{ClassEntity, Reflection, ReflectionError};

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while rendering a project.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The configured theme could not be resolved.
    #[error(transparent)]
    Theme(#[from] ThemeError),

    /// A directory of the selected theme does not exist.
    #[error("template directory of theme {theme} does not exist: {path}")]
    TemplateDirMissing { theme: String, path: PathBuf },

    /// The template engine failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The diff could not be computed or committed.
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Reflection(#[from] ReflectionError),

    /// Writing or deleting output failed.
    #[error("render I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> RenderError + '_ {
    move |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Render stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Static,
    Global,
    Namespace,
    Class,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStage::Static => write!(f, "Static"),
            RenderStage::Global => write!(f, "Global"),
            RenderStage::Namespace => write!(f, "Namespace"),
            RenderStage::Class => write!(f, "Class"),
        }
    }
}

/// One progress report. `step` counts completed units out of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress<'a> {
    pub stage: RenderStage,
    /// Target, namespace or class being rendered.
    pub subject: &'a str,
    pub step: usize,
    pub total: usize,
}

/// Progress callback accepted by [`Renderer::render`].
pub type ProgressCallback<'a> = &'a mut dyn FnMut(&RenderProgress<'_>);

struct Progress<'a> {
    callback: Option<ProgressCallback<'a>>,
    step: usize,
    total: usize,
}

impl Progress<'_> {
    fn report(&mut self, stage: RenderStage, subject: &str) {
        if let Some(callback) = self.callback.as_mut() {
            callback(&RenderProgress {
                stage,
                subject,
                step: self.step,
                total: self.total,
            });
        }
    }

    fn advance(&mut self) {
        self.step += 1;
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Drives a template engine over the stale parts of a project.
pub struct Renderer<E: TemplateEngine> {
    engine: E,
    themes: ThemeSet,
    tree_builder: Box<dyn TreeBuilder>,
    indexer: Box<dyn SearchIndexer>,
    /// Navigation tree per output directory, valid for one render.
    trees: HashMap<PathBuf, Value>,
}

impl<E: TemplateEngine> Renderer<E> {
    /// Renderer with the default tree builder and search indexer.
    pub fn new(engine: E, themes: ThemeSet) -> Self {
        Renderer {
            engine,
            themes,
            tree_builder: Box::new(NamespaceTreeBuilder),
            indexer: Box::new(SearchIndex),
            trees: HashMap::new(),
        }
    }

    pub fn with_tree_builder(mut self, builder: impl TreeBuilder + 'static) -> Self {
        self.tree_builder = Box::new(builder);
        self
    }

    pub fn with_indexer(mut self, indexer: impl SearchIndexer + 'static) -> Self {
        self.indexer = Box::new(indexer);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn themes(&self) -> &ThemeSet {
        &self.themes
    }

    /// True when the committed snapshot matches the project exactly.
    pub fn is_rendered(&self, project: &Project) -> RenderResult<bool> {
        Ok(Diff::compute(project)?.is_already_rendered())
    }

    /// Render the stale parts of `project` and commit the new snapshot.
    ///
    /// Returns the diff that was rendered. Nothing is written when the diff
    /// is empty.
    pub fn render(
        &mut self,
        project: &Project,
        progress: Option<ProgressCallback<'_>>,
        force: bool,
    ) -> RenderResult<Diff> {
        let config = project.config();
        let cache_dir = config.template_cache_dir();
        if force {
            remove_path(&cache_dir).map_err(io_error(&cache_dir))?;
            debug!(dir = %cache_dir.display(), "flushed template cache");
        }
        self.engine.set_cache_dir(&cache_dir)?;
        self.trees.clear();

        let diff = Diff::compute(project)?;
        if diff.is_empty() {
            info!("nothing to render");
            return Ok(diff);
        }

        let theme = self.themes.theme(&config.theme)?;
        for dir in theme.template_dirs() {
            if !dir.is_dir() {
                return Err(RenderError::TemplateDirMissing {
                    theme: theme.name().to_string(),
                    path: dir.clone(),
                });
            }
        }

        let mut progress = Progress {
            callback: progress,
            step: 0,
            total: diff.modified_namespaces().len()
                + diff.modified_classes().len()
                + theme.template_count(TemplateScope::Global)
                + 1,
        };

        self.engine.set_search_paths(theme.search_paths());
        self.engine
            .add_global("has_namespaces", json!(project.has_namespaces()));
        self.engine.add_global(
            "project",
            json!({
                "title": config.title,
                "version": config.version,
                "theme": theme.name(),
            }),
        );

        self.render_static(project, &theme, &mut progress)?;
        self.render_global(project, &theme, &mut progress)?;
        self.render_namespaces(project, &theme, diff.modified_namespaces(), &mut progress)?;
        self.render_classes(project, &theme, diff.modified_classes(), &mut progress)?;
        Self::cleanup(project, &theme, &diff)?;

        diff.save()?;
        Ok(diff)
    }

    fn render_static(
        &mut self,
        project: &Project,
        theme: &Theme,
        progress: &mut Progress<'_>,
    ) -> RenderResult<()> {
        info!(theme = theme.name(), "copying static files");
        progress.report(RenderStage::Static, "Rendering files");

        let build_dir = &project.config().build_dir;
        for (file, target) in theme.templates(TemplateScope::Static) {
            let Some(source) = theme.locate(file) else {
                warn!(file, theme = theme.name(), "static file not found in theme");
                continue;
            };
            let dest = build_dir.join(target);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
            fs::copy(&source, &dest).map_err(io_error(&dest))?;
            debug!(file, target, "copied static file");
        }
        progress.advance();
        Ok(())
    }

    fn render_global(
        &mut self,
        project: &Project,
        theme: &Theme,
        progress: &mut Progress<'_>,
    ) -> RenderResult<()> {
        info!(
            templates = theme.template_count(TemplateScope::Global),
            "rendering global templates"
        );
        let variables = json!({
            "namespaces": project.namespaces(),
            "interfaces": project
                .project_interfaces()
                .into_iter()
                .map(|c| context::class_view(project, c))
                .collect::<Vec<_>>(),
            "classes": project
                .project_classes()
                .into_iter()
                .map(|c| context::class_view(project, c))
                .collect::<Vec<_>>(),
            "items": serde_json::to_value(items_index(project))?,
            "index": serde_json::to_value(self.indexer.index(project))?,
            "tree": self.tree(project)?,
        });

        for (template, target) in theme.templates(TemplateScope::Global) {
            progress.report(RenderStage::Global, target);
            self.save(project, target, template, &variables)?;
            progress.advance();
        }
        Ok(())
    }

    fn render_namespaces(
        &mut self,
        project: &Project,
        theme: &Theme,
        namespaces: &[String],
        progress: &mut Progress<'_>,
    ) -> RenderResult<()> {
        info!(namespaces = namespaces.len(), "rendering namespace templates");
        let views = |classes: Vec<&ClassEntity>| {
            classes
                .into_iter()
                .map(|c| context::class_view(project, c))
                .collect::<Vec<_>>()
        };

        for namespace in namespaces {
            progress.report(RenderStage::Namespace, namespace);
            let variables = json!({
                "namespace": namespace,
                "subnamespaces": project.namespace_sub_namespaces(namespace),
                "functions": project
                    .namespace_functions(namespace)
                    .into_iter()
                    .map(|f| context::function_view(project, f))
                    .collect::<Vec<_>>(),
                "classes": views(project.namespace_classes(namespace)),
                "interfaces": views(project.namespace_interfaces(namespace)),
                "exceptions": views(project.namespace_exceptions(namespace)),
                "tree": self.tree(project)?,
            });
            for (template, target) in theme.templates(TemplateScope::Namespace) {
                let uri = target.replace("%s", &name_to_path(namespace));
                self.save(project, &uri, template, &variables)?;
            }
            progress.advance();
        }
        Ok(())
    }

    fn render_classes(
        &mut self,
        project: &Project,
        theme: &Theme,
        classes: &[String],
        progress: &mut Progress<'_>,
    ) -> RenderResult<()> {
        info!(classes = classes.len(), "rendering class templates");
        for name in classes {
            progress.report(RenderStage::Class, name);
            if let Some(class) = project.class(name) {
                let variables = self.class_variables(project, class)?;
                for (template, target) in theme.templates(TemplateScope::Class) {
                    let uri = target.replace("%s", &name_to_path(name));
                    self.save(project, &uri, template, &variables)?;
                }
            }
            progress.advance();
        }
        Ok(())
    }

    /// Members of a class page, merged with inherited members when
    /// configured and ordered per collection.
    fn class_variables(&mut self, project: &Project, class: &ClassEntity) -> RenderResult<Value> {
        let config = project.config();
        let deep = config.include_parent_data;
        let sort = &config.sort;

        let mut properties = project.properties(class, deep);
        sort.properties.apply(&mut properties, |p| p.name());
        let mut methods = project.methods(class, deep);
        sort.methods.apply(&mut methods, |m| m.name());
        let mut constants = project.constants(class, deep);
        sort.constants.apply(&mut constants, |c| c.name());
        let mut traits = project.traits(class, deep);
        sort.traits.apply(&mut traits, |t| t.name());
        let mut interfaces = project.interfaces(class);
        sort.interfaces.apply(&mut interfaces, |i| i.name());

        Ok(json!({
            "class": context::class_view(project, class),
            "properties": properties
                .into_iter()
                .map(|p| context::property_view(project, p))
                .collect::<Vec<_>>(),
            "methods": methods
                .into_iter()
                .map(|m| context::method_view(project, m))
                .collect::<Vec<_>>(),
            "constants": constants
                .into_iter()
                .map(|c| context::constant_view(project, c))
                .collect::<Vec<_>>(),
            "traits": traits.into_iter().map(context::class_ref_view).collect::<Vec<_>>(),
            "interfaces": interfaces
                .into_iter()
                .map(context::class_ref_view)
                .collect::<Vec<_>>(),
            "tree": self.tree(project)?,
        }))
    }

    /// Delete the pages of removed classes and namespaces.
    fn cleanup(project: &Project, theme: &Theme, diff: &Diff) -> RenderResult<()> {
        let build_dir = &project.config().build_dir;
        let stale = diff
            .removed_classes()
            .iter()
            .map(|name| (TemplateScope::Class, name))
            .chain(
                diff.removed_namespaces()
                    .iter()
                    .map(|name| (TemplateScope::Namespace, name)),
            );
        for (scope, name) in stale {
            for (_, target) in theme.templates(scope) {
                let file = build_dir.join(target.replace("%s", &name_to_path(name)));
                remove_path(&file).map_err(io_error(&file))?;
                debug!(file = %file.display(), "removed stale page");
            }
        }
        Ok(())
    }

    /// Navigation tree, built once per output directory.
    fn tree(&mut self, project: &Project) -> RenderResult<Value> {
        let key = project.config().build_dir.clone();
        if let Some(tree) = self.trees.get(&key) {
            return Ok(tree.clone());
        }
        let tree = serde_json::to_value(self.tree_builder.build(project))?;
        self.trees.insert(key, tree.clone());
        Ok(tree)
    }

    /// Render one page to `<build>/<uri>`.
    fn save(
        &mut self,
        project: &Project,
        uri: &str,
        template: &str,
        variables: &Value,
    ) -> RenderResult<()> {
        let links = LinkHelper::for_page(uri);
        self.engine.add_global("depth", json!(links.depth()));
        self.engine.add_global("root_path", json!(links.root()));

        let content = self.engine.render(template, variables)?;
        let file = project.config().build_dir.join(uri);
        write_with_parents(&file, content.as_bytes()).map_err(io_error(&file))?;
        debug!(template, uri, "rendered page");
        Ok(())
    }
}
