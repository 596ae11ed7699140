//! Themes: named template sets with output targets.
//!
//! A theme is a directory holding a `manifest.json` and its templates:
//!
//! ```json
//! {
//!   "name": "default",
//!   "parent": null,
//!   "static":    { "css/main.css": "css/main.css" },
//!   "global":    { "index.tpl": "index.html" },
//!   "namespace": { "namespace.tpl": "%s.html" },
//!   "class":     { "class.tpl": "%s.html" }
//! }
//! ```
//!
//! Each map goes from template name to output target. Namespace and class
//! targets contain `%s`, replaced by the qualified name with `\` mapped to
//! `/`. A child theme inherits its parent's templates and searches its own
//! directory before the parent's.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Manifest file name inside a theme directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Errors raised while discovering or resolving themes.
#[derive(Debug, Error)]
pub enum ThemeError {
    /// No theme with this name was discovered.
    #[error("theme not found: {name}")]
    NotFound { name: String },

    /// A manifest could not be read or parsed.
    #[error("invalid theme manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    /// A parent chain loops back on itself.
    #[error("theme inheritance cycle at {name}")]
    Cycle { name: String },

    #[error("theme I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for theme operations.
pub type ThemeResult<T> = Result<T, ThemeError>;

/// Template scope: when and how often a template is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateScope {
    /// Copied verbatim.
    Static,
    /// Rendered once per build.
    Global,
    /// Rendered once per namespace.
    Namespace,
    /// Rendered once per class.
    Class,
}

/// On-disk theme manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeManifest {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default, rename = "static")]
    pub static_files: IndexMap<String, String>,
    #[serde(default)]
    pub global: IndexMap<String, String>,
    #[serde(default)]
    pub namespace: IndexMap<String, String>,
    #[serde(default)]
    pub class: IndexMap<String, String>,
}

impl ThemeManifest {
    fn scope(&self, scope: TemplateScope) -> &IndexMap<String, String> {
        match scope {
            TemplateScope::Static => &self.static_files,
            TemplateScope::Global => &self.global,
            TemplateScope::Namespace => &self.namespace,
            TemplateScope::Class => &self.class,
        }
    }
}

/// A theme with its inheritance resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    name: String,
    dirs: Vec<PathBuf>,
    templates: BTreeMap<TemplateScope, IndexMap<String, String>>,
}

impl Theme {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template directories, most specific first.
    pub fn template_dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Templates of a scope, as `template -> target`.
    pub fn templates(&self, scope: TemplateScope) -> impl Iterator<Item = (&str, &str)> {
        self.templates
            .get(&scope)
            .into_iter()
            .flat_map(|map| map.iter().map(|(t, target)| (t.as_str(), target.as_str())))
    }

    pub fn template_count(&self, scope: TemplateScope) -> usize {
        self.templates.get(&scope).map_or(0, IndexMap::len)
    }

    /// Engine search path: every template directory followed by each one's
    /// parent, without duplicates. Parents let a template extend the
    /// same-named template of another theme.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.dirs
            .iter()
            .cloned()
            .chain(self.dirs.iter().filter_map(|d| d.parent().map(Path::to_path_buf)))
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }

    /// First directory (most specific first) holding `file`.
    pub fn locate(&self, file: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(file))
            .find(|path| path.is_file())
    }
}

/// All discovered themes, by name.
#[derive(Debug, Clone, Default)]
pub struct ThemeSet {
    manifests: BTreeMap<String, (ThemeManifest, PathBuf)>,
}

impl ThemeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover every theme below the given roots. A later root overrides
    /// an earlier one when names collide.
    pub fn discover<P: AsRef<Path>>(roots: &[P]) -> ThemeResult<Self> {
        let mut set = ThemeSet::new();
        for root in roots {
            let root = root.as_ref();
            if !root.is_dir() {
                continue;
            }
            for entry in WalkDir::new(root).max_depth(2).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    ThemeError::Io(
                        e.into_io_error()
                            .unwrap_or_else(|| io::Error::other("theme directory walk failed")),
                    )
                })?;
                if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE_NAME {
                    set.load_manifest(entry.path())?;
                }
            }
        }
        Ok(set)
    }

    fn load_manifest(&mut self, path: &Path) -> ThemeResult<()> {
        let manifest_err = |reason: String| ThemeError::Manifest {
            path: path.to_path_buf(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| manifest_err(e.to_string()))?;
        let manifest: ThemeManifest =
            serde_json::from_str(&content).map_err(|e| manifest_err(e.to_string()))?;
        if manifest.name.is_empty() {
            return Err(manifest_err("theme name must not be empty".to_string()));
        }
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        debug!(theme = %manifest.name, dir = %dir.display(), "discovered theme");
        self.add(manifest, dir);
        Ok(())
    }

    /// Register a theme whose templates live in `dir`.
    pub fn add(&mut self, manifest: ThemeManifest, dir: impl Into<PathBuf>) {
        self.manifests
            .insert(manifest.name.clone(), (manifest, dir.into()));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.manifests.keys().map(String::as_str)
    }

    /// Resolve a theme and its parents.
    pub fn theme(&self, name: &str) -> ThemeResult<Theme> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(name);
        while let Some(theme_name) = current {
            if !seen.insert(theme_name) {
                return Err(ThemeError::Cycle {
                    name: theme_name.to_string(),
                });
            }
            let (manifest, dir) =
                self.manifests
                    .get(theme_name)
                    .ok_or_else(|| ThemeError::NotFound {
                        name: theme_name.to_string(),
                    })?;
            chain.push((manifest, dir));
            current = manifest.parent.as_deref();
        }

        let dirs = chain.iter().map(|(_, dir)| dir.to_path_buf()).collect();
        let mut templates = BTreeMap::new();
        for scope in [
            TemplateScope::Static,
            TemplateScope::Global,
            TemplateScope::Namespace,
            TemplateScope::Class,
        ] {
            let mut merged = IndexMap::new();
            // Root ancestor first so descendants override.
            for (manifest, _) in chain.iter().rev() {
                for (template, target) in manifest.scope(scope) {
                    merged.insert(template.clone(), target.clone());
                }
            }
            templates.insert(scope, merged);
        }

        Ok(Theme {
            name: name.to_string(),
            dirs,
            templates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_theme(root: &Path, dir: &str, manifest: &str) -> PathBuf {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE_NAME), manifest).unwrap();
        dir
    }

    #[test]
    fn test_discover_and_resolve() {
        let temp = TempDir::new().unwrap();
        let dir = write_theme(
            temp.path(),
            "default",
            r#"{"name": "default", "global": {"index.tpl": "index.html"},
                "class": {"class.tpl": "%s.html"}}"#,
        );

        let set = ThemeSet::discover(&[temp.path()]).unwrap();
        let theme = set.theme("default").unwrap();
        assert_eq!(theme.template_dirs(), [dir]);
        assert_eq!(theme.template_count(TemplateScope::Global), 1);
        assert_eq!(
            theme.templates(TemplateScope::Class).collect::<Vec<_>>(),
            vec![("class.tpl", "%s.html")]
        );
        assert_eq!(theme.template_count(TemplateScope::Namespace), 0);
    }

    #[test]
    fn test_child_inherits_and_overrides() {
        let temp = TempDir::new().unwrap();
        let base = write_theme(
            temp.path(),
            "base",
            r#"{"name": "base", "global": {"index.tpl": "index.html", "search.tpl": "search.html"}}"#,
        );
        let child = write_theme(
            temp.path(),
            "child",
            r#"{"name": "child", "parent": "base", "global": {"index.tpl": "home.html"}}"#,
        );

        let set = ThemeSet::discover(&[temp.path()]).unwrap();
        let theme = set.theme("child").unwrap();
        assert_eq!(theme.template_dirs(), [child.clone(), base.clone()]);

        let globals: Vec<(&str, &str)> = theme.templates(TemplateScope::Global).collect();
        assert_eq!(
            globals,
            vec![("index.tpl", "home.html"), ("search.tpl", "search.html")]
        );

        // Both theme dirs share a parent, which appears once.
        assert_eq!(
            theme.search_paths(),
            vec![child, base, temp.path().to_path_buf()]
        );
    }

    #[test]
    fn test_locate_prefers_child() {
        let temp = TempDir::new().unwrap();
        let base = write_theme(temp.path(), "base", r#"{"name": "base"}"#);
        let child = write_theme(temp.path(), "child", r#"{"name": "child", "parent": "base"}"#);
        fs::write(base.join("main.css"), "base").unwrap();
        fs::write(base.join("only-base.css"), "base").unwrap();
        fs::write(child.join("main.css"), "child").unwrap();

        let theme = ThemeSet::discover(&[temp.path()]).unwrap().theme("child").unwrap();
        assert_eq!(theme.locate("main.css"), Some(child.join("main.css")));
        assert_eq!(theme.locate("only-base.css"), Some(base.join("only-base.css")));
        assert_eq!(theme.locate("missing.css"), None);
    }

    #[test]
    fn test_missing_theme_and_parent() {
        let temp = TempDir::new().unwrap();
        write_theme(temp.path(), "orphan", r#"{"name": "orphan", "parent": "gone"}"#);
        let set = ThemeSet::discover(&[temp.path()]).unwrap();

        assert!(matches!(set.theme("nope"), Err(ThemeError::NotFound { .. })));
        assert!(matches!(set.theme("orphan"), Err(ThemeError::NotFound { .. })));
    }

    #[test]
    fn test_cycle_detected() {
        let mut set = ThemeSet::new();
        set.add(
            ThemeManifest {
                name: "a".into(),
                parent: Some("b".into()),
                ..Default::default()
            },
            "/themes/a",
        );
        set.add(
            ThemeManifest {
                name: "b".into(),
                parent: Some("a".into()),
                ..Default::default()
            },
            "/themes/b",
        );
        assert!(matches!(set.theme("a"), Err(ThemeError::Cycle { .. })));
    }

    #[test]
    fn test_invalid_manifest() {
        let temp = TempDir::new().unwrap();
        write_theme(temp.path(), "bad", "{ nope");
        assert!(matches!(
            ThemeSet::discover(&[temp.path()]),
            Err(ThemeError::Manifest { .. })
        ));
    }
}
