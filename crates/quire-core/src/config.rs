//! Project configuration.
//!
//! Configuration is read from a JSON file (`quire.json` by convention).
//! Relative paths in the file resolve against the file's directory. Custom
//! member ordering is only available programmatically.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "quire.json";

/// Default theme name.
pub const DEFAULT_THEME: &str = "default";

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration file is not valid JSON or has the wrong shape.
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// ============================================================================
// Member Ordering
// ============================================================================

/// Comparator over member names.
pub type NameComparator = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// How a member collection is ordered on class pages.
#[derive(Clone, Default)]
pub enum MemberOrdering {
    /// Keep declaration order.
    Declaration,
    /// Byte-wise order of names.
    #[default]
    ByName,
    /// Caller-supplied comparator over names.
    Custom(NameComparator),
}

impl MemberOrdering {
    /// Wrap a comparator.
    pub fn custom<F>(compare: F) -> Self
    where
        F: Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    {
        MemberOrdering::Custom(Arc::new(compare))
    }

    /// Sort `items` in place; `name` extracts the sort key. Sorting is stable.
    pub fn apply<T>(&self, items: &mut [T], name: impl Fn(&T) -> &str) {
        match self {
            MemberOrdering::Declaration => {}
            MemberOrdering::ByName => items.sort_by(|a, b| name(a).cmp(name(b))),
            MemberOrdering::Custom(compare) => items.sort_by(|a, b| compare(name(a), name(b))),
        }
    }

    /// Stable label for fingerprinting, `None` for custom comparators.
    pub(crate) fn label(&self) -> Option<&'static str> {
        match self {
            MemberOrdering::Declaration => Some("declaration"),
            MemberOrdering::ByName => Some("name"),
            MemberOrdering::Custom(_) => None,
        }
    }
}

impl fmt::Debug for MemberOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberOrdering::Declaration => write!(f, "Declaration"),
            MemberOrdering::ByName => write!(f, "ByName"),
            MemberOrdering::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl From<bool> for MemberOrdering {
    fn from(sort: bool) -> Self {
        if sort {
            MemberOrdering::ByName
        } else {
            MemberOrdering::Declaration
        }
    }
}

/// Ordering applied to each member collection of a class page.
#[derive(Debug, Clone, Default)]
pub struct SortConfig {
    pub properties: MemberOrdering,
    pub methods: MemberOrdering,
    pub constants: MemberOrdering,
    pub traits: MemberOrdering,
    pub interfaces: MemberOrdering,
}

// ============================================================================
// Project Configuration
// ============================================================================

/// Settings for one documented project.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Title shown by themes.
    pub title: String,
    /// Free-form version label shown by themes.
    pub version: Option<String>,
    /// Theme name.
    pub theme: String,
    /// Output directory for rendered pages.
    pub build_dir: PathBuf,
    /// Cache directory holding the store and the template cache.
    pub cache_dir: PathBuf,
    /// Merge inherited members into class pages.
    pub include_parent_data: bool,
    pub sort: SortConfig,
}

impl ProjectConfig {
    /// Configuration with defaults and the given directories.
    pub fn new(build_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        ProjectConfig {
            title: "API".to_string(),
            version: None,
            theme: DEFAULT_THEME.to_string(),
            build_dir: build_dir.into(),
            cache_dir: cache_dir.into(),
            include_parent_data: true,
            sort: SortConfig::default(),
        }
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(file.into_config(base))
    }

    /// Directory for the durable entity store.
    pub fn store_dir(&self) -> PathBuf {
        self.cache_dir.join("store")
    }

    /// Directory handed to the template engine as its cache.
    pub fn template_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("templates")
    }

    /// Settings that change every rendered page when they change.
    ///
    /// Custom comparators have no stable identity and are left out.
    pub(crate) fn render_settings(&self) -> serde_json::Value {
        serde_json::json!({
            "theme": self.theme,
            "title": self.title,
            "version": self.version,
            "include_parent_data": self.include_parent_data,
            "sort": {
                "properties": self.sort.properties.label(),
                "methods": self.sort.methods.label(),
                "constants": self.sort.constants.label(),
                "traits": self.sort.traits.label(),
                "interfaces": self.sort.interfaces.label(),
            },
        })
    }
}

/// On-disk shape of the configuration file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    title: Option<String>,
    version: Option<String>,
    theme: Option<String>,
    build_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    include_parent_data: Option<bool>,
    sort_class_properties: Option<bool>,
    sort_class_methods: Option<bool>,
    sort_class_constants: Option<bool>,
    sort_class_traits: Option<bool>,
    sort_class_interfaces: Option<bool>,
}

impl ConfigFile {
    fn into_config(self, base: &Path) -> ProjectConfig {
        let resolve = |p: Option<PathBuf>, default: &str| {
            let p = p.unwrap_or_else(|| PathBuf::from(default));
            if p.is_absolute() {
                p
            } else {
                base.join(p)
            }
        };
        let ordering = |v: Option<bool>| v.map(MemberOrdering::from).unwrap_or_default();

        let mut config = ProjectConfig::new(
            resolve(self.build_dir, "build"),
            resolve(self.cache_dir, "cache"),
        );
        if let Some(title) = self.title {
            config.title = title;
        }
        config.version = self.version;
        if let Some(theme) = self.theme {
            config.theme = theme;
        }
        if let Some(include) = self.include_parent_data {
            config.include_parent_data = include;
        }
        config.sort = SortConfig {
            properties: ordering(self.sort_class_properties),
            methods: ordering(self.sort_class_methods),
            constants: ordering(self.sort_class_constants),
            traits: ordering(self.sort_class_traits),
            interfaces: ordering(self.sort_class_interfaces),
        };
        config
    }
}
