//! Reflection model: serializable descriptions of documented code entities.
//!
//! This module provides the entity data model consumed by the store, the
//! diff and the renderer:
//! - [`ClassEntity`]: classes, interfaces and traits, owning their members
//! - [`PropertyEntity`], [`MethodEntity`], [`ConstantEntity`]: class members
//! - [`ParameterEntity`]: method and function parameters
//! - [`FunctionEntity`]: namespace-level functions
//!
//! Every entity carries a [`DocBlock`] (name, line, descriptions, type hint,
//! tags, analysis errors) and exposes it through the [`Reflection`] trait.
//!
//! # Serialization Contract
//!
//! Entities round-trip losslessly through `serde_json::Value`
//! (`to_value` / `from_value`). The encoded form holds only plain data:
//! back-references from members to their owning class are not encoded and are
//! re-established when the class is decoded. Cross-entity references (parent
//! class, implemented interfaces, thrown exceptions) are stored as qualified
//! names and resolved on read through [`crate::project::Project`].
//!
//! # Names
//!
//! Qualified names use `\` as the namespace separator (`Acme\Http\Client`).
//! The global namespace is the empty string.

mod class;
mod function;
mod members;
mod modifiers;

pub use class::{ClassEntity, ClassId, ClassKind};
pub use function::FunctionEntity;
pub use members::{ConstantEntity, MethodEntity, ParameterEntity, PropertyEntity, ThrownException};
pub use modifiers::{Modifiers, Visibility};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between namespace segments in qualified names.
pub const NAMESPACE_SEPARATOR: char = '\\';

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while building or decoding entities.
#[derive(Debug, Error)]
pub enum ReflectionError {
    /// Encoded entity is missing required structure or has the wrong shape.
    #[error("malformed entity '{entity}': {reason}")]
    Malformed { entity: String, reason: String },

    /// Entity was given an empty name.
    #[error("entity name must not be empty")]
    EmptyName,

    /// Entity could not be encoded.
    #[error("failed to encode entity: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for reflection operations.
pub type ReflectionResult<T> = Result<T, ReflectionError>;

impl ReflectionError {
    /// Build a `Malformed` error, naming the entity when the payload has one.
    pub(crate) fn malformed(value: &serde_json::Value, reason: impl ToString) -> Self {
        let entity = value
            .get("name")
            .and_then(|n| n.as_str())
            .unwrap_or("<unnamed>")
            .to_string();
        ReflectionError::Malformed {
            entity,
            reason: reason.to_string(),
        }
    }
}

/// Decode an entity record, reporting shape errors as `Malformed`.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    value: &serde_json::Value,
) -> ReflectionResult<T> {
    T::deserialize(value).map_err(|e| ReflectionError::malformed(value, e))
}

// ============================================================================
// Doc Block
// ============================================================================

/// A single documentation tag, e.g. `@deprecated since 2.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name without the leading `@`.
    pub name: String,
    /// Whitespace-separated tag arguments, in source order.
    pub values: Vec<String>,
}

impl Tag {
    /// Create a new tag.
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Tag {
            name: name.into(),
            values,
        }
    }
}

/// Attributes shared by every documented entity.
///
/// Construction requires the name and declaration line; the line cannot be
/// changed afterwards. Everything else is set through mutators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocBlock {
    name: String,
    line: u32,
    #[serde(default)]
    short_desc: String,
    #[serde(default)]
    long_desc: String,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    hint_desc: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    errors: Vec<String>,
}

impl DocBlock {
    /// Create a doc block with only a name and declaration line.
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        DocBlock {
            name: name.into(),
            line,
            short_desc: String::new(),
            long_desc: String::new(),
            hint: None,
            hint_desc: None,
            tags: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Reject blocks whose name is empty.
    pub(crate) fn validate(&self) -> ReflectionResult<()> {
        if self.name.is_empty() {
            return Err(ReflectionError::EmptyName);
        }
        Ok(())
    }
}

// ============================================================================
// Reflection Trait
// ============================================================================

/// Capabilities shared by all entities: named, line-numbered, documented.
pub trait Reflection {
    /// The entity's doc block.
    fn doc(&self) -> &DocBlock;

    /// Mutable access to the entity's doc block.
    fn doc_mut(&mut self) -> &mut DocBlock;

    /// Name, unique within the immediate container.
    fn name(&self) -> &str {
        &self.doc().name
    }

    /// Line of the declaration in its source file.
    fn line(&self) -> u32 {
        self.doc().line
    }

    fn short_desc(&self) -> &str {
        &self.doc().short_desc
    }

    fn long_desc(&self) -> &str {
        &self.doc().long_desc
    }

    /// Declared or documented type, if any.
    fn hint(&self) -> Option<&str> {
        self.doc().hint.as_deref()
    }

    fn hint_desc(&self) -> Option<&str> {
        self.doc().hint_desc.as_deref()
    }

    /// All tags in source order.
    fn tags(&self) -> &[Tag] {
        &self.doc().tags
    }

    /// Tags with the given name, in source order.
    fn tags_named<'a>(&'a self, name: &'a str) -> Box<dyn Iterator<Item = &'a Tag> + 'a> {
        Box::new(self.doc().tags.iter().filter(move |t| t.name == name))
    }

    /// Diagnostics collected while analyzing this entity.
    fn errors(&self) -> &[String] {
        &self.doc().errors
    }

    fn has_errors(&self) -> bool {
        !self.doc().errors.is_empty()
    }

    fn set_short_desc(&mut self, desc: impl Into<String>)
    where
        Self: Sized,
    {
        self.doc_mut().short_desc = desc.into();
    }

    fn set_long_desc(&mut self, desc: impl Into<String>)
    where
        Self: Sized,
    {
        self.doc_mut().long_desc = desc.into();
    }

    /// Set the type hint and its description together.
    fn set_hint(&mut self, hint: Option<String>, hint_desc: Option<String>)
    where
        Self: Sized,
    {
        let doc = self.doc_mut();
        doc.hint = hint;
        doc.hint_desc = hint_desc;
    }

    fn add_tag(&mut self, tag: Tag)
    where
        Self: Sized,
    {
        self.doc_mut().tags.push(tag);
    }

    fn add_error(&mut self, error: impl Into<String>)
    where
        Self: Sized,
    {
        self.doc_mut().errors.push(error.into());
    }
}

// ============================================================================
// Top-level Entities
// ============================================================================

/// Kind of a top-level (separately stored) entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Class,
    Function,
}

impl EntityKind {
    /// File name prefix used by the durable store.
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Class => "c_",
            EntityKind::Function => "f_",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Class => write!(f, "class"),
            EntityKind::Function => write!(f, "function"),
        }
    }
}

/// A top-level entity: the unit of storage and change detection.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Class(ClassEntity),
    Function(FunctionEntity),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Class(_) => EntityKind::Class,
            Entity::Function(_) => EntityKind::Function,
        }
    }

    /// Qualified name.
    pub fn name(&self) -> &str {
        match self {
            Entity::Class(c) => c.name(),
            Entity::Function(f) => f.name(),
        }
    }

    /// Reject entities with an empty name, or with an unnamed member.
    pub fn validate(&self) -> ReflectionResult<()> {
        match self {
            Entity::Class(c) => c.validate(),
            Entity::Function(f) => f.validate(),
        }
    }

    /// Encode without the kind marker (the store keeps kind in the file name).
    pub fn to_value(&self) -> ReflectionResult<serde_json::Value> {
        match self {
            Entity::Class(c) => c.to_value(),
            Entity::Function(f) => f.to_value(),
        }
    }

    /// Decode a record of a known kind.
    pub fn from_value(kind: EntityKind, value: serde_json::Value) -> ReflectionResult<Self> {
        match kind {
            EntityKind::Class => ClassEntity::from_value(value).map(Entity::Class),
            EntityKind::Function => FunctionEntity::from_value(value).map(Entity::Function),
        }
    }

    /// Encode with an `"entity"` kind marker, for mixed entity lists.
    pub fn to_tagged_value(&self) -> ReflectionResult<serde_json::Value> {
        let mut value = self.to_value()?;
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "entity".to_string(),
                serde_json::to_value(self.kind())?,
            );
        }
        Ok(value)
    }

    /// Decode a record carrying an `"entity"` kind marker (defaults to class).
    pub fn from_tagged_value(mut value: serde_json::Value) -> ReflectionResult<Self> {
        let tag = value.as_object_mut().and_then(|m| m.remove("entity"));
        let kind = match tag {
            Some(tag) => serde_json::from_value::<EntityKind>(tag)
                .map_err(|e| ReflectionError::malformed(&value, e))?,
            None => EntityKind::Class,
        };
        Entity::from_value(kind, value)
    }
}

impl From<ClassEntity> for Entity {
    fn from(class: ClassEntity) -> Self {
        Entity::Class(class)
    }
}

impl From<FunctionEntity> for Entity {
    fn from(function: FunctionEntity) -> Self {
        Entity::Function(function)
    }
}

// ============================================================================
// Name Helpers
// ============================================================================

/// Split a qualified name into `(namespace, short_name)`.
///
/// `"Acme\\Http\\Client"` splits into `("Acme\\Http", "Client")`; names
/// without a separator live in the global namespace `""`.
pub fn split_qualified(name: &str) -> (&str, &str) {
    let trimmed = name.trim_start_matches(NAMESPACE_SEPARATOR);
    match trimmed.rfind(NAMESPACE_SEPARATOR) {
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    }
}

/// Canonical form of a fully qualified name: no leading separator.
pub(crate) fn qualified_name(name: &str) -> &str {
    name.trim_start_matches(NAMESPACE_SEPARATOR)
}

/// Parent namespace of `namespace`, or `None` for the global namespace.
pub fn parent_namespace(namespace: &str) -> Option<&str> {
    if namespace.is_empty() {
        return None;
    }
    Some(split_qualified(namespace).0)
}

// ============================================================================
// Tests
// ============================================================================
