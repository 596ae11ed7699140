//! Classes, interfaces and traits.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::{
    decode, qualified_name, split_qualified, ConstantEntity, DocBlock, MethodEntity, Modifiers,
    PropertyEntity, Reflection, ReflectionResult, NAMESPACE_SEPARATOR,
};

// ============================================================================
// Class Identity
// ============================================================================

/// Stable identifier of a class, derived from its qualified name.
///
/// Members store the id of their owning class instead of a reference. Because
/// the id is a function of the name alone, it can be recomputed when a class
/// is decoded without consulting any table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u64);

impl ClassId {
    /// Id for a qualified class name. A leading separator is ignored.
    pub fn of(name: &str) -> Self {
        let digest = Sha256::digest(name.trim_start_matches(NAMESPACE_SEPARATOR).as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        ClassId(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class_{:016x}", self.0)
    }
}

/// Declaration kind of a class-like entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Trait,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Class Entity
// ============================================================================

/// A documented class, interface or trait and the members it declares.
///
/// The name is the qualified name (`Acme\Http\Client`). Parent class,
/// interfaces and traits are kept as qualified names and resolved through
/// the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntity {
    #[serde(flatten)]
    doc: DocBlock,
    #[serde(default)]
    kind: ClassKind,
    #[serde(default)]
    modifiers: Modifiers,
    #[serde(default)]
    file: Option<String>,
    #[serde(default = "default_true")]
    project_class: bool,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    interfaces: Vec<String>,
    #[serde(default)]
    traits: Vec<String>,
    #[serde(default)]
    constants: IndexMap<String, ConstantEntity>,
    properties: IndexMap<String, PropertyEntity>,
    methods: IndexMap<String, MethodEntity>,
}

impl ClassEntity {
    /// Create an empty project class.
    ///
    /// A leading namespace separator is dropped: `\Acme\Pool` and
    /// `Acme\Pool` name the same class.
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        let name: String = name.into();
        ClassEntity {
            doc: DocBlock::new(qualified_name(&name), line),
            kind: ClassKind::Class,
            modifiers: Modifiers::default(),
            file: None,
            project_class: true,
            parent: None,
            interfaces: Vec::new(),
            traits: Vec::new(),
            constants: IndexMap::new(),
            properties: IndexMap::new(),
            methods: IndexMap::new(),
        }
    }

    pub fn id(&self) -> ClassId {
        ClassId::of(self.name())
    }

    /// Name without the namespace.
    pub fn short_name(&self) -> &str {
        split_qualified(self.name()).1
    }

    /// Namespace of the class; empty for the global namespace.
    pub fn namespace(&self) -> &str {
        split_qualified(self.name()).0
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ClassKind) {
        self.kind = kind;
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_trait(&self) -> bool {
        self.kind == ClassKind::Trait
    }

    /// Class-level modifiers (abstract, final). Stored as given.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn set_modifiers(&mut self, modifiers: impl Into<Modifiers>) {
        self.modifiers = modifiers.into();
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }

    /// Source file, relative to the project root.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, file: Option<String>) {
        self.file = file;
    }

    /// False for classes known only by reference (e.g. a base class from a
    /// dependency). Such classes are never rendered.
    pub fn is_project_class(&self) -> bool {
        self.project_class
    }

    pub fn set_project_class(&mut self, project_class: bool) {
        self.project_class = project_class;
    }

    /// Qualified name of the parent class, unresolved.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn set_parent(&mut self, parent: Option<String>) {
        self.parent = parent;
    }

    /// Qualified names of directly implemented interfaces.
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn add_interface(&mut self, interface: impl Into<String>) {
        self.interfaces.push(interface.into());
    }

    pub fn set_interfaces(&mut self, interfaces: Vec<String>) {
        self.interfaces = interfaces;
    }

    /// Qualified names of directly used traits.
    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    pub fn add_trait(&mut self, name: impl Into<String>) {
        self.traits.push(name.into());
    }

    pub fn set_traits(&mut self, traits: Vec<String>) {
        self.traits = traits;
    }

    pub fn add_constant(&mut self, mut constant: ConstantEntity) {
        constant.set_class(self.id());
        self.constants.insert(constant.name().to_string(), constant);
    }

    pub fn add_property(&mut self, mut property: PropertyEntity) {
        property.set_class(self.id());
        self.properties.insert(property.name().to_string(), property);
    }

    pub fn add_method(&mut self, mut method: MethodEntity) {
        method.set_class(self.id());
        self.methods.insert(method.name().to_string(), method);
    }

    pub fn constant(&self, name: &str) -> Option<&ConstantEntity> {
        self.constants.get(name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyEntity> {
        self.properties.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodEntity> {
        self.methods.get(name)
    }

    /// Declared constants in declaration order.
    pub fn constants(&self) -> impl Iterator<Item = &ConstantEntity> {
        self.constants.values()
    }

    /// Declared properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyEntity> {
        self.properties.values()
    }

    /// Declared methods in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodEntity> {
        self.methods.values()
    }

    pub fn to_value(&self) -> ReflectionResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a class and re-establish member back-references.
    pub fn from_value(value: serde_json::Value) -> ReflectionResult<Self> {
        let mut class: ClassEntity = decode(&value)?;
        class.doc.name = qualified_name(&class.doc.name).to_string();
        class.validate()?;
        class.relink();
        Ok(class)
    }

    pub(crate) fn validate(&self) -> ReflectionResult<()> {
        self.doc.validate()?;
        for property in self.properties.values() {
            property.doc().validate()?;
        }
        for method in self.methods.values() {
            method.validate()?;
        }
        for constant in self.constants.values() {
            constant.doc().validate()?;
        }
        Ok(())
    }

    fn relink(&mut self) {
        let id = self.id();
        for constant in self.constants.values_mut() {
            constant.set_class(id);
        }
        for property in self.properties.values_mut() {
            property.set_class(id);
        }
        for method in self.methods.values_mut() {
            method.set_class(id);
            method.relink();
        }
    }
}

impl Reflection for ClassEntity {
    fn doc(&self) -> &DocBlock {
        &self.doc
    }

    fn doc_mut(&mut self) -> &mut DocBlock {
        &mut self.doc
    }
}

// ============================================================================
// Tests
// ============================================================================
