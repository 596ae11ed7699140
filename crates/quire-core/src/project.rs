//! The project: a table of all known entities plus configuration.
//!
//! The project is the lookup context for every name-based reference in the
//! model. Parent classes, interfaces, traits and thrown exceptions are stored
//! as qualified names; resolving them is an explicit call that returns a
//! [`ClassRef`], so an unknown name is an ordinary, testable branch.

use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::config::ProjectConfig;
use crate::reflection::{
    parent_namespace, qualified_name, ClassEntity, ClassId, ConstantEntity, Entity, EntityKind,
    FunctionEntity, MethodEntity, PropertyEntity, Reflection,
};
use crate::store::{Store, StoreResult};

/// Base names that make a class an exception class.
const EXCEPTION_ROOTS: &[&str] = &["Exception", "Throwable"];

// ============================================================================
// Class References
// ============================================================================

/// Result of resolving a class name against the project.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassRef<'p> {
    /// The class is loaded.
    Known(&'p ClassEntity),
    /// No class with this name is loaded.
    Unknown(&'p str),
}

impl<'p> ClassRef<'p> {
    /// Qualified name, whether resolved or not.
    pub fn name(&self) -> &'p str {
        match self {
            ClassRef::Known(class) => class.name(),
            ClassRef::Unknown(name) => qualified_name(name),
        }
    }

    pub fn entity(&self) -> Option<&'p ClassEntity> {
        match self {
            ClassRef::Known(class) => Some(class),
            ClassRef::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ClassRef::Known(_))
    }

    /// True when the class is loaded and belongs to the project.
    pub fn is_project_class(&self) -> bool {
        self.entity().is_some_and(|c| c.is_project_class())
    }
}

// ============================================================================
// Project
// ============================================================================

/// All entities of one documented project.
///
/// Classes and functions are kept sorted by qualified name so every listing
/// derived from the project is deterministic.
#[derive(Debug, Clone)]
pub struct Project {
    config: ProjectConfig,
    classes: BTreeMap<String, ClassEntity>,
    functions: BTreeMap<String, FunctionEntity>,
    ids: HashMap<ClassId, String>,
}

impl Project {
    pub fn new(config: ProjectConfig) -> Self {
        Project {
            config,
            classes: BTreeMap::new(),
            functions: BTreeMap::new(),
            ids: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ProjectConfig {
        &mut self.config
    }

    // ------------------------------------------------------------------------
    // Population
    // ------------------------------------------------------------------------

    /// Add or replace a class. Returns the replaced class, if any.
    pub fn add_class(&mut self, class: ClassEntity) -> Option<ClassEntity> {
        let name = qualified_name(class.name()).to_string();
        self.ids.insert(class.id(), name.clone());
        self.classes.insert(name, class)
    }

    /// Add or replace a function. Returns the replaced function, if any.
    pub fn add_function(&mut self, function: FunctionEntity) -> Option<FunctionEntity> {
        let name = qualified_name(function.name()).to_string();
        self.functions.insert(name, function)
    }

    pub fn add_entity(&mut self, entity: Entity) {
        match entity {
            Entity::Class(class) => {
                self.add_class(class);
            }
            Entity::Function(function) => {
                self.add_function(function);
            }
        }
    }

    pub fn remove_class(&mut self, name: &str) -> Option<ClassEntity> {
        let removed = self.classes.remove(qualified_name(name))?;
        self.ids.remove(&removed.id());
        Some(removed)
    }

    pub fn remove_function(&mut self, name: &str) -> Option<FunctionEntity> {
        self.functions.remove(qualified_name(name))
    }

    /// Load every entity from `store`.
    pub fn load(config: ProjectConfig, store: &dyn Store) -> StoreResult<Self> {
        let mut project = Project::new(config);
        for entity in store.list_all()? {
            project.add_entity(entity);
        }
        debug!(
            classes = project.classes.len(),
            functions = project.functions.len(),
            "loaded project from store"
        );
        Ok(project)
    }

    /// Write every entity to `store` and remove stored entities that are no
    /// longer part of the project.
    pub fn persist(&self, store: &mut dyn Store) -> StoreResult<()> {
        let stale: Vec<(EntityKind, String)> = store
            .list_all()?
            .into_iter()
            .filter(|entity| match entity {
                Entity::Class(c) => self.class(c.name()).is_none(),
                Entity::Function(f) => self.function(f.name()).is_none(),
            })
            .map(|entity| (entity.kind(), entity.name().to_string()))
            .collect();

        for class in self.classes.values() {
            store.write(&Entity::Class(class.clone()))?;
        }
        for function in self.functions.values() {
            store.write(&Entity::Function(function.clone()))?;
        }
        for (kind, name) in &stale {
            store.remove(*kind, name)?;
        }
        debug!(
            written = self.classes.len() + self.functions.len(),
            removed = stale.len(),
            "persisted project"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    pub fn class(&self, name: &str) -> Option<&ClassEntity> {
        self.classes.get(qualified_name(name))
    }

    /// Class owning a member, by back-reference id.
    pub fn class_by_id(&self, id: ClassId) -> Option<&ClassEntity> {
        self.ids.get(&id).and_then(|name| self.classes.get(name))
    }

    /// Resolve a class name; unknown names yield [`ClassRef::Unknown`].
    pub fn resolve_class<'p>(&'p self, name: &'p str) -> ClassRef<'p> {
        match self.class(name) {
            Some(class) => ClassRef::Known(class),
            None => ClassRef::Unknown(name),
        }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionEntity> {
        self.functions.get(qualified_name(name))
    }

    /// All loaded classes, including those known only by reference.
    pub fn classes(&self) -> impl Iterator<Item = &ClassEntity> {
        self.classes.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionEntity> {
        self.functions.values()
    }

    /// Project classes and traits (interfaces excluded), sorted by name.
    pub fn project_classes(&self) -> Vec<&ClassEntity> {
        self.classes
            .values()
            .filter(|c| c.is_project_class() && !c.is_interface())
            .collect()
    }

    /// Project interfaces, sorted by name.
    pub fn project_interfaces(&self) -> Vec<&ClassEntity> {
        self.classes
            .values()
            .filter(|c| c.is_project_class() && c.is_interface())
            .collect()
    }

    /// Every rendered class-like entity (classes, traits and interfaces).
    pub fn rendered_classes(&self) -> impl Iterator<Item = &ClassEntity> {
        self.classes.values().filter(|c| c.is_project_class())
    }

    // ------------------------------------------------------------------------
    // Namespaces
    // ------------------------------------------------------------------------

    /// All non-global namespaces holding project classes or functions,
    /// together with their ancestors, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces = BTreeSet::new();
        let direct = self
            .rendered_classes()
            .map(|c| c.namespace())
            .chain(self.functions.values().map(|f| f.namespace()));
        for namespace in direct {
            let mut current = Some(namespace);
            while let Some(ns) = current {
                if ns.is_empty() || !namespaces.insert(ns.to_string()) {
                    break;
                }
                current = parent_namespace(ns);
            }
        }
        namespaces.into_iter().collect()
    }

    /// True when any entity lives outside the global namespace.
    pub fn has_namespaces(&self) -> bool {
        !self.namespaces().is_empty()
    }

    /// Direct children of `namespace`, sorted.
    pub fn namespace_sub_namespaces(&self, namespace: &str) -> Vec<String> {
        self.namespaces()
            .into_iter()
            .filter(|ns| parent_namespace(ns) == Some(namespace))
            .collect()
    }

    pub fn namespace_classes(&self, namespace: &str) -> Vec<&ClassEntity> {
        self.project_classes()
            .into_iter()
            .filter(|c| c.namespace() == namespace && !self.is_exception(c))
            .collect()
    }

    pub fn namespace_interfaces(&self, namespace: &str) -> Vec<&ClassEntity> {
        self.project_interfaces()
            .into_iter()
            .filter(|c| c.namespace() == namespace)
            .collect()
    }

    pub fn namespace_exceptions(&self, namespace: &str) -> Vec<&ClassEntity> {
        self.project_classes()
            .into_iter()
            .filter(|c| c.namespace() == namespace && self.is_exception(c))
            .collect()
    }

    pub fn namespace_functions(&self, namespace: &str) -> Vec<&FunctionEntity> {
        self.functions
            .values()
            .filter(|f| f.namespace() == namespace)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------------

    /// Resolved parent class.
    pub fn parent<'p>(&'p self, class: &'p ClassEntity) -> Option<ClassRef<'p>> {
        class.parent().map(|name| self.resolve_class(name))
    }

    /// Ancestors from nearest to farthest. Stops at the first unknown class
    /// or when a cycle is detected; the unknown class is included.
    pub fn ancestors<'p>(&'p self, class: &'p ClassEntity) -> Vec<ClassRef<'p>> {
        let mut seen = HashSet::new();
        seen.insert(class.id());
        let mut chain = Vec::new();
        let mut current = self.parent(class);
        while let Some(parent) = current {
            chain.push(parent);
            current = match parent {
                ClassRef::Known(p) if seen.insert(p.id()) => self.parent(p),
                _ => None,
            };
        }
        chain
    }

    /// True when the class derives from one of the exception roots.
    pub fn is_exception(&self, class: &ClassEntity) -> bool {
        self.ancestors(class)
            .iter()
            .any(|ancestor| EXCEPTION_ROOTS.contains(&ancestor.name()))
    }

    /// Resolved interfaces implemented directly by the class.
    pub fn interfaces<'p>(&'p self, class: &'p ClassEntity) -> Vec<ClassRef<'p>> {
        class
            .interfaces()
            .iter()
            .map(|name| self.resolve_class(name))
            .collect()
    }

    /// Resolved traits. With `deep`, traits used by ancestors are included
    /// after the class's own, without duplicates.
    pub fn traits<'p>(&'p self, class: &'p ClassEntity, deep: bool) -> Vec<ClassRef<'p>> {
        let mut seen = HashSet::new();
        let mut traits = Vec::new();
        for owner in self.lineage(class, deep) {
            for name in owner.traits() {
                if seen.insert(qualified_name(name)) {
                    traits.push(self.resolve_class(name));
                }
            }
        }
        traits
    }

    /// Class followed by its used traits and then, with `deep`, by each
    /// known ancestor and its traits. Cycle-safe.
    pub(crate) fn lineage<'p>(&'p self, class: &'p ClassEntity, deep: bool) -> Vec<&'p ClassEntity> {
        let mut seen = HashSet::new();
        let mut lineage = Vec::new();
        let mut push = |entity: &'p ClassEntity, lineage: &mut Vec<&'p ClassEntity>| {
            if seen.insert(entity.id()) {
                lineage.push(entity);
                for name in entity.traits() {
                    if let Some(used) = self.class(name) {
                        if seen.insert(used.id()) {
                            lineage.push(used);
                        }
                    }
                }
            }
        };

        push(class, &mut lineage);
        if deep {
            for ancestor in self.ancestors(class) {
                if let ClassRef::Known(parent) = ancestor {
                    push(parent, &mut lineage);
                }
            }
        }
        lineage
    }

    fn merge<'p, T, I>(
        &'p self,
        class: &'p ClassEntity,
        deep: bool,
        members: impl Fn(&'p ClassEntity) -> I,
    ) -> Vec<&'p T>
    where
        T: Reflection + 'p,
        I: Iterator<Item = &'p T>,
    {
        let mut merged: IndexMap<&'p str, &'p T> = IndexMap::new();
        let owners = if deep {
            self.lineage(class, true)
        } else {
            vec![class]
        };
        for owner in owners {
            for member in members(owner) {
                merged.entry(member.name()).or_insert(member);
            }
        }
        merged.into_values().collect()
    }

    /// Properties of the class. With `deep`, members from used traits and
    /// ancestors are merged in; the nearest declaration wins.
    pub fn properties<'p>(&'p self, class: &'p ClassEntity, deep: bool) -> Vec<&'p PropertyEntity> {
        self.merge(class, deep, |c| c.properties())
    }

    /// Methods of the class, merged like [`Project::properties`].
    pub fn methods<'p>(&'p self, class: &'p ClassEntity, deep: bool) -> Vec<&'p MethodEntity> {
        self.merge(class, deep, |c| c.methods())
    }

    /// Constants of the class, merged like [`Project::properties`].
    pub fn constants<'p>(&'p self, class: &'p ClassEntity, deep: bool) -> Vec<&'p ConstantEntity> {
        self.merge(class, deep, |c| c.constants())
    }

    // ------------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------------

    /// `Class::method()`, or just `method()` when the owner is not loaded.
    pub fn method_label(&self, method: &MethodEntity) -> String {
        match method.class().and_then(|id| self.class_by_id(id)) {
            Some(class) => format!("{}::{}()", class.name(), method.name()),
            None => format!("{}()", method.name()),
        }
    }

    /// `Class::$property`, or just `$property` when the owner is not loaded.
    pub fn property_label(&self, property: &PropertyEntity) -> String {
        match property.class().and_then(|id| self.class_by_id(id)) {
            Some(class) => format!("{}::${}", class.name(), property.name()),
            None => format!("${}", property.name()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
