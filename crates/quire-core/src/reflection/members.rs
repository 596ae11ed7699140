//! Class members and parameters.
//!
//! Members point back at their owning class through a [`ClassId`], never
//! through a reference. The id is assigned when the member is attached to a
//! class (or when the class is decoded) and is resolved through
//! [`Project::class_by_id`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{decode, ClassId, DocBlock, Modifiers, Reflection, ReflectionResult};
use crate::project::{ClassRef, Project};

// ============================================================================
// Parameters
// ============================================================================

/// A method or function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterEntity {
    #[serde(flatten)]
    doc: DocBlock,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    variadic: bool,
    #[serde(default, rename = "is_by_ref")]
    by_ref: bool,
    /// Name of the owning method or function.
    #[serde(skip)]
    owner: Option<String>,
}

impl ParameterEntity {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        ParameterEntity {
            doc: DocBlock::new(name, line),
            default: None,
            variadic: false,
            by_ref: false,
            owner: None,
        }
    }

    /// Default value as a source literal, e.g. `'utf-8'` or `[]`.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn set_default(&mut self, default: Option<String>) {
        self.default = default;
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn set_variadic(&mut self, variadic: bool) {
        self.variadic = variadic;
    }

    pub fn is_by_ref(&self) -> bool {
        self.by_ref
    }

    pub fn set_by_ref(&mut self, by_ref: bool) {
        self.by_ref = by_ref;
    }

    /// Name of the method or function declaring this parameter.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = Some(owner.to_string());
    }

    pub fn to_value(&self) -> ReflectionResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: serde_json::Value) -> ReflectionResult<Self> {
        let param: ParameterEntity = decode(&value)?;
        param.doc.validate()?;
        Ok(param)
    }
}

impl Reflection for ParameterEntity {
    fn doc(&self) -> &DocBlock {
        &self.doc
    }

    fn doc_mut(&mut self) -> &mut DocBlock {
        &mut self.doc
    }
}

/// Ordered parameter list keyed by name; order is declaration order.
pub(crate) type Parameters = IndexMap<String, ParameterEntity>;

/// Point every parameter at its owner.
pub(crate) fn link_parameters(params: &mut Parameters, owner: &str) {
    for param in params.values_mut() {
        param.set_owner(owner);
    }
}

// ============================================================================
// Exceptions
// ============================================================================

/// A documented thrown exception: class name plus free-text condition.
///
/// The class is kept by name and resolved against the project when read, so
/// it may refer to classes that were not loaded when the thrower was parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrownException {
    pub class: String,
    #[serde(default)]
    pub description: String,
}

impl ThrownException {
    pub fn new(class: impl Into<String>, description: impl Into<String>) -> Self {
        ThrownException {
            class: class.into(),
            description: description.into(),
        }
    }

    /// Resolve the exception class through the project.
    pub fn resolve<'p>(&'p self, project: &'p Project) -> (ClassRef<'p>, &'p str) {
        (project.resolve_class(&self.class), &self.description)
    }
}

// ============================================================================
// Properties
// ============================================================================

/// A class property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyEntity {
    #[serde(flatten)]
    doc: DocBlock,
    #[serde(default)]
    modifiers: Modifiers,
    #[serde(default)]
    default: Option<String>,
    #[serde(skip)]
    class: Option<ClassId>,
}

impl PropertyEntity {
    /// Create a public property.
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        PropertyEntity {
            doc: DocBlock::new(name, line),
            modifiers: Modifiers::default().normalized(),
            default: None,
            class: None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Store modifiers, adding the public bit when no visibility is given.
    pub fn set_modifiers(&mut self, modifiers: impl Into<Modifiers>) {
        self.modifiers = modifiers.into().normalized();
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.is_public()
    }

    pub fn is_protected(&self) -> bool {
        self.modifiers.is_protected()
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.is_private()
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn set_default(&mut self, default: Option<String>) {
        self.default = default;
    }

    /// Id of the owning class.
    pub fn class(&self) -> Option<ClassId> {
        self.class
    }

    pub(crate) fn set_class(&mut self, class: ClassId) {
        self.class = Some(class);
    }

    pub fn to_value(&self) -> ReflectionResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: serde_json::Value) -> ReflectionResult<Self> {
        let property: PropertyEntity = decode(&value)?;
        property.doc.validate()?;
        Ok(property)
    }
}

impl Reflection for PropertyEntity {
    fn doc(&self) -> &DocBlock {
        &self.doc
    }

    fn doc_mut(&mut self) -> &mut DocBlock {
        &mut self.doc
    }
}

// ============================================================================
// Methods
// ============================================================================

/// A class method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodEntity {
    #[serde(flatten)]
    doc: DocBlock,
    #[serde(default)]
    modifiers: Modifiers,
    #[serde(default, rename = "is_by_ref")]
    by_ref: bool,
    #[serde(default)]
    exceptions: Vec<ThrownException>,
    parameters: Parameters,
    #[serde(skip)]
    class: Option<ClassId>,
}

impl MethodEntity {
    /// Create a public method without parameters.
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        MethodEntity {
            doc: DocBlock::new(name, line),
            modifiers: Modifiers::default().normalized(),
            by_ref: false,
            exceptions: Vec::new(),
            parameters: IndexMap::new(),
            class: None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Store modifiers, adding the public bit when no visibility is given.
    pub fn set_modifiers(&mut self, modifiers: impl Into<Modifiers>) {
        self.modifiers = modifiers.into().normalized();
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.is_public()
    }

    pub fn is_protected(&self) -> bool {
        self.modifiers.is_protected()
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.is_private()
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }

    /// Whether the method returns by reference.
    pub fn is_by_ref(&self) -> bool {
        self.by_ref
    }

    pub fn set_by_ref(&mut self, by_ref: bool) {
        self.by_ref = by_ref;
    }

    /// Append a parameter; a parameter with the same name is replaced in place.
    pub fn add_parameter(&mut self, mut parameter: ParameterEntity) {
        parameter.set_owner(self.name());
        self.parameters
            .insert(parameter.name().to_string(), parameter);
    }

    /// Replace all parameters from any iterator, in iteration order.
    pub fn set_parameters<I>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = ParameterEntity>,
    {
        self.parameters.clear();
        for parameter in parameters {
            self.add_parameter(parameter);
        }
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterEntity> {
        self.parameters.values()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterEntity> {
        self.parameters.get(name)
    }

    /// Parameter by declaration position.
    pub fn parameter_at(&self, index: usize) -> Option<&ParameterEntity> {
        self.parameters.get_index(index).map(|(_, p)| p)
    }

    pub fn set_exceptions(&mut self, exceptions: Vec<ThrownException>) {
        self.exceptions = exceptions;
    }

    pub fn add_exception(&mut self, exception: ThrownException) {
        self.exceptions.push(exception);
    }

    /// Exceptions as stored, with unresolved class names.
    pub fn raw_exceptions(&self) -> &[ThrownException] {
        &self.exceptions
    }

    /// Exceptions with classes resolved through the project.
    pub fn exceptions<'p>(&'p self, project: &'p Project) -> Vec<(ClassRef<'p>, &'p str)> {
        self.exceptions.iter().map(|e| e.resolve(project)).collect()
    }

    /// Id of the owning class.
    pub fn class(&self) -> Option<ClassId> {
        self.class
    }

    pub(crate) fn set_class(&mut self, class: ClassId) {
        self.class = Some(class);
    }

    pub fn to_value(&self) -> ReflectionResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: serde_json::Value) -> ReflectionResult<Self> {
        let mut method: MethodEntity = decode(&value)?;
        method.validate()?;
        method.relink();
        Ok(method)
    }

    /// Restore parameter back-references after decoding.
    pub(crate) fn relink(&mut self) {
        let name = self.name().to_string();
        link_parameters(&mut self.parameters, &name);
    }

    pub(crate) fn validate(&self) -> ReflectionResult<()> {
        self.doc.validate()?;
        for parameter in self.parameters.values() {
            parameter.doc.validate()?;
        }
        Ok(())
    }
}

impl Reflection for MethodEntity {
    fn doc(&self) -> &DocBlock {
        &self.doc
    }

    fn doc_mut(&mut self) -> &mut DocBlock {
        &mut self.doc
    }
}

// ============================================================================
// Constants
// ============================================================================

/// A class constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantEntity {
    #[serde(flatten)]
    doc: DocBlock,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    modifiers: Modifiers,
    #[serde(skip)]
    class: Option<ClassId>,
}

impl ConstantEntity {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        ConstantEntity {
            doc: DocBlock::new(name, line),
            value: None,
            modifiers: Modifiers::default().normalized(),
            class: None,
        }
    }

    /// Value as a source literal.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn set_modifiers(&mut self, modifiers: impl Into<Modifiers>) {
        self.modifiers = modifiers.into().normalized();
    }

    pub fn class(&self) -> Option<ClassId> {
        self.class
    }

    pub(crate) fn set_class(&mut self, class: ClassId) {
        self.class = Some(class);
    }
}

impl Reflection for ConstantEntity {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::Tag;

    fn sample_method() -> MethodEntity {
        let mut method = MethodEntity::new("send", 42);
        method.set_short_desc("Send a request.");
        method.set_long_desc("Blocks until the response headers arrive.");
        method.set_hint(Some("Response".into()), Some("the response".into()));
        method.add_tag(Tag::new("since", vec!["1.2".into()]));
        method.set_modifiers(Modifiers::PROTECTED | Modifiers::FINAL);
        method.set_by_ref(true);
        method.add_exception(ThrownException::new("Acme\\TimeoutError", "on timeout"));

        let mut request = ParameterEntity::new("request", 42);
        request.set_hint(Some("Request".into()), None);
        method.add_parameter(request);

        let mut options = ParameterEntity::new("options", 42);
        options.set_default(Some("[]".into()));
        options.set_variadic(true);
        method.add_parameter(options);
        method
    }

    mod modifier_tests {
        use super::*;

        #[test]
        fn test_property_zero_modifiers_is_public() {
            let mut property = PropertyEntity::new("id", 3);
            property.set_modifiers(0u32);
            assert!(property.is_public());
            assert!(!property.is_protected());
            assert!(!property.is_private());
            assert_eq!(property.modifiers().bits(), Modifiers::PUBLIC);
        }

        #[test]
        fn test_method_zero_modifiers_is_public() {
            let mut method = MethodEntity::new("run", 3);
            method.set_modifiers(0u32);
            assert!(method.is_public());
            assert!(!method.is_protected());
            assert!(!method.is_private());
        }

        #[test]
        fn test_setter_keeps_explicit_visibility() {
            let mut property = PropertyEntity::new("id", 3);
            property.set_modifiers(Modifiers::PRIVATE | Modifiers::STATIC);
            assert!(property.is_private());
            assert!(property.is_static());
            assert!(!property.is_public());
        }

        #[test]
        fn test_decoded_raw_zero_still_reads_public() {
            let value = serde_json::json!({
                "name": "run", "line": 1, "modifiers": 0, "parameters": {}
            });
            let method = MethodEntity::from_value(value).unwrap();
            assert_eq!(method.modifiers().bits(), 0);
            assert!(method.is_public());
        }
    }

    mod parameter_tests {
        use super::*;

        #[test]
        fn test_parameters_keep_declaration_order() {
            let method = sample_method();
            let names: Vec<&str> = method.parameters().map(|p| p.name()).collect();
            assert_eq!(names, vec!["request", "options"]);
            assert_eq!(method.parameter_at(1).unwrap().name(), "options");
            assert!(method.parameter_at(2).is_none());
        }

        #[test]
        fn test_parameters_point_back_at_method() {
            let method = sample_method();
            assert_eq!(method.parameter("request").unwrap().owner(), Some("send"));
        }

        #[test]
        fn test_set_parameters_from_iterator() {
            let mut method = sample_method();
            method.set_parameters((0..3).map(|i| ParameterEntity::new(format!("p{}", i), 1)));
            assert_eq!(method.parameter_count(), 3);
            assert!(method.parameter("request").is_none());
            assert_eq!(method.parameter_at(0).unwrap().name(), "p0");
        }
    }

    mod round_trip_tests {
        use super::*;

        #[test]
        fn test_method_round_trip() {
            let method = sample_method();
            let decoded = MethodEntity::from_value(method.to_value().unwrap()).unwrap();

            assert_eq!(decoded, method);
            assert_eq!(decoded.short_desc(), "Send a request.");
            assert_eq!(decoded.hint_desc(), Some("the response"));
            assert!(decoded.is_protected());
            assert!(decoded.is_final());
            assert!(decoded.is_by_ref());
            assert_eq!(decoded.raw_exceptions()[0].class, "Acme\\TimeoutError");
            assert_eq!(
                decoded.parameter("options").unwrap().default_value(),
                Some("[]")
            );
            assert!(decoded.parameter("options").unwrap().is_variadic());
        }

        #[test]
        fn test_property_round_trip() {
            let mut property = PropertyEntity::new("timeout", 9);
            property.set_default(Some("30".into()));
            property.set_modifiers(Modifiers::PROTECTED | Modifiers::STATIC);
            property.add_error("no @var tag");

            let decoded = PropertyEntity::from_value(property.to_value().unwrap()).unwrap();
            assert_eq!(decoded, property);
            assert_eq!(decoded.default_value(), Some("30"));
            assert!(decoded.is_static());
            assert_eq!(decoded.errors().len(), 1);
        }

        #[test]
        fn test_method_without_parameters_key_is_malformed() {
            let value = serde_json::json!({"name": "run", "line": 1});
            let err = MethodEntity::from_value(value).unwrap_err();
            assert!(err.to_string().contains("run"));
        }

        #[test]
        fn test_property_without_line_is_malformed() {
            let value = serde_json::json!({"name": "id"});
            assert!(PropertyEntity::from_value(value).is_err());
        }
    }
}
