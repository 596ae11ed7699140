//! Namespace-level functions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::members::{link_parameters, Parameters};
use super::{
    decode, qualified_name, split_qualified, DocBlock, ParameterEntity, Reflection,
    ReflectionResult, ThrownException,
};
use crate::project::{ClassRef, Project};

/// A function declared directly in a namespace.
///
/// Stored and fingerprinted on its own, like a class, so a change to a
/// function marks its namespace as modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntity {
    #[serde(flatten)]
    doc: DocBlock,
    #[serde(default, rename = "is_by_ref")]
    by_ref: bool,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    exceptions: Vec<ThrownException>,
    parameters: Parameters,
}

impl FunctionEntity {
    /// Create a function from its qualified name.
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        let name: String = name.into();
        FunctionEntity {
            doc: DocBlock::new(qualified_name(&name), line),
            by_ref: false,
            file: None,
            exceptions: Vec::new(),
            parameters: IndexMap::new(),
        }
    }

    pub fn short_name(&self) -> &str {
        split_qualified(self.name()).1
    }

    pub fn namespace(&self) -> &str {
        split_qualified(self.name()).0
    }

    pub fn is_by_ref(&self) -> bool {
        self.by_ref
    }

    pub fn set_by_ref(&mut self, by_ref: bool) {
        self.by_ref = by_ref;
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, file: Option<String>) {
        self.file = file;
    }

    pub fn add_parameter(&mut self, mut parameter: ParameterEntity) {
        parameter.set_owner(self.name());
        self.parameters
            .insert(parameter.name().to_string(), parameter);
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterEntity> {
        self.parameters.values()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterEntity> {
        self.parameters.get(name)
    }

    pub fn parameter_at(&self, index: usize) -> Option<&ParameterEntity> {
        self.parameters.get_index(index).map(|(_, p)| p)
    }

    pub fn add_exception(&mut self, exception: ThrownException) {
        self.exceptions.push(exception);
    }

    pub fn raw_exceptions(&self) -> &[ThrownException] {
        &self.exceptions
    }

    pub fn exceptions<'p>(&'p self, project: &'p Project) -> Vec<(ClassRef<'p>, &'p str)> {
        self.exceptions.iter().map(|e| e.resolve(project)).collect()
    }

    pub fn to_value(&self) -> ReflectionResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: serde_json::Value) -> ReflectionResult<Self> {
        let mut function: FunctionEntity = decode(&value)?;
        function.doc.name = qualified_name(&function.doc.name).to_string();
        function.validate()?;
        let name = function.name().to_string();
        link_parameters(&mut function.parameters, &name);
        Ok(function)
    }
}

impl FunctionEntity {
    pub(crate) fn validate(&self) -> ReflectionResult<()> {
        self.doc.validate()?;
        for parameter in self.parameters.values() {
            parameter.doc().validate()?;
        }
        Ok(())
    }
}

impl Reflection for FunctionEntity {
    fn doc(&self) -> &DocBlock {
        &self.doc
    }

    fn doc_mut(&mut self) -> &mut DocBlock {
        &mut self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_round_trip() {
        let mut function = FunctionEntity::new("Acme\\Support\\tap", 7);
        function.set_short_desc("Call a closure with a value and return the value.");
        function.set_file(Some("src/Support/helpers.php".into()));
        let mut value = ParameterEntity::new("value", 7);
        value.set_by_ref(true);
        function.add_parameter(value);
        function.add_parameter(ParameterEntity::new("callback", 7));

        let decoded = FunctionEntity::from_value(function.to_value().unwrap()).unwrap();
        assert_eq!(decoded, function);
        assert_eq!(decoded.namespace(), "Acme\\Support");
        assert_eq!(decoded.short_name(), "tap");
        let names: Vec<&str> = decoded.parameters().map(|p| p.name()).collect();
        assert_eq!(names, vec!["value", "callback"]);
        assert!(decoded.parameter_at(0).unwrap().is_by_ref());
        assert_eq!(decoded.parameter_at(1).unwrap().name(), "callback");
        assert_eq!(decoded.parameter("callback").unwrap().owner(), Some("Acme\\Support\\tap"));
    }

    #[test]
    fn test_leading_separator_dropped() {
        let function = FunctionEntity::new("\\Acme\\tap", 1);
        assert_eq!(function.name(), "Acme\\tap");
        assert_eq!(function.namespace(), "Acme");

        let value = serde_json::json!({"name": "\\Acme\\tap", "line": 1, "parameters": {}});
        assert_eq!(FunctionEntity::from_value(value).unwrap().name(), "Acme\\tap");
    }

    #[test]
    fn test_empty_name_rejected() {
        let value = serde_json::json!({"name": "", "line": 1, "parameters": {}});
        assert!(matches!(
            FunctionEntity::from_value(value),
            Err(crate::reflection::ReflectionError::EmptyName)
        ));
        assert!(FunctionEntity::new("", 1).validate().is_err());
    }

    #[test]
    fn test_missing_parameters_is_malformed() {
        let value = serde_json::json!({"name": "helper", "line": 1});
        assert!(FunctionEntity::from_value(value).is_err());
    }
}
