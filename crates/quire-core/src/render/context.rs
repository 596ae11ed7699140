//! Template variables built from the model.
//!
//! Templates receive plain JSON. Each view carries the entity's own fields
//! plus the values templates cannot derive themselves: resolved names,
//! visibility, owner class and relative paths.

use serde_json::{json, Value};

use super::helpers::name_to_path;
use crate::project::{ClassRef, Project};
use crate::reflection::{
    ClassEntity, ConstantEntity, DocBlock, FunctionEntity, MethodEntity, ParameterEntity,
    PropertyEntity, Reflection,
};

fn doc_fields(doc: &DocBlock) -> Value {
    serde_json::to_value(doc).unwrap_or(Value::Null)
}

/// Merge `extra` into the object `base`.
fn extend(mut base: Value, extra: Value) -> Value {
    if let (Some(base_map), Value::Object(extra_map)) = (base.as_object_mut(), extra) {
        base_map.extend(extra_map);
    }
    base
}

fn owner_name(project: &Project, id: Option<crate::reflection::ClassId>) -> Option<String> {
    id.and_then(|id| project.class_by_id(id))
        .map(|c| c.name().to_string())
}

pub(crate) fn class_ref_view(class: ClassRef<'_>) -> Value {
    let name = class.name();
    json!({
        "name": name,
        "short_name": crate::reflection::split_qualified(name).1,
        "known": class.is_known(),
        "project_class": class.is_project_class(),
        "path": format!("{}.html", name_to_path(name)),
    })
}

pub(crate) fn class_view(project: &Project, class: &ClassEntity) -> Value {
    extend(
        doc_fields(class.doc()),
        json!({
            "short_name": class.short_name(),
            "namespace": class.namespace(),
            "kind": class.kind(),
            "file": class.file(),
            "is_abstract": class.is_abstract(),
            "is_final": class.is_final(),
            "is_interface": class.is_interface(),
            "is_trait": class.is_trait(),
            "is_exception": project.is_exception(class),
            "parent": project.parent(class).map(class_ref_view),
            "path": format!("{}.html", name_to_path(class.name())),
        }),
    )
}

pub(crate) fn parameter_view(parameter: &ParameterEntity) -> Value {
    extend(
        doc_fields(parameter.doc()),
        json!({
            "default": parameter.default_value(),
            "is_variadic": parameter.is_variadic(),
            "is_by_ref": parameter.is_by_ref(),
        }),
    )
}

fn exceptions_view(resolved: Vec<(ClassRef<'_>, &str)>) -> Value {
    Value::Array(
        resolved
            .into_iter()
            .map(|(class, description)| {
                extend(class_ref_view(class), json!({ "description": description }))
            })
            .collect(),
    )
}

pub(crate) fn property_view(project: &Project, property: &PropertyEntity) -> Value {
    extend(
        doc_fields(property.doc()),
        json!({
            "class": owner_name(project, property.class()),
            "label": project.property_label(property),
            "visibility": property.modifiers().visibility(),
            "is_static": property.is_static(),
            "is_final": property.is_final(),
            "default": property.default_value(),
        }),
    )
}

pub(crate) fn method_view(project: &Project, method: &MethodEntity) -> Value {
    extend(
        doc_fields(method.doc()),
        json!({
            "class": owner_name(project, method.class()),
            "label": project.method_label(method),
            "visibility": method.modifiers().visibility(),
            "is_static": method.is_static(),
            "is_abstract": method.is_abstract(),
            "is_final": method.is_final(),
            "is_by_ref": method.is_by_ref(),
            "parameters": method.parameters().map(parameter_view).collect::<Vec<_>>(),
            "exceptions": exceptions_view(method.exceptions(project)),
        }),
    )
}

pub(crate) fn constant_view(project: &Project, constant: &ConstantEntity) -> Value {
    extend(
        doc_fields(constant.doc()),
        json!({
            "class": owner_name(project, constant.class()),
            "value": constant.value(),
            "visibility": constant.modifiers().visibility(),
        }),
    )
}

pub(crate) fn function_view(project: &Project, function: &FunctionEntity) -> Value {
    extend(
        doc_fields(function.doc()),
        json!({
            "short_name": function.short_name(),
            "namespace": function.namespace(),
            "is_by_ref": function.is_by_ref(),
            "parameters": function.parameters().map(parameter_view).collect::<Vec<_>>(),
            "exceptions": exceptions_view(function.exceptions(project)),
        }),
    )
}
