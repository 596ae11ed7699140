//! Search index and alphabetical item index for global templates.

use serde::Serialize;
use std::collections::BTreeMap;

use super::helpers::{name_to_path, snippet};
use crate::project::Project;
use crate::reflection::Reflection;

/// A searchable entry. Paths are relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEntry {
    pub kind: &'static str,
    pub name: String,
    pub path: String,
    pub summary: String,
}

/// Builds the search index of a project.
pub trait SearchIndexer {
    fn index(&self, project: &Project) -> Vec<SearchEntry>;
}

/// Default indexer: namespaces, classes, interfaces, traits, methods and
/// functions, with a snippet of each short description.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchIndex;

impl SearchIndexer for SearchIndex {
    fn index(&self, project: &Project) -> Vec<SearchEntry> {
        let mut entries = Vec::new();

        for namespace in project.namespaces() {
            entries.push(SearchEntry {
                kind: "namespace",
                path: format!("{}.html", name_to_path(&namespace)),
                name: namespace,
                summary: String::new(),
            });
        }

        for class in project.rendered_classes() {
            let kind = if class.is_interface() {
                "interface"
            } else if class.is_trait() {
                "trait"
            } else {
                "class"
            };
            let page = format!("{}.html", name_to_path(class.name()));
            entries.push(SearchEntry {
                kind,
                name: class.name().to_string(),
                path: page.clone(),
                summary: snippet(class.short_desc()),
            });
            for method in class.methods() {
                entries.push(SearchEntry {
                    kind: "method",
                    name: format!("{}::{}", class.name(), method.name()),
                    path: format!("{}#method_{}", page, method.name()),
                    summary: snippet(method.short_desc()),
                });
            }
        }

        for function in project.functions() {
            let namespace = if function.namespace().is_empty() {
                "index".to_string()
            } else {
                name_to_path(function.namespace())
            };
            entries.push(SearchEntry {
                kind: "function",
                name: function.name().to_string(),
                path: format!("{}.html#function_{}", namespace, function.short_name()),
                summary: snippet(function.short_desc()),
            });
        }

        entries
    }
}

/// An entry of the alphabetical index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexItem {
    pub kind: &'static str,
    pub name: String,
    /// Owning class for members; the class itself for classes.
    pub class: String,
}

/// Project classes with their properties and methods, grouped by the
/// uppercased first letter of their (short) name. Letters are sorted.
pub fn items_index(project: &Project) -> BTreeMap<String, Vec<IndexItem>> {
    let mut items: BTreeMap<String, Vec<IndexItem>> = BTreeMap::new();
    let mut push = |name: &str, item: IndexItem| {
        if let Some(first) = name.chars().next() {
            items
                .entry(first.to_uppercase().collect())
                .or_default()
                .push(item);
        }
    };

    for class in project.project_classes() {
        push(
            class.short_name(),
            IndexItem {
                kind: "class",
                name: class.name().to_string(),
                class: class.name().to_string(),
            },
        );
        for property in class.properties() {
            push(
                property.name(),
                IndexItem {
                    kind: "property",
                    name: property.name().to_string(),
                    class: class.name().to_string(),
                },
            );
        }
        for method in class.methods() {
            push(
                method.name(),
                IndexItem {
                    kind: "method",
                    name: method.name().to_string(),
                    class: class.name().to_string(),
                },
            );
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::reflection::{ClassEntity, FunctionEntity, MethodEntity, PropertyEntity};

    fn project() -> Project {
        let mut project = Project::new(ProjectConfig::new("build", "cache"));
        let mut client = ClassEntity::new("Acme\\Client", 1);
        client.set_short_desc("HTTP client.");
        client.add_method(MethodEntity::new("send", 2));
        client.add_property(PropertyEntity::new("agent", 3));
        project.add_class(client);
        project.add_function(FunctionEntity::new("Acme\\tap", 1));
        project
    }

    #[test]
    fn test_search_index_entries() {
        let entries = SearchIndex.index(&project());
        let names: Vec<(&str, &str)> = entries.iter().map(|e| (e.kind, e.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                ("namespace", "Acme"),
                ("class", "Acme\\Client"),
                ("method", "Acme\\Client::send"),
                ("function", "Acme\\tap"),
            ]
        );
        assert_eq!(entries[1].path, "Acme/Client.html");
        assert_eq!(entries[1].summary, "HTTP client.");
        assert_eq!(entries[2].path, "Acme/Client.html#method_send");
        assert_eq!(entries[3].path, "Acme.html#function_tap");
    }

    #[test]
    fn test_items_grouped_by_letter() {
        let items = items_index(&project());
        let letters: Vec<&str> = items.keys().map(String::as_str).collect();
        assert_eq!(letters, vec!["A", "C", "S"]);
        assert_eq!(items["A"][0].kind, "property");
        assert_eq!(items["C"][0].name, "Acme\\Client");
        assert_eq!(items["S"][0].class, "Acme\\Client");
    }
}
