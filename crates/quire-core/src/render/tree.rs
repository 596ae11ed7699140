//! Namespace tree for navigation templates.

use serde::Serialize;

use super::helpers::name_to_path;
use crate::project::Project;
use crate::reflection::{Reflection, NAMESPACE_SEPARATOR};

/// One node of the navigation tree. Paths are relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Short name shown in the tree.
    pub label: String,
    /// Qualified name.
    pub name: String,
    pub path: String,
    pub kind: TreeNodeKind,
    /// Nesting level, starting at 1.
    pub level: usize,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNodeKind {
    Namespace,
    Class,
}

/// Builds the navigation tree of a project.
pub trait TreeBuilder {
    fn build(&self, project: &Project) -> Vec<TreeNode>;
}

/// Default tree: namespaces nested by segment, each listing its
/// sub-namespaces first and then its classes. Without namespaces the tree
/// is a flat class list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceTreeBuilder;

impl NamespaceTreeBuilder {
    fn class_leaves(project: &Project, namespace: &str, level: usize) -> Vec<TreeNode> {
        project
            .rendered_classes()
            .filter(|c| c.namespace() == namespace)
            .map(|c| TreeNode {
                label: c.short_name().to_string(),
                name: c.name().to_string(),
                path: format!("{}.html", name_to_path(c.name())),
                kind: TreeNodeKind::Class,
                level,
                children: Vec::new(),
            })
            .collect()
    }

    fn namespace_node(project: &Project, namespace: &str, level: usize) -> TreeNode {
        let mut children: Vec<TreeNode> = project
            .namespace_sub_namespaces(namespace)
            .iter()
            .map(|sub| Self::namespace_node(project, sub, level + 1))
            .collect();
        children.extend(Self::class_leaves(project, namespace, level + 1));

        let label = namespace
            .rsplit(NAMESPACE_SEPARATOR)
            .next()
            .unwrap_or(namespace)
            .to_string();
        TreeNode {
            label,
            name: namespace.to_string(),
            path: format!("{}.html", name_to_path(namespace)),
            kind: TreeNodeKind::Namespace,
            level,
            children,
        }
    }
}

impl TreeBuilder for NamespaceTreeBuilder {
    fn build(&self, project: &Project) -> Vec<TreeNode> {
        let namespaces = project.namespaces();
        if namespaces.is_empty() {
            return Self::class_leaves(project, "", 1);
        }
        let mut roots: Vec<TreeNode> = namespaces
            .iter()
            .filter(|ns| !ns.contains(NAMESPACE_SEPARATOR))
            .map(|ns| Self::namespace_node(project, ns, 1))
            .collect();
        roots.extend(Self::class_leaves(project, "", 1));
        roots
    }
}
