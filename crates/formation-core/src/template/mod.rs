//! Template model
//!
//! A template is a tree of mappings and sequences, loaded as a
//! [`serde_json::Value`]. This module classifies its nodes, validates whole
//! templates without touching the platform, and holds the result tree the
//! walker builds.

pub mod node;
mod tree;

pub use node::TemplateNode;
pub use tree::{NestedResource, NodeId, ResourceNode, ResourceTree};

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

/// What a template would resolve to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateSummary {
    /// Number of resource nodes
    pub resources: usize,
    /// Resource nodes per kind label
    pub by_kind: BTreeMap<String, usize>,
    /// Nodes already carrying an id from a previous run
    pub annotated: usize,
}

/// Build the JSON pointer of a child location.
pub(crate) fn child_pointer(parent: &str, segment: impl std::fmt::Display) -> String {
    format!("{}/{}", parent, segment)
}

/// Human-readable form of a JSON pointer; the root is `/`.
pub(crate) fn display_location(pointer: &str) -> &str {
    if pointer.is_empty() { "/" } else { pointer }
}

/// Name of a raw template value for error context.
pub(crate) fn node_label(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        Value::Object(map) => map
            .get(node::NAME_KEY)
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string(),
        Value::Array(_) => "<list>".to_string(),
        _ => "<invalid>".to_string(),
    }
}

/// Classify every node of `template` without any platform call.
///
/// `has_parent` states whether the template will be applied under an
/// existing container, which decides whether top-level folders are valid.
/// Returns the first malformed node, with its location, as an error.
pub fn validate(template: &Value, has_parent: bool) -> Result<TemplateSummary> {
    let mut summary = TemplateSummary::default();
    let mut stack: Vec<(String, &Value, bool)> = vec![(String::new(), template, has_parent)];

    while let Some((pointer, value, parent_known)) = stack.pop() {
        let wrap = |e: Error| e.at_node(display_location(&pointer), node_label(value));

        let node = TemplateNode::classify(value).map_err(wrap)?;
        if let TemplateNode::PlainList(_) = node {
            if let Value::Array(items) = value {
                for (index, item) in items.iter().enumerate().rev() {
                    stack.push((child_pointer(&pointer, index), item, parent_known));
                }
            }
            continue;
        }

        if node.requires_parent() && !parent_known {
            let kind = node.kind().map(|k| k.to_string()).unwrap_or_default();
            return Err(wrap(Error::invalid_node(format!(
                "{} nodes need a parent container",
                kind
            ))));
        }

        summary.resources += 1;
        if let Some(kind) = node.kind() {
            *summary.by_kind.entry(kind.to_string()).or_default() += 1;
        }
        if node.existing_id().is_some() {
            summary.annotated += 1;
        }

        if let Some(children) = value.get(node::CHILDREN_KEY) {
            if !children.is_null() {
                stack.push((child_pointer(&pointer, node::CHILDREN_KEY), children, true));
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_resources_by_kind() {
        let template = json!([
            {
                "name": "P",
                "type": "Project",
                "children": [
                    {"name": "Data", "children": ["raw", "processed"]},
                    {"name": "V", "type": "View"},
                    {"name": "Home", "type": "Wiki"}
                ]
            },
            {"name": "T", "type": "Team", "id": "12"}
        ]);

        let summary = validate(&template, false).unwrap();

        assert_eq!(summary.resources, 7);
        assert_eq!(summary.by_kind["Folder"], 3);
        assert_eq!(summary.by_kind["Project"], 1);
        assert_eq!(summary.by_kind["View"], 1);
        assert_eq!(summary.annotated, 1);
    }

    #[test]
    fn top_level_folder_needs_parent() {
        let template = json!(["raw"]);

        let err = validate(&template, false).unwrap_err();
        assert_eq!(err.location(), Some("/0"));

        assert_eq!(validate(&template, true).unwrap().resources, 1);
    }

    #[test]
    fn reports_location_of_first_bad_node() {
        let template = json!({
            "name": "P",
            "type": "Project",
            "children": ["ok", {"name": "bad", "type": "Bucket"}]
        });

        let err = validate(&template, false).unwrap_err();

        assert_eq!(err.location(), Some("/children/1"));
        assert!(matches!(err.root(), Error::UnknownType { .. }));
        assert!(err.to_string().contains("(bad)"));
    }

    #[test]
    fn null_children_are_ignored() {
        let template = json!({"name": "P", "type": "Project", "children": null});
        assert_eq!(validate(&template, false).unwrap().resources, 1);
    }

    #[test]
    fn nested_lists_share_the_parent() {
        let template = json!({
            "name": "P",
            "type": "Project",
            "children": [["a", "b"], "c"]
        });
        assert_eq!(validate(&template, false).unwrap().by_kind["Folder"], 3);
    }
}
