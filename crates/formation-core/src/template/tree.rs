//! Result tree
//!
//! An arena of resolved resources mirroring the shape of the template, for
//! callers that want to navigate what was created rather than read `id`
//! fields back out of the document.

use serde::Serialize;

use crate::entity::EntityHandle;

/// Index of a node in a [`ResourceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A resolved template node.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    /// Name as written in the template
    pub name: String,
    pub handle: EntityHandle,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena of resolved resources, in the order they were resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceTree {
    nodes: Vec<ResourceNode>,
    roots: Vec<NodeId>,
}

/// Nested, serializable view of a [`ResourceTree`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedResource {
    pub name: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NestedResource>,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent` (a root when `None`).
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        handle: EntityHandle,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ResourceNode {
            name: name.into(),
            handle,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(NodeId(p)) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&ResourceNode> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> impl Iterator<Item = &ResourceNode> + '_ {
        self.roots.iter().map(|id| &self.nodes[id.0])
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ResourceNode> + '_ {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|child| &self.nodes[child.0])
    }

    /// Nodes in resolution order, which is template pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceNode> + '_ {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolved ids in resolution order.
    pub fn ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.handle.id.as_str()).collect()
    }

    /// Follow template names from a root down the tree.
    ///
    /// `find(&["P", "Data", "raw"])` is the `raw` node under `Data` under the
    /// root named `P`.
    pub fn find(&self, path: &[&str]) -> Option<&ResourceNode> {
        let (first, rest) = path.split_first()?;
        let mut current = self.roots.iter().find(|id| self.nodes[id.0].name == *first)?;
        for segment in rest {
            current = self.nodes[current.0]
                .children
                .iter()
                .find(|id| self.nodes[id.0].name == *segment)?;
        }
        Some(&self.nodes[current.0])
    }

    /// Nested view suitable for serialization.
    pub fn to_nested(&self) -> Vec<NestedResource> {
        self.roots.iter().map(|id| self.nest(*id)).collect()
    }

    fn nest(&self, id: NodeId) -> NestedResource {
        let node = &self.nodes[id.0];
        NestedResource {
            name: node.name.clone(),
            id: node.handle.id.clone(),
            kind: node
                .handle
                .kind()
                .map(|k| k.to_string())
                .unwrap_or_else(|| node.handle.concrete_type.clone()),
            children: node.children.iter().map(|child| self.nest(*child)).collect(),
        }
    }
}
