//! In-memory catalog tree with an id index.

use crate::error::{Result, SubsonicError};
use crate::types::{CatalogEntry, NodeKind};
use serde::Serialize;
use std::collections::HashMap;

/// Handle to a node inside a [`CatalogStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

/// Where a new node is attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parent {
    Root,
    Id(String),
}

impl Parent {
    pub fn id(&self) -> Option<&str> {
        match self {
            Parent::Root => None,
            Parent::Id(id) => Some(id),
        }
    }
}

/// A node in the catalog arena.
#[derive(Debug, Clone)]
pub struct CatalogNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    children: Vec<NodeHandle>,
}

impl CatalogNode {
    pub fn is_expandable(&self) -> bool {
        self.kind.is_expandable()
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }
}

/// Owned snapshot of a subtree, for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogTree {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub expandable: bool,
    pub children: Vec<CatalogTree>,
}

/// The catalog: an arena of nodes rooted at the service node, plus the
/// id index used to find the parent of a lazily fetched listing.
///
/// Nodes are never removed. Attaching the same id twice creates two
/// sibling nodes; the index then points at the newer one.
#[derive(Debug)]
pub struct CatalogStore {
    nodes: Vec<CatalogNode>,
    index: HashMap<String, NodeHandle>,
}

impl CatalogStore {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![CatalogNode {
                id: String::new(),
                name: service_name.into(),
                kind: NodeKind::Service,
                children: Vec::new(),
            }],
            index: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&CatalogNode> {
        self.nodes.get(handle.0)
    }

    /// Look up a node by its server id. The root is never indexed.
    pub fn resolve(&self, id: &str) -> Option<NodeHandle> {
        self.index
            .get(id)
            .copied()
            .filter(|handle| handle.0 < self.nodes.len())
    }

    /// Append `entry` as the last child of `parent` and index it by id.
    pub fn attach(&mut self, parent: &Parent, entry: CatalogEntry) -> Result<NodeHandle> {
        let parent_handle = match parent {
            Parent::Root => self.root(),
            Parent::Id(id) => self
                .resolve(id)
                .ok_or_else(|| SubsonicError::UnknownNode(id.clone()))?,
        };

        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(CatalogNode {
            id: entry.id.clone(),
            name: entry.name,
            kind: entry.kind,
            children: Vec::new(),
        });
        self.nodes[parent_handle.0].children.push(handle);
        self.index.insert(entry.id, handle);

        Ok(handle)
    }

    /// Children of `parent` as entries, in attach order.
    pub fn children_of(&self, parent: &Parent) -> Vec<CatalogEntry> {
        let handle = match parent {
            Parent::Root => Some(self.root()),
            Parent::Id(id) => self.resolve(id),
        };

        handle
            .and_then(|h| self.node(h))
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|child| self.node(*child))
                    .map(|child| CatalogEntry::new(child.id.clone(), child.name.clone(), child.kind))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the whole catalog.
    pub fn tree(&self) -> CatalogTree {
        self.subtree(self.root())
    }

    fn subtree(&self, handle: NodeHandle) -> CatalogTree {
        let node = &self.nodes[handle.0];
        CatalogTree {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            expandable: node.is_expandable(),
            children: node
                .children
                .iter()
                .map(|child| self.subtree(*child))
                .collect(),
        }
    }
}
