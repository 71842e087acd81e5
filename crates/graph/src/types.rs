use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use specguard_protocol::FileCategory;
use std::collections::HashMap;

/// What a graph node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A scanned source file
    Source(FileCategory),
    /// An import target as written after resolution (may carry no extension,
    /// or be a bare package name)
    Module,
    /// A literal network-call target
    Endpoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub key: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    /// A imports B
    Imports,
    /// A (UI) calls endpoint B
    Fetches,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEdge {
    pub relationship: Relationship,
}

/// Static reference graph over one tree. Duplicate edges are kept.
pub struct UsageGraph {
    pub graph: DiGraph<FileNode, UsageEdge>,

    /// Node key -> NodeIndex mapping for fast lookup
    pub node_index: HashMap<String, NodeIndex>,
}

impl UsageGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
        }
    }

    /// Return the existing node for `key`, or add one. A scanned source
    /// upgrades a node first seen as an import target.
    pub fn ensure_node(&mut self, key: &str, kind: NodeKind) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(key) {
            if let (Some(node), NodeKind::Source(_)) = (self.graph.node_weight_mut(idx), kind) {
                node.kind = kind;
            }
            return idx;
        }
        let idx = self.graph.add_node(FileNode {
            key: key.to_string(),
            kind,
        });
        self.node_index.insert(key.to_string(), idx);
        idx
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, relationship: Relationship) {
        self.graph.add_edge(from, to, UsageEdge { relationship });
    }

    pub fn find_node(&self, key: &str) -> Option<NodeIndex> {
        self.node_index.get(key).copied()
    }

    pub fn get_node(&self, idx: NodeIndex) -> Option<&FileNode> {
        self.graph.node_weight(idx)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for UsageGraph {
    fn default() -> Self {
        Self::new()
    }
}
