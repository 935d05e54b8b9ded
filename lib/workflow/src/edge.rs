//! Edge types for workflow graphs.
//!
//! Edges are directed connections between nodes. The source node must
//! reach a terminal state before the target node may start, and the
//! insertion order of edges is the tie-break order for traversal.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// A directed edge between two nodes in a dag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Identifier unique within the dag.
    pub id: String,
    /// The upstream node.
    pub source: NodeId,
    /// The downstream node.
    pub target: NodeId,
}

impl Edge {
    /// Creates a new edge.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Creates an edge with a generated `edge-{n}` identifier.
    #[must_use]
    pub fn numbered(index: usize, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self::new(format!("edge-{index}"), source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_creation() {
        let edge = Edge::new("edge-1", "a", "b");
        assert_eq!(edge.id, "edge-1");
        assert_eq!(edge.source, NodeId::new("a"));
        assert_eq!(edge.target, NodeId::new("b"));
    }

    #[test]
    fn numbered_edge_id() {
        let edge = Edge::numbered(3, "a", "b");
        assert_eq!(edge.id, "edge-3");
    }

    #[test]
    fn edge_serde_roundtrip() {
        let edge = Edge::new("edge-1", "trigger", "actionA");
        let json = serde_json::to_string(&edge).expect("serialize");
        let parsed: Edge = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(edge, parsed);
    }
}
