//! Dag validation and deterministic traversal.
//!
//! A dag is the executable form of a workflow: one trigger node, any
//! number of action nodes, and directed edges defining execution order.
//! Nodes and edges are kept in document order because edge insertion
//! order is the tie-break order for traversal; the stored form is also
//! the wire form.

use crate::edge::Edge;
use crate::error::GraphError;
use crate::node::{Node, NodeId, NodeKind};
use cogflow_core::DagId;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// A workflow dag: ordered nodes and edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dag {
    /// Unique identifier for this dag revision.
    pub id: DagId,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Dag {
    /// Creates a new empty dag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: DagId::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Creates a dag from pre-built nodes and edges.
    #[must_use]
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            id: DagId::new(),
            nodes,
            edges,
        }
    }

    /// Appends a node, returning its ID.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let node_id = node.id.clone();
        self.nodes.push(node);
        node_id
    }

    /// Appends an edge.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Returns a reference to a node by its ID.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == node_id)
    }

    /// Returns all nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the trigger node, if the dag has exactly one.
    #[must_use]
    pub fn trigger_node(&self) -> Option<&Node> {
        let mut triggers = self.nodes.iter().filter(|n| n.kind == NodeKind::Trigger);
        let first = triggers.next()?;
        if triggers.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Returns the downstream node IDs of a node, in edge-insertion order.
    #[must_use]
    pub fn successors(&self, node_id: &NodeId) -> Vec<&NodeId> {
        self.edges
            .iter()
            .filter(|e| &e.source == node_id)
            .map(|e| &e.target)
            .collect()
    }

    /// Returns the upstream node IDs of a node, in edge-insertion order.
    #[must_use]
    pub fn predecessors(&self, node_id: &NodeId) -> Vec<&NodeId> {
        self.edges
            .iter()
            .filter(|e| &e.target == node_id)
            .map(|e| &e.source)
            .collect()
    }

    /// Validates the dag.
    ///
    /// Checks, in order:
    /// - node IDs are unique
    /// - exactly one trigger node exists
    /// - every edge endpoint names an existing node
    /// - the graph is acyclic
    /// - every action node is reachable from the trigger
    ///
    /// Rejected dags must never be persisted or executed.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError`] found.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(&node.id) {
                return Err(GraphError::DuplicateNodeId {
                    node_id: node.id.clone(),
                });
            }
        }

        let trigger_count = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Trigger)
            .count();
        if trigger_count == 0 {
            return Err(GraphError::MissingTrigger);
        }
        if trigger_count > 1 {
            return Err(GraphError::MultipleTriggers { count: trigger_count });
        }

        for edge in &self.edges {
            if !seen.contains(&edge.source) || !seen.contains(&edge.target) {
                return Err(GraphError::DanglingEdge {
                    edge_id: edge.id.clone(),
                });
            }
        }

        if self.is_cyclic() {
            return Err(GraphError::CycleDetected);
        }

        // Every action node must be reachable from the trigger.
        let trigger = self
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Trigger)
            .expect("trigger presence checked above");
        let reachable = self.reachable_from(&trigger.id);
        for node in &self.nodes {
            if !reachable.contains(&node.id) {
                return Err(GraphError::Disconnected {
                    node_id: node.id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Returns the deterministic traversal order from the trigger node.
    ///
    /// The order is breadth-first: a node is emitted once all of its
    /// predecessors have been emitted, and when a node has multiple
    /// outgoing edges the targets are queued in edge-insertion order.
    /// Identical dags always produce identical orders, which keeps
    /// job/step logs reproducible.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if the dag does not validate.
    pub fn traversal(&self) -> Result<Vec<NodeId>, GraphError> {
        self.validate()?;

        let trigger = self
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Trigger)
            .expect("validated dag has a trigger");

        let mut indegree: HashMap<&NodeId, usize> = self.nodes.iter().map(|n| (&n.id, 0)).collect();
        for edge in &self.edges {
            if let Some(count) = indegree.get_mut(&edge.target) {
                *count += 1;
            }
        }

        let mut queue = VecDeque::from([&trigger.id]);
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node_id) = queue.pop_front() {
            order.push(node_id.clone());
            for target in self.successors(node_id) {
                let count = indegree
                    .get_mut(target)
                    .expect("edge endpoints checked by validate");
                *count -= 1;
                if *count == 0 {
                    queue.push_back(target);
                }
            }
        }

        Ok(order)
    }

    fn is_cyclic(&self) -> bool {
        let mut graph: DiGraph<&NodeId, ()> = DiGraph::new();
        let mut indices = HashMap::new();
        for node in &self.nodes {
            indices.insert(&node.id, graph.add_node(&node.id));
        }
        for edge in &self.edges {
            if let (Some(&source), Some(&target)) =
                (indices.get(&edge.source), indices.get(&edge.target))
            {
                graph.add_edge(source, target, ());
            }
        }
        petgraph::algo::is_cyclic_directed(&graph)
    }

    fn reachable_from(&self, start: &NodeId) -> HashSet<NodeId> {
        let mut visited = HashSet::from([start.clone()]);
        let mut queue = VecDeque::from([start]);
        while let Some(node_id) = queue.pop_front() {
            for target in self.successors(node_id) {
                if visited.insert(target.clone()) {
                    queue.push_back(target);
                }
            }
        }
        visited
    }
}

impl Default for Dag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond_dag() -> Dag {
        // trigger -> a -> c
        //         \> b /
        let mut dag = Dag::new();
        dag.add_node(Node::trigger("trigger", "webhook", "incoming"));
        dag.add_node(Node::action("a", "dev", "echo"));
        dag.add_node(Node::action("b", "dev", "echo"));
        dag.add_node(Node::action("c", "dev", "echo"));
        dag.add_edge(Edge::numbered(1, "trigger", "a"));
        dag.add_edge(Edge::numbered(2, "trigger", "b"));
        dag.add_edge(Edge::numbered(3, "a", "c"));
        dag.add_edge(Edge::numbered(4, "b", "c"));
        dag
    }

    #[test]
    fn valid_dag_passes_validation() {
        assert!(diamond_dag().validate().is_ok());
    }

    #[test]
    fn validate_detects_duplicate_node_id() {
        let mut dag = Dag::new();
        dag.add_node(Node::trigger("n", "webhook", "incoming"));
        dag.add_node(Node::action("n", "dev", "echo"));

        let err = dag.validate().unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNodeId { .. }));
    }

    #[test]
    fn validate_detects_missing_trigger() {
        let mut dag = Dag::new();
        dag.add_node(Node::action("a", "dev", "echo"));

        assert!(matches!(dag.validate(), Err(GraphError::MissingTrigger)));
    }

    #[test]
    fn validate_detects_multiple_triggers() {
        let mut dag = Dag::new();
        dag.add_node(Node::trigger("t1", "webhook", "incoming"));
        dag.add_node(Node::trigger("t2", "webhook", "incoming"));

        assert!(matches!(
            dag.validate(),
            Err(GraphError::MultipleTriggers { count: 2 })
        ));
    }

    #[test]
    fn validate_detects_dangling_edge() {
        let mut dag = Dag::new();
        dag.add_node(Node::trigger("trigger", "webhook", "incoming"));
        dag.add_edge(Edge::numbered(1, "trigger", "ghost"));

        let err = dag.validate().unwrap_err();
        assert!(matches!(err, GraphError::DanglingEdge { edge_id } if edge_id == "edge-1"));
    }

    #[test]
    fn validate_detects_cycle() {
        let mut dag = Dag::new();
        dag.add_node(Node::trigger("trigger", "webhook", "incoming"));
        dag.add_node(Node::action("a", "dev", "echo"));
        dag.add_node(Node::action("b", "dev", "echo"));
        dag.add_edge(Edge::numbered(1, "trigger", "a"));
        dag.add_edge(Edge::numbered(2, "a", "b"));
        dag.add_edge(Edge::numbered(3, "b", "a"));

        assert!(matches!(dag.validate(), Err(GraphError::CycleDetected)));
    }

    #[test]
    fn validate_detects_disconnected_node() {
        let mut dag = Dag::new();
        dag.add_node(Node::trigger("trigger", "webhook", "incoming"));
        dag.add_node(Node::action("a", "dev", "echo"));
        dag.add_node(Node::action("island", "dev", "echo"));
        dag.add_edge(Edge::numbered(1, "trigger", "a"));

        let err = dag.validate().unwrap_err();
        assert!(matches!(err, GraphError::Disconnected { node_id } if node_id.as_str() == "island"));
    }

    #[test]
    fn traversal_visits_every_node_once() {
        let dag = diamond_dag();
        let order = dag.traversal().unwrap();

        assert_eq!(order.len(), dag.node_count());
        let unique: HashSet<_> = order.iter().collect();
        assert_eq!(unique.len(), order.len());
        assert_eq!(order[0].as_str(), "trigger");
    }

    #[test]
    fn traversal_respects_edge_insertion_order() {
        let dag = diamond_dag();
        let order = dag.traversal().unwrap();
        let as_strs: Vec<&str> = order.iter().map(NodeId::as_str).collect();

        // a was wired before b, and c waits for both.
        assert_eq!(as_strs, vec!["trigger", "a", "b", "c"]);
    }

    #[test]
    fn traversal_emits_node_after_all_predecessors() {
        let dag = diamond_dag();
        let order = dag.traversal().unwrap();
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        assert!(position["c"] > position["a"]);
        assert!(position["c"] > position["b"]);
    }

    #[test]
    fn traversal_rejects_invalid_dag() {
        let mut dag = Dag::new();
        dag.add_node(Node::action("a", "dev", "echo"));
        assert!(dag.traversal().is_err());
    }

    #[test]
    fn successors_keep_insertion_order() {
        let dag = diamond_dag();
        let successors = dag.successors(&NodeId::new("trigger"));
        let as_strs: Vec<&str> = successors.iter().map(|id| id.as_str()).collect();
        assert_eq!(as_strs, vec!["a", "b"]);
    }

    #[test]
    fn dag_serde_roundtrip() {
        let dag = diamond_dag();
        let json = serde_json::to_string(&dag).expect("serialize");
        let parsed: Dag = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(dag, parsed);
        assert!(parsed.validate().is_ok());
    }
}
