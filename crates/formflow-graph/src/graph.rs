//! Core graph data structure.
//!
//! The FlowGraph wraps petgraph and keeps an id index so questions can be
//! looked up by their string id. It is a read-only view derived from a
//! question snapshot: build it, query it, throw it away.

use crate::builder::GraphBuilder;
use crate::edge::{DanglingLink, GraphEdge, OptionEdge};
use formflow_core::Question;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a question node in the graph.
pub type NodeId = NodeIndex;

/// The directed graph of questions and their resolved option links.
///
/// Node weights are question ids. Nodes are added in collection order, so
/// the first node is always the designated start question.
#[derive(Debug, Default)]
pub struct FlowGraph {
    /// The underlying petgraph graph.
    graph: DiGraph<String, OptionEdge>,

    /// Maps question ids to graph node indexes.
    id_index: HashMap<String, NodeId>,

    /// Options whose target does not resolve.
    dangling: Vec<DanglingLink>,
}

impl FlowGraph {
    /// Builds the graph for a snapshot of questions.
    pub fn from_questions(questions: &[Question]) -> Self {
        let mut builder = GraphBuilder::new();
        builder.add_questions(questions);
        builder.build()
    }

    pub(crate) fn add_node(&mut self, id: String) -> NodeId {
        let index = self.graph.add_node(id.clone());
        self.id_index.insert(id, index);
        index
    }

    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId, edge: OptionEdge) {
        self.graph.add_edge(from, to, edge);
    }

    pub(crate) fn add_dangling(&mut self, link: DanglingLink) {
        self.dangling.push(link);
    }

    /// Gets the node index for a question id.
    pub fn get_index(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// Gets the question id stored at a node.
    pub fn id(&self, index: NodeId) -> Option<&str> {
        self.graph.node_weight(index).map(String::as_str)
    }

    /// The designated start node: the first question in collection order.
    pub fn start(&self) -> Option<NodeId> {
        self.graph.node_indices().next()
    }

    /// Targets of a node's resolved options, in option order.
    ///
    /// A target reached by several options appears once per option.
    pub fn successors(&self, index: NodeId) -> Vec<NodeId> {
        // petgraph walks outgoing edges newest-first
        let mut next: Vec<NodeId> = self.graph.neighbors(index).collect();
        next.reverse();
        next
    }

    /// Number of resolved options, across all questions, pointing at a node.
    pub fn incoming_count(&self, index: NodeId) -> usize {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .count()
    }

    /// Returns the number of distinct questions.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of resolved option links.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over node indexes in collection order.
    pub fn node_indexes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// Options whose target does not resolve, in collection order.
    pub fn dangling(&self) -> &[DanglingLink] {
        &self.dangling
    }

    /// Returns all resolved links with source and target ids for a diagram.
    pub fn export_edges(&self) -> Vec<GraphEdge> {
        self.graph
            .edge_references()
            .filter_map(|edge_ref| {
                let source = self.id(edge_ref.source())?;
                let target = self.id(edge_ref.target())?;
                Some(GraphEdge {
                    source: source.to_string(),
                    target: target.to_string(),
                    label: edge_ref.weight().label().to_string(),
                })
            })
            .collect()
    }

    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            question_count: self.node_count(),
            link_count: self.edge_count(),
            dangling_count: self.dangling.len(),
        }
    }
}

/// Graph statistics for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub question_count: usize,
    pub link_count: usize,
    pub dangling_count: usize,
}
