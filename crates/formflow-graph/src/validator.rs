//! Structural validation of a question flow.
//!
//! Three independent, non-exclusive diagnostics are computed from a
//! snapshot:
//!
//! - **orphans**: questions with no options at all (dead ends by
//!   construction, whether or not their options resolve)
//! - **unreachable**: questions no resolved option points at, except the
//!   start question, which is the entry point of the form
//! - **cycles**: paths found by depth-first search that re-enter a
//!   question already on the active path
//!
//! Unreachability is an incoming-degree check. A question fed only by
//! other unreachable questions is not reported.
//!
//! Each cycle is the slice of the search path starting at the first
//! occurrence of the re-entered question and ending with that question
//! again, where it was re-encountered. `q1 -> q2 -> q1` is reported as
//! `["q1", "q2", "q1"]`. Orphans and unreachable ids keep collection
//! order; cycles keep discovery order. Nothing is sorted.

use crate::graph::{FlowGraph, NodeId};
use formflow_core::Question;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// The diagnostics computed for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationState {
    pub orphans: Vec<String>,
    pub unreachable: Vec<String>,
    pub cycles: Vec<Vec<String>>,
}

impl ValidationState {
    /// True when no diagnostic was raised.
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.unreachable.is_empty() && self.cycles.is_empty()
    }

    pub fn is_orphan(&self, id: &str) -> bool {
        self.orphans.iter().any(|orphan| orphan == id)
    }

    pub fn is_unreachable(&self, id: &str) -> bool {
        self.unreachable.iter().any(|unreachable| unreachable == id)
    }

    /// True when the question takes part in at least one reported cycle.
    pub fn in_cycle(&self, id: &str) -> bool {
        self.cycles
            .iter()
            .any(|cycle| cycle.iter().any(|member| member == id))
    }

    /// Returns a summary suitable for CLI output.
    pub fn summary(&self) -> String {
        if self.is_clean() {
            return "Flow is valid: no unreachable, orphan or cyclic questions".to_string();
        }

        let mut lines = Vec::new();
        if !self.unreachable.is_empty() {
            lines.push(format!(
                "Unreachable: {} (no incoming links)",
                self.unreachable.join(", ")
            ));
        }
        if !self.orphans.is_empty() {
            lines.push(format!(
                "Orphans: {} (no outgoing options)",
                self.orphans.join(", ")
            ));
        }
        if !self.cycles.is_empty() {
            let cycles: Vec<String> = self.cycles.iter().map(|cycle| cycle.join(" → ")).collect();
            lines.push(format!("Cycles: {}", cycles.join("; ")));
        }
        lines.join("\n")
    }
}

/// Validates a snapshot of questions.
pub fn validate(questions: &[Question]) -> ValidationState {
    let graph = FlowGraph::from_questions(questions);

    let orphans: Vec<String> = questions
        .iter()
        .filter(|question| question.is_dead_end())
        .map(|question| question.id.clone())
        .collect();

    let start = graph.start();
    let unreachable: Vec<String> = graph
        .node_indexes()
        .filter(|&index| Some(index) != start && graph.incoming_count(index) == 0)
        .filter_map(|index| graph.id(index).map(str::to_string))
        .collect();

    let cycles = find_cycles(&graph);

    debug!(
        "Validated {} questions: {} orphans, {} unreachable, {} cycles",
        questions.len(),
        orphans.len(),
        unreachable.len(),
        cycles.len()
    );

    ValidationState {
        orphans,
        unreachable,
        cycles,
    }
}

/// Validates an arbitrary JSON value speculatively.
///
/// Anything that is not an array of questions yields empty diagnostics
/// instead of an error, so partially built state can be checked safely.
pub fn validate_value(value: &Value) -> ValidationState {
    if !value.is_array() {
        return ValidationState::default();
    }

    match Vec::<Question>::deserialize(value) {
        Ok(questions) => validate(&questions),
        Err(e) => {
            warn!("Skipping validation of malformed questions: {}", e);
            ValidationState::default()
        }
    }
}

/// Depth-first cycle search state.
struct CycleSearch<'a> {
    graph: &'a FlowGraph,
    /// Nodes fully explored from an earlier root (or the current one).
    explored: HashSet<NodeId>,
    /// Nodes on the active DFS path.
    on_path: HashSet<NodeId>,
    /// The active path, ending with the node being visited.
    path: Vec<NodeId>,
    cycles: Vec<Vec<NodeId>>,
}

impl<'a> CycleSearch<'a> {
    fn new(graph: &'a FlowGraph) -> Self {
        Self {
            graph,
            explored: HashSet::new(),
            on_path: HashSet::new(),
            path: Vec::new(),
            cycles: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Vec<NodeId>> {
        let graph = self.graph;
        // (node, its successors, index of the next successor to try)
        let mut frames: Vec<(NodeId, Vec<NodeId>, usize)> = Vec::new();

        for root in graph.node_indexes() {
            self.path.push(root);
            if self.enter(root) {
                frames.push((root, graph.successors(root), 0));
            } else {
                self.path.pop();
                continue;
            }

            while let Some(frame) = frames.last_mut() {
                let next = frame.1.get(frame.2).copied();
                frame.2 += 1;
                match next {
                    Some(next) => {
                        self.path.push(next);
                        if self.enter(next) {
                            frames.push((next, graph.successors(next), 0));
                        } else {
                            self.path.pop();
                        }
                    }
                    None => {
                        if let Some((node, _, _)) = frames.pop() {
                            self.on_path.remove(&node);
                        }
                        self.path.pop();
                    }
                }
            }
        }
        self.cycles
    }

    /// Handles arrival at `node`, which is already the last entry of
    /// `path`. Returns true when its successors still need exploring.
    fn enter(&mut self, node: NodeId) -> bool {
        if self.on_path.contains(&node) {
            if let Some(first) = self.path.iter().position(|&step| step == node) {
                self.cycles.push(self.path[first..].to_vec());
            }
            return false;
        }
        if !self.explored.insert(node) {
            return false;
        }
        self.on_path.insert(node);
        true
    }
}

fn find_cycles(graph: &FlowGraph) -> Vec<Vec<String>> {
    CycleSearch::new(graph)
        .run()
        .into_iter()
        .map(|cycle| {
            cycle
                .into_iter()
                .filter_map(|index| graph.id(index).map(str::to_string))
                .collect()
        })
        .collect()
}
