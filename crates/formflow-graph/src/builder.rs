//! Graph builder for constructing the flow graph from questions.
//!
//! The builder handles the two-pass process:
//! 1. Add every question as a node
//! 2. Resolve option targets into edges, once all ids are known

use crate::edge::{DanglingLink, OptionEdge};
use crate::graph::{FlowGraph, NodeId};
use formflow_core::Question;

/// An option waiting for its target to be resolved.
struct PendingLink {
    from: NodeId,
    option_index: usize,
    text: String,
    target: String,
}

/// Builds a [`FlowGraph`] from a question snapshot.
#[derive(Default)]
pub struct GraphBuilder {
    graph: FlowGraph,
    pending: Vec<PendingLink>,
}

impl GraphBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds questions to the graph, in collection order.
    ///
    /// A repeated id reuses the node of its first occurrence; its options
    /// are attached to that node as well.
    pub fn add_questions(&mut self, questions: &[Question]) {
        for question in questions {
            let from = match self.graph.get_index(&question.id) {
                Some(existing) => existing,
                None => self.graph.add_node(question.id.clone()),
            };

            for (option_index, option) in question.options.iter().enumerate() {
                if let Some(target) = option.target() {
                    self.pending.push(PendingLink {
                        from,
                        option_index,
                        text: option.text.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }
    }

    /// Resolves pending option targets into edges.
    ///
    /// Targets that name no known question are recorded as dangling
    /// links and produce no edge.
    pub fn resolve_edges(&mut self) {
        for link in std::mem::take(&mut self.pending) {
            match self.graph.get_index(&link.target) {
                Some(to) => {
                    self.graph
                        .add_edge(link.from, to, OptionEdge::new(link.option_index, link.text));
                }
                None => {
                    let source = self.graph.id(link.from).unwrap_or_default().to_string();
                    self.graph.add_dangling(DanglingLink {
                        source,
                        option_index: link.option_index,
                        target: link.target,
                    });
                }
            }
        }
    }

    /// Finishes building and returns the graph.
    pub fn build(mut self) -> FlowGraph {
        self.resolve_edges();
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formflow_core::QuestionOption;

    #[test]
    fn test_builder_adds_nodes() {
        let mut builder = GraphBuilder::new();
        builder.add_questions(&[Question::new("q1", "A"), Question::new("q2", "B")]);
        let graph = builder.build();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_builder_resolves_forward_references() {
        // q1 points at q2, which is added after it
        let mut builder = GraphBuilder::new();
        builder.add_questions(&[
            Question::new("q1", "A").with_option(QuestionOption::new("next", Some("q2"))),
            Question::new("q2", "B"),
        ]);
        let graph = builder.build();

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.dangling().is_empty());
    }

    #[test]
    fn test_builder_drops_dangling_targets() {
        let mut builder = GraphBuilder::new();
        builder.add_questions(&[
            Question::new("q1", "A").with_option(QuestionOption::new("gone", Some("q9")))
        ]);
        let graph = builder.build();

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.dangling().len(), 1);
        assert_eq!(graph.dangling()[0].target, "q9");
        assert_eq!(graph.dangling()[0].source, "q1");
    }

    #[test]
    fn test_duplicate_ids_share_a_node() {
        let mut builder = GraphBuilder::new();
        builder.add_questions(&[
            Question::new("q1", "A").with_option(QuestionOption::new("a", Some("q2"))),
            Question::new("q2", "B"),
            Question::new("q1", "A again").with_option(QuestionOption::new("b", Some("q2"))),
        ]);
        let graph = builder.build();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
    }
}
