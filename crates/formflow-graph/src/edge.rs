//! Edge types for the flow graph.
//!
//! Every resolved option becomes one edge. Two options of the same
//! question pointing at the same target produce two parallel edges, so
//! incoming counts reflect the number of options, not distinct sources.

use serde::{Deserialize, Serialize};

/// Label used for links whose option text is empty.
pub const DEFAULT_LINK_LABEL: &str = "Option";

/// Weight stored on each graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEdge {
    /// Position of the option within its question.
    pub option_index: usize,

    /// The option's label.
    pub text: String,
}

impl OptionEdge {
    pub fn new(option_index: usize, text: impl Into<String>) -> Self {
        Self {
            option_index,
            text: text.into(),
        }
    }

    /// The label a diagram should draw on this link.
    pub fn label(&self) -> &str {
        if self.text.is_empty() {
            DEFAULT_LINK_LABEL
        } else {
            &self.text
        }
    }
}

/// A simplified edge for diagram export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// An option whose `next` names a question that does not exist.
///
/// These are not edges. They are kept so tools can point at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingLink {
    pub source: String,
    pub option_index: usize,
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_uses_default_label() {
        assert_eq!(OptionEdge::new(0, "").label(), DEFAULT_LINK_LABEL);
        assert_eq!(OptionEdge::new(1, "Yes").label(), "Yes");
    }
}
