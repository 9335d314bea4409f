//! Questions and the options that link them.
//!
//! A question is a node of the flow. Each option is an outgoing edge
//! template: it may point at another question through `next`, or leave
//! `next` empty to mark the end of the form. A `next` that names a
//! question which no longer exists is kept verbatim; graph consumers
//! simply ignore it.

use serde::{Deserialize, Serialize};

/// Display coordinates of a node in the diagram. Has no effect on the
/// graph itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A labeled choice belonging to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Label shown for the choice.
    #[serde(default)]
    pub text: String,

    /// Id of the question this choice leads to. `None` ends the form.
    #[serde(default)]
    pub next: Option<String>,
}

impl QuestionOption {
    /// Creates an option leading to `next`.
    pub fn new(text: impl Into<String>, next: Option<impl Into<String>>) -> Self {
        Self {
            text: text.into(),
            next: next.map(Into::into),
        }
    }

    /// Creates an option that ends the form.
    pub fn end(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next: None,
        }
    }

    /// Returns the target id if this option points anywhere.
    ///
    /// An empty string counts as "end of form", the same as `None`.
    pub fn target(&self) -> Option<&str> {
        self.next.as_deref().filter(|next| !next.is_empty())
    }
}

/// A single step of the questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique, stable identifier (e.g. "q3").
    pub id: String,

    /// Display label.
    #[serde(default)]
    pub text: String,

    /// Choices in display order.
    #[serde(default)]
    pub options: Vec<QuestionOption>,

    /// Manual diagram position. Always serialized, as `null` when unset.
    #[serde(default)]
    pub position: Option<Position>,
}

impl Question {
    /// Creates a question with no options and no position.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            options: Vec::new(),
            position: None,
        }
    }

    /// Builder-style helper that appends an option.
    pub fn with_option(mut self, option: QuestionOption) -> Self {
        self.options.push(option);
        self
    }

    /// True when the question has no outgoing choices at all.
    pub fn is_dead_end(&self) -> bool {
        self.options.is_empty()
    }

    /// Iterates over the non-empty `next` ids of this question's options,
    /// whether or not they resolve.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.options.iter().filter_map(QuestionOption::target)
    }
}
