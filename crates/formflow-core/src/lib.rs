//! Formflow Core - Questionnaire data model
//!
//! This crate defines the pieces every other part of Formflow works with:
//! questions, the options that link them together, and the JSON document
//! used to move a flow in and out of the editor.
//!
//! # Example
//!
//! ```
//! use formflow_core::{FlowDocument, Question, QuestionOption};
//!
//! let mut start = Question::new("q1", "Do you own a car?");
//! start.options.push(QuestionOption::new("Yes", Some("q2")));
//! start.options.push(QuestionOption::end("No"));
//!
//! let doc = FlowDocument::new(vec![start, Question::new("q2", "Which brand?")]);
//! let json = doc.to_json_pretty().unwrap();
//! let back = FlowDocument::from_json(&json).unwrap();
//! assert_eq!(back.questions.len(), 2);
//! ```

pub mod document;
pub mod error;
pub mod question;

pub use document::{FlowDocument, DEFAULT_EXPORT_FILE};
pub use error::{ImportError, Result};
pub use question::{Position, Question, QuestionOption};
