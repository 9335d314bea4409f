//! The serialized flow document.
//!
//! This is the JSON shape exchanged at the import/export boundary:
//!
//! ```json
//! { "questions": [
//!     { "id": "q1", "text": "...",
//!       "options": [ { "text": "...", "next": "q2" } ],
//!       "position": { "x": 0.0, "y": 0.0 } } ] }
//! ```
//!
//! Import is lenient about individual fields (a missing `position` becomes
//! `None`) but strict about the envelope: the top-level `questions` field
//! must exist and be an array.

use crate::error::{ImportError, Result};
use crate::question::Question;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// File name used when exporting without an explicit destination.
pub const DEFAULT_EXPORT_FILE: &str = "form_flow.json";

/// A whole questionnaire as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    pub questions: Vec<Question>,
}

impl FlowDocument {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Parses a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Builds a document from an already parsed JSON value.
    ///
    /// Rejects payloads without a `questions` array. Each entry is decoded
    /// on its own so the error can name the offending index.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            warn!("Rejected flow document: top level is not an object");
            return Err(ImportError::MissingQuestions);
        };

        let entries = match root.remove("questions") {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                warn!("Rejected flow document: questions is not an array");
                return Err(ImportError::QuestionsNotSequence);
            }
            None => {
                warn!("Rejected flow document: questions field missing");
                return Err(ImportError::MissingQuestions);
            }
        };

        let questions = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                serde_json::from_value::<Question>(entry)
                    .map_err(|source| ImportError::InvalidQuestion { index, source })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Decoded flow document with {} questions", questions.len());
        Ok(Self { questions })
    }

    /// Serializes the document with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads and decodes a document from disk.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Writes the document to disk, replacing any existing file.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{Position, QuestionOption};
    use tempfile::tempdir;

    #[test]
    fn test_missing_questions_is_rejected() {
        let err = FlowDocument::from_json(r#"{"nodes": []}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingQuestions));
    }

    #[test]
    fn test_non_array_questions_is_rejected() {
        let err = FlowDocument::from_json(r#"{"questions": {"id": "q1"}}"#).unwrap_err();
        assert!(matches!(err, ImportError::QuestionsNotSequence));
    }

    #[test]
    fn test_top_level_array_is_rejected() {
        let err = FlowDocument::from_json("[]").unwrap_err();
        assert!(matches!(err, ImportError::MissingQuestions));
    }

    #[test]
    fn test_broken_json_is_reported() {
        let err = FlowDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ImportError::Json(_)));
    }

    #[test]
    fn test_invalid_entry_names_index() {
        let err = FlowDocument::from_json(r#"{"questions": [{"id": "q1"}, {"text": "no id"}]}"#)
            .unwrap_err();
        match err {
            ImportError::InvalidQuestion { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_position_is_tolerated() {
        let doc = FlowDocument::from_json(
            r#"{"questions": [{"id": "q1", "text": "Start", "options": [{"text": "Go", "next": null}]}]}"#,
        )
        .unwrap();
        assert_eq!(doc.questions[0].position, None);
        assert_eq!(doc.questions[0].options[0].next, None);
    }

    #[test]
    fn test_export_includes_every_field() {
        let mut q1 = Question::new("q1", "Start").with_option(QuestionOption::new("Go", Some("q2")));
        q1.position = Some(Position::new(10.0, 20.0));
        let q2 = Question::new("q2", "End");
        let doc = FlowDocument::new(vec![q1, q2]);

        let value: Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
        let questions = value["questions"].as_array().unwrap();
        assert_eq!(questions[0]["options"][0]["next"], "q2");
        assert_eq!(questions[0]["position"]["x"], 10.0);
        assert!(questions[1]["position"].is_null());
        assert!(questions[1]["options"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_FILE);

        let doc = FlowDocument::new(vec![
            Question::new("q1", "Start").with_option(QuestionOption::end("Done")),
        ]);
        doc.write_to(&path).unwrap();

        let loaded = FlowDocument::read_from(&path).unwrap();
        assert_eq!(loaded, doc);
    }
}
