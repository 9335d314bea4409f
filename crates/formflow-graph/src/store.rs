//! The authoritative question store.
//!
//! Every mutation goes through one pipeline: copy the collection, apply
//! the change, validate the result, then swap the new questions and their
//! diagnostics in together and notify subscribers. A failed mutation
//! (unknown id, option index out of range) changes nothing and publishes
//! nothing.

use crate::graph::FlowGraph;
use crate::validator::{validate, ValidationState};
use formflow_core::{FlowDocument, ImportError, Position, Question, QuestionOption};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("question not found: {0}")]
    QuestionNotFound(String),

    #[error("question {question_id} has no option at index {index} ({len} options)")]
    OptionOutOfRange {
        question_id: String,
        index: usize,
        len: usize,
    },

    #[error("import failed: {0}")]
    Import(#[from] ImportError),
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the change notification channel. Slow subscribers
    /// that fall further behind than this miss intermediate events.
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { event_capacity: 64 }
    }
}

/// A published snapshot: questions paired with the diagnostics computed
/// from exactly those questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    pub questions: Vec<Question>,
    pub validation: ValidationState,
}

impl FlowState {
    fn derive(questions: Vec<Question>) -> Self {
        let validation = validate(&questions);
        Self {
            questions,
            validation,
        }
    }
}

/// Notifications sent to subscribers.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// The collection changed; carries the new snapshot and diagnostics.
    Changed(Arc<FlowState>),
    /// The highlighted question changed.
    ActiveChanged(Option<String>),
}

/// How a diagram should highlight a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Active,
    Unreachable,
    Orphan,
    Cycle,
    Ok,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Unreachable => "unreachable",
            Self::Orphan => "orphan",
            Self::Cycle => "cycle",
            Self::Ok => "ok",
        };
        write!(f, "{}", s)
    }
}

/// Single-writer container for the question collection.
pub struct FormStore {
    state: Arc<FlowState>,
    active_question: Option<String>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for FormStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FormStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store with custom configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            state: Arc::new(FlowState::default()),
            active_question: None,
            events,
        }
    }

    /// Creates a store already holding `questions`.
    pub fn from_questions(questions: Vec<Question>) -> Self {
        let mut store = Self::new();
        store.state = Arc::new(FlowState::derive(questions));
        store
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// The current questions, in collection order.
    pub fn snapshot(&self) -> &[Question] {
        &self.state.questions
    }

    /// The last computed diagnostics.
    pub fn validation_state(&self) -> &ValidationState {
        &self.state.validation
    }

    /// The current published state, shareable with other consumers.
    pub fn state(&self) -> Arc<FlowState> {
        Arc::clone(&self.state)
    }

    /// Looks up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.state.questions.iter().find(|q| q.id == id)
    }

    /// The designated start question.
    pub fn start_question(&self) -> Option<&Question> {
        self.state.questions.first()
    }

    /// Builds the resolved graph view of the current snapshot.
    pub fn graph(&self) -> FlowGraph {
        FlowGraph::from_questions(&self.state.questions)
    }

    /// Raw option targets per question, dangling references included.
    pub fn adjacency(&self) -> Vec<(String, Vec<String>)> {
        self.state
            .questions
            .iter()
            .map(|q| (q.id.clone(), q.targets().map(str::to_string).collect()))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Appends a new question with no options and returns its id.
    ///
    /// Ids are `q<n>` where `n` starts at the collection size plus one and
    /// is bumped past any id already taken.
    pub fn add_question(&mut self, text: Option<&str>) -> String {
        let ordinal = self.state.questions.len() + 1;
        let mut sequence = ordinal;
        let mut id = format!("q{}", sequence);
        while self.question(&id).is_some() {
            sequence += 1;
            id = format!("q{}", sequence);
        }

        let text = match text {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("Untitled Question {}", ordinal),
        };

        let question = Question::new(id.clone(), text);
        let mut questions = self.state.questions.clone();
        questions.push(question);
        self.commit(questions);
        debug!("Added question {}", id);
        id
    }

    /// Appends an option to a question.
    pub fn add_option(
        &mut self,
        question_id: &str,
        text: &str,
        next: Option<String>,
    ) -> Result<(), StoreError> {
        self.mutate(|questions| {
            let question = find_mut(questions, question_id)?;
            question.options.push(QuestionOption {
                text: text.to_string(),
                next,
            });
            Ok(())
        })
    }

    pub fn update_question_text(
        &mut self,
        question_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        self.mutate(|questions| {
            find_mut(questions, question_id)?.text = text.to_string();
            Ok(())
        })
    }

    pub fn update_option_text(
        &mut self,
        question_id: &str,
        index: usize,
        text: &str,
    ) -> Result<(), StoreError> {
        self.mutate(|questions| {
            option_mut(questions, question_id, index)?.text = text.to_string();
            Ok(())
        })
    }

    /// Points an option at another question. An empty or missing `next`
    /// makes the option end the form.
    pub fn update_option_next(
        &mut self,
        question_id: &str,
        index: usize,
        next: Option<String>,
    ) -> Result<(), StoreError> {
        let next = next.filter(|next| !next.is_empty());
        self.mutate(|questions| {
            option_mut(questions, question_id, index)?.next = next;
            Ok(())
        })
    }

    /// Removes one option. Other questions are untouched.
    pub fn delete_option(&mut self, question_id: &str, index: usize) -> Result<(), StoreError> {
        self.mutate(|questions| {
            let question = find_mut(questions, question_id)?;
            check_index(question, index)?;
            question.options.remove(index);
            Ok(())
        })
    }

    /// Removes a question.
    ///
    /// Options elsewhere that pointed at it keep their `next` verbatim and
    /// simply stop resolving.
    pub fn delete_question(&mut self, question_id: &str) -> Result<(), StoreError> {
        self.mutate(|questions| {
            let before = questions.len();
            questions.retain(|q| q.id != question_id);
            if questions.len() == before {
                return Err(StoreError::QuestionNotFound(question_id.to_string()));
            }
            Ok(())
        })
    }

    /// Sets the diagram position of a question. Display only.
    pub fn update_node_position(
        &mut self,
        question_id: &str,
        position: Option<Position>,
    ) -> Result<(), StoreError> {
        self.mutate(|questions| {
            find_mut(questions, question_id)?.position = position;
            Ok(())
        })
    }

    /// Replaces the whole collection.
    pub fn replace_all(&mut self, questions: Vec<Question>) {
        debug!("Replacing collection with {} questions", questions.len());
        self.commit(questions);
    }

    /// Imports a JSON document, replacing the collection.
    ///
    /// On failure the store keeps its previous state and the error is
    /// returned for the caller to report.
    pub fn import_json(&mut self, text: &str) -> Result<usize, StoreError> {
        let document = FlowDocument::from_json(text).map_err(|e| {
            warn!("Import rejected: {}", e);
            StoreError::Import(e)
        })?;

        let count = document.questions.len();
        self.replace_all(document.questions);
        info!("Form flow loaded: {} questions", count);
        Ok(count)
    }

    /// Exports the current collection in wire form.
    pub fn export_document(&self) -> FlowDocument {
        FlowDocument::new(self.state.questions.clone())
    }

    /// Recomputes diagnostics for the current snapshot and republishes.
    pub fn run_validation(&mut self) {
        let questions = self.state.questions.clone();
        self.commit(questions);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Active question
    // ─────────────────────────────────────────────────────────────────────

    /// The question currently highlighted, if any.
    pub fn active_question(&self) -> Option<&str> {
        self.active_question.as_deref()
    }

    /// Highlights an existing question.
    pub fn set_active_question(&mut self, question_id: &str) -> Result<(), StoreError> {
        if self.question(question_id).is_none() {
            warn!("Cannot activate unknown question {}", question_id);
            return Err(StoreError::QuestionNotFound(question_id.to_string()));
        }
        self.set_active(Some(question_id.to_string()));
        Ok(())
    }

    pub fn clear_active_question(&mut self) {
        self.set_active(None);
    }

    /// Classifies a question for highlighting.
    ///
    /// Precedence: active, unreachable, orphan, cycle, ok.
    pub fn node_status(&self, question_id: &str) -> Option<NodeStatus> {
        self.question(question_id)?;

        let validation = &self.state.validation;
        let status = if self.active_question() == Some(question_id) {
            NodeStatus::Active
        } else if validation.is_unreachable(question_id) {
            NodeStatus::Unreachable
        } else if validation.is_orphan(question_id) {
            NodeStatus::Orphan
        } else if validation.in_cycle(question_id) {
            NodeStatus::Cycle
        } else {
            NodeStatus::Ok
        };
        Some(status)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Pipeline
    // ─────────────────────────────────────────────────────────────────────

    /// Applies `change` to a copy of the collection and commits it if the
    /// change succeeds.
    fn mutate<F>(&mut self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Question>) -> Result<(), StoreError>,
    {
        let mut questions = self.state.questions.clone();
        if let Err(e) = change(&mut questions) {
            warn!("Mutation had no effect: {}", e);
            return Err(e);
        }
        self.commit(questions);
        Ok(())
    }

    /// Validates `questions` and publishes them together with the result.
    fn commit(&mut self, questions: Vec<Question>) {
        let state = Arc::new(FlowState::derive(questions));
        debug!(
            "Committed {} questions (clean: {})",
            state.questions.len(),
            state.validation.is_clean()
        );
        self.state = Arc::clone(&state);
        // No subscribers is fine
        let _ = self.events.send(StoreEvent::Changed(state));

        let active_gone = self
            .active_question
            .as_deref()
            .is_some_and(|id| self.question(id).is_none());
        if active_gone {
            self.set_active(None);
        }
    }

    fn set_active(&mut self, active: Option<String>) {
        if self.active_question == active {
            return;
        }
        self.active_question = active.clone();
        let _ = self.events.send(StoreEvent::ActiveChanged(active));
    }
}

fn find_mut<'a>(questions: &'a mut [Question], id: &str) -> Result<&'a mut Question, StoreError> {
    questions
        .iter_mut()
        .find(|q| q.id == id)
        .ok_or_else(|| StoreError::QuestionNotFound(id.to_string()))
}

fn check_index(question: &Question, index: usize) -> Result<(), StoreError> {
    if index >= question.options.len() {
        return Err(StoreError::OptionOutOfRange {
            question_id: question.id.clone(),
            index,
            len: question.options.len(),
        });
    }
    Ok(())
}

fn option_mut<'a>(
    questions: &'a mut [Question],
    id: &str,
    index: usize,
) -> Result<&'a mut QuestionOption, StoreError> {
    let question = find_mut(questions, id)?;
    check_index(question, index)?;
    Ok(&mut question.options[index])
}
