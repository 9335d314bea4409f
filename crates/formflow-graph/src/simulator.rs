//! Step-by-step walk through a flow, the way a respondent would see it.
//!
//! A simulation starts at the start question (or any chosen question),
//! follows the `next` of each chosen option, and ends when an option has
//! no `next`. The store's active question follows the walk so a diagram
//! can highlight it.

use crate::store::{FormStore, StoreError};
use formflow_core::Question;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("no questions available")]
    EmptyFlow,

    #[error("simulation already finished")]
    Finished,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One answered question on the visited path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitedStep {
    pub question_id: String,
    pub option_text: String,
}

impl std::fmt::Display for VisitedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.question_id, self.option_text)
    }
}

/// What happened after choosing an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved on to the named question.
    Moved(String),
    /// The option ended the form.
    Finished,
    /// The option pointed at a question that no longer exists; the run
    /// ends here.
    BrokenLink(String),
}

/// A running walk through the flow.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    current: Option<String>,
    path: Vec<VisitedStep>,
}

impl Simulation {
    /// Starts at the start question.
    pub fn start(store: &mut FormStore) -> Result<Self, SimulationError> {
        let start = store
            .start_question()
            .map(|q| q.id.clone())
            .ok_or(SimulationError::EmptyFlow)?;
        Self::start_at(store, &start)
    }

    /// Starts at any existing question.
    pub fn start_at(store: &mut FormStore, question_id: &str) -> Result<Self, SimulationError> {
        store.set_active_question(question_id)?;
        debug!("Simulation started at {}", question_id);
        Ok(Self {
            current: Some(question_id.to_string()),
            path: Vec::new(),
        })
    }

    /// Goes back to the start question and forgets the visited path.
    pub fn restart(&mut self, store: &mut FormStore) -> Result<(), SimulationError> {
        *self = Self::start(store)?;
        Ok(())
    }

    /// Id of the question being shown, `None` once finished.
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The question being shown.
    pub fn current_question<'s>(&self, store: &'s FormStore) -> Option<&'s Question> {
        store.question(self.current.as_deref()?)
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    /// Answers visited so far, in order.
    pub fn path(&self) -> &[VisitedStep] {
        &self.path
    }

    /// Chooses the option at `index` of the current question.
    pub fn choose(
        &mut self,
        store: &mut FormStore,
        index: usize,
    ) -> Result<StepOutcome, SimulationError> {
        let current = self.current.clone().ok_or(SimulationError::Finished)?;
        let question = store
            .question(&current)
            .ok_or_else(|| StoreError::QuestionNotFound(current.clone()))?;
        let option = question
            .options
            .get(index)
            .ok_or_else(|| StoreError::OptionOutOfRange {
                question_id: current.clone(),
                index,
                len: question.options.len(),
            })?;

        let text = option.text.clone();
        let next = option.target().map(str::to_string);

        self.path.push(VisitedStep {
            question_id: current,
            option_text: text,
        });

        let outcome = match next {
            None => StepOutcome::Finished,
            Some(next) if store.question(&next).is_none() => StepOutcome::BrokenLink(next),
            Some(next) => StepOutcome::Moved(next),
        };

        match &outcome {
            StepOutcome::Moved(next) => {
                store.set_active_question(next)?;
                self.current = Some(next.clone());
            }
            StepOutcome::Finished | StepOutcome::BrokenLink(_) => {
                store.clear_active_question();
                self.current = None;
            }
        }
        debug!("Simulation step: {:?}", outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formflow_core::QuestionOption;

    fn survey() -> FormStore {
        // q1 -yes-> q2 -done-> end, q1 -no-> end, q1 -lost-> q9 (dangling)
        FormStore::from_questions(vec![
            Question::new("q1", "Own a car?")
                .with_option(QuestionOption::new("Yes", Some("q2")))
                .with_option(QuestionOption::end("No"))
                .with_option(QuestionOption::new("Lost", Some("q9"))),
            Question::new("q2", "Which brand?").with_option(QuestionOption::end("Done")),
        ])
    }

    #[test]
    fn test_walk_to_the_end() {
        let mut store = survey();
        let mut sim = Simulation::start(&mut store).unwrap();
        assert_eq!(sim.current_id(), Some("q1"));
        assert_eq!(store.active_question(), Some("q1"));

        let outcome = sim.choose(&mut store, 0).unwrap();
        assert_eq!(outcome, StepOutcome::Moved("q2".to_string()));
        assert_eq!(sim.current_question(&store).unwrap().text, "Which brand?");
        assert_eq!(store.active_question(), Some("q2"));

        assert_eq!(sim.choose(&mut store, 0).unwrap(), StepOutcome::Finished);
        assert!(sim.is_finished());
        assert_eq!(store.active_question(), None);

        let path: Vec<String> = sim.path().iter().map(ToString::to_string).collect();
        assert_eq!(path, vec!["q1 (Yes)", "q2 (Done)"]);
    }

    #[test]
    fn test_finished_simulation_rejects_choices() {
        let mut store = survey();
        let mut sim = Simulation::start(&mut store).unwrap();
        sim.choose(&mut store, 1).unwrap();
        assert!(matches!(sim.choose(&mut store, 0), Err(SimulationError::Finished)));
    }

    #[test]
    fn test_dangling_option_ends_the_run() {
        let mut store = survey();
        let mut sim = Simulation::start(&mut store).unwrap();
        let outcome = sim.choose(&mut store, 2).unwrap();
        assert_eq!(outcome, StepOutcome::BrokenLink("q9".to_string()));
        assert!(sim.is_finished());
    }

    #[test]
    fn test_bad_option_index_keeps_position() {
        let mut store = survey();
        let mut sim = Simulation::start(&mut store).unwrap();
        assert!(sim.choose(&mut store, 7).is_err());
        assert_eq!(sim.current_id(), Some("q1"));
        assert!(sim.path().is_empty());
    }

    #[test]
    fn test_start_at_and_restart() {
        let mut store = survey();
        let mut sim = Simulation::start_at(&mut store, "q2").unwrap();
        sim.choose(&mut store, 0).unwrap();

        sim.restart(&mut store).unwrap();
        assert_eq!(sim.current_id(), Some("q1"));
        assert!(sim.path().is_empty());

        assert!(Simulation::start_at(&mut store, "q9").is_err());
    }

    #[test]
    fn test_empty_flow_cannot_start() {
        let mut store = FormStore::new();
        assert!(matches!(
            Simulation::start(&mut store),
            Err(SimulationError::EmptyFlow)
        ));
    }
}
