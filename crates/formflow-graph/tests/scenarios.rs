//! End-to-end checks of the store and validator working together.

use formflow_core::{Question, QuestionOption};
use formflow_graph::{validate, validate_value, FormStore, StoreError, StoreEvent};
use serde_json::json;

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn mutual_links_form_one_cycle() {
    let mut store = FormStore::new();
    let q1 = store.add_question(Some("First"));
    let q2 = store.add_question(Some("Second"));
    store.add_option(&q1, "to second", Some(q2.clone())).unwrap();
    store.add_option(&q2, "to first", Some(q1.clone())).unwrap();

    let state = store.validation_state();
    assert!(state.orphans.is_empty());
    assert!(state.unreachable.is_empty());
    assert_eq!(state.cycles.len(), 1);

    let cycle = &state.cycles[0];
    assert!(cycle.contains(&q1) && cycle.contains(&q2));
    assert_eq!(cycle, &ids(&["q1", "q2", "q1"]));
}

#[test]
fn dead_ends_and_unreachable_questions() {
    let mut store = FormStore::new();
    store.add_question(None);
    store.add_question(None);
    store.add_question(None);
    store.add_option("q1", "next", Some("q2".to_string())).unwrap();

    let state = store.validation_state();
    assert_eq!(state.orphans, ids(&["q2", "q3"]));
    assert_eq!(state.unreachable, ids(&["q3"]));
    assert!(state.cycles.is_empty());
}

#[test]
fn import_without_questions_key_is_reported() {
    let mut store = FormStore::new();
    store.add_question(Some("Keep me"));
    let before = store.snapshot().to_vec();
    let mut rx = store.subscribe();

    let result = store.import_json(r#"{"title": "no questions here"}"#);

    assert!(matches!(result, Err(StoreError::Import(_))));
    assert_eq!(store.snapshot(), before.as_slice());
    assert!(rx.try_recv().is_err());
}

#[test]
fn deleted_target_stays_referenced() {
    let mut store = FormStore::new();
    store.add_question(None);
    store.add_question(None);
    store.add_option("q1", "go", Some("q2".to_string())).unwrap();

    store.delete_question("q2").unwrap();

    let q1 = &store.snapshot()[0];
    assert_eq!(q1.options[0].next.as_deref(), Some("q2"));
    assert!(store.validation_state().is_clean());
    assert!(store.graph().export_edges().is_empty());
    assert_eq!(store.graph().dangling().len(), 1);
}

#[test]
fn every_published_state_matches_its_questions() {
    let mut store = FormStore::new();
    let mut rx = store.subscribe();

    store.add_question(Some("A"));
    store.add_question(Some("B"));
    store.add_option("q1", "a", Some("q2".to_string())).unwrap();
    store.add_option("q2", "b", Some("q1".to_string())).unwrap();
    store.update_option_next("q2", 0, None).unwrap();
    store.delete_option("q1", 0).unwrap();
    store.delete_question("q1").unwrap();

    let mut published = 0;
    while let Ok(event) = rx.try_recv() {
        if let StoreEvent::Changed(state) = event {
            assert_eq!(state.validation, validate(&state.questions));
            published += 1;
        }
    }
    assert_eq!(published, 7);
    assert_eq!(*store.validation_state(), validate(store.snapshot()));
}

#[test]
fn deleting_a_question_leaves_other_options_alone() {
    let questions = vec![
        Question::new("q1", "A")
            .with_option(QuestionOption::new("b", Some("q2")))
            .with_option(QuestionOption::new("c", Some("q3"))),
        Question::new("q2", "B").with_option(QuestionOption::new("c", Some("q3"))),
        Question::new("q3", "C"),
    ];
    let mut store = FormStore::from_questions(questions.clone());

    store.delete_question("q3").unwrap();

    assert_eq!(store.snapshot()[0].options, questions[0].options);
    assert_eq!(store.snapshot()[1].options, questions[1].options);
}

#[test]
fn speculative_validation_of_odd_input() {
    let empty = validate(&[]);
    assert!(empty.orphans.is_empty() && empty.unreachable.is_empty() && empty.cycles.is_empty());
    assert_eq!(validate_value(&json!({"not": "an array"})), empty);
    assert_eq!(validate_value(&json!(42)), empty);
}
