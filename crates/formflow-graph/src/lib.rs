//! Formflow Graph - Question flow management
//!
//! This crate owns the authoritative question collection and keeps its
//! structural diagnostics current. Every edit to the [`FormStore`] is
//! validated before it becomes visible, so the published questions and
//! the published diagnostics always describe the same snapshot.
//!
//! # Architecture
//!
//! - [`FlowGraph`] wraps petgraph and resolves option targets into edges
//! - [`validate`] classifies orphans, unreachable questions and cycles
//! - [`FormStore`] applies mutations and broadcasts [`StoreEvent`]s
//! - [`Simulation`] walks a flow the way a respondent would
//!
//! # Example
//!
//! ```
//! use formflow_graph::FormStore;
//!
//! let mut store = FormStore::new();
//! let q1 = store.add_question(Some("Do you own a car?"));
//! let q2 = store.add_question(Some("Which brand?"));
//! store.add_option(&q1, "Yes", Some(q2.clone())).unwrap();
//! store.add_option(&q1, "No", None).unwrap();
//!
//! // q2 has no options yet
//! assert_eq!(store.validation_state().orphans, vec![q2]);
//! ```

mod builder;
mod edge;
mod graph;
mod simulator;
mod store;
mod validator;

pub use builder::GraphBuilder;
pub use edge::{DanglingLink, GraphEdge, OptionEdge, DEFAULT_LINK_LABEL};
pub use graph::{FlowGraph, GraphStats, NodeId};
pub use simulator::{Simulation, SimulationError, StepOutcome, VisitedStep};
pub use store::{FlowState, FormStore, NodeStatus, StoreConfig, StoreError, StoreEvent};
pub use validator::{validate, validate_value, ValidationState};
