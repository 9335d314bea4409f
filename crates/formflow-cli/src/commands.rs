//! CLI command implementations.

use colored::Colorize;
use formflow_core::{FlowDocument, Position, DEFAULT_EXPORT_FILE};
use formflow_graph::{FormStore, NodeStatus, Simulation, StepOutcome, ValidationState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const CONFIG_DIR: &str = ".formflow";
const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("flow file not found: {0} (run `formflow new` first)")]
    MissingFlow(PathBuf),

    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("flow has {0} structural issue(s)")]
    ValidationFailed(usize),
}

/// Project configuration written by `formflow init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub version: String,
    /// Flow file, relative to the directory holding `.formflow/`.
    pub flow: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            flow: PathBuf::from(DEFAULT_EXPORT_FILE),
        }
    }
}

impl CliConfig {
    fn load(dir: &Path) -> Option<Self> {
        let path = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring unreadable config {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Picks the flow file: explicit flag, then project config, then default.
pub fn resolve_flow_path(file: Option<&Path>) -> PathBuf {
    if let Some(file) = file {
        return file.to_path_buf();
    }
    match CliConfig::load(Path::new(".")) {
        Some(config) => config.flow,
        None => PathBuf::from(DEFAULT_EXPORT_FILE),
    }
}

fn load_store(flow: &Path) -> Result<FormStore> {
    if !flow.exists() {
        return Err(CommandError::MissingFlow(flow.to_path_buf()).into());
    }
    let text = fs::read_to_string(flow)?;
    let mut store = FormStore::new();
    let count = store.import_json(&text)?;
    debug!("Loaded {} questions from {}", count, flow.display());
    Ok(store)
}

fn save_store(store: &FormStore, flow: &Path) -> Result<()> {
    store.export_document().write_to(flow)?;
    debug!("Saved {} questions to {}", store.snapshot().len(), flow.display());
    Ok(())
}

/// Loads the flow, applies `edit`, saves it and reports the diagnostics.
fn edit_flow<F>(flow: &Path, edit: F) -> Result<()>
where
    F: FnOnce(&mut FormStore) -> Result<String>,
{
    let mut store = load_store(flow)?;
    let message = edit(&mut store)?;
    save_store(&store, flow)?;

    println!("{} {}", "✓".green(), message);
    print_diagnostics(store.validation_state());
    Ok(())
}

/// Initialize Formflow in a directory.
pub fn init(path: &Path) -> Result<()> {
    let config_dir = path.join(CONFIG_DIR);

    if config_dir.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    fs::create_dir_all(&config_dir)?;

    let config = CliConfig::default();
    fs::write(
        config_dir.join(CONFIG_FILE),
        serde_json::to_string_pretty(&config)?,
    )?;

    let flow = path.join(&config.flow);
    if !flow.exists() {
        FlowDocument::default().write_to(&flow)?;
    }

    info!("Initialized {}", config_dir.display());
    println!("{} Initialized Formflow in {}", "✓".green(), path.display());
    println!("  Run {} to start building", "formflow add-question".cyan());

    Ok(())
}

/// Create an empty flow file.
pub fn new_flow(flow: &Path, force: bool) -> Result<()> {
    if flow.exists() && !force {
        return Err(CommandError::AlreadyExists(flow.to_path_buf()).into());
    }
    FlowDocument::default().write_to(flow)?;
    println!("{} Created {}", "✓".green(), flow.display());
    Ok(())
}

pub fn add_question(flow: &Path, text: Option<&str>) -> Result<()> {
    edit_flow(flow, |store| {
        let id = store.add_question(text);
        Ok(format!("Added question {}", id.cyan()))
    })
}

pub fn add_option(flow: &Path, question: &str, text: &str, next: Option<String>) -> Result<()> {
    edit_flow(flow, |store| {
        store.add_option(question, text, next)?;
        Ok(format!("Added option \"{}\" to {}", text, question.cyan()))
    })
}

pub fn set_text(flow: &Path, question: &str, text: &str) -> Result<()> {
    edit_flow(flow, |store| {
        store.update_question_text(question, text)?;
        Ok(format!("Updated {}", question.cyan()))
    })
}

pub fn set_option_text(flow: &Path, question: &str, index: usize, text: &str) -> Result<()> {
    edit_flow(flow, |store| {
        store.update_option_text(question, index, text)?;
        Ok(format!("Updated option {} of {}", index, question.cyan()))
    })
}

/// Points an option at `target`, or makes it end the form.
pub fn link(flow: &Path, question: &str, index: usize, target: Option<String>) -> Result<()> {
    edit_flow(flow, |store| {
        if let Some(target) = target.as_deref() {
            if store.question(target).is_none() {
                warn!("Linking to {}, which does not exist yet", target);
            }
        }
        let message = match target.as_deref() {
            Some(target) => format!("Linked {}[{}] → {}", question.cyan(), index, target.cyan()),
            None => format!("{}[{}] now ends the form", question.cyan(), index),
        };
        store.update_option_next(question, index, target)?;
        Ok(message)
    })
}

pub fn delete_option(flow: &Path, question: &str, index: usize) -> Result<()> {
    edit_flow(flow, |store| {
        store.delete_option(question, index)?;
        Ok(format!("Deleted option {} of {}", index, question.cyan()))
    })
}

pub fn delete_question(flow: &Path, question: &str) -> Result<()> {
    edit_flow(flow, |store| {
        store.delete_question(question)?;
        let referrers: Vec<String> = store
            .adjacency()
            .into_iter()
            .filter(|(_, targets)| targets.iter().any(|target| target == question))
            .map(|(id, _)| id)
            .collect();
        let mut message = format!("Deleted {}", question.cyan());
        if !referrers.is_empty() {
            message.push_str(&format!(
                " ({} still link to it: {})",
                referrers.len(),
                referrers.join(", ")
            ));
        }
        Ok(message)
    })
}

pub fn move_question(flow: &Path, question: &str, position: Option<(f64, f64)>) -> Result<()> {
    edit_flow(flow, |store| {
        let position = position.map(|(x, y)| Position::new(x, y));
        store.update_node_position(question, position)?;
        Ok(match position {
            Some(p) => format!("Moved {} to ({}, {})", question.cyan(), p.x, p.y),
            None => format!("Cleared position of {}", question.cyan()),
        })
    })
}

/// Print the flow.
pub fn show(flow: &Path, json: bool) -> Result<()> {
    let store = load_store(flow)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*store.state())?);
        return Ok(());
    }

    let graph = store.graph();
    let stats = graph.stats();
    println!(
        "{} questions, {} links, {} dangling\n",
        stats.question_count.to_string().cyan(),
        stats.link_count.to_string().cyan(),
        stats.dangling_count
    );

    for (position, question) in store.snapshot().iter().enumerate() {
        let status = store.node_status(&question.id).unwrap_or(NodeStatus::Ok);
        let marker = if position == 0 { " (start)" } else { "" };
        println!(
            "  {} {}{} {}",
            question.id.cyan().bold(),
            question.text,
            marker.dimmed(),
            status_label(status)
        );

        for (index, option) in question.options.iter().enumerate() {
            let target = match option.target() {
                Some(target) if store.question(target).is_some() => target.to_string(),
                Some(target) => format!("{} (missing)", target).red().to_string(),
                None => "end".dimmed().to_string(),
            };
            println!("    [{}] {} → {}", index, option.text, target);
        }
    }

    println!();
    print_diagnostics(store.validation_state());
    Ok(())
}

/// Report structural diagnostics.
pub fn check(flow: &Path, strict: bool, json: bool) -> Result<()> {
    let store = load_store(flow)?;
    let state = store.validation_state();

    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        print_diagnostics(state);
    }

    let issues = state.orphans.len() + state.unreachable.len() + state.cycles.len();
    if strict && issues > 0 {
        return Err(CommandError::ValidationFailed(issues).into());
    }
    Ok(())
}

/// Export the normalized flow document.
pub fn export(flow: &Path, output: &Path) -> Result<()> {
    let store = load_store(flow)?;
    save_store(&store, output)?;
    println!("{} Exported to {}", "✓".green(), output.display());
    Ok(())
}

/// Walk the flow with scripted choices.
pub fn simulate(flow: &Path, choices: &[usize], from: Option<&str>) -> Result<()> {
    let mut store = load_store(flow)?;
    let mut sim = match from {
        Some(id) => Simulation::start_at(&mut store, id)?,
        None => Simulation::start(&mut store)?,
    };

    for &choice in choices {
        if let Some(question) = sim.current_question(&store) {
            println!("{} {}", "?".cyan(), question.text);
        }
        match sim.choose(&mut store, choice)? {
            StepOutcome::Moved(next) => debug!("Moved to {}", next),
            StepOutcome::Finished => {
                println!("{} End of form reached", "✓".green());
                break;
            }
            StepOutcome::BrokenLink(target) => {
                println!("{} Option leads to missing question {}", "⚠".yellow(), target.red());
                break;
            }
        }
    }

    if let Some(question) = sim.current_question(&store) {
        println!("{} {} (waiting for an answer)", "?".cyan(), question.text);
        for (index, option) in question.options.iter().enumerate() {
            println!("    [{}] {}", index, option.text);
        }
    }

    if !sim.path().is_empty() {
        let path: Vec<String> = sim.path().iter().map(ToString::to_string).collect();
        println!("\nVisited path: {}", path.join(" → "));
    }
    Ok(())
}

fn status_label(status: NodeStatus) -> String {
    match status {
        NodeStatus::Ok | NodeStatus::Active => String::new(),
        NodeStatus::Unreachable => format!("[{}]", status).red().to_string(),
        NodeStatus::Orphan => format!("[{}]", status).yellow().to_string(),
        NodeStatus::Cycle => format!("[{}]", status).magenta().to_string(),
    }
}

fn print_diagnostics(state: &ValidationState) {
    if state.is_clean() {
        println!("{} {}", "✓".green(), state.summary());
        return;
    }

    for line in state.summary().lines() {
        println!("{} {}", "⚠".yellow(), line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_edit_flow_persists_changes() {
        let dir = tempdir().unwrap();
        let flow = dir.path().join("flow.json");

        new_flow(&flow, false).unwrap();
        add_question(&flow, Some("Start")).unwrap();
        add_question(&flow, None).unwrap();
        add_option(&flow, "q1", "Go", Some("q2".to_string())).unwrap();

        let doc = FlowDocument::read_from(&flow).unwrap();
        assert_eq!(doc.questions.len(), 2);
        assert_eq!(doc.questions[0].options[0].next.as_deref(), Some("q2"));
    }

    #[test]
    fn test_move_to_negative_position() {
        let dir = tempdir().unwrap();
        let flow = dir.path().join("flow.json");
        new_flow(&flow, false).unwrap();
        add_question(&flow, None).unwrap();

        move_question(&flow, "q1", Some((-120.0, 40.0))).unwrap();

        let doc = FlowDocument::read_from(&flow).unwrap();
        assert_eq!(doc.questions[0].position, Some(Position::new(-120.0, 40.0)));
    }

    #[test]
    fn test_new_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let flow = dir.path().join("flow.json");

        new_flow(&flow, false).unwrap();
        assert!(new_flow(&flow, false).is_err());
        assert!(new_flow(&flow, true).is_ok());
    }

    #[test]
    fn test_missing_flow_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(show(&dir.path().join("absent.json"), false).is_err());
    }

    #[test]
    fn test_failed_edit_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let flow = dir.path().join("flow.json");
        new_flow(&flow, false).unwrap();
        add_question(&flow, None).unwrap();
        let before = fs::read_to_string(&flow).unwrap();

        assert!(delete_option(&flow, "q1", 0).is_err());
        assert_eq!(fs::read_to_string(&flow).unwrap(), before);
    }

    #[test]
    fn test_strict_check_fails_on_issues() {
        let dir = tempdir().unwrap();
        let flow = dir.path().join("flow.json");
        new_flow(&flow, false).unwrap();
        assert!(check(&flow, true, false).is_ok());

        add_question(&flow, None).unwrap();
        assert!(check(&flow, false, false).is_ok());
        assert!(check(&flow, true, false).is_err());
    }

    #[test]
    fn test_init_writes_config_and_flow() {
        let dir = tempdir().unwrap();
        init(dir.path()).unwrap();

        let config = CliConfig::load(dir.path()).unwrap();
        assert_eq!(config.flow, PathBuf::from(DEFAULT_EXPORT_FILE));
        assert!(dir.path().join(DEFAULT_EXPORT_FILE).exists());
    }

    #[test]
    fn test_simulate_runs_to_the_end() {
        let dir = tempdir().unwrap();
        let flow = dir.path().join("flow.json");
        new_flow(&flow, false).unwrap();
        add_question(&flow, Some("Start")).unwrap();
        add_option(&flow, "q1", "Done", None).unwrap();

        assert!(simulate(&flow, &[0], None).is_ok());
        assert!(simulate(&flow, &[3], None).is_err());
    }
}
