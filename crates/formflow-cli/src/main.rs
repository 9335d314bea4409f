//! Formflow CLI - Command-line interface for Formflow
//!
//! This is the main entry point for users editing question flows.
//! It provides commands for building, checking, exporting and simulating
//! a flow stored as a JSON document.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "formflow")]
#[command(author = "Formflow Contributors")]
#[command(version)]
#[command(about = "Build, check and simulate branching questionnaires", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Flow file to operate on (defaults to the configured flow)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Formflow in a directory
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Create an empty flow file
    New {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Add a question
    AddQuestion {
        /// Question text (defaults to "Untitled Question N")
        text: Option<String>,
    },

    /// Add an option to a question
    AddOption {
        /// Question to extend
        question: String,

        /// Option label
        text: String,

        /// Question the option leads to (omit to end the form)
        #[arg(short, long)]
        next: Option<String>,
    },

    /// Change a question's text
    SetText {
        question: String,
        text: String,
    },

    /// Change an option's label
    SetOptionText {
        question: String,
        index: usize,
        text: String,
    },

    /// Point an option at another question
    Link {
        question: String,
        index: usize,
        target: String,
    },

    /// Make an option end the form
    Unlink {
        question: String,
        index: usize,
    },

    /// Remove an option from a question
    DeleteOption {
        question: String,
        index: usize,
    },

    /// Remove a question (links to it are kept and stop resolving)
    DeleteQuestion {
        question: String,
    },

    /// Set or clear a question's diagram position
    Move {
        question: String,

        #[arg(required_unless_present = "clear", allow_negative_numbers = true)]
        x: Option<f64>,

        #[arg(required_unless_present = "clear", allow_negative_numbers = true)]
        y: Option<f64>,

        /// Remove the stored position
        #[arg(long, conflicts_with_all = ["x", "y"])]
        clear: bool,
    },

    /// Print the flow
    Show {
        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Report orphan, unreachable and cyclic questions
    Check {
        /// Exit with an error when any diagnostic is present
        #[arg(long)]
        strict: bool,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Write the normalized flow document to another file
    Export {
        /// Output file
        #[arg(short, long, default_value = formflow_core::DEFAULT_EXPORT_FILE)]
        output: PathBuf,
    },

    /// Walk through the flow choosing options by index
    Simulate {
        /// Option indexes to choose, in order
        choices: Vec<usize>,

        /// Start at this question instead of the first one
        #[arg(long)]
        from: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let flow = commands::resolve_flow_path(cli.file.as_deref());

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::New { force } => commands::new_flow(&flow, force),
        Commands::AddQuestion { text } => commands::add_question(&flow, text.as_deref()),
        Commands::AddOption {
            question,
            text,
            next,
        } => commands::add_option(&flow, &question, &text, next),
        Commands::SetText { question, text } => commands::set_text(&flow, &question, &text),
        Commands::SetOptionText {
            question,
            index,
            text,
        } => commands::set_option_text(&flow, &question, index, &text),
        Commands::Link {
            question,
            index,
            target,
        } => commands::link(&flow, &question, index, Some(target)),
        Commands::Unlink { question, index } => commands::link(&flow, &question, index, None),
        Commands::DeleteOption { question, index } => {
            commands::delete_option(&flow, &question, index)
        }
        Commands::DeleteQuestion { question } => commands::delete_question(&flow, &question),
        Commands::Move {
            question,
            x,
            y,
            clear,
        } => {
            let position = if clear { None } else { x.zip(y) };
            commands::move_question(&flow, &question, position)
        }
        Commands::Show { json } => commands::show(&flow, json),
        Commands::Check { strict, json } => commands::check(&flow, strict, json),
        Commands::Export { output } => commands::export(&flow, &output),
        Commands::Simulate { choices, from } => {
            commands::simulate(&flow, &choices, from.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["formflow", "move", "q1", "-120", "40"]).unwrap();
        match cli.command {
            Commands::Move {
                question,
                x,
                y,
                clear,
            } => {
                assert_eq!(question, "q1");
                assert_eq!(x, Some(-120.0));
                assert_eq!(y, Some(40.0));
                assert!(!clear);
            }
            _ => panic!("expected the move command"),
        }
    }

    #[test]
    fn test_move_clear_needs_no_coordinates() {
        let cli = Cli::try_parse_from(["formflow", "move", "q1", "--clear"]).unwrap();
        assert!(matches!(cli.command, Commands::Move { clear: true, x: None, .. }));
    }
}
