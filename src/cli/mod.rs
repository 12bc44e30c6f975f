// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for nodeflow.

pub mod analyze;
pub mod convert;
pub mod deps;
pub mod graph;
pub mod preprocess;
pub mod validate;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::errors::{NodeflowError, NodeflowResult};
use crate::registry::NodeRegistry;
use crate::workflow::WorkflowFormat;

/// Workflow graph compiler
///
/// Parse, convert, clean and analyze node-graph workflows.
#[derive(Parser, Debug)]
#[clap(
    name = "nodeflow",
    version,
    about = "Compiler for node-graph image-generation workflows",
    long_about = None,
    after_help = "Examples:\n\
        nodeflow validate workflow.json          Check structure and cycles\n\
        nodeflow convert workflow.json --to api  Normalize a UI export\n\
        nodeflow preprocess workflow.json        Strip presentation-only nodes\n\
        nodeflow analyze 'workflows/*.json'      Analyze many workflows\n\
        nodeflow deps workflow.json              List models and custom nodes\n\n\
        See 'nodeflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Node registry overlay (YAML, JSON or TOML)
    #[clap(short, long, global = true, value_name = "FILE")]
    pub registry: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a workflow and check its connections
    Validate {
        /// Workflow file
        file: PathBuf,
    },

    /// Convert between UI and API form
    Convert {
        /// Workflow file
        file: PathBuf,

        /// Target form (defaults to the opposite of the input's)
        #[clap(short, long, value_name = "api|ui")]
        to: Option<WorkflowFormat>,

        /// Output file (default: stdout)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove presentation-only nodes and broken connections
    Preprocess {
        /// Workflow file
        file: PathBuf,

        /// Output file (default: stdout)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze workflow structure
    Analyze {
        /// Files or glob patterns
        patterns: Vec<String>,

        /// Output format (text, json)
        #[clap(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List models, custom nodes and Python packages a workflow needs
    Deps {
        /// Workflow file
        file: PathBuf,

        /// Custom node Python sources to scan for imports
        #[clap(short, long, value_name = "FILE")]
        source: Vec<PathBuf>,

        /// Output format (text, json)
        #[clap(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the workflow as a graph
    Graph {
        /// Workflow file
        file: PathBuf,

        /// Output format (text, dot, mermaid)
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,

        /// Keep presentation-only nodes
        #[clap(long)]
        raw: bool,
    },
}

/// Output format for report commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

/// Built-in registry plus the overlay named on the command line or discovered
pub fn load_registry(path: Option<&Path>) -> Result<NodeRegistry> {
    Ok(NodeRegistry::load(path)?)
}

/// Read and decode a workflow document
pub async fn read_document(path: &Path) -> NodeflowResult<Value> {
    if !path.exists() {
        return Err(NodeflowError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| NodeflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

    serde_json::from_str(&text).map_err(|e| NodeflowError::malformed(&e))
}

/// Write to a file, or to stdout when no path is given
pub async fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, text).await.map_err(|e| {
                miette::miette!("Failed to write '{}': {}", path.display(), e)
            })?;
            tracing::info!(path = %path.display(), "wrote output");
            Ok(())
        }
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

/// Pretty-print a serializable value as JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| miette::miette!("Failed to serialize JSON: {}", e))?;
    println!("{}", json);
    Ok(())
}

/// Print the recovery suggestion for an error, if it has one
pub fn print_recovery(error: &NodeflowError) {
    if let Some(suggestion) = error.recovery() {
        eprintln!();
        eprint!("{}", suggestion);
    }
}

/// List the node ids preprocessing removed, on stderr
pub fn report_removed(removed: &BTreeSet<String>) {
    if removed.is_empty() {
        return;
    }
    let ids: Vec<&str> = removed.iter().map(String::as_str).collect();
    eprintln!("{} {}", "Removed:".bold(), ids.join(", ").dimmed());
}
