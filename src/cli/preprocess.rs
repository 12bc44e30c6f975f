// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Preprocess command - strip presentation-only nodes

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use super::{load_registry, print_recovery, read_document, report_removed, write_output};
use crate::workflow::{GraphPreprocessor, Parser};

/// Run the preprocess command
///
/// The cleaned API graph goes to stdout or `output`; the report goes to stderr.
pub async fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    registry_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let registry = load_registry(registry_path)?;
    let document = read_document(&file).await?;

    let graph = match Parser::new(&registry).parse(&document) {
        Ok(parsed) => parsed.into_graph(),
        Err(e) => {
            print_recovery(&e);
            return Err(e.into());
        }
    };

    let mut preprocessor = GraphPreprocessor::new(&registry);
    let cleaned = preprocessor.preprocess(&graph);

    let removed = preprocessor.removed_node_ids();
    eprintln!(
        "{} {} of {} nodes removed",
        "Preprocessed:".bold(),
        removed.len(),
        graph.len()
    );
    if verbose {
        report_removed(removed);
    }
    for warning in preprocessor.warnings() {
        eprintln!("  {} {}", "⚠".yellow(), warning);
    }

    let text = cleaned
        .to_json_pretty()
        .map_err(|e| miette::miette!("Failed to serialize JSON: {}", e))?;

    write_output(output.as_deref(), &text).await
}
