// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Convert command - translate between UI and API form
//!
//! Empty documents convert to empty documents; nothing else is checked
//! beyond what conversion itself needs.

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use super::{load_registry, print_recovery, read_document, write_output};
use crate::workflow::{detect_format, FormatConverter, WorkflowFormat};

/// Run the convert command
pub async fn run(
    file: PathBuf,
    to: Option<WorkflowFormat>,
    output: Option<PathBuf>,
    registry_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let registry = load_registry(registry_path)?;
    let document = read_document(&file).await?;

    let source = detect_format(&document);
    let target = to.unwrap_or(match source {
        WorkflowFormat::Ui => WorkflowFormat::Api,
        WorkflowFormat::Api => WorkflowFormat::Ui,
    });
    tracing::info!(%source, %target, "converting workflow");

    let converter = FormatConverter::new(&registry);
    let (graph, dropped) = match converter.convert_reporting(&document) {
        Ok(converted) => converted,
        Err(e) => {
            print_recovery(&e);
            return Err(e.into());
        }
    };

    for reason in &dropped {
        eprintln!("  {} {}", "⚠".yellow(), reason);
    }
    if verbose {
        eprintln!(
            "{} {} nodes, {} links dropped ({} -> {})",
            "Converted:".bold(),
            graph.len(),
            dropped.len(),
            source,
            target
        );
    }

    let text = match target {
        WorkflowFormat::Api => graph.to_json_pretty(),
        WorkflowFormat::Ui => {
            let ui = converter.api_to_ui_value(&graph)?;
            serde_json::to_string_pretty(&ui)
        }
    }
    .map_err(|e| miette::miette!("Failed to serialize JSON: {}", e))?;

    write_output(output.as_deref(), &text).await
}

