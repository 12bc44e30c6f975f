// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Deps command - what a workflow needs installed

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use super::{load_registry, print_json, print_recovery, read_document, report_removed, OutputFormat};
use crate::dependencies::{DependencyExtractor, WorkflowDependencies};
use crate::utils::{print_bullet, print_section, print_warning};
use crate::workflow::{GraphPreprocessor, Parser};

/// Run the deps command
pub async fn run(
    file: PathBuf,
    sources: Vec<PathBuf>,
    format: OutputFormat,
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
    if verbose {
        report_removed(preprocessor.removed_node_ids());
    }

    let mut deps = DependencyExtractor::new(&registry).extract_all(&cleaned);
    for source in &sources {
        let code = tokio::fs::read_to_string(source).await.map_err(|e| {
            miette::miette!("Failed to read '{}': {}", source.display(), e)
        })?;
        deps.add_python_source(&code);
    }

    match format {
        OutputFormat::Text => print_text(&deps),
        OutputFormat::Json => print_json(&deps)?,
    }

    Ok(())
}

fn print_text(deps: &WorkflowDependencies) {
    if deps.is_empty() {
        println!("{}", "No dependencies beyond the built-in node set.".green());
        return;
    }

    if !deps.models.is_empty() {
        print_section("Models");
        for (category, files) in &deps.models {
            println!("  {}:", category.bold());
            for file in files {
                println!("    - {}", file);
            }
        }
    }

    if !deps.rejected_models.is_empty() {
        print_section("Rejected model paths");
        for path in &deps.rejected_models {
            print_warning(path);
        }
    }

    if !deps.custom_nodes.is_empty() {
        print_section("Custom nodes");
        for node in &deps.custom_nodes {
            let source = match (&node.repository, &node.commit) {
                (Some(repo), Some(commit)) => format!(" {}@{}", repo, commit),
                (Some(repo), None) => format!(" {}", repo),
                _ => String::new(),
            };
            print_bullet(&format!(
                "{} [{}]{}",
                node.class_type,
                node.node_ids.join(", "),
                source.dimmed()
            ));
        }
    }

    if !deps.python_packages.is_empty() {
        print_section("Python packages");
        for package in &deps.python_packages {
            print_bullet(package);
        }
    }

    println!();
}
