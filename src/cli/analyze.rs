// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Analyze command - structural analysis of one or more workflows

use colored::Colorize;
use miette::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{load_registry, print_json, read_document, OutputFormat};
use crate::analyzer::{Analysis, GraphAnalyzer};
use crate::errors::NodeflowResult;
use crate::registry::NodeRegistry;
use crate::utils::{print_bullet, print_header, print_section, print_warning};
use crate::workflow::{GraphPreprocessor, Parser};

#[derive(Serialize)]
struct FileAnalysis {
    file: String,
    removed_nodes: Vec<String>,
    #[serde(flatten)]
    analysis: Analysis,
}

/// Run the analyze command
pub async fn run(
    patterns: Vec<String>,
    format: OutputFormat,
    registry_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    if patterns.is_empty() {
        return Err(miette::miette!(
            "No files specified.\n\n\
             Usage: nodeflow analyze <file>..."
        ));
    }

    let registry = load_registry(registry_path)?;
    let files = expand_patterns(&patterns);
    if files.is_empty() {
        return Err(miette::miette!("No workflow files matched"));
    }

    let mut reports = Vec::new();
    let mut failures = 0;

    for file in &files {
        match analyze_file(&registry, file).await {
            Ok(report) => match format {
                OutputFormat::Text => print_text_analysis(&report, verbose),
                OutputFormat::Json => reports.push(report),
            },
            Err(e) => {
                failures += 1;
                eprintln!("{}: Failed to analyze {}: {}", "Error".red(), file.display(), e);
            }
        }
    }

    if format == OutputFormat::Json {
        print_json(&reports)?;
    }

    if failures == files.len() {
        Err(miette::miette!("No workflow could be analyzed"))
    } else {
        Ok(())
    }
}

/// Existing paths are taken as-is; everything else is treated as a glob
fn expand_patterns(patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for pattern in patterns {
        let path = PathBuf::from(pattern);
        if path.exists() {
            files.push(path);
            continue;
        }

        let matched: Vec<PathBuf> = match glob::glob(pattern) {
            Ok(paths) => paths.filter_map(|entry| entry.ok()).collect(),
            Err(e) => {
                eprintln!("{}: Invalid pattern '{}': {}", "Warning".yellow(), pattern, e);
                continue;
            }
        };

        if matched.is_empty() {
            eprintln!("{}: No files match '{}'", "Warning".yellow(), pattern);
        }
        files.extend(matched);
    }

    files
}

async fn analyze_file(registry: &NodeRegistry, file: &Path) -> NodeflowResult<FileAnalysis> {
    let document = read_document(file).await?;
    let graph = Parser::new(registry).parse(&document)?.into_graph();

    let mut preprocessor = GraphPreprocessor::new(registry);
    let cleaned = preprocessor.preprocess(&graph);

    Ok(FileAnalysis {
        file: file.display().to_string(),
        removed_nodes: preprocessor.removed_node_ids().iter().cloned().collect(),
        analysis: GraphAnalyzer::new(registry).analyze(&cleaned),
    })
}

fn print_text_analysis(report: &FileAnalysis, verbose: bool) {
    let analysis = &report.analysis;

    println!();
    print_header(&format!("Analyzing: {}", report.file));
    println!();

    println!("{}:      {}", "Nodes".bold(), analysis.node_count);
    println!(
        "{}: {}",
        "Connections".bold(),
        analysis.connection_stats.total
    );
    println!(
        "{}:  {} ({:.1}, longest chain {})",
        "Complexity".bold(),
        analysis.complexity_level.to_string().green().bold(),
        analysis.complexity.score,
        analysis.complexity.max_depth
    );
    if !report.removed_nodes.is_empty() {
        println!(
            "{}:    {}",
            "Removed".bold(),
            report.removed_nodes.join(", ").dimmed()
        );
    }

    print_section("Execution order");
    match (&analysis.execution_order, &analysis.cycle) {
        (Some(order), _) => println!("  {}", order.join(" → ")),
        (None, Some(cycle)) => println!("  {} {}", "✗".red(), cycle),
        (None, None) => {}
    }

    print_section("Categories");
    for (category, ids) in &analysis.categories {
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        println!("  {:<8} {}", category.to_string(), ids.join(", "));
    }

    if !analysis.model_loaders.is_empty() {
        print_section("Models");
        for loader in &analysis.model_loaders {
            let inferred = if loader.inferred { " (inferred)" } else { "" };
            print_bullet(&format!(
                "{} [{}]{}",
                loader.filename,
                loader.category,
                inferred.dimmed()
            ));
        }
    }

    if !analysis.custom_nodes.is_empty() {
        print_section("Custom nodes");
        for class_type in &analysis.custom_nodes {
            print_bullet(class_type);
        }
    }

    if !analysis.issues.is_empty() {
        print_section("Issues");
        for issue in &analysis.issues {
            print_warning(issue);
        }
    }

    if verbose {
        print_section("Details");
        println!("  Fingerprint: {}", analysis.fingerprint.dimmed());
        if let Some(busiest) = &analysis.connection_stats.most_connected {
            println!(
                "  Most connected: {} ({}, {} inputs)",
                busiest.node_id, busiest.class_type, busiest.inputs
            );
        }
        if !analysis.isolated_nodes.is_empty() {
            let ids: Vec<&str> = analysis.isolated_nodes.iter().map(String::as_str).collect();
            println!("  Isolated: {}", ids.join(", "));
        }
    }

    println!();
}
