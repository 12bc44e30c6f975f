// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Validate command - check workflow structure and connections

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use super::{load_registry, print_recovery, read_document};
use crate::analyzer::GraphAnalyzer;
use crate::utils::{print_error, print_success, print_warning};
use crate::workflow::Parser;

/// Run the validate command
pub async fn run(file: PathBuf, registry_path: Option<&Path>, verbose: bool) -> Result<()> {
    println!("{}", "Validating workflow...".bold());
    println!();

    let registry = load_registry(registry_path)?;

    let document = match read_document(&file).await {
        Ok(document) => document,
        Err(e) => {
            print_error("Failed to read workflow");
            print_recovery(&e);
            return Err(e.into());
        }
    };

    let parsed = match Parser::new(&registry).parse(&document) {
        Ok(parsed) => parsed,
        Err(e) => {
            print_error("Workflow structure is invalid");
            print_recovery(&e);
            return Err(e.into());
        }
    };

    print_success(&format!(
        "Parsed {} nodes ({} form)",
        parsed.node_count(),
        parsed.format()
    ));

    let mut failed = false;
    match parsed.validate_connections() {
        Ok(()) => print_success("No circular dependencies"),
        Err(e) => {
            failed = true;
            print_error(&e.to_string());
            print_recovery(&e);
        }
    }

    let mut issues = parsed.errors().to_vec();
    issues.extend(GraphAnalyzer::new(&registry).connection_issues(parsed.graph()));
    if !issues.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for issue in &issues {
            print_warning(issue);
        }
    }

    let custom = parsed.custom_nodes();
    if custom.is_empty() {
        print_success("Only built-in node types");
    } else {
        print_warning(&format!("{} custom node types", custom.len()));
    }

    if verbose {
        println!();
        println!("{}:", "Workflow summary".bold());
        println!("  Connections: {}", parsed.connections().len());
        println!("  Fingerprint: {}", parsed.fingerprint().dimmed());
        for class_type in custom {
            println!("    - {}", class_type);
        }
    }

    println!();

    if failed {
        Err(miette::miette!("Workflow validation failed"))
    } else if issues.is_empty() {
        println!("{}", "Workflow is valid!".green().bold());
        Ok(())
    } else {
        println!("{}", "Workflow is valid but has warnings.".yellow().bold());
        Ok(())
    }
}
