// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! nodeflow - Workflow Graph Compiler
//!
//! Parse, convert, clean and analyze node-graph workflows.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nodeflow::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries converted documents
    let default_filter = if cli.verbose { "nodeflow=debug" } else { "nodeflow=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let registry = cli.registry.as_deref();

    match cli.command {
        Commands::Validate { file } => {
            nodeflow::cli::validate::run(file, registry, cli.verbose).await
        }
        Commands::Convert { file, to, output } => {
            nodeflow::cli::convert::run(file, to, output, registry, cli.verbose).await
        }
        Commands::Preprocess { file, output } => {
            nodeflow::cli::preprocess::run(file, output, registry, cli.verbose).await
        }
        Commands::Analyze { patterns, format } => {
            nodeflow::cli::analyze::run(patterns, format, registry, cli.verbose).await
        }
        Commands::Deps {
            file,
            source,
            format,
        } => nodeflow::cli::deps::run(file, source, format, registry, cli.verbose).await,
        Commands::Graph { file, format, raw } => {
            nodeflow::cli::graph::run(file, format, raw, registry, cli.verbose).await
        }
    }
}
