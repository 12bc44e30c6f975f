// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Graph command - visualize a workflow as a graph

use miette::Result;
use std::path::{Path, PathBuf};

use super::{load_registry, print_recovery, read_document, report_removed, GraphFormat};
use crate::analyzer::DependencyDag;
use crate::workflow::{GraphPreprocessor, Parser};

/// Run the graph command
pub async fn run(
    file: PathBuf,
    format: GraphFormat,
    raw: bool,
    registry_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let registry = load_registry(registry_path)?;
    let document = read_document(&file).await?;

    let mut graph = Parser::new(&registry).parse(&document)?.into_graph();
    if !raw {
        let mut preprocessor = GraphPreprocessor::new(&registry);
        graph = preprocessor.preprocess(&graph);
        if verbose {
            report_removed(preprocessor.removed_node_ids());
        }
    }

    let dag = DependencyDag::build(&graph);

    let output = match format {
        GraphFormat::Text => match dag.to_text() {
            Ok(text) => text,
            Err(e) => {
                print_recovery(&e);
                return Err(e.into());
            }
        },
        GraphFormat::Dot => dag.to_dot(),
        GraphFormat::Mermaid => dag.to_mermaid(),
    };

    print!("{}", output);

    Ok(())
}
