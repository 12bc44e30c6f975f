// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Dependency extraction
//!
//! Collects what an execution environment needs installed to run a
//! workflow: model files by category, custom node packs and the Python
//! packages they declare.

mod imports;
mod models;

pub use imports::{distribution_name, python_imports_from_source};
pub use models::validate_model_path;

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::analyzer::{GraphAnalyzer, NodeKind};
use crate::registry::NodeRegistry;
use crate::workflow::Graph;

/// A custom node class type and what is known about where it comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomNodeDependency {
    pub class_type: String,
    pub node_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,
}

/// Everything a workflow needs installed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowDependencies {
    /// Model filenames by category, first-seen order, no duplicates
    pub models: BTreeMap<String, Vec<String>>,
    /// Filenames that failed path validation
    pub rejected_models: Vec<String>,
    pub custom_nodes: Vec<CustomNodeDependency>,
    pub python_packages: BTreeSet<String>,
}

impl WorkflowDependencies {
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
            && self.rejected_models.is_empty()
            && self.custom_nodes.is_empty()
            && self.python_packages.is_empty()
    }

    /// Add the imports found in a custom node's Python source
    pub fn add_python_source(&mut self, code: &str) {
        self.python_packages.extend(python_imports_from_source(code));
    }
}

/// Dependency extractor
pub struct DependencyExtractor<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> DependencyExtractor<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    /// Extract every dependency category; total over any graph
    pub fn extract_all(&self, graph: &Graph) -> WorkflowDependencies {
        let (models, rejected_models) = self.models(graph);
        let custom_nodes = self.custom_nodes(graph);
        let python_packages = custom_nodes
            .iter()
            .flat_map(|node| node.packages.iter().cloned())
            .collect();

        WorkflowDependencies {
            models,
            rejected_models,
            custom_nodes,
            python_packages,
        }
    }

    /// Model files read by registry-described loaders, split into accepted
    /// filenames by category and rejected filenames
    pub fn models(&self, graph: &Graph) -> (BTreeMap<String, Vec<String>>, Vec<String>) {
        let mut models: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut rejected: Vec<String> = Vec::new();

        let loaders = GraphAnalyzer::new(self.registry).model_loaders(graph);
        for loader in loaders.into_iter().filter(|l| !l.inferred) {
            if !validate_model_path(&loader.filename) {
                tracing::warn!(node = %loader.node_id, filename = %loader.filename, "rejecting model path");
                if !rejected.contains(&loader.filename) {
                    rejected.push(loader.filename);
                }
                continue;
            }

            let files = models.entry(loader.category).or_default();
            if !files.contains(&loader.filename) {
                files.push(loader.filename);
            }
        }

        (models, rejected)
    }

    /// Non-built-in class types with any `_meta` provenance attached to their nodes
    pub fn custom_nodes(&self, graph: &Graph) -> Vec<CustomNodeDependency> {
        let analyzer = GraphAnalyzer::new(self.registry);
        let mut found: IndexMap<&str, CustomNodeDependency> = IndexMap::new();

        for (id, node) in graph.iter() {
            if analyzer.node_kind(&node.class_type) != NodeKind::Custom {
                continue;
            }

            let entry = found
                .entry(node.class_type.as_str())
                .or_insert_with(|| CustomNodeDependency {
                    class_type: node.class_type.clone(),
                    node_ids: Vec::new(),
                    repository: None,
                    commit: None,
                    packages: Vec::new(),
                });
            entry.node_ids.push(id.to_string());

            let Some(meta) = &node.meta else {
                continue;
            };
            if entry.repository.is_none() {
                entry.repository = meta.repository.clone();
            }
            if entry.commit.is_none() {
                entry.commit = meta.commit.clone();
            }
            for package in &meta.packages {
                if !entry.packages.contains(package) {
                    entry.packages.push(package.clone());
                }
            }
        }

        found.into_values().collect()
    }
}
