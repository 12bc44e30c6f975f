// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Error types for the workflow compiler
//!
//! Parser failures are fail-fast and carry the offending node id or path.
//! Preprocessor anomalies are not errors; see [`crate::workflow::PreprocessWarning`].

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for nodeflow operations
pub type NodeflowResult<T> = Result<T, NodeflowError>;

/// Main error type for nodeflow
#[derive(Error, Debug, Diagnostic)]
pub enum NodeflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Parse Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Malformed workflow document: {message}")]
    #[diagnostic(
        code(nodeflow::malformed_input),
        help("Workflows must be JSON objects in either API or UI form")
    )]
    MalformedInput { message: String },

    #[error("Workflow file not found: {path}")]
    #[diagnostic(code(nodeflow::file_not_found))]
    FileNotFound { path: PathBuf },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(nodeflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Workflow contains no nodes")]
    #[diagnostic(
        code(nodeflow::empty_graph),
        help("Export the workflow again, making sure at least one node is present")
    )]
    EmptyGraph,

    #[error("Node '{node_id}' is invalid: {reason}")]
    #[diagnostic(code(nodeflow::invalid_node_structure))]
    InvalidNodeStructure { node_id: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Circular dependency detected at node '{node_id}'")]
    #[diagnostic(
        code(nodeflow::circular_dependency),
        help("Review the connections between the listed nodes to remove the cycle")
    )]
    CircularDependency { node_id: String, cycle: Vec<String> },

    #[error("Cannot order workflow: node '{node_id}' is part of a cycle")]
    #[diagnostic(
        code(nodeflow::cycle),
        help("Remove one of the links feeding back into '{node_id}'")
    )]
    CycleError {
        node_id: String,
        remaining: Vec<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Registry Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid node registry '{path}': {message}")]
    #[diagnostic(
        code(nodeflow::registry_error),
        help("Registry overlays may be written in YAML, JSON or TOML")
    )]
    RegistryError { path: PathBuf, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(nodeflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(nodeflow::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(nodeflow::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(nodeflow::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for NodeflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for NodeflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for NodeflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for NodeflowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl NodeflowError {
    /// Wrap a JSON decode failure of the input document
    pub fn malformed(e: &serde_json::Error) -> Self {
        Self::MalformedInput {
            message: format!("{} (line {}, column {})", e, e.line(), e.column()),
        }
    }

    /// Create an invalid node error
    pub fn invalid_node(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeStructure {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error reports a cycle, from either the parser or the analyzer
    pub fn is_cycle(&self) -> bool {
        matches!(
            self,
            Self::CircularDependency { .. } | Self::CycleError { .. }
        )
    }

    /// The node id this error is about, when there is one
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::InvalidNodeStructure { node_id, .. }
            | Self::CircularDependency { node_id, .. }
            | Self::CycleError { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    /// Suggest how to recover from this error, if anything useful can be said
    pub fn recovery(&self) -> Option<RecoverySuggestion> {
        match self {
            Self::MalformedInput { .. } => Some(RecoverySuggestion::fix_json_syntax()),
            Self::EmptyGraph => Some(RecoverySuggestion::export_nodes()),
            Self::InvalidNodeStructure { node_id, reason } => {
                Some(RecoverySuggestion::fix_node(node_id, reason))
            }
            Self::CircularDependency { cycle, .. } => {
                Some(RecoverySuggestion::fix_circular_dependency(cycle))
            }
            Self::CycleError { remaining, .. } => {
                Some(RecoverySuggestion::fix_circular_dependency(remaining))
            }
            _ => None,
        }
    }
}
