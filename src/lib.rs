// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! # nodeflow - Workflow Graph Compiler
//!
//! `nodeflow` prepares node-graph image-generation workflows for execution.
//!
//! ## Features
//!
//! - **Parsing** - UI and API exports, with structural validation
//! - **Conversion** - Widget values mapped to named inputs and back
//! - **Preprocessing** - Reroutes elided, notes and markers dropped
//! - **Analysis** - Execution order, statistics, complexity, diagnostics
//! - **Dependencies** - Models, custom nodes and Python packages
//!
//! ## Quick Start
//!
//! ```bash
//! # Check a workflow
//! nodeflow validate workflow.json
//!
//! # Normalize a UI export to API form
//! nodeflow convert workflow.json --to api
//!
//! # What does it need installed?
//! nodeflow deps workflow.json
//! ```
//!
//! ## Library use
//!
//! ```
//! use nodeflow::{GraphAnalyzer, NodeRegistry, Parser};
//!
//! let registry = NodeRegistry::builtin();
//! let parsed = Parser::new(&registry)
//!     .parse_from_text(r#"{"1": {"class_type": "SaveImage", "inputs": {}}}"#)
//!     .unwrap();
//! let order = GraphAnalyzer::new(&registry).execution_order(parsed.graph()).unwrap();
//! assert_eq!(order, vec!["1"]);
//! ```

pub mod analyzer;
pub mod cli;
pub mod dependencies;
pub mod errors;
pub mod registry;
pub mod utils;
pub mod workflow;

// Re-export commonly used types
pub use analyzer::{Analysis, DependencyDag, GraphAnalyzer};
pub use dependencies::{DependencyExtractor, WorkflowDependencies};
pub use errors::{NodeflowError, NodeflowResult};
pub use registry::NodeRegistry;
pub use workflow::{FormatConverter, Graph, GraphPreprocessor, Node, ParseResult, Parser};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
