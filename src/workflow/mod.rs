// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Workflow documents and graph transforms
//!
//! Parsing, UI/API conversion, fingerprinting and preprocessing of
//! workflow graphs.

mod converter;
mod definition;
mod fingerprint;
mod parser;
mod preprocess;
mod ui;

pub use converter::{detect_format, FormatConverter, WorkflowFormat};
pub use definition::{Connection, Graph, InputValue, Link, Node, NodeMeta};
pub use fingerprint::GraphHasher;
pub use parser::{ParseResult, Parser};
pub use preprocess::{GraphPreprocessor, PreprocessWarning};
pub use ui::{UiDocument, UiInput, UiLink, UiNode, UiOutput};
