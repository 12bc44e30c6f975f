// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Keyword heuristics over class type names

use serde::Serialize;

/// Broad functional category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Loader,
    Sampler,
    Encoder,
    Output,
    Other,
}

impl std::fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loader => write!(f, "loader"),
            Self::Sampler => write!(f, "sampler"),
            Self::Encoder => write!(f, "encoder"),
            Self::Output => write!(f, "output"),
            Self::Other => write!(f, "other"),
        }
    }
}

const LOADER_KEYWORDS: &[&str] = &["loader"];
const SAMPLER_KEYWORDS: &[&str] = &["sampler", "sampling"];
// Decoders share the category: both sides of a codec stage
const ENCODER_KEYWORDS: &[&str] = &["encode", "decode"];
const OUTPUT_KEYWORDS: &[&str] = &["save", "preview", "output"];

/// Categorize a class type by name; the first matching rule wins
pub fn categorize(class_type: &str) -> NodeCategory {
    let name = class_type.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

    if has_any(LOADER_KEYWORDS) || name.starts_with("load") {
        NodeCategory::Loader
    } else if has_any(SAMPLER_KEYWORDS) {
        NodeCategory::Sampler
    } else if has_any(ENCODER_KEYWORDS) {
        NodeCategory::Encoder
    } else if has_any(OUTPUT_KEYWORDS) {
        NodeCategory::Output
    } else {
        NodeCategory::Other
    }
}

/// Naming convention for model loaders the registry does not describe
pub fn looks_like_loader(class_type: &str) -> bool {
    class_type.ends_with("Loader")
}
