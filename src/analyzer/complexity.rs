// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Complexity scoring for workflow graphs

use serde::Serialize;

const NODE_WEIGHT: f64 = 1.0;
const CONNECTION_WEIGHT: f64 = 0.5;
const DEPTH_WEIGHT: f64 = 2.0;
const CUSTOM_NODE_WEIGHT: f64 = 3.0;

const MODERATE_THRESHOLD: f64 = 25.0;
const COMPLEX_THRESHOLD: f64 = 75.0;

/// Complexity analysis result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Complexity {
    /// Number of nodes
    pub node_count: usize,
    /// Number of connection-valued inputs
    pub connection_count: usize,
    /// Nodes on the longest dependency chain
    pub max_depth: usize,
    /// Nodes whose class type is not built in
    pub custom_node_count: usize,
    /// Weighted sum of the above
    pub score: f64,
}

/// Coarse bucket over the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Moderate => write!(f, "moderate"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

impl Complexity {
    pub fn new(
        node_count: usize,
        connection_count: usize,
        max_depth: usize,
        custom_node_count: usize,
    ) -> Self {
        let score = node_count as f64 * NODE_WEIGHT
            + connection_count as f64 * CONNECTION_WEIGHT
            + max_depth as f64 * DEPTH_WEIGHT
            + custom_node_count as f64 * CUSTOM_NODE_WEIGHT;

        Self {
            node_count,
            connection_count,
            max_depth,
            custom_node_count,
            score,
        }
    }

    pub fn level(&self) -> ComplexityLevel {
        if self.score >= COMPLEX_THRESHOLD {
            ComplexityLevel::Complex
        } else if self.score >= MODERATE_THRESHOLD {
            ComplexityLevel::Moderate
        } else {
            ComplexityLevel::Simple
        }
    }
}
