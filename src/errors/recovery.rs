// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest fixing a circular dependency
    pub fn fix_circular_dependency(nodes: &[String]) -> Self {
        Self {
            action: "Remove circular dependency".into(),
            steps: vec![
                format!("Nodes involved: {}", nodes.join(" → ")),
                "A node's output cannot feed back into one of its own inputs".into(),
                "Disconnect one of the links between the listed nodes".into(),
            ],
            commands: vec![
                "# Visualize the workflow:".into(),
                "nodeflow graph workflow.json --format mermaid".into(),
            ],
        }
    }

    /// Suggest re-exporting a workflow that has no nodes
    pub fn export_nodes() -> Self {
        Self {
            action: "Export a workflow that contains nodes".into(),
            steps: vec![
                "The document parsed, but no nodes were found".into(),
                "UI exports keep nodes under \"nodes\"; API exports key nodes by id".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest fixing a structurally invalid node
    pub fn fix_node(node_id: &str, reason: &str) -> Self {
        Self {
            action: format!("Fix node '{}'", node_id),
            steps: vec![
                reason.to_string(),
                "Every node needs a non-empty string \"class_type\"".into(),
                "\"inputs\", when present, must be an object".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest fixing invalid JSON
    pub fn fix_json_syntax() -> Self {
        Self {
            action: "Fix JSON syntax".into(),
            steps: vec![
                "Check for common JSON issues:".into(),
                "  • Trailing commas after the last entry".into(),
                "  • Single quotes instead of double quotes".into(),
                "  • Truncated files from an interrupted download".into(),
            ],
            commands: vec![
                "# Validate your JSON:".into(),
                "python -m json.tool workflow.json".into(),
            ],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
