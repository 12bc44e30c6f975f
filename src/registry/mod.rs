// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Node type registry
//!
//! Static lookup tables describing node types: which class types ship with
//! the execution environment, how positional widget values map onto named
//! inputs, how input slots are ordered, and which inputs name model files.
//!
//! A registry is built once and then only read. Every component borrows it.

mod builtin;
mod config;

pub use config::RegistryConfig;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::errors::NodeflowResult;

/// Role of a positional widget value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetRole {
    /// Stored as a named input
    #[default]
    Value,
    /// Read positionally but never persisted (e.g. `control_after_generate`)
    Control,
}

/// One entry of a widget schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetField {
    pub name: String,
    #[serde(default)]
    pub role: WidgetRole,
}

impl WidgetField {
    /// A persisted widget
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: WidgetRole::Value,
        }
    }

    /// A control token widget
    pub fn control(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: WidgetRole::Control,
        }
    }

    pub fn is_control(&self) -> bool {
        self.role == WidgetRole::Control
    }
}

/// Inputs of a loader node that hold model filenames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelField {
    /// Input names holding a filename, in lookup order
    pub fields: Vec<String>,
    /// Model directory category (checkpoints, loras, vae, ...)
    pub category: String,
}

/// Everything the registry knows about one class type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Ordered widget schema for positional widget values
    #[serde(default)]
    pub widgets: Vec<WidgetField>,

    /// Input slot names, indexed by slot position
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Model filename fields, for loader types
    #[serde(default)]
    pub model: Option<ModelField>,
}

/// How the preprocessor treats a class type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingClass {
    /// Single-input routing node, elided by rewiring its consumers
    Bypassable,
    /// Presentation-only node, removed along with references to it
    Droppable,
    /// Everything else
    Ordinary,
}

/// Immutable node type registry
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    builtins: HashSet<String>,
    specs: HashMap<String, NodeSpec>,
    bypassable: HashSet<String>,
    droppable: HashSet<String>,
}

impl NodeRegistry {
    /// A registry that knows nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table of core node types
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        for (class_type, spec) in builtin::node_specs() {
            registry.builtins.insert(class_type.to_string());
            registry.specs.insert(class_type.to_string(), spec);
        }

        registry
            .builtins
            .extend(builtin::FRONTEND_ONLY.iter().map(|s| s.to_string()));
        registry
            .bypassable
            .extend(builtin::BYPASSABLE.iter().map(|s| s.to_string()));
        registry
            .droppable
            .extend(builtin::DROPPABLE.iter().map(|s| s.to_string()));

        registry
    }

    /// Load the built-in table plus an overlay, from `path` if given or from
    /// the discovered default location otherwise
    pub fn load(path: Option<&Path>) -> NodeflowResult<Self> {
        let overlay_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => RegistryConfig::discover(),
        };

        match overlay_path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading registry overlay");
                let config = RegistryConfig::from_file(&p)?;
                Ok(Self::builtin().with_overlay(config))
            }
            None => Ok(Self::builtin()),
        }
    }

    /// Apply an overlay; overlay specs replace built-in specs of the same class type
    pub fn with_overlay(mut self, config: RegistryConfig) -> Self {
        self.builtins.extend(config.builtins);
        self.bypassable.extend(config.bypassable);
        self.droppable.extend(config.droppable);
        for (class_type, spec) in config.nodes {
            self.specs.insert(class_type, spec);
        }
        self
    }

    /// Whether a class type ships with the execution environment
    pub fn is_builtin(&self, class_type: &str) -> bool {
        self.builtins.contains(class_type)
    }

    /// All built-in class types
    pub fn builtin_types(&self) -> impl Iterator<Item = &str> {
        self.builtins.iter().map(String::as_str)
    }

    /// Full spec for a class type
    pub fn spec(&self, class_type: &str) -> Option<&NodeSpec> {
        self.specs.get(class_type)
    }

    /// Ordered widget schema for a class type
    pub fn widget_schema(&self, class_type: &str) -> Option<&[WidgetField]> {
        self.specs.get(class_type).map(|s| s.widgets.as_slice())
    }

    /// Name of the input at slot `index`
    pub fn input_slot(&self, class_type: &str, index: usize) -> Option<&str> {
        self.specs
            .get(class_type)
            .and_then(|s| s.inputs.get(index))
            .map(String::as_str)
    }

    /// Model filename fields for a loader class type
    pub fn model_field(&self, class_type: &str) -> Option<&ModelField> {
        self.specs.get(class_type).and_then(|s| s.model.as_ref())
    }

    /// Preprocessor classification for a class type
    pub fn routing(&self, class_type: &str) -> RoutingClass {
        if self.bypassable.contains(class_type) {
            RoutingClass::Bypassable
        } else if self.droppable.contains(class_type) {
            RoutingClass::Droppable
        } else {
            RoutingClass::Ordinary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schema_marks_control_token() {
        let registry = NodeRegistry::builtin();
        let schema = registry.widget_schema("KSampler").unwrap();

        assert_eq!(schema[0].name, "seed");
        assert!(schema[1].is_control());
        assert_eq!(schema[2].name, "steps");
    }

    #[test]
    fn test_routing_classes() {
        let registry = NodeRegistry::builtin();
        assert_eq!(registry.routing("Reroute"), RoutingClass::Bypassable);
        assert_eq!(registry.routing("Note"), RoutingClass::Droppable);
        assert_eq!(registry.routing("SetNode"), RoutingClass::Droppable);
        assert_eq!(registry.routing("KSampler"), RoutingClass::Ordinary);
    }

    #[test]
    fn test_loader_fields() {
        let registry = NodeRegistry::builtin();
        let field = registry.model_field("CheckpointLoaderSimple").unwrap();
        assert_eq!(field.fields, vec!["ckpt_name"]);
        assert_eq!(field.category, "checkpoints");
        assert!(registry.model_field("KSampler").is_none());
    }

    #[test]
    fn test_input_slots() {
        let registry = NodeRegistry::builtin();
        assert_eq!(registry.input_slot("KSampler", 3), Some("latent_image"));
        assert_eq!(registry.input_slot("KSampler", 4), None);
        assert_eq!(registry.input_slot("Unknown", 0), None);
    }

    #[test]
    fn test_overlay_adds_custom_spec_without_making_it_builtin() {
        let config = RegistryConfig::from_yaml(
            r#"
nodes:
  MyUpscaler:
    widgets:
      - name: factor
    inputs: [image]
droppable: [MyComment]
"#,
        )
        .unwrap();

        let registry = NodeRegistry::builtin().with_overlay(config);
        assert!(!registry.is_builtin("MyUpscaler"));
        assert_eq!(registry.input_slot("MyUpscaler", 0), Some("image"));
        assert_eq!(registry.routing("MyComment"), RoutingClass::Droppable);
    }
}
