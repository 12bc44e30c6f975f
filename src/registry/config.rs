// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Registry overlay loading
//!
//! Overlays extend the built-in table with custom node schemas and extra
//! routing classifications. They are read from YAML, JSON or TOML.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::NodeSpec;
use crate::errors::{NodeflowError, NodeflowResult};

/// Environment variable naming an overlay file
pub const REGISTRY_ENV: &str = "NODEFLOW_REGISTRY";

/// Overlay on top of the built-in node registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Extra class types to treat as built-in
    #[serde(default)]
    pub builtins: Vec<String>,

    /// Node specs keyed by class type; replace built-in specs of the same name
    #[serde(default)]
    pub nodes: IndexMap<String, NodeSpec>,

    /// Extra single-input routing class types
    #[serde(default)]
    pub bypassable: Vec<String>,

    /// Extra presentation-only class types
    #[serde(default)]
    pub droppable: Vec<String>,
}

impl RegistryConfig {
    /// Load an overlay, choosing the format from the file extension
    pub fn from_file(path: &Path) -> NodeflowResult<Self> {
        if !path.exists() {
            return Err(NodeflowError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| NodeflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let parsed = match ext.as_deref() {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_yaml(&content),
        };

        parsed.map_err(|e| NodeflowError::RegistryError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse an overlay from YAML
    pub fn from_yaml(yaml: &str) -> NodeflowResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse an overlay from JSON
    pub fn from_json(json: &str) -> NodeflowResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Parse an overlay from TOML
    pub fn from_toml(text: &str) -> NodeflowResult<Self> {
        toml::from_str(text).map_err(Into::into)
    }

    /// Locate the default overlay: `$NODEFLOW_REGISTRY`, then
    /// `<config dir>/registry.yaml` if it exists
    pub fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(REGISTRY_ENV) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        let dirs = directories::ProjectDirs::from("", "", "nodeflow")?;
        let candidate = dirs.config_dir().join("registry.yaml");
        candidate.exists().then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WidgetRole;
    use tempfile::TempDir;

    #[test]
    fn test_load_yaml_overlay() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("registry.yaml");
        std::fs::write(
            &path,
            r#"
builtins: [MyBuiltin]
nodes:
  SeededNoise:
    widgets:
      - name: seed
      - name: control_after_generate
        role: control
"#,
        )
        .unwrap();

        let config = RegistryConfig::from_file(&path).unwrap();
        assert_eq!(config.builtins, vec!["MyBuiltin"]);
        let spec = &config.nodes["SeededNoise"];
        assert_eq!(spec.widgets[1].role, WidgetRole::Control);
    }

    #[test]
    fn test_load_toml_overlay() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("registry.toml");
        std::fs::write(
            &path,
            r#"
droppable = ["Sticky Note"]

[nodes.FaceLoader]
inputs = ["image"]
model = { fields = ["face_model"], category = "facerestore_models" }
"#,
        )
        .unwrap();

        let config = RegistryConfig::from_file(&path).unwrap();
        assert_eq!(config.droppable, vec!["Sticky Note"]);
        let model = config.nodes["FaceLoader"].model.as_ref().unwrap();
        assert_eq!(model.category, "facerestore_models");
    }

    #[test]
    fn test_load_json_overlay() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("registry.json");
        std::fs::write(&path, r#"{"bypassable": ["Route Anything"]}"#).unwrap();

        let config = RegistryConfig::from_file(&path).unwrap();
        assert_eq!(config.bypassable, vec!["Route Anything"]);
    }

    #[test]
    fn test_invalid_overlay_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        std::fs::write(&path, "nodes: [not, a, map]").unwrap();

        let err = RegistryConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, NodeflowError::RegistryError { .. }));
    }

    #[test]
    fn test_missing_overlay() {
        let err = RegistryConfig::from_file(Path::new("/nonexistent/registry.yaml")).unwrap_err();
        assert!(matches!(err, NodeflowError::FileNotFound { .. }));
    }
}
