// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! UI form of a workflow
//!
//! The editor's serialization: a node list with positional widget values and
//! a separate link table. Only the fields the compiler needs are modelled;
//! presentation metadata (positions, sizes, colors) is ignored on input.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;

use crate::errors::{NodeflowError, NodeflowResult};

/// Complete UI document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiDocument {
    #[serde(default)]
    pub nodes: Vec<UiNode>,
    #[serde(default)]
    pub links: Vec<UiLink>,
}

/// UI node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiNode {
    #[serde(with = "node_id")]
    pub id: String,

    #[serde(rename = "type", default)]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<UiInput>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<UiOutput>,

    /// Positional list, or a name-keyed object for some extension nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widgets_values: Option<Value>,
}

/// Declared input slot of a UI node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiInput {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub slot_type: String,

    #[serde(default)]
    pub link: Option<u64>,
}

/// Declared output slot of a UI node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiOutput {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub slot_type: String,

    #[serde(default)]
    pub links: Option<Vec<u64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_index: Option<u32>,
}

/// Link table entry
///
/// Read from either `[id, origin, origin_slot, target, target_slot, type?]`
/// or the object form; always written as the five-element array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiLink {
    pub id: u64,
    pub origin_id: String,
    pub origin_slot: u32,
    pub target_id: String,
    pub target_slot: u32,
}

impl UiLink {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) if items.len() >= 5 => Some(Self {
                id: items[0].as_u64()?,
                origin_id: id_string(&items[1])?,
                origin_slot: slot(&items[2])?,
                target_id: id_string(&items[3])?,
                target_slot: slot(&items[4])?,
            }),
            Value::Object(map) => Some(Self {
                id: map.get("id")?.as_u64()?,
                origin_id: id_string(map.get("origin_id")?)?,
                origin_slot: slot(map.get("origin_slot")?)?,
                target_id: id_string(map.get("target_id")?)?,
                target_slot: slot(map.get("target_slot")?)?,
            }),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Array(vec![
            Value::from(self.id),
            id_value(&self.origin_id),
            Value::from(self.origin_slot),
            id_value(&self.target_id),
            Value::from(self.target_slot),
        ])
    }
}

impl Serialize for UiLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UiLink {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid link entry: {}", value)))
    }
}

impl UiDocument {
    /// Read a UI document leniently: malformed links are skipped, malformed
    /// nodes are reported by id
    pub fn from_value(document: &Value) -> NodeflowResult<Self> {
        let empty = Vec::new();
        let raw_nodes = document
            .get("nodes")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        let raw_links = document
            .get("links")
            .and_then(Value::as_array)
            .unwrap_or(&empty);

        let mut nodes = Vec::with_capacity(raw_nodes.len());
        let mut seen = HashSet::with_capacity(raw_nodes.len());
        for (position, raw) in raw_nodes.iter().enumerate() {
            let node: UiNode = serde_json::from_value(raw.clone()).map_err(|e| {
                let id = raw
                    .get("id")
                    .and_then(id_string)
                    .unwrap_or_else(|| format!("#{}", position));
                NodeflowError::invalid_node(id, e.to_string())
            })?;
            if !seen.insert(node.id.clone()) {
                return Err(NodeflowError::invalid_node(&node.id, "duplicate node id"));
            }
            nodes.push(node);
        }

        let mut links = Vec::with_capacity(raw_links.len());
        for raw in raw_links {
            match UiLink::from_json(raw) {
                Some(link) => links.push(link),
                None => tracing::warn!(link = %raw, "skipping malformed link entry"),
            }
        }

        Ok(Self { nodes, links })
    }

    pub fn node(&self, id: &str) -> Option<&UiNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Node ids appear as integers in UI documents and as strings in API documents
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn id_value(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) if n.to_string() == id => Value::from(n),
        _ => Value::String(id.to_string()),
    }
}

fn slot(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|v| u32::try_from(v).ok())
}

mod node_id {
    use super::{id_string, id_value};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
        id_value(id).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Value::deserialize(deserializer)?;
        id_string(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid node id: {}", value)))
    }
}
