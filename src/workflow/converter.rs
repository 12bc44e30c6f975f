// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Conversion between the UI and API serializations
//!
//! UI documents store literal parameters positionally in `widgets_values`
//! and connections in a separate link table. The API form names every input.
//! Widget positions are mapped to names through the registry's widget schema;
//! link targets through the node's declared inputs or the registry's slot
//! ordering.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::definition::{Connection, Graph, InputValue, Node, NodeMeta};
use super::parser::graph_from_api;
use super::ui::{UiDocument, UiInput, UiLink, UiNode, UiOutput};
use crate::errors::NodeflowResult;
use crate::registry::{NodeRegistry, WidgetField};

/// Serialization convention of a workflow document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowFormat {
    Ui,
    Api,
}

impl std::fmt::Display for WorkflowFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ui => write!(f, "ui"),
            Self::Api => write!(f, "api"),
        }
    }
}

impl std::str::FromStr for WorkflowFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ui" => Ok(Self::Ui),
            "api" => Ok(Self::Api),
            _ => Err(format!("Unknown workflow format: {}", s)),
        }
    }
}

/// Classify a document: both a `nodes` list and a `links` list means UI form,
/// anything else is taken to be API form
pub fn detect_format(document: &Value) -> WorkflowFormat {
    let has_list = |key: &str| document.get(key).map_or(false, Value::is_array);

    if has_list("nodes") && has_list("links") {
        WorkflowFormat::Ui
    } else {
        WorkflowFormat::Api
    }
}

/// Bidirectional UI/API converter
pub struct FormatConverter<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> FormatConverter<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    /// Detect the format of a document
    pub fn detect_format(&self, document: &Value) -> WorkflowFormat {
        detect_format(document)
    }

    /// Normalize any document to the canonical graph
    pub fn convert(&self, document: &Value) -> NodeflowResult<Graph> {
        self.convert_reporting(document).map(|(graph, _)| graph)
    }

    /// Like [`convert`](Self::convert), also returning the UI links that were dropped
    pub fn convert_reporting(&self, document: &Value) -> NodeflowResult<(Graph, Vec<String>)> {
        match detect_format(document) {
            WorkflowFormat::Ui => {
                let ui = UiDocument::from_value(document)?;
                Ok(self.ui_to_api_reporting(&ui))
            }
            WorkflowFormat::Api => Ok((graph_from_api(document)?, Vec::new())),
        }
    }

    /// Convert a UI document to the canonical graph
    pub fn ui_to_api(&self, doc: &UiDocument) -> Graph {
        self.ui_to_api_reporting(doc).0
    }

    /// Convert a UI document, also describing every link that had to be dropped
    pub fn ui_to_api_reporting(&self, doc: &UiDocument) -> (Graph, Vec<String>) {
        let mut graph = Graph::new();
        let mut dropped = Vec::new();

        for ui_node in &doc.nodes {
            let mut node = Node::new(ui_node.node_type.clone());

            if let Some(widgets) = &ui_node.widgets_values {
                self.apply_widgets(&mut node, widgets);
            }

            node.outputs = ui_node
                .outputs
                .iter()
                .map(|o| {
                    if o.name.is_empty() {
                        o.slot_type.clone()
                    } else {
                        o.name.clone()
                    }
                })
                .collect();

            if let Some(title) = &ui_node.title {
                node.meta = Some(NodeMeta {
                    title: Some(title.clone()),
                    ..Default::default()
                });
            }

            graph.insert(ui_node.id.clone(), node);
        }

        let by_id: HashMap<&str, &UiNode> = doc.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        for link in &doc.links {
            if let Err(reason) = self.apply_link(&mut graph, &by_id, link) {
                dropped.push(reason);
            }
        }

        tracing::debug!(
            nodes = graph.len(),
            links = doc.links.len(),
            dropped = dropped.len(),
            "converted UI document"
        );

        (graph, dropped)
    }

    fn apply_widgets(&self, node: &mut Node, widgets: &Value) {
        let schema = self.registry.widget_schema(&node.class_type);

        match widgets {
            Value::Array(values) => {
                let Some(schema) = schema else {
                    tracing::debug!(
                        class_type = %node.class_type,
                        "no widget schema; positional values ignored"
                    );
                    return;
                };

                for (field, value) in schema.iter().zip(values) {
                    if field.is_control() {
                        continue;
                    }
                    node.inputs
                        .insert(field.name.clone(), InputValue::Literal(value.clone()));
                }
            }
            Value::Object(map) => {
                let is_control = |name: &str| {
                    schema.map_or(false, |s| s.iter().any(|f| f.name == name && f.is_control()))
                };
                for (name, value) in map {
                    if !is_control(name) {
                        node.inputs
                            .insert(name.clone(), InputValue::Literal(value.clone()));
                    }
                }
            }
            _ => {}
        }
    }

    fn apply_link(
        &self,
        graph: &mut Graph,
        by_id: &HashMap<&str, &UiNode>,
        link: &UiLink,
    ) -> Result<(), String> {
        let Some(target) = by_id.get(link.target_id.as_str()) else {
            tracing::warn!(link = link.id, target = %link.target_id, "link targets an unknown node");
            return Err(format!(
                "link {} targets unknown node '{}'",
                link.id, link.target_id
            ));
        };

        let Some(name) = self.input_name(target, link.target_slot) else {
            tracing::warn!(
                link = link.id,
                node = %target.id,
                slot = link.target_slot,
                "cannot resolve input slot name; link dropped"
            );
            return Err(format!(
                "link {} into node '{}' slot {} has no input name",
                link.id, target.id, link.target_slot
            ));
        };

        if let Some(node) = graph.get_mut(&target.id) {
            node.inputs.insert(
                name,
                InputValue::Link(Connection::new(link.origin_id.clone(), link.origin_slot)),
            );
        }
        Ok(())
    }

    fn input_name(&self, target: &UiNode, slot: u32) -> Option<String> {
        let index = slot as usize;

        target
            .inputs
            .get(index)
            .map(|input| input.name.as_str())
            .filter(|name| !name.is_empty())
            .or_else(|| self.registry.input_slot(&target.node_type, index))
            .map(str::to_string)
    }

    /// Convert the canonical graph to a UI document
    pub fn api_to_ui(&self, graph: &Graph) -> UiDocument {
        let mut doc = UiDocument::default();
        let mut next_link_id: u64 = 0;

        for (id, node) in graph.iter() {
            let mut ui_node = UiNode {
                id: id.to_string(),
                node_type: node.class_type.clone(),
                title: node.title().map(str::to_string),
                widgets_values: Some(Value::Array(self.widget_values(node))),
                ..Default::default()
            };

            for (name, conn) in node.links() {
                next_link_id += 1;
                doc.links.push(UiLink {
                    id: next_link_id,
                    origin_id: conn.node_id.clone(),
                    origin_slot: conn.output_index,
                    target_id: id.to_string(),
                    target_slot: ui_node.inputs.len() as u32,
                });
                ui_node.inputs.push(UiInput {
                    name: name.to_string(),
                    link: Some(next_link_id),
                    ..Default::default()
                });
            }

            doc.nodes.push(ui_node);
        }

        self.attach_outputs(graph, &mut doc);
        doc
    }

    /// UI form as a JSON value
    pub fn api_to_ui_value(&self, graph: &Graph) -> NodeflowResult<Value> {
        Ok(serde_json::to_value(self.api_to_ui(graph))?)
    }

    fn widget_values(&self, node: &Node) -> Vec<Value> {
        let literal = |name: &str| {
            node.inputs
                .get(name)
                .and_then(InputValue::as_literal)
                .cloned()
                .unwrap_or(Value::Null)
        };

        let Some(schema) = self.registry.widget_schema(&node.class_type) else {
            return node.literals().map(|(_, v)| v.clone()).collect();
        };

        let mut values: Vec<Value> = schema
            .iter()
            .map(|field: &WidgetField| {
                if field.is_control() {
                    Value::Null
                } else {
                    literal(&field.name)
                }
            })
            .collect();

        // Literals the schema does not know about trail the positional values
        values.extend(
            node.literals()
                .filter(|(name, _)| !schema.iter().any(|f| f.name == *name))
                .map(|(_, v)| v.clone()),
        );

        values
    }

    fn attach_outputs(&self, graph: &Graph, doc: &mut UiDocument) {
        let mut per_slot: HashMap<(&str, u32), Vec<u64>> = HashMap::new();
        for link in &doc.links {
            per_slot
                .entry((link.origin_id.as_str(), link.origin_slot))
                .or_default()
                .push(link.id);
        }

        let mut outputs_by_node: HashMap<String, Vec<UiOutput>> = HashMap::new();
        for (id, node) in graph.iter() {
            let used = per_slot
                .keys()
                .filter(|(origin, _)| *origin == id)
                .map(|(_, slot)| *slot as usize + 1)
                .max()
                .unwrap_or(0);
            let count = node.outputs.len().max(used);

            let outputs = (0..count)
                .map(|slot| UiOutput {
                    name: node.outputs.get(slot).cloned().unwrap_or_default(),
                    links: Some(
                        per_slot
                            .get(&(id, slot as u32))
                            .cloned()
                            .unwrap_or_default(),
                    ),
                    slot_index: Some(slot as u32),
                    ..Default::default()
                })
                .collect();
            outputs_by_node.insert(id.to_string(), outputs);
        }

        for ui_node in &mut doc.nodes {
            if let Some(outputs) = outputs_by_node.remove(&ui_node.id) {
                ui_node.outputs = outputs;
            }
        }
    }
}
