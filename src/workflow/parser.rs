// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Workflow parsing and structural validation
//!
//! Accepts documents in either serialization, normalizes them to the
//! canonical graph and checks that every node is structurally sound.
//! Cycle detection is opt-in through [`ParseResult::validate_connections`].

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use super::converter::{detect_format, FormatConverter, WorkflowFormat};
use super::definition::{Graph, InputValue, Link, Node, NodeMeta};
use super::ui::UiDocument;
use crate::errors::{NodeflowError, NodeflowResult};
use crate::registry::NodeRegistry;

/// Workflow parser
pub struct Parser<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    /// Parse an already-decoded document
    pub fn parse(&self, document: &Value) -> NodeflowResult<ParseResult<'r>> {
        if !document.is_object() {
            return Err(NodeflowError::MalformedInput {
                message: "expected a JSON object at the top level".into(),
            });
        }

        let format = detect_format(document);
        tracing::debug!(%format, "detected workflow format");

        let (graph, errors) = match format {
            WorkflowFormat::Ui => {
                let ui = UiDocument::from_value(document)?;
                let (graph, dropped) = FormatConverter::new(self.registry).ui_to_api_reporting(&ui);
                validate_graph(&graph)?;
                (graph, dropped)
            }
            WorkflowFormat::Api => (graph_from_api(document)?, Vec::new()),
        };

        if graph.is_empty() {
            return Err(NodeflowError::EmptyGraph);
        }

        Ok(ParseResult::new(graph, format, errors, self.registry))
    }

    /// Parse JSON text
    pub fn parse_from_text(&self, text: &str) -> NodeflowResult<ParseResult<'r>> {
        let document: Value =
            serde_json::from_str(text).map_err(|e| NodeflowError::malformed(&e))?;
        self.parse(&document)
    }

    /// Read and parse a workflow file
    pub fn parse_from_path(&self, path: &Path) -> NodeflowResult<ParseResult<'r>> {
        if !path.exists() {
            return Err(NodeflowError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|e| NodeflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        self.parse_from_text(&text)
    }
}

/// Build the canonical graph from an API-form document, validating each node
pub(crate) fn graph_from_api(document: &Value) -> NodeflowResult<Graph> {
    let Some(entries) = document.as_object() else {
        return Err(NodeflowError::MalformedInput {
            message: "expected a JSON object keyed by node id".into(),
        });
    };

    let mut graph = Graph::new();
    for (id, raw) in entries {
        graph.insert(id.clone(), node_from_api(id, raw)?);
    }
    Ok(graph)
}

fn node_from_api(id: &str, raw: &Value) -> NodeflowResult<Node> {
    let Some(record) = raw.as_object() else {
        return Err(NodeflowError::invalid_node(id, "node must be an object"));
    };

    let class_type = match record.get("class_type") {
        None => return Err(NodeflowError::invalid_node(id, "missing class_type")),
        Some(Value::String(s)) if s.is_empty() => {
            return Err(NodeflowError::invalid_node(id, "class_type must not be empty"))
        }
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(NodeflowError::invalid_node(id, "class_type must be a string")),
    };

    let mut node = Node::new(class_type);

    match record.get("inputs") {
        None | Some(Value::Null) => {}
        Some(Value::Object(inputs)) => {
            for (name, value) in inputs {
                node.inputs
                    .insert(name.clone(), InputValue::from_json(value.clone()));
            }
        }
        Some(_) => return Err(NodeflowError::invalid_node(id, "inputs must be an object")),
    }

    if let Some(Value::Array(outputs)) = record.get("outputs") {
        node.outputs = outputs
            .iter()
            .map(|o| match o {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
    }

    if let Some(meta) = record.get("_meta") {
        match serde_json::from_value::<NodeMeta>(meta.clone()) {
            Ok(meta) => node.meta = Some(meta),
            Err(e) => tracing::debug!(node = id, error = %e, "ignoring unreadable _meta"),
        }
    }

    Ok(node)
}

/// Structural checks for graphs produced by conversion
fn validate_graph(graph: &Graph) -> NodeflowResult<()> {
    for (id, node) in graph.iter() {
        if node.class_type.is_empty() {
            return Err(NodeflowError::invalid_node(id, "class_type must not be empty"));
        }
    }
    Ok(())
}

/// Outcome of a successful parse
#[derive(Debug)]
pub struct ParseResult<'r> {
    graph: Graph,
    format: WorkflowFormat,
    errors: Vec<String>,
    registry: &'r NodeRegistry,
    connections: OnceLock<Vec<Link>>,
    custom_nodes: OnceLock<BTreeSet<String>>,
}

impl<'r> ParseResult<'r> {
    fn new(
        graph: Graph,
        format: WorkflowFormat,
        errors: Vec<String>,
        registry: &'r NodeRegistry,
    ) -> Self {
        Self {
            graph,
            format,
            errors,
            registry,
            connections: OnceLock::new(),
            custom_nodes: OnceLock::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Format the document was written in
    pub fn format(&self) -> WorkflowFormat {
        self.format
    }

    /// False when conversion had to drop part of the document
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Recovered problems, such as UI links whose target input could not be named.
    /// Structural errors fail the parse instead of landing here.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    /// Every connection-valued input; computed once
    pub fn connections(&self) -> &[Link] {
        self.connections.get_or_init(|| self.graph.links())
    }

    /// Class types not shipped with the execution environment; computed once
    pub fn custom_nodes(&self) -> &BTreeSet<String> {
        self.custom_nodes.get_or_init(|| {
            self.graph
                .iter()
                .map(|(_, node)| node.class_type.as_str())
                .filter(|class_type| !self.registry.is_builtin(class_type))
                .map(str::to_string)
                .collect()
        })
    }

    /// Content fingerprint of the parsed graph
    pub fn fingerprint(&self) -> String {
        self.graph.fingerprint()
    }

    /// Check the connection structure for cycles
    ///
    /// Connections to nodes outside the graph are ignored here; they are
    /// reported by the analyzer's connection diagnostics.
    pub fn validate_connections(&self) -> NodeflowResult<()> {
        let mut producers: HashMap<&str, Vec<&str>> = HashMap::new();
        for link in self.connections() {
            if self.graph.contains(&link.source.node_id) {
                producers
                    .entry(link.consumer.as_str())
                    .or_default()
                    .push(link.source.node_id.as_str());
            }
        }

        let ids: Vec<&str> = self.graph.node_ids().collect();
        match find_cycle(&ids, &producers) {
            Some(cycle) => Err(NodeflowError::CircularDependency {
                node_id: cycle[0].clone(),
                cycle,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Iterative three-colour depth-first search
///
/// Returns the nodes of the first cycle found, starting at the node the
/// back edge points to.
fn find_cycle(ids: &[&str], edges: &HashMap<&str, Vec<&str>>) -> Option<Vec<String>> {
    let mut marks: HashMap<&str, Mark> = ids.iter().map(|id| (*id, Mark::Unvisited)).collect();
    let no_edges: Vec<&str> = Vec::new();

    for &root in ids {
        if marks[root] != Mark::Unvisited {
            continue;
        }

        // (node, index of the next edge to follow)
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::InProgress);

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let targets = edges.get(node).unwrap_or(&no_edges);

            if frame.1 < targets.len() {
                let target = targets[frame.1];
                frame.1 += 1;

                match marks.get(target).copied().unwrap_or(Mark::Done) {
                    Mark::Unvisited => {
                        marks.insert(target, Mark::InProgress);
                        stack.push((target, 0));
                    }
                    Mark::InProgress => {
                        let start = stack.iter().position(|(n, _)| *n == target).unwrap_or(0);
                        return Some(stack[start..].iter().map(|(n, _)| n.to_string()).collect());
                    }
                    Mark::Done => {}
                }
            } else {
                marks.insert(node, Mark::Done);
                stack.pop();
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn two_node_api() -> Value {
        json!({
            "1": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "m.safetensors"}},
            "2": {"class_type": "KSampler", "inputs": {"model": ["1", 0], "seed": 42}}
        })
    }

    #[test]
    fn test_parse_api_document() {
        let registry = NodeRegistry::builtin();
        let result = Parser::new(&registry).parse(&two_node_api()).unwrap();

        assert_eq!(result.format(), WorkflowFormat::Api);
        assert!(result.is_valid());
        assert_eq!(result.node_count(), 2);
        assert!(result.graph().get("1").unwrap().outputs.is_empty());
        assert_eq!(result.connections().len(), 1);
        assert!(result.custom_nodes().is_empty());
        assert!(result.validate_connections().is_ok());
    }

    #[test]
    fn test_reparse_serialized_graph() {
        let registry = NodeRegistry::builtin();
        let parser = Parser::new(&registry);
        let first = parser.parse(&two_node_api()).unwrap();

        let text = first.graph().to_json_pretty().unwrap();
        let second = parser.parse_from_text(&text).unwrap();

        assert_eq!(second.graph(), first.graph());
    }

    #[test]
    fn test_connections_are_cached() {
        let registry = NodeRegistry::builtin();
        let result = Parser::new(&registry).parse(&two_node_api()).unwrap();

        let first = result.connections().as_ptr();
        let second = result.connections().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_nodes() {
        let registry = NodeRegistry::builtin();
        let result = Parser::new(&registry)
            .parse(&json!({
                "1": {"class_type": "LoadImage", "inputs": {"image": "a.png"}},
                "2": {"class_type": "ImpactFaceDetailer", "inputs": {"image": ["1", 0]}},
                "3": {"class_type": "ImpactFaceDetailer", "inputs": {"image": ["2", 0]}}
            }))
            .unwrap();

        let custom: Vec<_> = result.custom_nodes().iter().cloned().collect();
        assert_eq!(custom, vec!["ImpactFaceDetailer"]);
    }

    #[test]
    fn test_malformed_text() {
        let registry = NodeRegistry::builtin();
        let err = Parser::new(&registry).parse_from_text("{\"1\": ").unwrap_err();
        assert!(matches!(err, NodeflowError::MalformedInput { .. }));

        let err = Parser::new(&registry).parse_from_text("[1, 2]").unwrap_err();
        assert!(matches!(err, NodeflowError::MalformedInput { .. }));
    }

    #[test]
    fn test_empty_documents() {
        let registry = NodeRegistry::builtin();
        let parser = Parser::new(&registry);

        assert!(matches!(parser.parse(&json!({})), Err(NodeflowError::EmptyGraph)));
        assert!(matches!(
            parser.parse(&json!({"nodes": [], "links": []})),
            Err(NodeflowError::EmptyGraph)
        ));
    }

    #[test]
    fn test_invalid_node_structure() {
        let registry = NodeRegistry::builtin();
        let parser = Parser::new(&registry);

        let cases = [
            json!({"7": "not a node"}),
            json!({"7": {"inputs": {}}}),
            json!({"7": {"class_type": ""}}),
            json!({"7": {"class_type": 3}}),
            json!({"7": {"class_type": "KSampler", "inputs": [1, 2]}}),
        ];

        for case in cases {
            let err = parser.parse(&case).unwrap_err();
            assert!(
                matches!(&err, NodeflowError::InvalidNodeStructure { node_id, .. } if node_id == "7"),
                "unexpected error for {}: {:?}",
                case,
                err
            );
        }
    }

    #[test]
    fn test_ui_node_without_type_is_invalid() {
        let registry = NodeRegistry::builtin();
        let err = Parser::new(&registry)
            .parse(&json!({"nodes": [{"id": 5}], "links": []}))
            .unwrap_err();
        assert_eq!(err.node_id(), Some("5"));
    }

    #[test]
    fn test_ui_duplicate_node_id_is_invalid() {
        let registry = NodeRegistry::builtin();
        let err = Parser::new(&registry)
            .parse(&json!({
                "nodes": [
                    {"id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["m.safetensors"]},
                    {"id": 1, "type": "SaveImage", "widgets_values": ["out"]}
                ],
                "links": []
            }))
            .unwrap_err();

        assert!(matches!(err, NodeflowError::InvalidNodeStructure { .. }));
        assert_eq!(err.node_id(), Some("1"));
    }

    #[test]
    fn test_unresolvable_ui_link_is_recorded() {
        let registry = NodeRegistry::builtin();
        let result = Parser::new(&registry)
            .parse(&json!({
                "nodes": [
                    {"id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["m.safetensors"]},
                    {"id": 2, "type": "StudioMixer"}
                ],
                "links": [[4, 1, 0, 2, 3, "MODEL"], [5, 1, 0, 9, 0, "MODEL"]]
            }))
            .unwrap();

        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 2);
        assert!(result.errors()[0].contains("link 4"));
        assert!(result.errors()[1].contains("'9'"));
        assert!(result.graph().get("2").unwrap().inputs.is_empty());
    }

    #[test]
    fn test_ui_document_is_converted() {
        let registry = NodeRegistry::builtin();
        let result = Parser::new(&registry)
            .parse(&json!({
                "nodes": [
                    {"id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["m.safetensors"]},
                    {"id": 2, "type": "KSampler", "inputs": [{"name": "model", "link": 1}],
                     "widgets_values": [42, "fixed", 20, 7, "euler", "normal", 1]}
                ],
                "links": [[1, 1, 0, 2, 0, "MODEL"]]
            }))
            .unwrap();

        assert_eq!(result.format(), WorkflowFormat::Ui);
        let sampler = result.graph().get("2").unwrap();
        assert_eq!(sampler.inputs["seed"].to_json(), json!(42));
        assert_eq!(sampler.inputs["model"].to_json(), json!(["1", 0]));
    }

    #[test]
    fn test_cycle_detection_names_node_on_cycle() {
        let registry = NodeRegistry::builtin();
        let result = Parser::new(&registry)
            .parse(&json!({
                "1": {"class_type": "A", "inputs": {}},
                "2": {"class_type": "B", "inputs": {"x": ["1", 0], "y": ["4", 0]}},
                "3": {"class_type": "C", "inputs": {"x": ["2", 0]}},
                "4": {"class_type": "D", "inputs": {"x": ["3", 0]}},
                "5": {"class_type": "E", "inputs": {"x": ["4", 0]}}
            }))
            .unwrap();

        match result.validate_connections() {
            Err(NodeflowError::CircularDependency { node_id, cycle }) => {
                assert!(["2", "3", "4"].contains(&node_id.as_str()));
                let mut members = cycle.clone();
                members.sort();
                assert_eq!(members, vec!["2", "3", "4"]);
            }
            other => panic!("expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let registry = NodeRegistry::builtin();
        let result = Parser::new(&registry)
            .parse(&json!({"1": {"class_type": "A", "inputs": {"x": ["1", 0]}}}))
            .unwrap();

        let err = result.validate_connections().unwrap_err();
        assert_eq!(err.node_id(), Some("1"));
    }

    #[test]
    fn test_dangling_reference_is_not_a_cycle() {
        let registry = NodeRegistry::builtin();
        let result = Parser::new(&registry)
            .parse(&json!({"1": {"class_type": "SaveImage", "inputs": {"images": ["999", 0]}}}))
            .unwrap();

        assert!(result.validate_connections().is_ok());
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let mut doc = serde_json::Map::new();
        doc.insert("0".into(), json!({"class_type": "Start"}));
        for i in 1..50_000 {
            doc.insert(
                i.to_string(),
                json!({"class_type": "Step", "inputs": {"x": [(i - 1).to_string(), 0]}}),
            );
        }

        let registry = NodeRegistry::builtin();
        let result = Parser::new(&registry).parse(&Value::Object(doc)).unwrap();
        assert!(result.validate_connections().is_ok());
    }

    #[test]
    fn test_parse_from_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("workflow.json");
        std::fs::write(&path, two_node_api().to_string()).unwrap();

        let registry = NodeRegistry::builtin();
        let parser = Parser::new(&registry);
        assert_eq!(parser.parse_from_path(&path).unwrap().node_count(), 2);

        let missing = temp.path().join("missing.json");
        assert!(matches!(
            parser.parse_from_path(&missing),
            Err(NodeflowError::FileNotFound { .. })
        ));
    }
}
