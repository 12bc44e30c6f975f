// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Canonical workflow graph
//!
//! The API form of a workflow: nodes keyed by id, each with a class type and
//! named inputs that hold either a literal or a connection to another node's
//! output slot.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Reference to an output slot of another node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub node_id: String,
    pub output_index: u32,
}

impl Connection {
    pub fn new(node_id: impl Into<String>, output_index: u32) -> Self {
        Self {
            node_id: node_id.into(),
            output_index,
        }
    }

    /// Interpret a `[source_node_id, source_output_index]` pair
    pub fn from_json(value: &Value) -> Option<Self> {
        let pair = value.as_array()?;
        if pair.len() != 2 {
            return None;
        }
        let node_id = pair[0].as_str()?;
        let index = pair[1].as_u64()?;
        Some(Self::new(node_id, u32::try_from(index).ok()?))
    }

    pub fn to_json(&self) -> Value {
        Value::Array(vec![
            Value::String(self.node_id.clone()),
            Value::from(self.output_index),
        ])
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.node_id, self.output_index)
    }
}

/// Value of a node input
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Link(Connection),
    Literal(Value),
}

impl InputValue {
    /// Any two-element `(string, integer)` sequence is a connection
    pub fn from_json(value: Value) -> Self {
        match Connection::from_json(&value) {
            Some(conn) => Self::Link(conn),
            None => Self::Literal(value),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Link(conn) => conn.to_json(),
            Self::Literal(value) => value.clone(),
        }
    }

    pub fn as_link(&self) -> Option<&Connection> {
        match self {
            Self::Link(conn) => Some(conn),
            Self::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Link(_) => None,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link(_))
    }
}

impl From<Connection> for InputValue {
    fn from(conn: Connection) -> Self {
        Self::Link(conn)
    }
}

impl Serialize for InputValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InputValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

/// Out-of-band node metadata (`_meta`)
///
/// Repository, commit and packages are only ever read from the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A single workflow node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub class_type: String,

    #[serde(default)]
    pub inputs: IndexMap<String, InputValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,

    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<NodeMeta>,
}

impl Node {
    pub fn new(class_type: impl Into<String>) -> Self {
        Self {
            class_type: class_type.into(),
            inputs: IndexMap::new(),
            outputs: Vec::new(),
            meta: None,
        }
    }

    /// Add a literal input
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs
            .insert(name.into(), InputValue::Literal(value.into()));
        self
    }

    /// Add a connection input
    pub fn with_link(
        mut self,
        name: impl Into<String>,
        node_id: impl Into<String>,
        output_index: u32,
    ) -> Self {
        self.inputs.insert(
            name.into(),
            InputValue::Link(Connection::new(node_id, output_index)),
        );
        self
    }

    pub fn with_meta(mut self, meta: NodeMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Connection-valued inputs, in declaration order
    pub fn links(&self) -> impl Iterator<Item = (&str, &Connection)> {
        self.inputs
            .iter()
            .filter_map(|(name, value)| value.as_link().map(|c| (name.as_str(), c)))
    }

    /// Literal-valued inputs, in declaration order
    pub fn literals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inputs
            .iter()
            .filter_map(|(name, value)| value.as_literal().map(|v| (name.as_str(), v)))
    }

    pub fn title(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.title.as_deref())
    }
}

/// A connection seen from the consuming side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Node whose input holds the connection
    pub consumer: String,
    /// Input name on the consumer
    pub input: String,
    /// Producer output referenced by the input
    #[serde(serialize_with = "serialize_connection")]
    pub source: Connection,
}

fn serialize_connection<S: Serializer>(conn: &Connection, s: S) -> Result<S::Ok, S::Error> {
    conn.to_json().serialize(s)
}

/// Workflow graph in canonical (API) form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Graph {
    nodes: IndexMap<String, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&mut self, id: impl Into<String>, node: Node) -> Option<Node> {
        self.nodes.insert(id.into(), node)
    }

    /// Builder-style insert
    pub fn with_node(mut self, id: impl Into<String>, node: Node) -> Self {
        self.insert(id, node);
        self
    }

    /// Remove a node, keeping the order of the rest
    pub fn remove(&mut self, id: &str) -> Option<Node> {
        self.nodes.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.nodes.iter_mut().map(|(id, node)| (id.as_str(), node))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Every connection-valued input in the graph, in node then input order
    pub fn links(&self) -> Vec<Link> {
        self.iter()
            .flat_map(|(id, node)| {
                node.links().map(move |(input, conn)| Link {
                    consumer: id.to_string(),
                    input: input.to_string(),
                    source: conn.clone(),
                })
            })
            .collect()
    }

    /// Number of connection-valued inputs
    pub fn connection_count(&self) -> usize {
        self.nodes.values().map(|n| n.links().count()).sum()
    }

    /// API-form JSON value
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Pretty-printed API-form JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<(String, Node)> for Graph {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_detection() {
        assert_eq!(
            Connection::from_json(&json!(["4", 1])),
            Some(Connection::new("4", 1))
        );
        assert_eq!(Connection::from_json(&json!([4, 1])), None);
        assert_eq!(Connection::from_json(&json!(["4", 1, 2])), None);
        assert_eq!(Connection::from_json(&json!(["4", -1])), None);
        assert_eq!(Connection::from_json(&json!(["4", 0.5])), None);
    }

    #[test]
    fn test_input_value_serializes_as_api_form() {
        let node = Node::new("KSampler")
            .with_link("model", "1", 0)
            .with_input("seed", 42);

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({"class_type": "KSampler", "inputs": {"model": ["1", 0], "seed": 42}})
        );
    }

    #[test]
    fn test_graph_keeps_insertion_order_on_remove() {
        let mut graph = Graph::new()
            .with_node("3", Node::new("A"))
            .with_node("1", Node::new("B"))
            .with_node("2", Node::new("C"));

        graph.remove("1");
        let ids: Vec<_> = graph.node_ids().collect();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[test]
    fn test_links_lists_only_connections() {
        let graph = Graph::new()
            .with_node("1", Node::new("CheckpointLoaderSimple").with_input("ckpt_name", "m"))
            .with_node(
                "2",
                Node::new("KSampler")
                    .with_link("model", "1", 0)
                    .with_input("steps", 20),
            );

        let links = graph.links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].consumer, "2");
        assert_eq!(links[0].input, "model");
        assert_eq!(links[0].source, Connection::new("1", 0));
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_deserialize_roundtrip_meta() {
        let value = json!({
            "5": {
                "class_type": "FaceDetailer",
                "inputs": {"image": ["4", 0]},
                "_meta": {"title": "Detailer", "repository": "https://example.com/impact.git", "extra_key": 1}
            }
        });

        let graph: Graph = serde_json::from_value(value.clone()).unwrap();
        let node = graph.get("5").unwrap();
        assert_eq!(node.title(), Some("Detailer"));
        assert_eq!(node.meta.as_ref().unwrap().extra["extra_key"], json!(1));
        assert_eq!(graph.to_value().unwrap(), value);
    }
}
