// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Content fingerprints for workflow graphs
//!
//! Uses BLAKE3 over a canonical walk of the graph: nodes sorted by id,
//! inputs sorted by name, object keys sorted at every depth. Titles and
//! other `_meta` content are not part of the fingerprint, so two exports
//! of the same workflow hash equal regardless of key order.

use blake3::Hasher;
use serde_json::Value;

use super::definition::{Graph, InputValue, Node};

/// Incremental hasher over graph content
pub struct GraphHasher {
    hasher: Hasher,
}

impl GraphHasher {
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
        }
    }

    /// Hash every node of a graph in id order
    pub fn hash_graph(&mut self, graph: &Graph) {
        let mut nodes: Vec<(&str, &Node)> = graph.iter().collect();
        nodes.sort_by(|a, b| a.0.cmp(b.0));

        for (id, node) in nodes {
            self.field(b"node", id.as_bytes());
            self.hash_node(node);
        }
    }

    fn hash_node(&mut self, node: &Node) {
        self.field(b"class", node.class_type.as_bytes());

        let mut inputs: Vec<(&String, &InputValue)> = node.inputs.iter().collect();
        inputs.sort_by(|a, b| a.0.cmp(b.0));

        for (name, value) in inputs {
            self.field(b"input", name.as_bytes());
            match value {
                InputValue::Link(conn) => {
                    self.field(b"link", conn.node_id.as_bytes());
                    self.hasher.update(&conn.output_index.to_le_bytes());
                }
                InputValue::Literal(literal) => {
                    self.hasher.update(b"literal");
                    self.hash_value(literal);
                }
            }
        }
    }

    fn hash_value(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                self.hasher.update(b"{");
                for key in keys {
                    self.field(b"key", key.as_bytes());
                    self.hash_value(&map[key]);
                }
                self.hasher.update(b"}");
            }
            Value::Array(items) => {
                self.hasher.update(b"[");
                for item in items {
                    self.hash_value(item);
                }
                self.hasher.update(b"]");
            }
            scalar => {
                self.field(b"scalar", scalar.to_string().as_bytes());
            }
        }
    }

    /// Length-prefixed write so adjacent fields cannot run together
    fn field(&mut self, tag: &[u8], bytes: &[u8]) {
        self.hasher.update(tag);
        self.hasher.update(&(bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    /// Hex digest
    pub fn finalize(&self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

impl Default for GraphHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Order-independent content fingerprint
    pub fn fingerprint(&self) -> String {
        let mut hasher = GraphHasher::new();
        hasher.hash_graph(self);
        hasher.finalize()
    }
}
