// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Presentation-node elimination
//!
//! Editors let users place nodes that only exist for layout: reroutes,
//! notes, bookmarks, variable get/set markers. These must be removed before
//! a graph can run. Routing nodes are elided by rewiring their consumers to
//! the real producer; everything else presentation-only is dropped together
//! with the inputs that referenced it.
//!
//! All rewiring is computed from a snapshot of the input graph. Chains of
//! routing nodes are followed through that snapshot to the first ordinary
//! producer, so the result does not depend on the order nodes are visited.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::converter::FormatConverter;
use super::definition::{Connection, Graph, InputValue};
use crate::errors::NodeflowResult;
use crate::registry::{NodeRegistry, RoutingClass};

/// Anomaly recovered while cleaning a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreprocessWarning {
    /// An input referenced a node that is not in the cleaned graph; the input was removed
    BrokenConnection {
        node_id: String,
        input: String,
        missing: String,
    },
    /// A routing node had no single upstream source; inputs it fed were removed
    UnresolvedBypass { node_id: String, class_type: String },
}

impl std::fmt::Display for PreprocessWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BrokenConnection {
                node_id,
                input,
                missing,
            } => write!(
                f,
                "node '{}' input '{}' referenced missing node '{}'",
                node_id, input, missing
            ),
            Self::UnresolvedBypass {
                node_id,
                class_type,
            } => write!(
                f,
                "routing node '{}' ({}) has no single upstream source",
                node_id, class_type
            ),
        }
    }
}

/// Graph cleaner
///
/// Holds the outcome of the most recent [`preprocess`](Self::preprocess) call.
pub struct GraphPreprocessor<'r> {
    registry: &'r NodeRegistry,
    removed: BTreeSet<String>,
    warnings: Vec<PreprocessWarning>,
}

impl<'r> GraphPreprocessor<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self {
            registry,
            removed: BTreeSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Ids of every node removed by the last run
    pub fn removed_node_ids(&self) -> &BTreeSet<String> {
        &self.removed
    }

    /// Anomalies recovered during the last run
    pub fn warnings(&self) -> &[PreprocessWarning] {
        &self.warnings
    }

    /// Normalize a document in either form, then clean it
    pub fn preprocess_document(&mut self, document: &Value) -> NodeflowResult<Graph> {
        let graph = FormatConverter::new(self.registry).convert(document)?;
        Ok(self.preprocess(&graph))
    }

    /// Return a cleaned copy of `graph`
    pub fn preprocess(&mut self, graph: &Graph) -> Graph {
        self.removed.clear();
        self.warnings.clear();

        let mut cleaned = graph.clone();

        // producer id -> [(consumer id, input name)]
        let mut consumers: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
        for (id, node) in graph.iter() {
            for (input, conn) in node.links() {
                consumers
                    .entry(conn.node_id.as_str())
                    .or_default()
                    .push((id, input));
            }
        }

        let routing: HashMap<&str, RoutingClass> = graph
            .iter()
            .map(|(id, node)| (id, self.registry.routing(&node.class_type)))
            .collect();
        let is_presentation =
            |id: &str| !matches!(routing.get(id), None | Some(RoutingClass::Ordinary));

        for (id, node) in graph.iter() {
            let class = routing[id];
            if class == RoutingClass::Ordinary {
                continue;
            }

            let replacement = match class {
                RoutingClass::Bypassable => self.resolve_source(graph, &routing, id),
                _ => None,
            };

            for &(consumer, input) in consumers.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                if is_presentation(consumer) {
                    continue;
                }
                let Some(target) = cleaned.get_mut(consumer) else {
                    continue;
                };
                match &replacement {
                    Some(conn) => {
                        target
                            .inputs
                            .insert(input.to_string(), InputValue::Link(conn.clone()));
                    }
                    None => {
                        target.inputs.shift_remove(input);
                    }
                }
            }

            tracing::debug!(node = id, class_type = %node.class_type, ?class, "removing presentation node");
            cleaned.remove(id);
            self.removed.insert(id.to_string());
        }

        self.prune_broken_connections(&mut cleaned);

        cleaned
    }

    /// Follow a chain of routing nodes back to the first ordinary producer
    ///
    /// Returns `None` when the chain ends at a droppable node, loops, or
    /// passes through a routing node without exactly one connection input.
    fn resolve_source(
        &mut self,
        graph: &Graph,
        routing: &HashMap<&str, RoutingClass>,
        start: &str,
    ) -> Option<Connection> {
        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut current = start;

        loop {
            let node = graph.get(current)?;
            let mut links = node.links();
            let source = match (links.next(), links.next()) {
                (Some((_, conn)), None) => conn,
                _ => {
                    // Reported once, by the routing node that lacks a source
                    if current == start {
                        self.unresolved(start, &node.class_type);
                    }
                    return None;
                }
            };

            match routing.get(source.node_id.as_str()) {
                Some(RoutingClass::Bypassable) => {
                    if !visited.insert(source.node_id.as_str()) {
                        self.unresolved(start, &node.class_type);
                        return None;
                    }
                    current = source.node_id.as_str();
                }
                Some(RoutingClass::Droppable) => return None,
                // Ordinary producers and missing ids; the latter are pruned afterwards
                _ => return Some(source.clone()),
            }
        }
    }

    fn unresolved(&mut self, node_id: &str, class_type: &str) {
        tracing::warn!(node = node_id, class_type, "routing node has no single upstream source");
        self.warnings.push(PreprocessWarning::UnresolvedBypass {
            node_id: node_id.to_string(),
            class_type: class_type.to_string(),
        });
    }

    fn prune_broken_connections(&mut self, graph: &mut Graph) {
        let present: HashSet<String> = graph.node_ids().map(str::to_string).collect();

        for (id, node) in graph.iter_mut() {
            let broken: Vec<(String, String)> = node
                .links()
                .filter(|(_, conn)| !present.contains(&conn.node_id))
                .map(|(input, conn)| (input.to_string(), conn.node_id.clone()))
                .collect();

            for (input, missing) in broken {
                tracing::warn!(node = id, input = %input, missing = %missing, "dropping broken connection");
                node.inputs.shift_remove(&input);
                self.warnings.push(PreprocessWarning::BrokenConnection {
                    node_id: id.to_string(),
                    input,
                    missing,
                });
            }
        }
    }
}
