// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Dependency DAG for workflow nodes
//!
//! Edges run from producer to consumer, one per connection-valued input.
//! Connections to nodes outside the graph contribute no edge.

use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use crate::errors::{NodeflowError, NodeflowResult};
use crate::workflow::Graph;

/// Node weight
#[derive(Debug, Clone)]
struct DagNode {
    id: String,
    class_type: String,
}

/// Sort key giving numeric ids their numeric order
///
/// All-digit ids sort numerically and before any other id; the rest sort
/// lexicographically.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum IdKey<'a> {
    Numeric(u64, &'a str),
    Text(&'a str),
}

impl<'a> IdKey<'a> {
    fn of(id: &'a str) -> Self {
        let numeric = !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit());
        match id.parse::<u64>() {
            Ok(n) if numeric => Self::Numeric(n, id),
            _ => Self::Text(id),
        }
    }
}

/// Ordering used wherever node ids must be listed deterministically
pub fn compare_node_ids(a: &str, b: &str) -> Ordering {
    IdKey::of(a).cmp(&IdKey::of(b))
}

/// Producer/consumer graph over a workflow
pub struct DependencyDag {
    graph: DiGraph<DagNode, String>,
    id_to_index: HashMap<String, NodeIndex>,
}

impl DependencyDag {
    /// Build the DAG from a workflow graph
    pub fn build(workflow: &Graph) -> Self {
        let mut graph = DiGraph::with_capacity(workflow.len(), workflow.connection_count());
        let mut id_to_index = HashMap::with_capacity(workflow.len());

        for (id, node) in workflow.iter() {
            let index = graph.add_node(DagNode {
                id: id.to_string(),
                class_type: node.class_type.clone(),
            });
            id_to_index.insert(id.to_string(), index);
        }

        for (id, node) in workflow.iter() {
            let consumer = id_to_index[id];
            for (input, conn) in node.links() {
                if let Some(&producer) = id_to_index.get(&conn.node_id) {
                    graph.add_edge(producer, consumer, input.to_string());
                }
            }
        }

        Self { graph, id_to_index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn id(&self, index: NodeIndex) -> &str {
        &self.graph[index].id
    }

    /// Kahn's algorithm, always taking the smallest ready id
    ///
    /// Stops early on a cycle; the nodes it could not reach are absent from
    /// the returned order.
    fn kahn(&self) -> Vec<NodeIndex> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.edges_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<(IdKey<'_>, NodeIndex)>> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(|n| Reverse((IdKey::of(self.id(n)), n)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, node))) = ready.pop() {
            order.push(node);
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    ready.push(Reverse((IdKey::of(self.id(target)), target)));
                }
            }
        }

        order
    }

    /// Node ids in execution order
    pub fn execution_order(&self) -> NodeflowResult<Vec<String>> {
        let order = self.kahn();

        if order.len() < self.graph.node_count() {
            return Err(self.cycle_error(&order));
        }

        tracing::debug!(nodes = order.len(), "computed execution order");
        Ok(order.into_iter().map(|n| self.id(n).to_string()).collect())
    }

    fn cycle_error(&self, ordered: &[NodeIndex]) -> NodeflowError {
        let mut placed = vec![false; self.graph.node_count()];
        for n in ordered {
            placed[n.index()] = true;
        }

        let mut remaining: Vec<String> = self
            .graph
            .node_indices()
            .filter(|n| !placed[n.index()])
            .map(|n| self.id(n).to_string())
            .collect();
        remaining.sort_by(|a, b| compare_node_ids(a, b));

        // Nodes downstream of a cycle are left over too; name one that is on it
        let node_id = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .flatten()
            .map(|n| self.id(n))
            .min_by(|a, b| compare_node_ids(a, b))
            .or_else(|| remaining.first().map(String::as_str))
            .unwrap_or_default()
            .to_string();

        tracing::debug!(node = %node_id, remaining = remaining.len(), "cycle blocks execution order");
        NodeflowError::CycleError { node_id, remaining }
    }

    /// Number of nodes on the longest dependency chain
    ///
    /// Computed over the acyclic part of the graph, so it is defined even
    /// when a cycle is present.
    pub fn longest_chain(&self) -> usize {
        let order = self.kahn();
        let mut depth = vec![0usize; self.graph.node_count()];

        for &node in &order {
            let here = depth[node.index()].max(1);
            depth[node.index()] = here;
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let slot = &mut depth[edge.target().index()];
                *slot = (*slot).max(here + 1);
            }
        }

        order.iter().map(|n| depth[n.index()]).max().unwrap_or(0)
    }

    fn neighbours(&self, id: &str, direction: Direction) -> Option<Vec<String>> {
        let node = self.id_to_index.get(id)?;
        let mut ids: Vec<String> = self
            .graph
            .neighbors_directed(*node, direction)
            .map(|n| self.id(n).to_string())
            .collect();
        ids.sort_by(|a, b| compare_node_ids(a, b));
        ids.dedup();
        Some(ids)
    }

    /// Direct producers of a node
    pub fn dependencies(&self, id: &str) -> Option<Vec<String>> {
        self.neighbours(id, Direction::Incoming)
    }

    /// Direct consumers of a node
    pub fn dependents(&self, id: &str) -> Option<Vec<String>> {
        self.neighbours(id, Direction::Outgoing)
    }

    /// Whether `a` needs the output of `b`, directly or transitively
    pub fn depends_on(&self, a: &str, b: &str) -> bool {
        let (Some(&node_a), Some(&node_b)) = (self.id_to_index.get(a), self.id_to_index.get(b))
        else {
            return false;
        };
        node_a != node_b && has_path_connecting(&self.graph, node_b, node_a, None)
    }

    /// Mermaid flowchart
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.graph.node_indices() {
            let weight = &self.graph[node];
            out.push_str(&format!(
                "    n{}[\"{}: {}\"]\n",
                node.index(),
                escape(&weight.id, "#quot;"),
                escape(&weight.class_type, "#quot;")
            ));
        }

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    n{} -->|{}| n{}\n",
                edge.source().index(),
                escape(edge.weight(), "#quot;"),
                edge.target().index()
            ));
        }

        out
    }

    /// Graphviz DOT
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph workflow {\n");
        out.push_str("    rankdir=LR;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for node in self.graph.node_indices() {
            let weight = &self.graph[node];
            out.push_str(&format!(
                "    \"{}\" [label=\"{}\\n{}\"];\n",
                escape(&weight.id, "\\\""),
                escape(&weight.id, "\\\""),
                escape(&weight.class_type, "\\\"")
            ));
        }

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
                escape(self.id(edge.source()), "\\\""),
                escape(self.id(edge.target()), "\\\""),
                escape(edge.weight(), "\\\"")
            ));
        }

        out.push_str("}\n");
        out
    }

    /// Numbered execution plan
    pub fn to_text(&self) -> NodeflowResult<String> {
        let order = self.execution_order()?;
        let mut out = String::new();

        for (i, id) in order.iter().enumerate() {
            let class_type = self
                .id_to_index
                .get(id)
                .map(|n| self.graph[*n].class_type.as_str())
                .unwrap_or_default();
            let deps = self.dependencies(id).unwrap_or_default();

            out.push_str(&format!("{}. {} ({})", i + 1, id, class_type));
            if !deps.is_empty() {
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }
            out.push('\n');
        }

        Ok(out)
    }
}

fn escape(text: &str, quote: &str) -> String {
    text.replace('"', quote)
}
