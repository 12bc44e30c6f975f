// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Workflow graph analyzer
//!
//! Structural queries over a normalized (usually preprocessed) graph:
//! execution order, connection statistics, model loaders, complexity and
//! diagnostics. Everything here is total over well-formed graphs; only the
//! execution order can fail, on a cycle.

mod categories;
mod complexity;
mod dag;

pub use categories::{categorize, NodeCategory};
pub use complexity::{Complexity, ComplexityLevel};
pub use dag::{compare_node_ids, DependencyDag};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::errors::NodeflowResult;
use crate::registry::NodeRegistry;
use crate::workflow::{Graph, Node};

/// Category reported for loaders found by naming convention alone
pub const INFERRED_MODEL_CATEGORY: &str = "other";

/// Provenance of a class type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Builtin,
    Custom,
    Unknown,
}

/// Producers a node reads from, with the inputs each one feeds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeDependencies {
    pub dependencies: IndexMap<String, Vec<String>>,
}

/// Node with the most connection-valued inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostConnected {
    pub node_id: String,
    pub class_type: String,
    pub inputs: usize,
}

/// Number of consumers reading one output slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputUsage {
    pub node_id: String,
    pub output_index: u32,
    pub consumers: usize,
}

/// Connection statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionStats {
    pub total: usize,
    pub most_connected: Option<MostConnected>,
    pub output_usage: Vec<OutputUsage>,
}

/// A node that loads a model file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelLoader {
    pub node_id: String,
    pub class_type: String,
    /// Model directory category (checkpoints, loras, ...)
    pub category: String,
    /// Input holding the filename
    pub field: String,
    pub filename: String,
    /// Found by naming convention rather than from the registry
    pub inferred: bool,
}

/// Everything the analyzer can say about a graph
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub fingerprint: String,
    pub node_count: usize,
    /// Absent when the graph has a cycle
    pub execution_order: Option<Vec<String>>,
    /// Cycle diagnostic, when ordering failed
    pub cycle: Option<String>,
    pub connection_stats: ConnectionStats,
    pub complexity: Complexity,
    pub complexity_level: ComplexityLevel,
    pub categories: BTreeMap<NodeCategory, BTreeSet<String>>,
    pub isolated_nodes: BTreeSet<String>,
    pub custom_nodes: BTreeSet<String>,
    pub model_loaders: Vec<ModelLoader>,
    pub issues: Vec<String>,
}

/// Graph analyzer
pub struct GraphAnalyzer<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> GraphAnalyzer<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    pub fn node_kind(&self, class_type: &str) -> NodeKind {
        if class_type.is_empty() {
            NodeKind::Unknown
        } else if self.registry.is_builtin(class_type) {
            NodeKind::Builtin
        } else {
            NodeKind::Custom
        }
    }

    /// Per node, the producers it reads from and through which inputs
    pub fn dependency_graph(&self, graph: &Graph) -> IndexMap<String, NodeDependencies> {
        graph
            .iter()
            .map(|(id, node)| {
                let mut deps = NodeDependencies::default();
                for (input, conn) in node.links() {
                    deps.dependencies
                        .entry(conn.node_id.clone())
                        .or_default()
                        .push(input.to_string());
                }
                (id.to_string(), deps)
            })
            .collect()
    }

    pub fn dag(&self, graph: &Graph) -> DependencyDag {
        DependencyDag::build(graph)
    }

    /// Topological order, ready nodes taken in ascending id order
    pub fn execution_order(&self, graph: &Graph) -> NodeflowResult<Vec<String>> {
        DependencyDag::build(graph).execution_order()
    }

    /// Nodes with no connection inputs and no consumers
    pub fn isolated_nodes(&self, graph: &Graph) -> BTreeSet<String> {
        let consumed: HashSet<&str> = graph
            .iter()
            .flat_map(|(_, node)| node.links().map(|(_, conn)| conn.node_id.as_str()))
            .collect();

        graph
            .iter()
            .filter(|(id, node)| node.links().next().is_none() && !consumed.contains(id))
            .map(|(id, _)| id.to_string())
            .collect()
    }

    pub fn connection_stats(&self, graph: &Graph) -> ConnectionStats {
        let mut stats = ConnectionStats::default();
        let mut usage: HashMap<(&str, u32), usize> = HashMap::new();

        for (id, node) in graph.iter() {
            let mut inputs = 0;
            for (_, conn) in node.links() {
                inputs += 1;
                if graph.contains(&conn.node_id) {
                    *usage.entry((conn.node_id.as_str(), conn.output_index)).or_default() += 1;
                }
            }
            stats.total += inputs;

            let busier = stats
                .most_connected
                .as_ref()
                .map_or(inputs > 0, |best| inputs > best.inputs);
            if busier {
                stats.most_connected = Some(MostConnected {
                    node_id: id.to_string(),
                    class_type: node.class_type.clone(),
                    inputs,
                });
            }
        }

        let mut output_usage: Vec<OutputUsage> = usage
            .into_iter()
            .map(|((node_id, output_index), consumers)| OutputUsage {
                node_id: node_id.to_string(),
                output_index,
                consumers,
            })
            .collect();
        output_usage.sort_by(|a, b| {
            compare_node_ids(&a.node_id, &b.node_id).then(a.output_index.cmp(&b.output_index))
        });
        stats.output_usage = output_usage;

        stats
    }

    /// Loader nodes paired with the filename they load
    pub fn model_loaders(&self, graph: &Graph) -> Vec<ModelLoader> {
        let mut loaders = Vec::new();

        for (id, node) in graph.iter() {
            if let Some(model) = self.registry.model_field(&node.class_type) {
                for field in &model.fields {
                    if let Some(filename) = string_literal(node, field) {
                        loaders.push(ModelLoader {
                            node_id: id.to_string(),
                            class_type: node.class_type.clone(),
                            category: model.category.clone(),
                            field: field.clone(),
                            filename: filename.to_string(),
                            inferred: false,
                        });
                    }
                }
            } else if categories::looks_like_loader(&node.class_type) {
                let mut named = node
                    .literals()
                    .filter(|(name, value)| name.ends_with("_name") && value.is_string());
                if let (Some((field, Value::String(filename))), None) = (named.next(), named.next())
                {
                    loaders.push(ModelLoader {
                        node_id: id.to_string(),
                        class_type: node.class_type.clone(),
                        category: INFERRED_MODEL_CATEGORY.to_string(),
                        field: field.to_string(),
                        filename: filename.clone(),
                        inferred: true,
                    });
                }
            }
        }

        loaders
    }

    pub fn custom_nodes(&self, graph: &Graph) -> BTreeSet<String> {
        graph
            .iter()
            .filter(|(_, node)| self.node_kind(&node.class_type) == NodeKind::Custom)
            .map(|(_, node)| node.class_type.clone())
            .collect()
    }

    pub fn complexity(&self, graph: &Graph) -> Complexity {
        let custom = graph
            .iter()
            .filter(|(_, node)| self.node_kind(&node.class_type) == NodeKind::Custom)
            .count();

        Complexity::new(
            graph.len(),
            graph.connection_count(),
            DependencyDag::build(graph).longest_chain(),
            custom,
        )
    }

    /// One diagnostic per connection to a node that is not in the graph
    pub fn connection_issues(&self, graph: &Graph) -> Vec<String> {
        graph
            .links()
            .into_iter()
            .filter(|link| !graph.contains(&link.source.node_id))
            .map(|link| {
                format!(
                    "Node '{}' input '{}' references missing node '{}'",
                    link.consumer, link.input, link.source.node_id
                )
            })
            .collect()
    }

    pub fn group_by_category(&self, graph: &Graph) -> BTreeMap<NodeCategory, BTreeSet<String>> {
        let mut groups: BTreeMap<NodeCategory, BTreeSet<String>> = BTreeMap::new();
        for (id, node) in graph.iter() {
            groups
                .entry(categorize(&node.class_type))
                .or_default()
                .insert(id.to_string());
        }
        groups
    }

    /// Run every analysis; a cycle is reported in the result rather than raised
    pub fn analyze(&self, graph: &Graph) -> Analysis {
        let (execution_order, cycle) = match self.execution_order(graph) {
            Ok(order) => (Some(order), None),
            Err(e) => (None, Some(e.to_string())),
        };
        let complexity = self.complexity(graph);

        Analysis {
            fingerprint: graph.fingerprint(),
            node_count: graph.len(),
            execution_order,
            cycle,
            connection_stats: self.connection_stats(graph),
            complexity_level: complexity.level(),
            complexity,
            categories: self.group_by_category(graph),
            isolated_nodes: self.isolated_nodes(graph),
            custom_nodes: self.custom_nodes(graph),
            model_loaders: self.model_loaders(graph),
            issues: self.connection_issues(graph),
        }
    }
}

fn string_literal<'a>(node: &'a Node, field: &str) -> Option<&'a str> {
    node.inputs.get(field)?.as_literal()?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Parser;
    use serde_json::json;

    fn two_node() -> Graph {
        let registry = NodeRegistry::builtin();
        Parser::new(&registry)
            .parse(&json!({
                "1": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "m.safetensors"}},
                "2": {"class_type": "KSampler", "inputs": {"model": ["1", 0], "seed": 42}}
            }))
            .unwrap()
            .into_graph()
    }

    #[test]
    fn test_end_to_end_order() {
        let registry = NodeRegistry::builtin();
        let analyzer = GraphAnalyzer::new(&registry);
        assert_eq!(analyzer.execution_order(&two_node()).unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_node_kind() {
        let registry = NodeRegistry::builtin();
        let analyzer = GraphAnalyzer::new(&registry);

        assert_eq!(analyzer.node_kind("KSampler"), NodeKind::Builtin);
        assert_eq!(analyzer.node_kind("ImpactFaceDetailer"), NodeKind::Custom);
        assert_eq!(analyzer.node_kind(""), NodeKind::Unknown);
    }

    #[test]
    fn test_dependency_graph_ignores_literals() {
        let graph = Graph::new()
            .with_node("1", Node::new("CheckpointLoaderSimple"))
            .with_node(
                "2",
                Node::new("CLIPTextEncode")
                    .with_link("clip", "1", 1)
                    .with_input("text", "a cat"),
            )
            .with_node(
                "3",
                Node::new("Mixer")
                    .with_link("a", "2", 0)
                    .with_link("b", "2", 0),
            );

        let registry = NodeRegistry::builtin();
        let deps = GraphAnalyzer::new(&registry).dependency_graph(&graph);

        assert!(deps["1"].dependencies.is_empty());
        assert_eq!(deps["2"].dependencies["1"], vec!["clip"]);
        assert_eq!(deps["3"].dependencies["2"], vec!["a", "b"]);
    }

    #[test]
    fn test_isolated_nodes() {
        let graph = two_node().with_node("7", Node::new("Note").with_input("text", "hi"));

        let registry = NodeRegistry::builtin();
        let isolated = GraphAnalyzer::new(&registry).isolated_nodes(&graph);
        assert_eq!(isolated.into_iter().collect::<Vec<_>>(), vec!["7"]);
    }

    #[test]
    fn test_connection_stats() {
        let graph = Graph::new()
            .with_node("1", Node::new("CheckpointLoaderSimple"))
            .with_node("2", Node::new("CLIPTextEncode").with_link("clip", "1", 1))
            .with_node("3", Node::new("CLIPTextEncode").with_link("clip", "1", 1))
            .with_node(
                "4",
                Node::new("KSampler")
                    .with_link("model", "1", 0)
                    .with_link("positive", "2", 0)
                    .with_link("negative", "3", 0),
            );

        let registry = NodeRegistry::builtin();
        let stats = GraphAnalyzer::new(&registry).connection_stats(&graph);

        assert_eq!(stats.total, 5);
        let busiest = stats.most_connected.unwrap();
        assert_eq!(busiest.node_id, "4");
        assert_eq!(busiest.inputs, 3);
        assert_eq!(
            stats.output_usage[0],
            OutputUsage {
                node_id: "1".into(),
                output_index: 0,
                consumers: 1
            }
        );
        assert_eq!(stats.output_usage[1].consumers, 2);
        assert_eq!(stats.output_usage.len(), 4);
    }

    #[test]
    fn test_model_loaders() {
        let graph = Graph::new()
            .with_node("1", Node::new("CheckpointLoaderSimple").with_input("ckpt_name", "sd15.safetensors"))
            .with_node(
                "2",
                Node::new("DualCLIPLoader")
                    .with_input("clip_name1", "t5.safetensors")
                    .with_input("clip_name2", "clip_l.safetensors")
                    .with_input("type", "flux"),
            )
            .with_node("3", Node::new("IPAdapterModelLoader").with_input("ipadapter_name", "ip.bin"))
            .with_node(
                "4",
                Node::new("AmbiguousLoader")
                    .with_input("a_name", "x")
                    .with_input("b_name", "y"),
            )
            .with_node("5", Node::new("VAELoader").with_link("vae_name", "9", 0));

        let registry = NodeRegistry::builtin();
        let loaders = GraphAnalyzer::new(&registry).model_loaders(&graph);

        let found: Vec<_> = loaders
            .iter()
            .map(|l| (l.node_id.as_str(), l.category.as_str(), l.filename.as_str(), l.inferred))
            .collect();
        assert_eq!(
            found,
            vec![
                ("1", "checkpoints", "sd15.safetensors", false),
                ("2", "clip", "t5.safetensors", false),
                ("2", "clip", "clip_l.safetensors", false),
                ("3", "other", "ip.bin", true),
            ]
        );
    }

    #[test]
    fn test_connection_issues_name_both_ids() {
        let graph = Graph::new().with_node("1", Node::new("SaveImage").with_link("images", "999", 0));

        let registry = NodeRegistry::builtin();
        let issues = GraphAnalyzer::new(&registry).connection_issues(&graph);

        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("'1'"));
        assert!(issues[0].contains("'999'"));
    }

    #[test]
    fn test_group_by_category() {
        let registry = NodeRegistry::builtin();
        let groups = GraphAnalyzer::new(&registry).group_by_category(&two_node());

        assert!(groups[&NodeCategory::Loader].contains("1"));
        assert!(groups[&NodeCategory::Sampler].contains("2"));
        assert!(!groups.contains_key(&NodeCategory::Output));
    }

    #[test]
    fn test_complexity_counts_custom_nodes_and_depth() {
        let registry = NodeRegistry::builtin();
        let analyzer = GraphAnalyzer::new(&registry);

        let plain = analyzer.complexity(&two_node());
        assert_eq!(plain.max_depth, 2);
        assert_eq!(plain.custom_node_count, 0);

        let extended = two_node().with_node("3", Node::new("ImpactFaceDetailer").with_link("model", "2", 0));
        let richer = analyzer.complexity(&extended);
        assert_eq!(richer.max_depth, 3);
        assert_eq!(richer.custom_node_count, 1);
        assert!(richer.score > plain.score);
    }

    #[test]
    fn test_analyze_reports_cycle_without_failing() {
        let graph = Graph::new()
            .with_node("1", Node::new("A").with_link("x", "2", 0))
            .with_node("2", Node::new("B").with_link("x", "1", 0));

        let registry = NodeRegistry::builtin();
        let analysis = GraphAnalyzer::new(&registry).analyze(&graph);

        assert!(analysis.execution_order.is_none());
        assert!(analysis.cycle.unwrap().contains("'1'"));
        assert_eq!(analysis.complexity.max_depth, 0);
        assert_eq!(analysis.custom_nodes.len(), 2);
    }

    #[test]
    fn test_analysis_serializes() {
        let registry = NodeRegistry::builtin();
        let analysis = GraphAnalyzer::new(&registry).analyze(&two_node());
        let value = serde_json::to_value(&analysis).unwrap();

        assert_eq!(value["execution_order"], json!(["1", "2"]));
        assert_eq!(value["complexity_level"], json!("simple"));
        assert_eq!(value["categories"]["loader"], json!(["1"]));
    }
}
