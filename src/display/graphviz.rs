//! DOT export of a dependency closure.

use crate::analysis::topology;
use crate::store::Node;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Builds a `petgraph` view of the closure of `targets`. Edges point from a
/// dependency to the node consuming it; a dependency listed twice by the same
/// node yields two edges.
pub fn to_graph(targets: &[Node]) -> DiGraph<String, ()> {
    let mut graph = DiGraph::new();
    let mut index: HashMap<Node, NodeIndex> = HashMap::new();

    // Closure order inserts every dependency before its consumer.
    for node in topology::closure(targets) {
        let idx = graph.add_node(node.name().to_string());
        for dep in node.dependencies() {
            if let Some(&dep_idx) = index.get(dep) {
                graph.add_edge(dep_idx, idx, ());
            }
        }
        index.insert(node, idx);
    }
    graph
}

pub fn to_dot(targets: &[Node]) -> String {
    let graph = to_graph(targets);
    format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}
