//! Portable encoding of node graphs.
//!
//! A graph is written as a flat table of its dependency closure in
//! evaluation order. Each entry carries its name, its operation tag and the
//! table indices of its dependencies, which always point at earlier entries.
//! A node reached along several paths is therefore written once, and
//! decoding rebuilds the same sharing. Decoded nodes compare equal to the
//! originals, so decoded graphs can be used directly as cache keys.
//!
//! Two encodings are offered: JSON for inspection and interchange, and a
//! compact binary form (`bincode`) for storage.

use crate::analysis::topology;
use crate::store::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Node JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Node binary encoding failed: {0}")]
    Binary(#[from] bincode::Error),
}

pub fn to_json(node: &Node) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(node)?)
}

pub fn from_json(json: &str) -> Result<Node, SerializationError> {
    Ok(serde_json::from_str(json)?)
}

pub fn to_bytes(node: &Node) -> Result<Vec<u8>, SerializationError> {
    Ok(bincode::serialize(node)?)
}

pub fn from_bytes(bytes: &[u8]) -> Result<Node, SerializationError> {
    Ok(bincode::deserialize(bytes)?)
}

/// One row of a [`NodeTable`]. A leaf has no operation and no dependencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct NodeEntry {
    name: String,
    #[serde(default)]
    operation: Option<crate::store::Operation>,
    #[serde(default)]
    dependencies: Vec<usize>,
}

/// Flat, index-linked form of a set of node graphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct NodeTable(Vec<NodeEntry>);

impl NodeTable {
    /// Tabulates the closure of `roots`. Returns the table and, for each
    /// root, its index in the table.
    pub(crate) fn encode(roots: &[Node]) -> (NodeTable, Vec<usize>) {
        let order = topology::closure(roots);
        let mut index: HashMap<&Node, usize> = HashMap::with_capacity(order.len());
        let mut entries = Vec::with_capacity(order.len());
        for (i, node) in order.iter().enumerate() {
            entries.push(NodeEntry {
                name: node.name().to_string(),
                operation: node.operation().cloned(),
                // Post-order: every dependency already has an index.
                dependencies: node.dependencies().iter().map(|d| index[d]).collect(),
            });
            index.insert(node, i);
        }
        let roots = roots.iter().map(|r| index[r]).collect();
        (NodeTable(entries), roots)
    }

    /// Rebuilds every node in the table, in table order.
    pub(crate) fn decode(&self) -> Result<Vec<Node>, String> {
        let mut nodes: Vec<Node> = Vec::with_capacity(self.0.len());
        for (i, entry) in self.0.iter().enumerate() {
            if let Some(&bad) = entry.dependencies.iter().find(|&&d| d >= i) {
                return Err(format!(
                    "node '{}' (entry {i}) refers to entry {bad}, which is not an earlier entry",
                    entry.name
                ));
            }
            let node = match &entry.operation {
                None if entry.dependencies.is_empty() => Node::leaf(entry.name.as_str()),
                None => {
                    return Err(format!("leaf node '{}' cannot declare dependencies", entry.name));
                }
                Some(op) => Node::derived(
                    op.clone(),
                    entry.dependencies.iter().map(|&d| nodes[d].clone()),
                    Some(&entry.name),
                ),
            };
            nodes.push(node);
        }
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Operation;
    use proptest::prelude::*;

    fn chain(depth: usize) -> Node {
        let mut node = Node::leaf("tokens");
        for i in 0..depth {
            node = if i % 2 == 0 {
                Node::derived(Operation::Table, [node], None)
            } else {
                Node::custom("wrap", [node.clone(), Node::leaf(format!("aux{i}"))], None)
            };
        }
        node
    }

    fn ladder(levels: usize) -> Node {
        let mut node = Node::leaf("x");
        for i in 0..levels {
            node = Node::custom("pair", [node.clone(), node], Some(&format!("l{i}")));
        }
        node
    }

    #[test]
    fn test_leaf_encoding() {
        assert_eq!(
            to_json(&Node::leaf("tokens")).unwrap(),
            r#"{"nodes":[{"name":"tokens","operation":null,"dependencies":[]}],"root":0}"#
        );
    }

    #[test]
    fn test_encode_decode_encode_is_stable() {
        let node = chain(6);
        let first = to_bytes(&node).unwrap();
        let decoded = from_bytes(&first).unwrap();
        assert_eq!(decoded, node);
        assert_eq!(to_bytes(&decoded).unwrap(), first);

        let json = to_json(&node).unwrap();
        assert_eq!(to_json(&from_json(&json).unwrap()).unwrap(), json);
    }

    #[test]
    fn test_long_chain_round_trips() {
        let mut node = Node::leaf("tokens");
        for i in 0..300 {
            node = Node::derived(Operation::Table, [node], Some(&format!("n{i}")));
        }
        assert_eq!(from_json(&to_json(&node).unwrap()).unwrap(), node);
        assert_eq!(from_bytes(&to_bytes(&node).unwrap()).unwrap(), node);
    }

    #[test]
    fn test_shared_dependencies_are_written_once() {
        let node = ladder(24);
        let json = to_json(&node).unwrap();
        // 25 entries of under a hundred bytes each.
        assert!(json.len() < 4_000, "encoded {} bytes", json.len());

        let decoded = from_json(&json).unwrap();
        assert_eq!(decoded, node);
        let deps = decoded.dependencies();
        assert!(Node::ptr_eq(&deps[0], &deps[1]));
    }

    #[test]
    fn test_leaf_with_dependencies_is_rejected() {
        let json = r#"{"nodes":[{"name":"y"},{"name":"x","dependencies":[0]}],"root":1}"#;
        let err = from_json(json).unwrap_err();
        assert!(err.to_string().contains("cannot declare dependencies"));
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let json = r#"{"nodes":[{"name":"t","operation":"table","dependencies":[1]},{"name":"x"}],"root":0}"#;
        let err = from_json(json).unwrap_err();
        assert!(err.to_string().contains("not an earlier entry"));
    }

    #[test]
    fn test_root_outside_table_is_rejected() {
        let err = from_json(r#"{"nodes":[{"name":"x"}],"root":3}"#).unwrap_err();
        assert!(err.to_string().contains("outside the node table"));
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(from_json("{").is_err());
        assert!(matches!(from_bytes(&[1, 2, 3]), Err(SerializationError::Binary(_))));
    }

    proptest! {
        #[test]
        fn property_round_trip_preserves_equality(depth in 0usize..40) {
            let node = chain(depth);
            let decoded = from_json(&to_json(&node).unwrap()).unwrap();
            prop_assert_eq!(&decoded, &node);
            prop_assert_eq!(from_bytes(&to_bytes(&node).unwrap()).unwrap(), node);
        }
    }
}
