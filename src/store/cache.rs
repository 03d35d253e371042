//! cache.rs
//! Node -> Value memo. Seeds a solve request and can be retained by the
//! caller as a memo across requests.

use super::node::Node;
use super::types::Value;
use crate::analysis::topology;
use crate::serialization::NodeTable;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Persisted form: one node table for all keys, so dependencies shared
/// between cached nodes are written once.
#[derive(Serialize)]
struct CacheReprRef<'a> {
    nodes: NodeTable,
    entries: Vec<(usize, &'a Value)>,
}

#[derive(Deserialize)]
struct CacheRepr {
    nodes: NodeTable,
    entries: Vec<(usize, Value)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cache {
    values: HashMap<Node, Value>,
}

impl Cache {
    pub fn new() -> Self { Self::default() }

    /// Builder-style insert, convenient for seeding leaves.
    pub fn with(mut self, node: &Node, value: impl Into<Value>) -> Self {
        self.insert(node.clone(), value.into());
        self
    }

    #[inline]
    pub fn get(&self, node: &Node) -> Option<&Value> { self.values.get(node) }

    #[inline]
    pub fn contains(&self, node: &Node) -> bool { self.values.contains_key(node) }

    pub fn insert(&mut self, node: Node, value: Value) -> Option<Value> {
        self.values.insert(node, value)
    }

    pub fn remove(&mut self, node: &Node) -> Option<Value> { self.values.remove(node) }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
    pub fn nodes(&self) -> impl Iterator<Item = &Node> { self.values.keys() }
    pub fn iter(&self) -> impl Iterator<Item = (&Node, &Value)> { self.values.iter() }

    /// Drops the given nodes' values.
    pub fn invalidate<'a>(&mut self, nodes: impl IntoIterator<Item = &'a Node>) {
        for node in nodes {
            self.values.remove(node);
        }
    }

    /// Drops every cached value within the closure of `targets` that depends
    /// (transitively) on one of the `changed` nodes. The changed nodes
    /// themselves are kept, since they normally carry the new seed values.
    pub fn invalidate_downstream(&mut self, targets: &[Node], changed: &[Node]) -> usize {
        let dirty = topology::downstream_from(targets, changed);
        let before = self.values.len();
        for node in dirty.iter().filter(|n| !changed.contains(*n)) {
            self.values.remove(node);
        }
        let dropped = before - self.values.len();
        tracing::debug!(dropped, "Invalidated downstream cache entries");
        dropped
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CacheError> {
        let json = serde_json::to_vec(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Serialize for Cache {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (keys, values): (Vec<Node>, Vec<&Value>) =
            self.values.iter().map(|(k, v)| (k.clone(), v)).unzip();
        let (nodes, indices) = NodeTable::encode(&keys);
        let entries = indices.into_iter().zip(values).collect();
        CacheReprRef { nodes, entries }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cache {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = CacheRepr::deserialize(deserializer)?;
        let nodes = repr.nodes.decode().map_err(serde::de::Error::custom)?;
        let mut values = HashMap::with_capacity(repr.entries.len());
        for (index, value) in repr.entries {
            let node = nodes.get(index).ok_or_else(|| {
                serde::de::Error::custom(format!("cache entry refers to missing node {index}"))
            })?;
            values.insert(node.clone(), value);
        }
        Ok(Self { values })
    }
}

impl Extend<(Node, Value)> for Cache {
    fn extend<T: IntoIterator<Item = (Node, Value)>>(&mut self, iter: T) {
        self.values.extend(iter);
    }
}

impl FromIterator<(Node, Value)> for Cache {
    fn from_iter<T: IntoIterator<Item = (Node, Value)>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

impl From<HashMap<Node, Value>> for Cache {
    fn from(values: HashMap<Node, Value>) -> Self { Self { values } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Operation;

    fn chain() -> (Node, Node, Node) {
        let tokens = Node::leaf("tokens");
        let ft = Node::derived(Operation::Table, [tokens.clone()], None);
        let other = Node::leaf("other");
        (tokens, ft, other)
    }

    #[test]
    fn test_invalidate_downstream_keeps_changed_and_unrelated() {
        let (tokens, ft, other) = chain();
        let mut cache = Cache::new()
            .with(&tokens, Value::items(["a"]))
            .with(&ft, Value::Number(1.0))
            .with(&other, Value::Number(2.0));

        let dropped = cache.invalidate_downstream(&[ft.clone(), other.clone()], &[tokens.clone()]);

        assert_eq!(dropped, 1);
        assert!(cache.contains(&tokens));
        assert!(!cache.contains(&ft));
        assert!(cache.contains(&other));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (tokens, ft, _) = chain();
        let cache = Cache::new()
            .with(&tokens, Value::items(["a", "b"]))
            .with(&ft, Value::Number(3.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        cache.save(&path).unwrap();

        let loaded = Cache::load(&path).unwrap();
        assert_eq!(loaded, cache);
        // A freshly built node finds the persisted value.
        let rebuilt = Node::derived(Operation::Table, [Node::leaf("tokens")], None);
        assert_eq!(loaded.get(&rebuilt), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Cache::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CacheError::Io(_)));
    }

    #[test]
    fn test_save_and_load_shared_graph() {
        let mut node = Node::leaf("x");
        let mut cache = Cache::new().with(&node, 1.0);
        for i in 0..24 {
            node = Node::custom("pair", [node.clone(), node], Some(&format!("l{i}")));
            cache.insert(node.clone(), Value::Number(2f64.powi(i + 1)));
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        cache.save(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() < 8_000);

        let loaded = Cache::load(&path).unwrap();
        assert_eq!(loaded, cache);
        assert_eq!(loaded.get(&node), Some(&Value::Number(2f64.powi(24))));
    }

    #[test]
    fn test_load_rejects_dangling_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, r#"{"nodes":[{"name":"x"}],"entries":[[4,{"Number":1.0}]]}"#).unwrap();
        assert!(matches!(Cache::load(&path), Err(CacheError::Encoding(_))));
    }
}
