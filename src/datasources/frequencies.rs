//! Frequency-table datasources over sequences of items.
//!
//! ```
//! use datasource_core::datasources::frequencies;
//! use datasource_core::{Cache, Node, Solver, TransformRegistry, Value};
//!
//! let old_tokens = Node::leaf("old_tokens");
//! let new_tokens = Node::leaf("new_tokens");
//! let old_ft = frequencies::table(&old_tokens, Some("old_ft"));
//! let new_ft = frequencies::table(&new_tokens, Some("new_ft"));
//! let delta = frequencies::delta(&old_ft, &new_ft, Some("delta"));
//!
//! let seed = Cache::new()
//!     .with(&old_tokens, Value::items(["a", "a", "b"]))
//!     .with(&new_tokens, Value::items(["a", "c"]));
//! let registry = TransformRegistry::new();
//! let out = Solver::new(&registry).solve_one(&delta, &seed).unwrap();
//! assert_eq!(out.as_deltas().unwrap().get_or("a", 0), -1);
//! ```

use crate::store::{Node, Operation};

/// Maps each distinct item produced by `items` to its number of occurrences.
pub fn table(items: &Node, name: Option<&str>) -> Node {
    Node::derived(Operation::Table, [items.clone()], name)
}

/// `new_count - old_count` for every item in either table.
pub fn delta(old_table: &Node, new_table: &Node, name: Option<&str>) -> Node {
    Node::derived(Operation::Delta, [old_table.clone(), new_table.clone()], name)
}

/// Proportional change per item of `delta`: the raw delta for items absent
/// from `old_table`, otherwise `delta / old_count` clamped to `[-1, 1]`.
pub fn prop_delta(old_table: &Node, delta: &Node, name: Option<&str>) -> Node {
    Node::derived(Operation::ProportionalDelta, [old_table.clone(), delta.clone()], name)
}
