//! Defines the core data structures: nodes, values and the evaluation cache.
pub mod cache;
pub mod node;
pub mod types;

// Re-export key types for convenient access
pub use cache::{Cache, CacheError};
pub use node::{Dependencies, Node, NodeKind, Operation};
pub use types::{DeltaTable, FrequencyTable, ProportionalDeltaTable, Value};
