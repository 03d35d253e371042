//! Maps custom operation tags to the transforms that evaluate them.

use super::error::{RegistryError, TransformError};
use crate::store::{Operation, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A pure function from dependency values (in declared order) to a node value.
pub trait Transform: Send + Sync {
    fn evaluate(&self, inputs: &[Value]) -> Result<Value, TransformError>;
}

impl<F> Transform for F
where
    F: Fn(&[Value]) -> Result<Value, TransformError> + Send + Sync,
{
    fn evaluate(&self, inputs: &[Value]) -> Result<Value, TransformError> {
        self(inputs)
    }
}

const BUILTIN_TAGS: [&str; 3] = ["table", "delta", "prop_delta"];

/// Resolves `Operation::Custom` tags at solve time.
///
/// Built once at setup and shared read-only across solve calls.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn register(
        &mut self,
        tag: impl Into<String>,
        transform: impl Transform + 'static,
    ) -> Result<&mut Self, RegistryError> {
        let tag = tag.into();
        if BUILTIN_TAGS.contains(&tag.as_str()) {
            return Err(RegistryError::ReservedTag(tag));
        }
        if self.transforms.contains_key(&tag) {
            return Err(RegistryError::DuplicateTag(tag));
        }
        self.transforms.insert(tag, Arc::new(transform));
        Ok(self)
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<dyn Transform>> { self.transforms.get(tag) }

    pub fn contains(&self, tag: &str) -> bool { self.transforms.contains_key(tag) }

    /// Whether `op` can be evaluated: built-ins always, custom tags if registered.
    pub fn supports(&self, op: &Operation) -> bool {
        match op {
            Operation::Custom { tag } => self.contains(tag),
            _ => true,
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> { self.transforms.keys().map(String::as_str) }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("TransformRegistry").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(inputs: &[Value]) -> Result<Value, TransformError> {
        inputs.first().cloned().ok_or(TransformError::ArityMismatch { expected: 1, actual: 0 })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TransformRegistry::new();
        registry.register("identity", identity).unwrap();

        assert!(registry.supports(&Operation::custom("identity")));
        assert!(registry.supports(&Operation::Table));
        assert!(!registry.supports(&Operation::custom("missing")));

        let out = registry.get("identity").unwrap().evaluate(&[Value::Number(2.0)]).unwrap();
        assert_eq!(out, Value::Number(2.0));
    }

    #[test]
    fn test_duplicate_and_reserved_tags_are_rejected() {
        let mut registry = TransformRegistry::new();
        registry.register("identity", identity).unwrap();
        assert_eq!(
            registry.register("identity", identity).unwrap_err(),
            RegistryError::DuplicateTag("identity".into())
        );
        assert_eq!(
            registry.register("delta", identity).unwrap_err(),
            RegistryError::ReservedTag("delta".into())
        );
    }
}
