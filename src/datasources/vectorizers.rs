//! Turns item sequences into sequences of fixed-width vectors.
//!
//! The embedding lookup itself is an external collaborator behind
//! [`KeyedVectors`]; loading pretrained binaries is left to the host
//! application. A [`Word2Vec`] transform is registered under a tag and
//! wired into graphs with [`word2vec`].

use crate::compute::kernel::{expect, expect_arity};
use crate::compute::{Transform, TransformError};
use crate::store::{Node, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Conventional width of pretrained word vectors.
pub const VECTOR_DIMENSIONS: usize = 300;

/// A word -> fixed-length vector lookup.
pub trait KeyedVectors: Send + Sync {
    fn dimensions(&self) -> usize;
    fn vector(&self, word: &str) -> Option<&[f64]>;
}

/// A `HashMap`-backed lookup, mostly useful for small vocabularies and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectors {
    dimensions: usize,
    vectors: HashMap<String, Vec<f64>>,
}

impl InMemoryVectors {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, vectors: HashMap::new() }
    }

    /// Adds a word. Fails if `vector` does not have the configured width.
    pub fn insert(&mut self, word: impl Into<String>, vector: Vec<f64>) -> Result<(), TransformError> {
        if vector.len() != self.dimensions {
            return Err(TransformError::Failed(format!(
                "vector has {} dimensions, expected {}",
                vector.len(),
                self.dimensions
            )));
        }
        self.vectors.insert(word.into(), vector);
        Ok(())
    }

    pub fn len(&self) -> usize { self.vectors.len() }
    pub fn is_empty(&self) -> bool { self.vectors.is_empty() }
}

impl KeyedVectors for InMemoryVectors {
    fn dimensions(&self) -> usize { self.dimensions }

    fn vector(&self, word: &str) -> Option<&[f64]> {
        self.vectors.get(word).map(Vec::as_slice)
    }
}

/// One vector per word. Out-of-vocabulary words map to a zero vector, and an
/// empty word list yields a single zero vector rather than nothing.
pub fn vectorize_words<K: KeyedVectors + ?Sized>(vectors: &K, words: &[String]) -> Vec<Vec<f64>> {
    let zero = || vec![0.0; vectors.dimensions()];
    if words.is_empty() {
        return vec![zero()];
    }
    words
        .iter()
        .map(|w| vectors.vector(w).map(<[f64]>::to_vec).unwrap_or_else(|| zero()))
        .collect()
}

/// Transform that vectorizes an items value with a shared lookup.
#[derive(Clone)]
pub struct Word2Vec {
    vectors: Arc<dyn KeyedVectors>,
}

impl Word2Vec {
    pub fn new(vectors: Arc<dyn KeyedVectors>) -> Self { Self { vectors } }
}

impl Transform for Word2Vec {
    fn evaluate(&self, inputs: &[Value]) -> Result<Value, TransformError> {
        expect_arity(inputs, 1)?;
        let words = expect(inputs, 0, "items", Value::as_items)?;
        Ok(Value::Vectors(Arc::new(vectorize_words(self.vectors.as_ref(), words))))
    }
}

/// Derived node vectorizing the words produced by `words`. `tag` must be the
/// tag a [`Word2Vec`] transform was registered under.
pub fn word2vec(words: &Node, tag: &str, name: Option<&str>) -> Node {
    Node::custom(tag, [words.clone()], name)
}
