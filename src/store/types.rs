use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Occurrence counts of distinct items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    counts: BTreeMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self { Self::default() }

    pub fn from_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = BTreeMap::new();
        for item in items {
            *counts.entry(item.as_ref().to_string()).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Count for `item`, or `default` when the item never occurred.
    #[inline]
    pub fn get_or(&self, item: &str, default: u64) -> u64 {
        self.counts.get(item).copied().unwrap_or(default)
    }

    pub fn contains(&self, item: &str) -> bool { self.counts.contains_key(item) }
    pub fn len(&self) -> usize { self.counts.len() }
    pub fn is_empty(&self) -> bool { self.counts.is_empty() }
    pub fn total(&self) -> u64 { self.counts.values().sum() }
    pub fn keys(&self) -> impl Iterator<Item = &str> { self.counts.keys().map(String::as_str) }
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for FrequencyTable {
    fn from_iter<T: IntoIterator<Item = (S, u64)>>(iter: T) -> Self {
        Self { counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

/// Signed change in count per item between two frequency tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaTable {
    deltas: BTreeMap<String, i64>,
}

impl DeltaTable {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, item: impl Into<String>, delta: i64) {
        self.deltas.insert(item.into(), delta);
    }

    #[inline]
    pub fn get_or(&self, item: &str, default: i64) -> i64 {
        self.deltas.get(item).copied().unwrap_or(default)
    }

    pub fn contains(&self, item: &str) -> bool { self.deltas.contains_key(item) }
    pub fn len(&self) -> usize { self.deltas.len() }
    pub fn is_empty(&self) -> bool { self.deltas.is_empty() }
    pub fn keys(&self) -> impl Iterator<Item = &str> { self.deltas.keys().map(String::as_str) }
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.deltas.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for DeltaTable {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        Self { deltas: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

/// Change in count per item relative to its original count.
///
/// Items with an original count are bounded to `[-1, 1]`; new items carry
/// their raw delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProportionalDeltaTable {
    ratios: BTreeMap<String, f64>,
}

impl ProportionalDeltaTable {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, item: impl Into<String>, ratio: f64) {
        self.ratios.insert(item.into(), ratio);
    }

    #[inline]
    pub fn get_or(&self, item: &str, default: f64) -> f64 {
        self.ratios.get(item).copied().unwrap_or(default)
    }

    pub fn contains(&self, item: &str) -> bool { self.ratios.contains_key(item) }
    pub fn len(&self) -> usize { self.ratios.len() }
    pub fn is_empty(&self) -> bool { self.ratios.is_empty() }
    pub fn keys(&self) -> impl Iterator<Item = &str> { self.ratios.keys().map(String::as_str) }
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ratios.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// The unit of data flowing along graph edges.
///
/// The engine treats values as opaque; only transforms inspect them. Bulk
/// payloads sit behind `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Items(Arc<Vec<String>>),
    Frequencies(Arc<FrequencyTable>),
    Deltas(Arc<DeltaTable>),
    Ratios(Arc<ProportionalDeltaTable>),
    Vectors(Arc<Vec<Vec<f64>>>),
}

impl Value {
    pub fn items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Items(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Short name of the variant, used in type-mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Items(_) => "items",
            Value::Frequencies(_) => "frequencies",
            Value::Deltas(_) => "deltas",
            Value::Ratios(_) => "ratios",
            Value::Vectors(_) => "vectors",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self { Value::Number(n) => Some(*n), _ => None }
    }

    pub fn as_items(&self) -> Option<&[String]> {
        match self { Value::Items(v) => Some(v.as_slice()), _ => None }
    }

    pub fn as_frequencies(&self) -> Option<&FrequencyTable> {
        match self { Value::Frequencies(t) => Some(t), _ => None }
    }

    pub fn as_deltas(&self) -> Option<&DeltaTable> {
        match self { Value::Deltas(t) => Some(t), _ => None }
    }

    pub fn as_ratios(&self) -> Option<&ProportionalDeltaTable> {
        match self { Value::Ratios(t) => Some(t), _ => None }
    }

    pub fn as_vectors(&self) -> Option<&[Vec<f64>]> {
        match self { Value::Vectors(v) => Some(v.as_slice()), _ => None }
    }
}

impl From<FrequencyTable> for Value {
    fn from(t: FrequencyTable) -> Self { Value::Frequencies(Arc::new(t)) }
}

impl From<DeltaTable> for Value {
    fn from(t: DeltaTable) -> Self { Value::Deltas(Arc::new(t)) }
}

impl From<ProportionalDeltaTable> for Value {
    fn from(t: ProportionalDeltaTable) -> Self { Value::Ratios(Arc::new(t)) }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Number(n) }
}
