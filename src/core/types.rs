use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::error::MemoryResult;

pub type RecordId = String;
pub type Vector = Vec<f32>;

/// Similarity score as reported by the backend, higher = more similar.
pub type Score = f64;

/// A record and its similarity to the query vector.
pub type SearchResult = (MemoryRecord, Score);

/// Single-pass, finite stream of search hits in descending score order.
pub type SimilarityStream = BoxStream<'static, MemoryResult<SearchResult>>;

/// Single-pass, finite stream of records from a full scan.
pub type RecordStream = BoxStream<'static, MemoryResult<MemoryRecord>>;

/// Tags attached to a record: each key holds one or more values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TagCollection(BTreeMap<String, Vec<String>>);

impl TagCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value under `key`. Duplicate values are kept once.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let values = self.0.entry(key.into()).or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(key, value);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

/// One filter expression: every key must match (AND). A collection of
/// filters is satisfied when any of them matches (OR).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MemoryFilter(BTreeMap<String, BTreeSet<String>>);

impl MemoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `value` for `key`, in addition to any value already accepted.
    pub fn by_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.entry(key.into()).or_default().insert(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }
}

/// A document chunk as handed to the store: identifier, tags, free-form
/// payload and its embedding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    pub id: RecordId,
    #[serde(default)]
    pub vector: Vector,
    #[serde(default)]
    pub tags: TagCollection,
    #[serde(default)]
    pub payload: HashMap<String, serde_json::Value>,
}

impl MemoryRecord {
    pub fn new(id: impl Into<RecordId>, vector: Vector) -> Self {
        Self {
            id: id.into(),
            vector,
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.add(key, value);
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}
