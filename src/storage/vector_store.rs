// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Vector Store - record upsert, nearest-neighbor search, deletion and scans
//!
//! Records are stored as nodes carrying the index label:
//! - `id` - the caller assigned record id
//! - `tags` - JSON encoded [`TagCollection`]
//! - `payload` - JSON encoded payload map
//! - `<index>Embedding` - the vector
//!
//! Tag filters are applied after the engine returns its candidates. A
//! filtered search can therefore yield fewer than `limit` records even when
//! more matching records exist; `search.overfetch_factor` widens the
//! candidate window when filters are present. `get_all` is not approximate:
//! it filters the whole index before applying `limit`.
//!
//! Upsert and search look the index up first to check dimensions, which is
//! one extra engine round trip per call (a name-filtered index lookup on
//! Neo4j).

use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::backends::{GraphBackend, GraphNode, IndexLayout};
use super::filter::tags_match_filters;
use super::index_manager::IndexManager;
use crate::core::{
    BackendError, MemoryDbError, MemoryFilter, MemoryRecord, MemoryResult, RecordStream,
    SearchConfig, SimilarityStream, TagCollection, Vector,
};

pub const ID_PROPERTY: &str = "id";
pub const TAGS_PROPERTY: &str = "tags";
pub const PAYLOAD_PROPERTY: &str = "payload";

/// Parameters of a nearest-neighbor search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Embedding produced by the caller's embedding generator
    pub query: Vector,
    /// OR-ed filter expressions, empty = no filtering
    pub filters: Vec<MemoryFilter>,
    /// Results scoring below this are dropped
    pub min_relevance: f64,
    /// Maximum number of results, non-positive = unbounded
    pub limit: i64,
    /// Return stored vectors with the records
    pub with_vectors: bool,
}

impl SearchRequest {
    pub fn new(query: Vector) -> Self {
        Self {
            query,
            filters: Vec::new(),
            min_relevance: 0.0,
            limit: 1,
            with_vectors: false,
        }
    }

    pub fn with_filter(mut self, filter: MemoryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn min_relevance(mut self, min_relevance: f64) -> Self {
        self.min_relevance = min_relevance;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_vectors(mut self, with_vectors: bool) -> Self {
        self.with_vectors = with_vectors;
        self
    }
}

/// Parameters of a full listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub filters: Vec<MemoryFilter>,
    /// Maximum number of records, non-positive = unbounded
    pub limit: i64,
    pub with_vectors: bool,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            limit: 0,
            with_vectors: false,
        }
    }
}

impl ListRequest {
    pub fn with_filter(mut self, filter: MemoryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_vectors(mut self, with_vectors: bool) -> Self {
        self.with_vectors = with_vectors;
        self
    }
}

/// Encode a record as the node written to the engine.
pub fn record_to_node(record: &MemoryRecord) -> MemoryResult<GraphNode> {
    let mut properties = Map::new();
    properties.insert(ID_PROPERTY.to_string(), Value::String(record.id.clone()));
    properties.insert(
        TAGS_PROPERTY.to_string(),
        Value::String(serde_json::to_string(&record.tags)?),
    );
    properties.insert(
        PAYLOAD_PROPERTY.to_string(),
        Value::String(serde_json::to_string(&record.payload)?),
    );

    Ok(GraphNode {
        id: record.id.clone(),
        properties,
        vector: Some(record.vector.clone()),
    })
}

/// Decode a node read back from the engine.
pub fn node_to_record(node: GraphNode) -> MemoryResult<MemoryRecord> {
    let GraphNode {
        id,
        mut properties,
        vector,
    } = node;

    let tags: TagCollection = decode_property(properties.remove(TAGS_PROPERTY))?;
    let payload = decode_property(properties.remove(PAYLOAD_PROPERTY))?;

    Ok(MemoryRecord {
        id,
        vector: vector.unwrap_or_default(),
        tags,
        payload,
    })
}

fn decode_property<T>(value: Option<Value>) -> MemoryResult<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(Value::String(encoded)) => Ok(serde_json::from_str(&encoded)?),
        Some(other) => Ok(serde_json::from_value(other)?),
    }
}

/// Map a caller limit onto a backend count: non-positive means unbounded.
pub fn effective_limit(limit: i64, max: usize) -> usize {
    if limit <= 0 {
        max
    } else {
        usize::try_from(limit).unwrap_or(max).min(max)
    }
}

#[derive(Clone)]
pub struct VectorStore {
    backend: Arc<dyn GraphBackend>,
    indexes: IndexManager,
    config: SearchConfig,
}

impl VectorStore {
    pub fn new(backend: Arc<dyn GraphBackend>, indexes: IndexManager, config: SearchConfig) -> Self {
        Self {
            backend,
            indexes,
            config,
        }
    }

    /// Insert or fully replace `record`, returns its id.
    pub async fn upsert(&self, index: &str, record: &MemoryRecord) -> MemoryResult<String> {
        let layout = self.indexes.layout_for(index)?;
        if record.id.is_empty() {
            return Err(MemoryDbError::InvalidArgument(
                "Record id cannot be empty".to_string(),
            ));
        }

        let spec = self.indexes.require(&layout).await?;
        if record.vector.len() != spec.dimensions {
            return Err(MemoryDbError::DimensionMismatch {
                index: layout.name,
                expected: spec.dimensions,
                actual: record.vector.len(),
            });
        }

        let node = record_to_node(record)?;
        let id = self
            .backend
            .merge_node(&layout, node)
            .await
            .map_err(|e| self.backend_error(e, "upsert", &layout.name))?;

        debug!("Upserted record {} into {}", id, layout.name);
        Ok(id)
    }

    /// Nearest neighbors of `request.query`, best first, tag filters applied
    /// to the returned candidates.
    pub async fn search(&self, index: &str, request: SearchRequest) -> MemoryResult<SimilarityStream> {
        let layout = self.indexes.layout_for(index)?;
        let spec = self.indexes.require(&layout).await?;
        if request.query.len() != spec.dimensions {
            return Err(MemoryDbError::DimensionMismatch {
                index: layout.name,
                expected: spec.dimensions,
                actual: request.query.len(),
            });
        }

        let SearchRequest {
            query,
            filters,
            min_relevance,
            limit,
            with_vectors,
        } = request;

        let max = self.max_top_k();
        let limit = effective_limit(limit, max);
        let top_k = self.candidate_count(limit, &filters, max);

        let hits = self
            .backend
            .query_nodes(&layout, &query, top_k, with_vectors)
            .await
            .map_err(|e| self.backend_error(e, "search", &layout.name))?;

        debug!(
            "Search on {} returned {} candidates (top_k {}, {} filters)",
            layout.name,
            hits.len(),
            top_k,
            filters.len()
        );

        let results = hits
            .into_iter()
            .filter(move |hit| hit.score >= min_relevance)
            .map(|hit| {
                let score = hit.score;
                node_to_record(hit.node).map(|record| (record, score))
            })
            .filter(move |item| match item {
                Ok((record, _)) => tags_match_filters(&record.tags, &filters),
                Err(_) => true,
            })
            .take(limit);

        Ok(stream::iter(results).boxed())
    }

    /// Remove the record with `record.id`. Missing records are not an error.
    pub async fn delete(&self, index: &str, record: &MemoryRecord) -> MemoryResult<()> {
        let layout = self.indexes.layout_for(index)?;

        self.backend
            .delete_node(&layout, &record.id)
            .await
            .map_err(|e| self.backend_error(e, "delete", &layout.name))?;

        debug!("Deleted record {} from {}", record.id, layout.name);
        Ok(())
    }

    /// List records without a query vector. Only available on engines that
    /// support non-vector scans.
    pub async fn get_all(&self, index: &str, request: ListRequest) -> MemoryResult<RecordStream> {
        let layout = self.indexes.layout_for(index)?;
        if !self.backend.capabilities().supports_scan {
            return Err(MemoryDbError::Unsupported {
                backend: self.backend.backend_name(),
                operation: "get_all",
            });
        }
        self.indexes.require(&layout).await?;

        let ListRequest {
            filters,
            limit,
            with_vectors,
        } = request;

        // A scan is exhaustive: with filters every node is read and the
        // limit applies to the matches.
        let max = self.max_top_k();
        let limit = effective_limit(limit, max);
        let count = if filters.is_empty() { limit } else { max };

        let nodes = self
            .backend
            .scan_nodes(&layout, count, with_vectors)
            .await
            .map_err(|e| self.backend_error(e, "get_all", &layout.name))?;

        let records = nodes
            .into_iter()
            .map(node_to_record)
            .filter(move |item| match item {
                Ok(record) => tags_match_filters(&record.tags, &filters),
                Err(_) => true,
            })
            .take(limit);

        Ok(stream::iter(records).boxed())
    }

    pub fn layout_for(&self, index: &str) -> MemoryResult<IndexLayout> {
        self.indexes.layout_for(index)
    }

    fn max_top_k(&self) -> usize {
        self.backend.capabilities().max_top_k.min(self.config.max_top_k)
    }

    fn candidate_count(&self, limit: usize, filters: &[MemoryFilter], max: usize) -> usize {
        if filters.is_empty() {
            limit
        } else {
            limit
                .saturating_mul(self.config.overfetch_factor as usize)
                .min(max)
        }
    }

    fn backend_error(&self, error: BackendError, operation: &'static str, index: &str) -> MemoryDbError {
        MemoryDbError::from_backend(error, self.backend.backend_name(), operation, index)
    }
}
