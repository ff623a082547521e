// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Graph / Vector Engine Backends
//!
//! The store talks to its engine through [`GraphBackend`]. Supported engines:
//! - Memory - in-process engine for tests, demos and embedded use
//! - Neo4j over HTTP - Cypher statements posted to the transactional endpoint
//!
//! Hosts pick the engine through [`BackendConfig`]; there is no runtime
//! plugin discovery.

pub mod cypher_backend;
pub mod http_executor;
pub mod memory_backend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::compute::DistanceMetric;
use crate::core::{BackendConfig, BackendError, BackendResult, BackendType, Vector};

pub use cypher_backend::{CypherBackend, CypherExecutor, CypherStatement, Row};
pub use http_executor::HttpCypherExecutor;
pub use memory_backend::MemoryGraphBackend;

/// Suffix appended to an index name to form its vector property key.
pub const VECTOR_PROPERTY_SUFFIX: &str = "Embedding";

/// Engine-side names derived from a normalized index name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexLayout {
    /// Normalized index name
    pub name: String,
    /// Node label records of this index carry
    pub label: String,
    /// Node property holding the embedding
    pub property_key: String,
}

impl IndexLayout {
    /// `name` must already be normalized.
    pub fn for_index(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_uppercase(),
            property_key: format!("{}{}", name.to_lowercase(), VECTOR_PROPERTY_SUFFIX),
        }
    }
}

/// A vector index as known to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndexSpec {
    pub layout: IndexLayout,
    pub dimensions: usize,
    pub similarity: DistanceMetric,
}

impl VectorIndexSpec {
    pub fn new(layout: IndexLayout, dimensions: usize) -> Self {
        Self {
            layout,
            dimensions,
            similarity: DistanceMetric::Cosine,
        }
    }

    pub fn name(&self) -> &str {
        &self.layout.name
    }
}

/// A stored node: identity, scalar properties and (optionally) its vector.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub vector: Option<Vector>,
}

/// A node returned by a nearest-neighbor query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredNode {
    pub node: GraphNode,
    pub score: f64,
}

/// Feature detection for optional operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Non-vector listing of an index's nodes
    pub supports_scan: bool,
    /// Largest top-k a nearest-neighbor query accepts
    pub max_top_k: usize,
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self {
            supports_scan: false,
            max_top_k: i32::MAX as usize,
        }
    }
}

/// Wire contract of a graph or vector engine.
///
/// Implementations hold only an immutable session handle; concurrent calls
/// are expected. Per-node writes must be atomic: a `merge_node` that does
/// not complete leaves the previous node untouched.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Backend name for identification
    fn backend_name(&self) -> &'static str;

    fn capabilities(&self) -> BackendCapabilities;

    /// Verify the engine is reachable and the credentials are accepted
    async fn health_check(&self) -> BackendResult<bool>;

    /// Create the index if it does not exist yet
    async fn create_vector_index(&self, spec: &VectorIndexSpec) -> BackendResult<()>;

    /// Vector indexes in engine order
    async fn list_vector_indexes(&self) -> BackendResult<Vec<VectorIndexSpec>>;

    /// The vector index named `layout.name`, if it exists
    async fn describe_vector_index(
        &self,
        layout: &IndexLayout,
    ) -> BackendResult<Option<VectorIndexSpec>> {
        Ok(self
            .list_vector_indexes()
            .await?
            .into_iter()
            .find(|spec| spec.layout.name == layout.name))
    }

    /// Drop the index and its nodes. Missing indexes are not an error.
    async fn drop_vector_index(&self, layout: &IndexLayout) -> BackendResult<()>;

    /// Create or fully replace the node with `node.id`, returns the stored id
    async fn merge_node(&self, layout: &IndexLayout, node: GraphNode) -> BackendResult<String>;

    /// Up to `top_k` nodes closest to `query`, best first
    async fn query_nodes(
        &self,
        layout: &IndexLayout,
        query: &[f32],
        top_k: usize,
        with_vectors: bool,
    ) -> BackendResult<Vec<ScoredNode>>;

    /// Remove a node. Missing nodes are not an error.
    async fn delete_node(&self, layout: &IndexLayout, id: &str) -> BackendResult<()>;

    /// List up to `limit` nodes without a query vector
    async fn scan_nodes(
        &self,
        _layout: &IndexLayout,
        _limit: usize,
        _with_vectors: bool,
    ) -> BackendResult<Vec<GraphNode>> {
        Err(BackendError::Unsupported("scan_nodes"))
    }
}

/// Backend factory for creating different backend implementations
pub struct BackendFactory;

impl BackendFactory {
    /// Create backend based on configuration
    pub fn create_backend(config: &BackendConfig) -> BackendResult<Arc<dyn GraphBackend>> {
        match config.backend_type {
            BackendType::Memory => Ok(Arc::new(MemoryGraphBackend::new())),
            BackendType::Neo4jHttp => {
                let executor = HttpCypherExecutor::new(&config.connection)?;
                Ok(Arc::new(CypherBackend::new(Arc::new(executor))))
            }
        }
    }

    /// Get available backend types
    pub fn available_backends() -> Vec<BackendType> {
        vec![BackendType::Memory, BackendType::Neo4jHttp]
    }
}
