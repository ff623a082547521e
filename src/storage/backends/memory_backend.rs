// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! In-Memory Graph Backend
//!
//! In-process engine with the same observable behavior as a graph engine's
//! vector index: labelled nodes, a vector property per index, brute force
//! cosine ranking. Nothing is persisted.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    BackendCapabilities, GraphBackend, GraphNode, IndexLayout, ScoredNode, VectorIndexSpec,
};
use crate::compute::cosine_score;
use crate::core::{BackendError, BackendResult};

/// In-memory graph backend
#[derive(Clone, Default)]
pub struct MemoryGraphBackend {
    state: Arc<RwLock<GraphState>>,
}

#[derive(Debug, Default)]
struct GraphState {
    /// Vector indexes in creation order
    indexes: Vec<VectorIndexSpec>,

    /// Nodes by label, then by id
    labels: HashMap<String, HashMap<String, GraphNode>>,
}

impl GraphState {
    fn index(&self, name: &str) -> Option<&VectorIndexSpec> {
        self.indexes.iter().find(|spec| spec.name() == name)
    }
}

impl MemoryGraphBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes carrying the index label.
    pub async fn node_count(&self, layout: &IndexLayout) -> usize {
        let state = self.state.read().await;
        state.labels.get(&layout.label).map_or(0, HashMap::len)
    }

    fn project(node: &GraphNode, with_vectors: bool) -> GraphNode {
        GraphNode {
            id: node.id.clone(),
            properties: node.properties.clone(),
            vector: if with_vectors { node.vector.clone() } else { None },
        }
    }
}

#[async_trait]
impl GraphBackend for MemoryGraphBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            supports_scan: true,
            max_top_k: usize::MAX,
        }
    }

    async fn health_check(&self) -> BackendResult<bool> {
        Ok(true)
    }

    async fn create_vector_index(&self, spec: &VectorIndexSpec) -> BackendResult<()> {
        let mut state = self.state.write().await;

        if state.index(spec.name()).is_some() {
            tracing::debug!("Vector index {} already exists", spec.name());
            return Ok(());
        }

        state.indexes.push(spec.clone());
        tracing::debug!(
            "Created vector index {} on :{}({}) with {} dimensions",
            spec.name(),
            spec.layout.label,
            spec.layout.property_key,
            spec.dimensions
        );
        Ok(())
    }

    async fn list_vector_indexes(&self) -> BackendResult<Vec<VectorIndexSpec>> {
        let state = self.state.read().await;
        Ok(state.indexes.clone())
    }

    async fn drop_vector_index(&self, layout: &IndexLayout) -> BackendResult<()> {
        let mut state = self.state.write().await;

        state.indexes.retain(|spec| spec.name() != layout.name);
        let removed = state.labels.remove(&layout.label).map_or(0, |nodes| nodes.len());

        tracing::debug!("Dropped vector index {} and {} nodes", layout.name, removed);
        Ok(())
    }

    async fn merge_node(&self, layout: &IndexLayout, node: GraphNode) -> BackendResult<String> {
        let id = node.id.clone();
        let mut state = self.state.write().await;

        state
            .labels
            .entry(layout.label.clone())
            .or_default()
            .insert(id.clone(), node);

        Ok(id)
    }

    async fn query_nodes(
        &self,
        layout: &IndexLayout,
        query: &[f32],
        top_k: usize,
        with_vectors: bool,
    ) -> BackendResult<Vec<ScoredNode>> {
        let state = self.state.read().await;

        let spec = state
            .index(&layout.name)
            .ok_or_else(|| BackendError::IndexNotFound(layout.name.clone()))?;

        if query.len() != spec.dimensions {
            return Err(BackendError::Query(format!(
                "Index query vector has {} dimensions, but indexed vectors have {}",
                query.len(),
                spec.dimensions
            )));
        }

        let Some(nodes) = state.labels.get(&layout.label) else {
            return Ok(Vec::new());
        };

        // Only nodes whose vector fits the index are indexed
        let mut scored: Vec<(f64, &GraphNode)> = nodes
            .values()
            .filter_map(|node| match &node.vector {
                Some(vector) if vector.len() == spec.dimensions => {
                    Some((cosine_score(query, vector), node))
                }
                _ => None,
            })
            .collect();

        scored.sort_by(|(a_score, a), (b_score, b)| {
            b_score
                .partial_cmp(a_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, node)| ScoredNode {
                node: Self::project(node, with_vectors),
                score,
            })
            .collect())
    }

    async fn delete_node(&self, layout: &IndexLayout, id: &str) -> BackendResult<()> {
        let mut state = self.state.write().await;

        let removed = state
            .labels
            .get_mut(&layout.label)
            .and_then(|nodes| nodes.remove(id))
            .is_some();

        tracing::debug!("Delete node {} from :{} (existed: {})", id, layout.label, removed);
        Ok(())
    }

    async fn scan_nodes(
        &self,
        layout: &IndexLayout,
        limit: usize,
        with_vectors: bool,
    ) -> BackendResult<Vec<GraphNode>> {
        let state = self.state.read().await;

        let Some(nodes) = state.labels.get(&layout.label) else {
            return Ok(Vec::new());
        };

        let mut listed: Vec<&GraphNode> = nodes.values().collect();
        listed.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(listed
            .into_iter()
            .take(limit)
            .map(|node| Self::project(node, with_vectors))
            .collect())
    }
}
