// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Memory Service - public store contract
//!
//! [`MemoryDb`] is what ingestion and query pipelines program against.
//! [`GraphMemory`] implements it on top of a [`GraphBackend`]:
//! - index names are validated before any backend call
//! - every operation honours a [`CancellationToken`]
//! - search and listing results are returned as lazy streams
//!
//! Query vectors are produced by the caller's embedding generator; this
//! layer never computes embeddings.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::{
    MemoryDbError, MemoryRecord, MemoryResult, RecordStream, SearchConfig, SimilarityStream,
    StoreConfig,
};
use crate::storage::backends::{BackendFactory, GraphBackend};
use crate::storage::index_manager::IndexManager;
use crate::storage::index_name::IndexNameHelper;
use crate::storage::validation::ConfigValidator;
use crate::storage::vector_store::{ListRequest, SearchRequest, VectorStore};

/// Asynchronous vector memory contract. All operations accept a
/// cancellation token; a cancelled operation returns
/// [`MemoryDbError::Cancelled`] and has no side effects.
#[async_trait]
pub trait MemoryDb: Send + Sync {
    /// Create the index if it does not exist yet.
    async fn create_index(
        &self,
        index: &str,
        vector_size: usize,
        cancel: &CancellationToken,
    ) -> MemoryResult<()>;

    /// Index names known to the backend, in backend order.
    async fn get_indexes(&self, cancel: &CancellationToken) -> MemoryResult<Vec<String>>;

    /// Drop the index and its records. Missing indexes are not an error.
    async fn delete_index(&self, index: &str, cancel: &CancellationToken) -> MemoryResult<()>;

    /// Insert or fully replace a record, returns its id.
    async fn upsert(
        &self,
        index: &str,
        record: &MemoryRecord,
        cancel: &CancellationToken,
    ) -> MemoryResult<String>;

    /// Nearest neighbors of `request.query`, best first.
    async fn get_similar_list(
        &self,
        index: &str,
        request: SearchRequest,
        cancel: &CancellationToken,
    ) -> MemoryResult<SimilarityStream>;

    /// Records of the index without a query vector.
    async fn get_list(
        &self,
        index: &str,
        request: ListRequest,
        cancel: &CancellationToken,
    ) -> MemoryResult<RecordStream>;

    /// Remove a record by id. Missing records are not an error.
    async fn delete(
        &self,
        index: &str,
        record: &MemoryRecord,
        cancel: &CancellationToken,
    ) -> MemoryResult<()>;
}

/// Graph-engine backed [`MemoryDb`].
#[derive(Clone)]
pub struct GraphMemory {
    backend: Arc<dyn GraphBackend>,
    indexes: IndexManager,
    store: VectorStore,
}

impl GraphMemory {
    /// Validate `config`, build the configured backend and verify it answers.
    pub async fn connect(config: StoreConfig) -> MemoryResult<Self> {
        ConfigValidator::validate_store_config(&config)
            .map_err(|e| MemoryDbError::Config(format!("{:#}", e)))?;

        let backend = BackendFactory::create_backend(&config.backend)
            .map_err(|e| MemoryDbError::BackendUnavailable(e.to_string()))?;

        match backend.health_check().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(MemoryDbError::BackendUnavailable(format!(
                    "{} backend failed its health check",
                    backend.backend_name()
                )))
            }
            Err(e) => return Err(MemoryDbError::BackendUnavailable(e.to_string())),
        }

        info!(
            "Connected to {} backend (default index '{}')",
            backend.backend_name(),
            config.indexing.default_index
        );

        Ok(Self::with_backend(
            backend,
            IndexNameHelper::new(&config.indexing.default_index),
            config.search,
        ))
    }

    /// Wire a facade over an already constructed backend.
    pub fn with_backend(
        backend: Arc<dyn GraphBackend>,
        names: IndexNameHelper,
        search: SearchConfig,
    ) -> Self {
        let indexes = IndexManager::new(backend.clone(), names);
        let store = VectorStore::new(backend.clone(), indexes.clone(), search);
        Self {
            backend,
            indexes,
            store,
        }
    }

    /// In-process store, mainly for tests and embedded use.
    pub fn in_memory() -> Self {
        Self::with_backend(
            Arc::new(crate::storage::backends::MemoryGraphBackend::new()),
            IndexNameHelper::default(),
            SearchConfig::default(),
        )
    }

    pub fn backend(&self) -> &Arc<dyn GraphBackend> {
        &self.backend
    }

    pub fn default_index(&self) -> &str {
        self.indexes.names().default_index()
    }
}

/// Run `operation` unless `cancel` fires first. Dropping the losing future
/// abandons the backend call, so nothing it had not confirmed is reported
/// as done.
async fn cancellable<T, F>(
    operation: &'static str,
    cancel: &CancellationToken,
    future: F,
) -> MemoryResult<T>
where
    F: Future<Output = MemoryResult<T>>,
{
    if cancel.is_cancelled() {
        return Err(MemoryDbError::Cancelled { operation });
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Operation {} cancelled", operation);
            Err(MemoryDbError::Cancelled { operation })
        }
        result = future => result,
    }
}

#[async_trait]
impl MemoryDb for GraphMemory {
    async fn create_index(
        &self,
        index: &str,
        vector_size: usize,
        cancel: &CancellationToken,
    ) -> MemoryResult<()> {
        cancellable(
            "create_index",
            cancel,
            self.indexes.create_index(index, vector_size),
        )
        .await
    }

    async fn get_indexes(&self, cancel: &CancellationToken) -> MemoryResult<Vec<String>> {
        cancellable("get_indexes", cancel, self.indexes.get_indexes()).await
    }

    async fn delete_index(&self, index: &str, cancel: &CancellationToken) -> MemoryResult<()> {
        cancellable("delete_index", cancel, self.indexes.delete_index(index)).await
    }

    async fn upsert(
        &self,
        index: &str,
        record: &MemoryRecord,
        cancel: &CancellationToken,
    ) -> MemoryResult<String> {
        cancellable("upsert", cancel, self.store.upsert(index, record)).await
    }

    async fn get_similar_list(
        &self,
        index: &str,
        request: SearchRequest,
        cancel: &CancellationToken,
    ) -> MemoryResult<SimilarityStream> {
        cancellable("search", cancel, self.store.search(index, request)).await
    }

    async fn get_list(
        &self,
        index: &str,
        request: ListRequest,
        cancel: &CancellationToken,
    ) -> MemoryResult<RecordStream> {
        cancellable("get_all", cancel, self.store.get_all(index, request)).await
    }

    async fn delete(
        &self,
        index: &str,
        record: &MemoryRecord,
        cancel: &CancellationToken,
    ) -> MemoryResult<()> {
        cancellable("delete", cancel, self.store.delete(index, record)).await
    }
}
