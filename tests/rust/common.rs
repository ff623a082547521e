//! Common utilities for integration tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use uuid::Uuid;

use vectorgraph::core::{BackendError, BackendResult, MemoryRecord, SearchConfig};
use vectorgraph::storage::backends::{
    BackendCapabilities, GraphBackend, GraphNode, IndexLayout, MemoryGraphBackend, ScoredNode,
    VectorIndexSpec,
};
use vectorgraph::{GraphMemory, IndexNameHelper};

static INIT: Once = Once::new();

/// Initialize test environment
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
            .with_test_writer()
            .try_init();
    });
}

/// Generate unique index name for testing
pub fn generate_test_index_name() -> String {
    format!("test-index-{}", Uuid::new_v4().simple())
}

/// Facade over the in-process engine
pub fn create_test_memory() -> (GraphMemory, MemoryGraphBackend) {
    let backend = MemoryGraphBackend::new();
    let memory = memory_over(Arc::new(backend.clone()));
    (memory, backend)
}

pub fn memory_over(backend: Arc<dyn GraphBackend>) -> GraphMemory {
    GraphMemory::with_backend(backend, IndexNameHelper::default(), SearchConfig::default())
}

/// Deterministic vector of `dimension` components derived from `seed`
pub fn create_test_vector(seed: usize, dimension: usize) -> Vec<f32> {
    (0..dimension)
        .map(|i| (((seed + 1) * (i + 3)) % 17) as f32 * 0.1 + 0.05)
        .collect()
}

/// Create test record
pub fn create_test_record(id: &str, dimension: usize, seed: usize) -> MemoryRecord {
    MemoryRecord::new(id, create_test_vector(seed, dimension))
        .with_tag("doc_type", "unit_test")
        .with_payload("text", serde_json::json!(format!("chunk {}", id)))
}

/// Delays writes and queries, so callers can cancel while they are in
/// flight. The wrapped engine is only reached after the delay elapses.
pub struct SlowBackend {
    inner: MemoryGraphBackend,
    delay: Duration,
    completed_writes: AtomicUsize,
}

impl SlowBackend {
    pub fn new(inner: MemoryGraphBackend, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            completed_writes: AtomicUsize::new(0),
        }
    }

    pub fn completed_writes(&self) -> usize {
        self.completed_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphBackend for SlowBackend {
    fn backend_name(&self) -> &'static str {
        "slow"
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.inner.capabilities()
    }

    async fn health_check(&self) -> BackendResult<bool> {
        self.inner.health_check().await
    }

    async fn create_vector_index(&self, spec: &VectorIndexSpec) -> BackendResult<()> {
        self.inner.create_vector_index(spec).await
    }

    async fn list_vector_indexes(&self) -> BackendResult<Vec<VectorIndexSpec>> {
        self.inner.list_vector_indexes().await
    }

    async fn drop_vector_index(&self, layout: &IndexLayout) -> BackendResult<()> {
        self.inner.drop_vector_index(layout).await
    }

    async fn merge_node(&self, layout: &IndexLayout, node: GraphNode) -> BackendResult<String> {
        tokio::time::sleep(self.delay).await;
        let id = self.inner.merge_node(layout, node).await?;
        self.completed_writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn query_nodes(
        &self,
        layout: &IndexLayout,
        query: &[f32],
        top_k: usize,
        with_vectors: bool,
    ) -> BackendResult<Vec<ScoredNode>> {
        tokio::time::sleep(self.delay).await;
        self.inner.query_nodes(layout, query, top_k, with_vectors).await
    }

    async fn delete_node(&self, layout: &IndexLayout, id: &str) -> BackendResult<()> {
        self.inner.delete_node(layout, id).await
    }

    async fn scan_nodes(
        &self,
        layout: &IndexLayout,
        limit: usize,
        with_vectors: bool,
    ) -> BackendResult<Vec<GraphNode>> {
        self.inner.scan_nodes(layout, limit, with_vectors).await
    }
}

/// Fails every call with the configured error.
pub struct FailingBackend {
    error: BackendError,
}

impl FailingBackend {
    pub fn new(error: BackendError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl GraphBackend for FailingBackend {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::default()
    }

    async fn health_check(&self) -> BackendResult<bool> {
        Err(self.error.clone())
    }

    async fn create_vector_index(&self, _spec: &VectorIndexSpec) -> BackendResult<()> {
        Err(self.error.clone())
    }

    async fn list_vector_indexes(&self) -> BackendResult<Vec<VectorIndexSpec>> {
        Err(self.error.clone())
    }

    async fn drop_vector_index(&self, _layout: &IndexLayout) -> BackendResult<()> {
        Err(self.error.clone())
    }

    async fn merge_node(&self, _layout: &IndexLayout, _node: GraphNode) -> BackendResult<String> {
        Err(self.error.clone())
    }

    async fn query_nodes(
        &self,
        _layout: &IndexLayout,
        _query: &[f32],
        _top_k: usize,
        _with_vectors: bool,
    ) -> BackendResult<Vec<ScoredNode>> {
        Err(self.error.clone())
    }

    async fn delete_node(&self, _layout: &IndexLayout, _id: &str) -> BackendResult<()> {
        Err(self.error.clone())
    }
}
