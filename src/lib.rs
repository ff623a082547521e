/*
 * Copyright 2025 VectorGraph
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # VectorGraph - Vector Memory on Graph Engines
//!
//! Stores embedded document chunks in a graph engine's vector indexes and
//! answers nearest-neighbor queries over them.
//!
//! ## Key Features
//!
//! - **Index Naming**: user supplied names are validated and normalized
//! - **Pluggable Backends**: Neo4j over HTTP, or an in-process engine
//! - **Tag Filtering**: OR-of-AND tag filters applied to search candidates
//! - **Cancellation**: every operation takes a cancellation token
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use vectorgraph::{GraphMemory, MemoryDb, MemoryRecord, SearchRequest, StoreConfig};
//!
//! # async fn demo() -> vectorgraph::MemoryResult<()> {
//! let memory = GraphMemory::connect(StoreConfig::in_memory()).await?;
//! let cancel = CancellationToken::new();
//!
//! memory.create_index("notes", 3, &cancel).await?;
//! memory
//!     .upsert("notes", &MemoryRecord::new("n1", vec![0.1, 0.2, 0.3]), &cancel)
//!     .await?;
//! let _hits = memory
//!     .get_similar_list("notes", SearchRequest::new(vec![0.1, 0.2, 0.3]), &cancel)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod compute;
pub mod core;
pub mod services;
pub mod storage;

pub use crate::core::*;
pub use services::{GraphMemory, MemoryDb};
pub use storage::{
    BackendCapabilities, BackendFactory, GraphBackend, IndexNameHelper, ListRequest,
    SearchRequest,
};
