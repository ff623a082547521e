// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Storage layer: index naming, engine backends, index lifecycle and
//! record operations.

pub mod backends;
pub mod filter;
pub mod index_manager;
pub mod index_name;
pub mod validation;
pub mod vector_store;

pub use backends::{
    BackendCapabilities, BackendFactory, GraphBackend, GraphNode, IndexLayout,
    MemoryGraphBackend, ScoredNode, VectorIndexSpec,
};
pub use filter::tags_match_filters;
pub use index_manager::IndexManager;
pub use index_name::{IndexNameConversion, IndexNameError, IndexNameHelper};
pub use validation::ConfigValidator;
pub use vector_store::{ListRequest, SearchRequest, VectorStore};
