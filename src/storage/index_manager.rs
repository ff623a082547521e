// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Vector index lifecycle: create, list, describe and drop.

use std::sync::Arc;
use tracing::{debug, info};

use super::backends::{GraphBackend, IndexLayout, VectorIndexSpec};
use super::index_name::IndexNameHelper;
use crate::core::{BackendError, MemoryDbError, MemoryResult};

#[derive(Clone)]
pub struct IndexManager {
    backend: Arc<dyn GraphBackend>,
    names: IndexNameHelper,
}

impl IndexManager {
    pub fn new(backend: Arc<dyn GraphBackend>, names: IndexNameHelper) -> Self {
        Self { backend, names }
    }

    pub fn names(&self) -> &IndexNameHelper {
        &self.names
    }

    /// Validate `index` and derive its engine-side names.
    pub fn layout_for(&self, index: &str) -> MemoryResult<IndexLayout> {
        let name = self.names.convert(index)?;
        Ok(IndexLayout::for_index(&name))
    }

    /// Create the index unless it exists. An existing index with another
    /// dimensionality is a caller error and is left untouched.
    pub async fn create_index(&self, index: &str, dimensions: usize) -> MemoryResult<()> {
        let layout = self.layout_for(index)?;
        if dimensions == 0 {
            return Err(MemoryDbError::InvalidArgument(format!(
                "Index '{}' needs a positive number of dimensions",
                layout.name
            )));
        }

        if let Some(existing) = self.describe(&layout).await? {
            if existing.dimensions != dimensions {
                return Err(MemoryDbError::DimensionMismatch {
                    index: layout.name,
                    expected: existing.dimensions,
                    actual: dimensions,
                });
            }
            debug!("Vector index {} already exists", layout.name);
        }

        let spec = VectorIndexSpec::new(layout, dimensions);
        self.backend
            .create_vector_index(&spec)
            .await
            .map_err(|e| self.backend_error(e, "create_index", spec.name()))?;

        info!(
            "Vector index {} ready ({} dimensions, {} similarity)",
            spec.name(),
            spec.dimensions,
            spec.similarity.similarity_function()
        );
        Ok(())
    }

    /// Names of the vector indexes the engine knows, in engine order.
    pub async fn get_indexes(&self) -> MemoryResult<Vec<String>> {
        let specs = self
            .backend
            .list_vector_indexes()
            .await
            .map_err(|e| self.backend_error(e, "get_indexes", ""))?;

        Ok(specs.into_iter().map(|spec| spec.layout.name).collect())
    }

    /// Drop the index and its records. Missing indexes are not an error.
    pub async fn delete_index(&self, index: &str) -> MemoryResult<()> {
        let layout = self.layout_for(index)?;

        self.backend
            .drop_vector_index(&layout)
            .await
            .map_err(|e| self.backend_error(e, "delete_index", &layout.name))?;

        info!("Vector index {} deleted", layout.name);
        Ok(())
    }

    pub async fn describe(&self, layout: &IndexLayout) -> MemoryResult<Option<VectorIndexSpec>> {
        self.backend
            .describe_vector_index(layout)
            .await
            .map_err(|e| self.backend_error(e, "describe_index", &layout.name))
    }

    /// Like [`describe`](Self::describe), failing when the index is missing.
    pub async fn require(&self, layout: &IndexLayout) -> MemoryResult<VectorIndexSpec> {
        self.describe(layout)
            .await?
            .ok_or_else(|| MemoryDbError::IndexNotFound(layout.name.clone()))
    }

    fn backend_error(
        &self,
        error: BackendError,
        operation: &'static str,
        index: &str,
    ) -> MemoryDbError {
        MemoryDbError::from_backend(error, self.backend.backend_name(), operation, index)
    }
}
