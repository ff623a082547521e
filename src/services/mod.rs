// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Service layer exposed to ingestion and query pipelines

pub mod memory_service;

pub use memory_service::{GraphMemory, MemoryDb};
