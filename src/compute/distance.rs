/*
 * Copyright 2024 Vijaykumar Singh
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

//! Similarity functions for vector indexes
//!
//! Vector indexes rank with cosine similarity. Graph engines report it
//! normalized into `[0, 1]`, which is what [`cosine_score`] produces so the
//! in-process engine scores exactly like a remote one.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity
    #[default]
    Cosine,
}

impl DistanceMetric {
    /// Name of the similarity function in vector index options.
    pub fn similarity_function(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
        }
    }
}

/// Raw cosine similarity in `[-1, 1]`. Zero vectors have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    // Manual loop unrolling for better performance
    let len = a.len().min(b.len());
    let chunks = len / 4;

    for i in 0..chunks {
        let base = i * 4;

        dot_product += a[base] * b[base];
        dot_product += a[base + 1] * b[base + 1];
        dot_product += a[base + 2] * b[base + 2];
        dot_product += a[base + 3] * b[base + 3];

        norm_a += a[base] * a[base];
        norm_a += a[base + 1] * a[base + 1];
        norm_a += a[base + 2] * a[base + 2];
        norm_a += a[base + 3] * a[base + 3];

        norm_b += b[base] * b[base];
        norm_b += b[base + 1] * b[base + 1];
        norm_b += b[base + 2] * b[base + 2];
        norm_b += b[base + 3] * b[base + 3];
    }

    // Handle remainder
    for i in (chunks * 4)..len {
        dot_product += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let norm_product = norm_a.sqrt() * norm_b.sqrt();
    if norm_product == 0.0 {
        0.0
    } else {
        (dot_product / norm_product).clamp(-1.0, 1.0)
    }
}

/// Cosine similarity mapped to `[0, 1]` as `(1 + cos) / 2`.
pub fn cosine_score(a: &[f32], b: &[f32]) -> f64 {
    (1.0 + cosine_similarity(a, b) as f64) / 2.0
}
