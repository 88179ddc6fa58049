// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mock embedder.
//!
//! Produces a stable pseudo-embedding from the text's bytes: identical
//! texts map to identical vectors (cosine 1.0), so recall and dedup
//! behavior can be asserted without the real ONNX model.

use async_trait::async_trait;

use kindred_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use kindred_core::{EmbeddingAdapter, KindredError, PluginAdapter};

/// Dimension of the mock embedding space.
pub const MOCK_EMBEDDING_DIM: usize = 32;

/// Deterministic byte-histogram embedder for tests.
pub struct MockEmbedder;

impl MockEmbedder {
    pub fn new() -> Self {
        Self
    }

    /// Embed one text deterministically and L2-normalize.
    pub fn embed_text(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; MOCK_EMBEDDING_DIM];
        for (i, byte) in text.bytes().enumerate() {
            vector[(i + byte as usize) % MOCK_EMBEDDING_DIM] += 1.0;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, KindredError> {
        let embeddings = input
            .texts
            .iter()
            .map(|text| Self::embed_text(text))
            .collect();
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: MOCK_EMBEDDING_DIM,
        })
    }
}
