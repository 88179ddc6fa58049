// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid memory retrieval combining vector similarity and BM25.
//!
//! The retriever embeds the query, runs cosine similarity over all active
//! embeddings and BM25 over the FTS5 index, fuses the two rankings with
//! Reciprocal Rank Fusion (k=60), and returns the top-K memories.

use std::collections::HashMap;
use std::sync::Arc;

use kindred_config::model::MemoryConfig;
use kindred_core::types::EmbeddingInput;
use kindred_core::{EmbeddingAdapter, KindredError};

use crate::store::MemoryStore;
use crate::types::{cosine_similarity, ScoredMemory};

/// RRF constant per the retrieval literature.
const RRF_K: f32 = 60.0;

/// Candidate pool size per search method, before fusion and truncation.
const CANDIDATE_POOL: usize = 50;

/// Retrieves memories related to a query via hybrid search.
pub struct MemoryRetriever {
    store: Arc<MemoryStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    config: MemoryConfig,
}

impl MemoryRetriever {
    /// Creates a new retriever.
    pub fn new(
        store: Arc<MemoryStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    /// Retrieve the top-`k` memories relevant to `query`, most relevant
    /// first. Recency plays no part in the ordering.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredMemory>, KindredError> {
        if query.trim().is_empty() || k == 0 {
            return Ok(vec![]);
        }

        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![query.to_string()],
            })
            .await?;
        let query_embedding = output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| KindredError::Internal("embedder returned no vectors".to_string()))?;

        let vector_results = self.vector_search(&query_embedding).await?;
        let bm25_results = self.store.search_bm25(query, CANDIDATE_POOL).await?;

        let fused = reciprocal_rank_fusion(&vector_results, &bm25_results);
        if fused.is_empty() {
            return Ok(vec![]);
        }

        let top_ids: Vec<String> = fused.iter().take(k).map(|(id, _)| id.clone()).collect();
        let memories = self.store.get_memories_by_ids(&top_ids).await?;

        let score_map: HashMap<&str, f32> =
            fused.iter().map(|(id, score)| (id.as_str(), *score)).collect();

        let mut scored: Vec<ScoredMemory> = memories
            .into_iter()
            .map(|memory| {
                let score = score_map.get(memory.id.as_str()).copied().unwrap_or(0.0);
                ScoredMemory { memory, score }
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    /// Cosine similarity over all active embeddings, filtered by the
    /// configured threshold, best first, capped at the candidate pool.
    async fn vector_search(
        &self,
        query_embedding: &[f32],
    ) -> Result<Vec<(String, f32)>, KindredError> {
        let active = self.store.get_active_embeddings().await?;

        let mut results: Vec<(String, f32)> = active
            .into_iter()
            .filter_map(|(id, embedding)| {
                if embedding.len() != query_embedding.len() {
                    return None;
                }
                let similarity = cosine_similarity(query_embedding, &embedding);
                (similarity >= self.config.similarity_threshold as f32).then_some((id, similarity))
            })
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(CANDIDATE_POOL);
        Ok(results)
    }
}

/// Reciprocal Rank Fusion: merge two ranked lists into one ranking.
///
/// RRF score for document d = sum over lists of 1 / (k + rank + 1), with
/// k = 60. Both inputs are already sorted most-relevant-first (BM25 scores
/// are negative, so SQLite's ascending ORDER BY delivers that).
pub fn reciprocal_rank_fusion(
    vector_results: &[(String, f32)],
    bm25_results: &[(String, f64)],
) -> Vec<(String, f32)> {
    let mut scores: HashMap<String, f32> = HashMap::new();

    for (rank, (id, _)) in vector_results.iter().enumerate() {
        *scores.entry(id.clone()).or_insert(0.0) += 1.0 / (RRF_K + rank as f32 + 1.0);
    }
    for (rank, (id, _)) in bm25_results.iter().enumerate() {
        *scores.entry(id.clone()).or_insert(0.0) += 1.0 / (RRF_K + rank as f32 + 1.0);
    }

    let mut fused: Vec<(String, f32)> = scores.into_iter().collect();
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused
}
