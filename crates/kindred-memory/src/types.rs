// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for the long-term memory system.

use serde::{Deserialize, Serialize};

/// A single durable fact stored by the memory system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier for this memory.
    pub id: String,
    /// The fact, as a third-person statement ("Has a cat named Miso").
    pub content: String,
    /// Embedding vector for semantic search (384-dim for all-MiniLM-L6-v2).
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// Current lifecycle status.
    pub status: MemoryStatus,
    /// Session where this memory was learned.
    pub session_id: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
}

/// Lifecycle status of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryStatus {
    /// Available for retrieval.
    Active,
    /// User asked to forget this; excluded from retrieval, kept for audit.
    Forgotten,
}

impl MemoryStatus {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryStatus::Active => "active",
            MemoryStatus::Forgotten => "forgotten",
        }
    }

    /// Parse from SQLite string.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "forgotten" => MemoryStatus::Forgotten,
            _ => MemoryStatus::Active,
        }
    }
}

/// A memory with a retrieval score from hybrid search.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    /// The memory fact.
    pub memory: Memory,
    /// Fused retrieval score, higher is more relevant.
    pub score: f32,
}

/// Result of analyzing a user message for memory-worthy content.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryAnalysis {
    /// Whether the message carries durable personal information.
    pub is_important: bool,
    /// The fact, reformatted as a standalone statement. `None` when not important.
    #[serde(default)]
    pub formatted_memory: Option<String>,
}

impl MemoryAnalysis {
    /// An analysis that stores nothing (used as the failure fallback).
    pub fn not_important() -> Self {
        Self {
            is_important: false,
            formatted_memory: None,
        }
    }
}

/// Convert an f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a SQLite BLOB back to an f32 vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

/// Compute cosine similarity between two vectors.
///
/// For L2-normalized vectors (as produced by the embedder) this reduces
/// to the dot product.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
