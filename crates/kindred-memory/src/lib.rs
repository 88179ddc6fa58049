// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory system for the Kindred companion.
//!
//! Provides local ONNX embedding inference, SQLite storage with hybrid
//! search (vector similarity + BM25 via FTS5), and LLM-based analysis of
//! user messages for durable personal facts.
//!
//! ## Architecture
//!
//! - **MiniLmEmbedder**: local ONNX model for 384-dim embedding inference
//! - **MemoryStore**: SQLite persistence with BLOB vectors and FTS5
//! - **ModelFiles**: first-run model download from HuggingFace
//! - **MemoryRetriever**: vector + BM25 + RRF fusion search
//! - **MemoryAnalyzer**: LLM importance analysis and dedup-aware writes

pub mod analyzer;
pub mod embedder;
pub mod model_files;
pub mod retriever;
pub mod store;
pub mod types;

pub use analyzer::MemoryAnalyzer;
pub use embedder::MiniLmEmbedder;
pub use model_files::ModelFiles;
pub use retriever::MemoryRetriever;
pub use store::MemoryStore;
pub use types::*;
