// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Kindred integration tests.
//!
//! Mock adapters for fast, deterministic, CI-runnable tests without
//! external services:
//!
//! - [`MockProvider`] -- LLM provider with queued responses or forced failure
//! - [`MockChannel`] -- messaging channel with injection and capture
//! - [`MockEmbedder`] -- deterministic byte-histogram embeddings
//! - [`MockTranscriber`] / [`MockSynthesizer`] / [`MockVision`] /
//!   [`MockImageGen`] -- modality adapters with failing variants

pub mod mock_channel;
pub mod mock_embedder;
pub mod mock_modality;
pub mod mock_provider;

pub use mock_channel::MockChannel;
pub use mock_embedder::{MockEmbedder, MOCK_EMBEDDING_DIM};
pub use mock_modality::{MockImageGen, MockSynthesizer, MockTranscriber, MockVision};
pub use mock_provider::MockProvider;
