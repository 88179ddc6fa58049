// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Kindred adapter architecture.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod embedding;
pub mod image;
pub mod provider;
pub mod speech;
pub mod storage;
pub mod vision;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use embedding::EmbeddingAdapter;
pub use image::ImageGenAdapter;
pub use provider::ProviderAdapter;
pub use speech::{SpeechToTextAdapter, TextToSpeechAdapter};
pub use storage::StorageAdapter;
pub use vision::VisionAdapter;
