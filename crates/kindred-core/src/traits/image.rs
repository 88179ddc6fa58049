// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generation adapter trait.

use async_trait::async_trait;

use crate::error::KindredError;
use crate::traits::adapter::PluginAdapter;

/// Adapter that generates an image from a textual prompt.
#[async_trait]
pub trait ImageGenAdapter: PluginAdapter {
    /// Generates an image for the given visual prompt, returning raw bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, KindredError>;
}
