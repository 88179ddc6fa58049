// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vision adapter trait for image understanding.

use async_trait::async_trait;

use crate::error::KindredError;
use crate::traits::adapter::PluginAdapter;

/// Adapter that produces a textual description of an image.
#[async_trait]
pub trait VisionAdapter: PluginAdapter {
    /// Describes the image, guided by an optional user prompt.
    ///
    /// An empty `prompt` lets the adapter fall back to its default
    /// descriptive instructions.
    async fn describe_image(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, KindredError>;
}
