// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generation via the Pollinations HTTP endpoint.
//!
//! Pollinations serves generated images as a plain GET on a URL-encoded
//! prompt; no API key is involved.

use async_trait::async_trait;
use kindred_config::model::ImageConfig;
use kindred_core::types::{AdapterType, HealthStatus};
use kindred_core::{ImageGenAdapter, KindredError, PluginAdapter};
use tracing::debug;

/// Image generation adapter for the Pollinations endpoint.
pub struct PollinationsGenerator {
    client: reqwest::Client,
    config: ImageConfig,
}

impl PollinationsGenerator {
    /// Creates a generator from image configuration.
    pub fn new(config: ImageConfig) -> Result<Self, KindredError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| KindredError::Media {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client, config })
    }

    /// Builds the request URL for a prompt.
    fn request_url(&self, prompt: &str) -> String {
        format!(
            "{}/{}?width={}&height={}&model={}&nologo=true",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(prompt),
            self.config.width,
            self.config.height,
            self.config.model,
        )
    }
}

#[async_trait]
impl PluginAdapter for PollinationsGenerator {
    fn name(&self) -> &str {
        "pollinations"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ImageGen
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        Ok(())
    }
}

#[async_trait]
impl ImageGenAdapter for PollinationsGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, KindredError> {
        if prompt.trim().is_empty() {
            return Err(KindredError::Media {
                message: "image prompt is empty".into(),
                source: None,
            });
        }

        let url = self.request_url(prompt);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| KindredError::Media {
                message: format!("image generation request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(KindredError::Media {
                message: format!("image endpoint returned {status}"),
                source: None,
            });
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| KindredError::Media {
                message: format!("failed to read generated image: {e}"),
                source: Some(Box::new(e)),
            })?
            .to_vec();

        if data.is_empty() {
            return Err(KindredError::Media {
                message: "image endpoint returned no data".into(),
                source: None,
            });
        }

        debug!(bytes = data.len(), "image generated");
        Ok(data)
    }
}
