// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image understanding via Groq's vision-capable chat models.
//!
//! Encodes the image as a base64 data URL content part and asks the
//! vision model for a description, optionally guided by the user's
//! caption.

use async_trait::async_trait;
use base64::Engine;
use kindred_core::types::{AdapterType, HealthStatus};
use kindred_core::{KindredError, PluginAdapter, VisionAdapter};
use tracing::debug;

use crate::client::GroqClient;
use crate::types::{ChatContent, ChatMessage, ChatRequest, ContentPart, ImageUrl};

/// Instructions used when the user sent an image with no question.
const DEFAULT_VISION_PROMPT: &str = "Look at this image carefully and describe what you see: \
the main subject, colors and physical details, the setting, any visible text, and the overall \
mood. Answer in a clear, conversational tone.";

/// Vision adapter backed by a Groq multimodal chat model.
pub struct ImageDescriber {
    client: GroqClient,
    model: String,
}

impl ImageDescriber {
    /// Creates a describer using the given client and vision model.
    pub fn new(client: GroqClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl PluginAdapter for ImageDescriber {
    fn name(&self) -> &str {
        "groq-vision"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Vision
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        Ok(())
    }
}

#[async_trait]
impl VisionAdapter for ImageDescriber {
    async fn describe_image(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, KindredError> {
        if image.is_empty() {
            return Err(KindredError::Media {
                message: "image data is empty".into(),
                source: None,
            });
        }

        let instructions = if prompt.trim().is_empty() {
            DEFAULT_VISION_PROMPT
        } else {
            prompt
        };

        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let data_url = format!("data:{mime_type};base64,{encoded}");

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: ChatContent::Parts(vec![
                    ContentPart::Text {
                        text: instructions.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ]),
            }],
            max_tokens: 1024,
            temperature: Some(0.3),
            stream: false,
            response_format: None,
            stream_options: None,
        };

        let response = self.client.chat(&request).await.map_err(|e| {
            KindredError::Media {
                message: format!("image analysis failed: {e}"),
                source: None,
            }
        })?;

        let description = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if description.is_empty() {
            return Err(KindredError::Media {
                message: "vision model returned an empty description".into(),
                source: None,
            });
        }

        debug!(chars = description.len(), "image described");
        Ok(description)
    }
}
