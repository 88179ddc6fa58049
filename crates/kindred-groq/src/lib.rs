// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Groq provider adapter for the Kindred companion.
//!
//! This crate implements [`ProviderAdapter`] for the Groq OpenAI-compatible
//! chat completions API, providing single-shot completion, streaming SSE
//! responses, and image understanding via [`vision::ImageDescriber`].

pub mod client;
pub mod sse;
pub mod types;
pub mod vision;

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use kindred_config::KindredConfig;
use kindred_core::types::{
    AdapterType, ContentBlock, HealthStatus, ProviderMessage, ProviderRequest, ProviderResponse,
    ProviderStreamChunk, TokenUsage,
};
use kindred_core::{KindredError, PluginAdapter, ProviderAdapter};
use tracing::info;

use crate::client::GroqClient;
use crate::types::{
    ApiUsage, ChatChunk, ChatContent, ChatMessage, ChatRequest, ContentPart, ImageUrl,
    ResponseFormat, StreamOptions,
};

pub use crate::vision::ImageDescriber;

/// Groq provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `GROQ_API_KEY` env var -> error.
pub struct GroqProvider {
    client: GroqClient,
}

impl GroqProvider {
    /// Creates a new Groq provider from the given configuration.
    pub fn new(config: &KindredConfig) -> Result<Self, KindredError> {
        let api_key = resolve_api_key(&config.groq.api_key)?;
        let client = GroqClient::new(api_key)?;

        info!(
            text_model = config.groq.text_model.as_str(),
            "Groq provider initialized"
        );

        Ok(Self { client })
    }

    /// Creates a provider around an existing client (tests, vision sharing).
    pub fn with_client(client: GroqClient) -> Self {
        Self { client }
    }

    /// Returns a clone of the underlying HTTP client.
    pub fn client(&self) -> GroqClient {
        self.client.clone()
    }
}

/// Resolves the API key from config or environment.
///
/// Shared with the transcription adapter, which talks to the same API
/// surface with the same credentials.
pub fn resolve_api_key(config_key: &Option<String>) -> Result<String, KindredError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("GROQ_API_KEY").map_err(|_| {
        KindredError::Config(
            "Groq API key not found. Set groq.api_key in config or the GROQ_API_KEY environment variable.".into(),
        )
    })
}

/// Converts a [`ProviderRequest`] into the wire-format [`ChatRequest`].
fn to_chat_request(request: &ProviderRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    if let Some(ref system) = request.system_prompt {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: ChatContent::Text(system.clone()),
        });
    }

    for msg in &request.messages {
        messages.push(ChatMessage {
            role: msg.role.clone(),
            content: convert_content(msg),
        });
    }

    ChatRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        stream: request.stream,
        response_format: request.json_mode.then(ResponseFormat::json_object),
        stream_options: request.stream.then_some(StreamOptions {
            include_usage: true,
        }),
    }
}

/// Converts core content blocks into chat content.
///
/// A single text block collapses to a plain string; anything else becomes
/// typed parts (images as base64 data URLs).
fn convert_content(msg: &ProviderMessage) -> ChatContent {
    if msg.content.len() == 1
        && let ContentBlock::Text { text } = &msg.content[0]
    {
        return ChatContent::Text(text.clone());
    }

    let parts = msg
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => ContentPart::Text { text: text.clone() },
            ContentBlock::Image { media_type, data } => ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:{media_type};base64,{data}"),
                },
            },
        })
        .collect();

    ChatContent::Parts(parts)
}

fn convert_usage(usage: &ApiUsage) -> TokenUsage {
    TokenUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    }
}

/// Maps a streamed [`ChatChunk`] to a [`ProviderStreamChunk`].
///
/// Chunks with neither content, finish reason, nor usage map to `None`.
fn map_chunk(chunk: ChatChunk) -> Option<ProviderStreamChunk> {
    let choice = chunk.choices.into_iter().next();
    let (text, finish_reason) = match choice {
        Some(c) => (c.delta.content, c.finish_reason),
        None => (None, None),
    };
    let usage = chunk.usage.as_ref().map(convert_usage);

    if text.is_none() && finish_reason.is_none() && usage.is_none() {
        return None;
    }

    Some(ProviderStreamChunk {
        text,
        finish_reason,
        usage,
        error: None,
    })
}

#[async_trait]
impl PluginAdapter for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        // Avoid burning tokens on health checks; the client is validated
        // at construction time.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for GroqProvider {
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, KindredError> {
        let api_request = to_chat_request(&request);
        let response = self.client.chat(&api_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KindredError::Provider {
                message: "completion carried no choices".into(),
                source: None,
            })?;

        Ok(ProviderResponse {
            id: response.id,
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
            finish_reason: choice.finish_reason,
            usage: convert_usage(&response.usage),
        })
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> Result<
        Pin<Box<dyn Stream<Item = Result<ProviderStreamChunk, KindredError>> + Send>>,
        KindredError,
    > {
        let api_request = to_chat_request(&request);
        let chunk_stream = self.client.chat_stream(&api_request).await?;

        let mapped = chunk_stream.filter_map(|result| async move {
            match result {
                Ok(chunk) => map_chunk(chunk).map(Ok),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(mapped))
    }
}
