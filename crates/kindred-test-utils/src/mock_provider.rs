// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured
//! responses, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use kindred_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, ProviderStreamChunk,
    TokenUsage,
};
use kindred_core::{KindredError, PluginAdapter, ProviderAdapter};

/// A mock LLM provider that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue; an empty queue yields a
/// default "mock response". `failing()` builds a provider whose every
/// call errors, for degradation-path tests.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    fail: bool,
}

impl MockProvider {
    /// Create a mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fail: false,
        }
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            fail: false,
        }
    }

    /// Create a provider where every call fails.
    pub fn failing() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fail: true,
        }
    }

    /// Queue an additional response.
    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    async fn next_response(&self) -> Result<String, KindredError> {
        if self.fail {
            return Err(KindredError::Provider {
                message: "mock provider configured to fail".into(),
                source: None,
            });
        }
        Ok(self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, KindredError> {
        let text = self.next_response().await?;
        Ok(ProviderResponse {
            id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
            content: text,
            model: request.model,
            finish_reason: Some("stop".to_string()),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            },
        })
    }

    async fn stream(
        &self,
        _request: ProviderRequest,
    ) -> Result<
        Pin<
            Box<
                dyn futures_core::Stream<Item = Result<ProviderStreamChunk, KindredError>>
                    + Send,
            >,
        >,
        KindredError,
    > {
        let text = self.next_response().await?;

        // Realistic sequence: a text delta, the finish marker, trailing usage.
        let chunks = vec![
            Ok(ProviderStreamChunk {
                text: Some(text),
                finish_reason: None,
                usage: None,
                error: None,
            }),
            Ok(ProviderStreamChunk {
                text: None,
                finish_reason: Some("stop".to_string()),
                usage: None,
                error: None,
            }),
            Ok(ProviderStreamChunk {
                text: None,
                finish_reason: None,
                usage: Some(TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                    total_tokens: 30,
                }),
                error: None,
            }),
        ];

        Ok(Box::pin(stream::iter(chunks)))
    }
}
