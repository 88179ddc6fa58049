// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Groq chat completions API.
//!
//! Handles request construction, bearer authentication, streaming SSE
//! responses, and transient error retry.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use kindred_core::KindredError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::sse;
use crate::types::{ApiErrorResponse, ChatChunk, ChatRequest, ChatResponse};

/// Chat completions endpoint on the Groq OpenAI-compatible surface.
const API_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// HTTP client for Groq API communication.
///
/// Manages authentication headers, connection pooling, and retry logic
/// for transient errors (429, 500, 502, 503).
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl GroqClient {
    /// Creates a new Groq API client with the given API key.
    pub fn new(api_key: String) -> Result<Self, KindredError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            KindredError::Config(format!("invalid API key header value: {e}"))
        })?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| KindredError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            max_retries: 1,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends a non-streaming request and returns the full response.
    ///
    /// On transient errors, retries once after a 1-second delay.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, KindredError> {
        let mut req = request.clone();
        req.stream = false;
        req.stream_options = None;

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying chat request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(&req)
                .send()
                .await
                .map_err(|e| KindredError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "chat response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| KindredError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| KindredError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(KindredError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        Err(last_error.unwrap_or_else(|| KindredError::Provider {
            message: "chat request failed after retries".into(),
            source: None,
        }))
    }

    /// Sends a streaming request and returns a stream of chat chunks.
    ///
    /// On transient errors, retries once after a 1-second delay.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<ChatChunk, KindredError>> + Send>>, KindredError>
    {
        let mut req = request.clone();
        req.stream = true;

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying streaming request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(&req)
                .send()
                .await
                .map_err(|e| KindredError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "streaming response received");

            if status.is_success() {
                return Ok(sse::parse_chunk_stream(response));
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(KindredError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        Err(last_error.unwrap_or_else(|| KindredError::Provider {
            message: "streaming request failed after retries".into(),
            source: None,
        }))
    }
}

/// Build a provider error from a non-success response body.
fn api_error(status: reqwest::StatusCode, body: String) -> KindredError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
        let kind = api_err.error.type_.unwrap_or_else(|| "api_error".into());
        format!("Groq API error ({kind}): {}", api_err.error.message)
    } else {
        format!("API returned {status}: {body}")
    };
    KindredError::Provider {
        message,
        source: None,
    }
}

/// Returns true for HTTP status codes worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
