// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Groq chat-completions API request/response types.
//!
//! Groq exposes an OpenAI-compatible surface; these types cover the subset
//! Kindred uses: text and vision content parts, JSON response mode, and
//! streamed chunks with trailing usage.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to the chat completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "llama-3.3-70b-versatile").
    pub model: String,

    /// Conversation messages, system first.
    pub messages: Vec<ChatMessage>,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Whether to stream the response.
    pub stream: bool,

    /// Constrain output format ("json_object" for structured calls).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    /// Stream options; usage reporting must be requested explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

/// A single message in the OpenAI-compatible conversation format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Content -- plain text or an array of typed parts.
    pub content: ChatContent,
}

/// Message content -- a plain string or structured parts (for vision).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent {
    /// Simple text content.
    Text(String),
    /// Array of typed content parts.
    Parts(Vec<ContentPart>),
}

/// A typed content part within a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    /// Text part.
    #[serde(rename = "text")]
    Text { text: String },
    /// Image part, referenced by URL (data URLs for inline images).
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

/// An image reference within a content part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    /// HTTP or `data:` URL of the image.
    pub url: String,
}

/// Output format constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFormat {
    /// Format type (e.g., "json_object").
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    /// The JSON object response format.
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// Options controlling streamed responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamOptions {
    /// Emit a final chunk carrying token usage.
    pub include_usage: bool,
}

// --- Response types ---

/// A full (non-streamed) chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Response ID.
    pub id: String,
    /// Model that generated the response.
    pub model: String,
    /// Completion choices; Kindred always requests a single choice.
    pub choices: Vec<Choice>,
    /// Token usage statistics.
    #[serde(default)]
    pub usage: ApiUsage,
}

/// A completion choice within a response.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Choice index.
    pub index: u32,
    /// The generated message.
    pub message: ResponseMessage,
    /// Reason the generation stopped.
    pub finish_reason: Option<String>,
}

/// The assistant message within a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Role (always "assistant").
    pub role: String,
    /// Generated text. Absent for refused/empty completions.
    pub content: Option<String>,
}

/// Token usage statistics from the API.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

// --- Streaming types ---

/// A single streamed chunk of a chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    /// Response ID (stable across chunks).
    pub id: String,
    /// Delta choices.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Usage totals; present only on the trailing chunk when
    /// `stream_options.include_usage` was set.
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

/// A delta choice within a streamed chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    /// Choice index.
    pub index: u32,
    /// Incremental content delta.
    pub delta: ChunkDelta,
    /// Reason the generation stopped; present on the final content chunk.
    pub finish_reason: Option<String>,
}

/// The incremental payload of a streamed chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    /// Role, present on the first chunk only.
    #[serde(default)]
    pub role: Option<String>,
    /// Appended text.
    #[serde(default)]
    pub content: Option<String>,
}

// --- Error types ---

/// API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// Error detail within an API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable error message.
    pub message: String,
    /// Error type identifier.
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
}
