// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Kindred companion.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
    Embedding,
    Speech,
    Vision,
    ImageGen,
}

/// The form of an inbound message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Voice,
    Image,
}

// --- Channel types ---

/// Content carried by an inbound message, one variant per modality.
#[derive(Debug, Clone)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// A voice note. `data` is the raw audio as delivered by the transport.
    Voice {
        data: Vec<u8>,
        mime_type: String,
    },
    /// An image, optionally with a user caption.
    Image {
        data: Vec<u8>,
        mime_type: String,
        caption: Option<String>,
    },
}

impl MessageContent {
    /// The modality of this content.
    pub fn modality(&self) -> Modality {
        match self {
            MessageContent::Text(_) => Modality::Text,
            MessageContent::Voice { .. } => Modality::Voice,
            MessageContent::Image { .. } => Modality::Image,
        }
    }
}

/// An inbound message received from a channel adapter, normalized into
/// the canonical envelope shape shared by every transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Transport-assigned message id.
    pub id: String,
    /// Session id, if already resolved. `None` until the agent loop maps
    /// the sender to a session.
    pub session_id: Option<String>,
    /// Name of the originating channel ("whatsapp", "api").
    pub channel: String,
    /// Transport-level sender identity (phone number, API caller id).
    pub sender_id: String,
    /// The message payload.
    pub content: MessageContent,
    /// ISO 8601 receive timestamp.
    pub timestamp: String,
    /// Channel-specific routing metadata as a JSON string.
    pub metadata: Option<String>,
}

/// Payload of an outbound message.
#[derive(Debug, Clone)]
pub enum OutboundPayload {
    /// Plain text reply.
    Text(String),
    /// Synthesized audio reply.
    Audio { data: Vec<u8>, mime_type: String },
    /// Generated image, with an optional caption delivered alongside.
    Image {
        data: Vec<u8>,
        mime_type: String,
        caption: Option<String>,
    },
}

/// An outbound message to be delivered via a channel adapter.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Session that produced this message.
    pub session_id: Option<String>,
    /// Channel the message should be delivered on.
    pub channel: String,
    /// The payload to render.
    pub payload: OutboundPayload,
    /// Channel-specific routing metadata as a JSON string (chat id, request id).
    pub metadata: Option<String>,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_voice: bool,
    pub supports_images: bool,
    pub supports_reactions: bool,
    pub supports_read_receipts: bool,
    pub max_message_length: Option<usize>,
}

// --- Storage types ---

/// A conversation session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub channel: String,
    pub user_id: Option<String>,
    pub state: String,
    pub metadata: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A persisted message envelope. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub session_id: String,
    /// "inbound" (from the user) or "outbound" (from the companion).
    pub direction: String,
    pub modality: Modality,
    /// Normalized text content. Voice notes store their transcription,
    /// images store the tagged analysis text.
    pub content: String,
    pub metadata: Option<String>,
    pub created_at: String,
}

// --- Provider types ---

/// A single message in a provider conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Content blocks (text, and base64 images for vision requests).
    pub content: Vec<ContentBlock>,
}

/// A typed content block within a provider message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// Base64-encoded inline image.
    Image {
        media_type: String,
        data: String,
    },
}

/// A request to an LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Model identifier.
    pub model: String,
    /// Optional system prompt, prepended as a system message.
    pub system_prompt: Option<String>,
    /// Conversation messages.
    pub messages: Vec<ProviderMessage>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature. `None` uses the provider default.
    pub temperature: Option<f32>,
    /// Whether to request a streaming response.
    pub stream: bool,
    /// Constrain the output to a JSON object (structured routing/analysis calls).
    pub json_mode: bool,
}

/// A full response from an LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub finish_reason: Option<String>,
    pub usage: TokenUsage,
}

/// A single chunk from a streaming provider response.
#[derive(Debug, Clone)]
pub struct ProviderStreamChunk {
    /// Incremental text, if this chunk carries a content delta.
    pub text: Option<String>,
    /// Finish reason, present on the final content chunk.
    pub finish_reason: Option<String>,
    /// Usage totals, present on the trailing usage chunk when requested.
    pub usage: Option<TokenUsage>,
    /// Provider-reported mid-stream error.
    pub error: Option<String>,
}

/// Token usage statistics, in the OpenAI-compatible shape Groq reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

/// A synthesized audio clip from a text-to-speech adapter.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn modality_roundtrips_through_strings() {
        for m in [Modality::Text, Modality::Voice, Modality::Image] {
            let s = m.to_string();
            assert_eq!(Modality::from_str(&s).unwrap(), m);
        }
        assert_eq!(Modality::Text.to_string(), "text");
    }

    #[test]
    fn message_content_reports_modality() {
        assert_eq!(
            MessageContent::Text("hi".into()).modality(),
            Modality::Text
        );
        assert_eq!(
            MessageContent::Voice {
                data: vec![1, 2],
                mime_type: "audio/ogg".into()
            }
            .modality(),
            Modality::Voice
        );
        assert_eq!(
            MessageContent::Image {
                data: vec![],
                mime_type: "image/jpeg".into(),
                caption: None
            }
            .modality(),
            Modality::Image
        );
    }

    #[test]
    fn adapter_type_serialization() {
        let json = serde_json::to_string(&AdapterType::Speech).unwrap();
        let parsed: AdapterType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, AdapterType::Speech);
    }

    #[test]
    fn modality_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Modality::Voice).unwrap(), "\"voice\"");
        let parsed: Modality = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(parsed, Modality::Image);
    }

    #[test]
    fn session_and_message_ids_clone_and_compare() {
        let sid = SessionId("session-1".into());
        assert_eq!(sid, sid.clone());
        let mid = MessageId("msg-1".into());
        assert_eq!(mid, mid.clone());
    }

    #[test]
    fn health_status_variants() {
        assert_eq!(HealthStatus::Healthy, HealthStatus::Healthy);
        assert_ne!(HealthStatus::Degraded("slow".into()), HealthStatus::Healthy);
    }
}
