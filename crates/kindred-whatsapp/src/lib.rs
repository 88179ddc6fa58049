// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel adapter for the Kindred companion.
//!
//! Inbound messages arrive via the gateway's webhook endpoint and are fed
//! through a [`WhatsAppIngress`] handle into the channel's queue; outbound
//! messages go out through the Graph API ([`client::GraphClient`]),
//! including media upload for voice and image replies.

pub mod client;
pub mod webhook;

use async_trait::async_trait;
use kindred_config::model::WhatsAppConfig;
use kindred_core::types::{
    ChannelCapabilities, InboundMessage, MessageContent, MessageId, OutboundMessage,
    OutboundPayload,
};
use kindred_core::{AdapterType, ChannelAdapter, HealthStatus, KindredError, PluginAdapter};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::client::GraphClient;
use crate::webhook::WebhookMessage;

pub use crate::client::DownloadedMedia;
pub use crate::webhook::{classify_payload, WebhookEvent, WebhookPayload};

/// Reply sent for message types the companion cannot handle.
const UNSUPPORTED_REPLY: &str = "sorry, I can't handle that kind of message yet — text, voice notes, and photos work!";

/// Reply sent when user media cannot be fetched from WhatsApp.
const MEDIA_FAILURE_REPLY: &str = "hmm, I couldn't load that — mind sending it again?";

/// WhatsApp channel adapter implementing [`ChannelAdapter`].
pub struct WhatsAppChannel {
    client: GraphClient,
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
}

impl WhatsAppChannel {
    /// Creates a new WhatsApp channel adapter.
    ///
    /// Requires `access_token` and `phone_number_id` to be configured.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, KindredError> {
        let client = GraphClient::new(
            config.access_token.clone().unwrap_or_default(),
            config.phone_number_id.clone().unwrap_or_default(),
            config.api_version.clone(),
        )?;
        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        Ok(Self {
            client,
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
        })
    }

    /// Overrides the Graph API base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }

    /// Returns the ingress handle the gateway webhook feeds.
    pub fn ingress(&self) -> WhatsAppIngress {
        WhatsAppIngress {
            client: self.client.clone(),
            inbound_tx: self.inbound_tx.clone(),
        }
    }
}

/// Handle for pushing parsed webhook messages into the channel.
///
/// Owns the visual-feedback side effects (read receipt, reaction) and the
/// media download step, so the gateway handler stays a thin parser.
#[derive(Clone)]
pub struct WhatsAppIngress {
    client: GraphClient,
    inbound_tx: mpsc::Sender<InboundMessage>,
}

impl WhatsAppIngress {
    /// Accepts one webhook message: acknowledges it, resolves media, and
    /// queues the canonical envelope for the agent loop.
    ///
    /// Best-effort throughout; failures are logged and the sender gets a
    /// fallback text where possible, never a transport error.
    pub async fn accept(&self, msg: WebhookMessage) {
        if let Err(e) = self.client.mark_as_read(&msg.id).await {
            debug!(error = %e, "failed to mark message as read");
        }

        let reaction = match msg.kind.as_str() {
            "image" => "👀",
            "audio" => "👂",
            _ => "🤔",
        };
        if let Err(e) = self.client.send_reaction(&msg.from, &msg.id, reaction).await {
            debug!(error = %e, "failed to send reaction");
        }

        let content = match self.resolve_content(&msg).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                // Unsupported type: answer directly, no turn.
                if let Err(e) = self.client.send_text(&msg.from, UNSUPPORTED_REPLY).await {
                    warn!(error = %e, "failed to send unsupported-type reply");
                }
                return;
            }
            Err(e) => {
                warn!(error = %e, kind = msg.kind.as_str(), "failed to resolve message media");
                if let Err(e) = self.client.send_text(&msg.from, MEDIA_FAILURE_REPLY).await {
                    warn!(error = %e, "failed to send media-failure reply");
                }
                return;
            }
        };

        let inbound = to_inbound_message(&msg, content);
        if self.inbound_tx.send(inbound).await.is_err() {
            warn!("inbound channel closed, dropping message");
        }
    }

    /// Maps a webhook message to canonical content, downloading media.
    ///
    /// Returns `Ok(None)` for unsupported message types.
    async fn resolve_content(
        &self,
        msg: &WebhookMessage,
    ) -> Result<Option<MessageContent>, KindredError> {
        match msg.kind.as_str() {
            "text" => {
                let body = msg
                    .text
                    .as_ref()
                    .map(|t| t.body.clone())
                    .unwrap_or_default();
                Ok(Some(MessageContent::Text(body)))
            }
            "audio" => {
                let audio = msg.audio.as_ref().ok_or_else(|| KindredError::Channel {
                    message: "audio message carried no audio object".into(),
                    source: None,
                })?;
                let media = self.client.download_media(&audio.id).await?;
                let mime_type = audio
                    .mime_type
                    .clone()
                    .unwrap_or(media.mime_type);
                Ok(Some(MessageContent::Voice {
                    data: media.data,
                    mime_type,
                }))
            }
            "image" => {
                let image = msg.image.as_ref().ok_or_else(|| KindredError::Channel {
                    message: "image message carried no image object".into(),
                    source: None,
                })?;
                let media = self.client.download_media(&image.id).await?;
                let mime_type = image
                    .mime_type
                    .clone()
                    .unwrap_or(media.mime_type);
                Ok(Some(MessageContent::Image {
                    data: media.data,
                    mime_type,
                    caption: image.caption.clone(),
                }))
            }
            _ => Ok(None),
        }
    }
}

/// Converts a webhook message and resolved content into the canonical envelope.
fn to_inbound_message(msg: &WebhookMessage, content: MessageContent) -> InboundMessage {
    let timestamp = msg
        .timestamp
        .as_deref()
        .and_then(|t| t.parse::<i64>().ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

    // Recipient and source message id ride in metadata so replies can be
    // routed without re-parsing the transport payload.
    let metadata = Some(
        serde_json::json!({
            "recipient": msg.from,
            "message_id": msg.id,
        })
        .to_string(),
    );

    InboundMessage {
        id: msg.id.clone(),
        session_id: None, // Resolved by the agent loop.
        channel: "whatsapp".to_string(),
        sender_id: msg.from.clone(),
        content,
        timestamp,
        metadata,
    }
}

/// Extracts the reply recipient from an outbound message's metadata.
fn extract_recipient(msg: &OutboundMessage) -> Result<String, KindredError> {
    if let Some(ref metadata) = msg.metadata
        && let Ok(meta) = serde_json::from_str::<serde_json::Value>(metadata)
        && let Some(recipient) = meta.get("recipient").and_then(|v| v.as_str())
    {
        return Ok(recipient.to_string());
    }

    Err(KindredError::Channel {
        message: "no recipient in outbound message metadata".into(),
        source: None,
    })
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        debug!("WhatsApp channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_voice: true,
            supports_images: true,
            supports_reactions: true,
            supports_read_receipts: true,
            max_message_length: Some(4096),
        }
    }

    async fn connect(&mut self) -> Result<(), KindredError> {
        // Inbound delivery is webhook-push via the gateway; nothing to poll.
        debug!("WhatsApp channel ready (webhook-fed)");
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, KindredError> {
        let recipient = extract_recipient(&msg)?;

        let message_id = match msg.payload {
            OutboundPayload::Text(body) => self.client.send_text(&recipient, &body).await?,
            OutboundPayload::Audio { data, mime_type } => {
                let media_id = self.client.upload_media(data, &mime_type).await?;
                self.client.send_media(&recipient, "audio", &media_id).await?
            }
            OutboundPayload::Image {
                data,
                mime_type,
                caption,
            } => {
                let media_id = self.client.upload_media(data, &mime_type).await?;
                let id = self.client.send_media(&recipient, "image", &media_id).await?;
                // WhatsApp media captions are unreliable for bot sends; the
                // caption goes out as a follow-up text message.
                if let Some(caption) = caption
                    && !caption.trim().is_empty()
                    && let Err(e) = self.client.send_text(&recipient, &caption).await
                {
                    warn!(error = %e, "failed to send image caption");
                }
                id
            }
        };

        Ok(MessageId(message_id))
    }

    async fn receive(&self) -> Result<InboundMessage, KindredError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| KindredError::Channel {
            message: "whatsapp inbound channel closed".into(),
            source: None,
        })
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), KindredError> {
        self.client.mark_as_read(message_id).await
    }

    async fn react(
        &self,
        recipient: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), KindredError> {
        self.client.send_reaction(recipient, message_id, emoji).await
    }
}
