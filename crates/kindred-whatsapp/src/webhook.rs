// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp webhook payload types and classification.
//!
//! The Cloud API delivers both user messages and delivery-status updates
//! through the same webhook; [`classify_payload`] separates the two so the
//! gateway can ack status updates without touching the turn pipeline.

use serde::Deserialize;

/// Top-level webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// Object type (always "whatsapp_business_account").
    #[serde(default)]
    pub object: Option<String>,
    /// Account entries; each carries a list of changes.
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

/// A single account entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    /// Business account id.
    #[serde(default)]
    pub id: Option<String>,
    /// Field changes in this entry.
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

/// A single field change.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChange {
    /// The change payload.
    pub value: ChangeValue,
}

/// The value of a change: user messages, or our own delivery statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeValue {
    /// User messages, when present.
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
    /// Delivery-status updates for messages we sent.
    #[serde(default)]
    pub statuses: Vec<serde_json::Value>,
}

/// A single inbound user message.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMessage {
    /// Sender phone number.
    pub from: String,
    /// WhatsApp message id (wamid).
    pub id: String,
    /// Unix timestamp as a string.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Message type ("text", "audio", "image", or something unsupported).
    #[serde(rename = "type")]
    pub kind: String,
    /// Text body, for text messages.
    #[serde(default)]
    pub text: Option<TextBody>,
    /// Audio reference, for voice notes.
    #[serde(default)]
    pub audio: Option<MediaRef>,
    /// Image reference, for photos.
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// Body of a text message.
#[derive(Debug, Clone, Deserialize)]
pub struct TextBody {
    pub body: String,
}

/// Reference to uploaded audio media.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRef {
    pub id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Reference to uploaded image media.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    pub id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// What a webhook delivery amounts to.
#[derive(Debug)]
pub enum WebhookEvent {
    /// User messages to process.
    Messages(Vec<WebhookMessage>),
    /// Delivery statuses for our own sends; ack and ignore.
    Status,
    /// Nothing actionable (subscription pings, empty changes).
    Empty,
}

/// Classify a webhook payload into the event the gateway should handle.
pub fn classify_payload(payload: WebhookPayload) -> WebhookEvent {
    let mut messages = Vec::new();
    let mut saw_status = false;

    for entry in payload.entry {
        for change in entry.changes {
            if !change.value.statuses.is_empty() {
                saw_status = true;
            }
            messages.extend(change.value.messages);
        }
    }

    if !messages.is_empty() {
        WebhookEvent::Messages(messages)
    } else if saw_status {
        WebhookEvent::Status
    } else {
        WebhookEvent::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_payload() -> serde_json::Value {
        serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "123",
                "changes": [{
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {"phone_number_id": "10987654321"},
                        "messages": [{
                            "from": "15551230001",
                            "id": "wamid.TEXT1",
                            "timestamp": "1750000000",
                            "type": "text",
                            "text": {"body": "hello there"}
                        }]
                    },
                    "field": "messages"
                }]
            }]
        })
    }

    #[test]
    fn parses_text_message() {
        let payload: WebhookPayload = serde_json::from_value(text_payload()).unwrap();
        match classify_payload(payload) {
            WebhookEvent::Messages(msgs) => {
                assert_eq!(msgs.len(), 1);
                assert_eq!(msgs[0].from, "15551230001");
                assert_eq!(msgs[0].kind, "text");
                assert_eq!(msgs[0].text.as_ref().unwrap().body, "hello there");
            }
            other => panic!("expected Messages, got {other:?}"),
        }
    }

    #[test]
    fn parses_audio_message() {
        let json = serde_json::json!({
            "entry": [{"changes": [{"value": {"messages": [{
                "from": "15551230001",
                "id": "wamid.AUDIO1",
                "type": "audio",
                "audio": {"id": "media-5", "mime_type": "audio/ogg; codecs=opus", "voice": true}
            }]}}]}]
        });
        let payload: WebhookPayload = serde_json::from_value(json).unwrap();
        match classify_payload(payload) {
            WebhookEvent::Messages(msgs) => {
                let audio = msgs[0].audio.as_ref().unwrap();
                assert_eq!(audio.id, "media-5");
                assert_eq!(audio.mime_type.as_deref(), Some("audio/ogg; codecs=opus"));
            }
            other => panic!("expected Messages, got {other:?}"),
        }
    }

    #[test]
    fn parses_image_with_caption() {
        let json = serde_json::json!({
            "entry": [{"changes": [{"value": {"messages": [{
                "from": "15551230001",
                "id": "wamid.IMG1",
                "type": "image",
                "image": {"id": "media-8", "mime_type": "image/jpeg", "caption": "look at this"}
            }]}}]}]
        });
        let payload: WebhookPayload = serde_json::from_value(json).unwrap();
        match classify_payload(payload) {
            WebhookEvent::Messages(msgs) => {
                let image = msgs[0].image.as_ref().unwrap();
                assert_eq!(image.caption.as_deref(), Some("look at this"));
            }
            other => panic!("expected Messages, got {other:?}"),
        }
    }

    #[test]
    fn status_updates_classify_as_status() {
        let json = serde_json::json!({
            "entry": [{"changes": [{"value": {
                "statuses": [{"id": "wamid.OUT1", "status": "delivered"}]
            }}]}]
        });
        let payload: WebhookPayload = serde_json::from_value(json).unwrap();
        assert!(matches!(classify_payload(payload), WebhookEvent::Status));
    }

    #[test]
    fn empty_payload_classifies_as_empty() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(classify_payload(payload), WebhookEvent::Empty));
    }

    #[test]
    fn unsupported_kind_still_parses() {
        let json = serde_json::json!({
            "entry": [{"changes": [{"value": {"messages": [{
                "from": "15551230001",
                "id": "wamid.STICKER",
                "type": "sticker"
            }]}}]}]
        });
        let payload: WebhookPayload = serde_json::from_value(json).unwrap();
        match classify_payload(payload) {
            WebhookEvent::Messages(msgs) => assert_eq!(msgs[0].kind, "sticker"),
            other => panic!("expected Messages, got {other:?}"),
        }
    }
}
