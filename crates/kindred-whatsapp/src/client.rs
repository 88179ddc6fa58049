// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Cloud (Graph) API.
//!
//! Covers the calls the companion needs: sending text and media messages,
//! uploading generated media, downloading user media (two-step: metadata
//! lookup, then binary fetch), read receipts, and emoji reactions.

use kindred_core::KindredError;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// Default Graph API host.
const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

fn channel_err(message: String) -> KindredError {
    KindredError::Channel {
        message,
        source: None,
    }
}

/// Response to a send-message call.
#[derive(Debug, Deserialize)]
struct SendResponse {
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// Response to a media upload.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

/// Media metadata returned for a media id.
#[derive(Debug, Deserialize)]
struct MediaMetadata {
    url: String,
    #[serde(default)]
    mime_type: Option<String>,
}

/// Downloaded user media.
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Client for the WhatsApp Cloud API.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    access_token: String,
    phone_number_id: String,
    api_version: String,
    base_url: String,
}

impl GraphClient {
    /// Creates a new Graph API client.
    pub fn new(
        access_token: String,
        phone_number_id: String,
        api_version: String,
    ) -> Result<Self, KindredError> {
        if access_token.is_empty() {
            return Err(KindredError::Config(
                "whatsapp.access_token is required".into(),
            ));
        }
        if phone_number_id.is_empty() {
            return Err(KindredError::Config(
                "whatsapp.phone_number_id is required".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| KindredError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            access_token,
            phone_number_id,
            api_version,
            base_url: GRAPH_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url, self.api_version, self.phone_number_id
        )
    }

    /// Sends a text message; returns the WhatsApp message id.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<String, KindredError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": {"body": body},
        });
        self.post_message(payload).await
    }

    /// Sends previously uploaded media (`kind` is "audio" or "image").
    pub async fn send_media(
        &self,
        to: &str,
        kind: &str,
        media_id: &str,
    ) -> Result<String, KindredError> {
        let mut payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": kind,
        });
        payload[kind] = json!({"id": media_id});
        self.post_message(payload).await
    }

    /// Marks an inbound message as read (blue ticks).
    pub async fn mark_as_read(&self, message_id: &str) -> Result<(), KindredError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
        });
        self.post_message(payload).await.map(|_| ())
    }

    /// Reacts to an inbound message with an emoji.
    pub async fn send_reaction(
        &self,
        to: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), KindredError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "reaction",
            "reaction": {"message_id": message_id, "emoji": emoji},
        });
        self.post_message(payload).await.map(|_| ())
    }

    /// Uploads media bytes, returning the media id for sending.
    pub async fn upload_media(
        &self,
        data: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, KindredError> {
        let url = format!(
            "{}/{}/{}/media",
            self.base_url, self.api_version, self.phone_number_id
        );

        let part = reqwest::multipart::Part::bytes(data)
            .file_name("media")
            .mime_str(mime_type)
            .map_err(|e| channel_err(format!("invalid media mime type `{mime_type}`: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("messaging_product", "whatsapp")
            .text("type", mime_type.to_string());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| KindredError::Channel {
                message: format!("media upload failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(channel_err(format!("media upload returned {status}: {body}")));
        }

        let parsed: UploadResponse = response.json().await.map_err(|e| {
            channel_err(format!("failed to parse upload response: {e}"))
        })?;
        debug!(media_id = parsed.id.as_str(), "media uploaded");
        Ok(parsed.id)
    }

    /// Downloads user media by id: metadata lookup, then binary fetch.
    pub async fn download_media(&self, media_id: &str) -> Result<DownloadedMedia, KindredError> {
        let meta_url = format!("{}/{}/{}", self.base_url, self.api_version, media_id);
        let meta_response = self
            .client
            .get(&meta_url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| KindredError::Channel {
                message: format!("media metadata lookup failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = meta_response.status();
        if !status.is_success() {
            let body = meta_response.text().await.unwrap_or_default();
            return Err(channel_err(format!(
                "media metadata lookup returned {status}: {body}"
            )));
        }

        let metadata: MediaMetadata = meta_response.json().await.map_err(|e| {
            channel_err(format!("failed to parse media metadata: {e}"))
        })?;

        let media_response = self
            .client
            .get(&metadata.url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| KindredError::Channel {
                message: format!("media download failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = media_response.status();
        if !status.is_success() {
            return Err(channel_err(format!("media download returned {status}")));
        }

        let data = media_response
            .bytes()
            .await
            .map_err(|e| KindredError::Channel {
                message: format!("failed to read media body: {e}"),
                source: Some(Box::new(e)),
            })?
            .to_vec();

        debug!(media_id, bytes = data.len(), "media downloaded");
        Ok(DownloadedMedia {
            data,
            mime_type: metadata
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        })
    }

    /// POSTs to the messages endpoint and extracts the sent message id.
    async fn post_message(&self, payload: serde_json::Value) -> Result<String, KindredError> {
        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| KindredError::Channel {
                message: format!("message send failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Graph API call failed");
            return Err(channel_err(format!("Graph API returned {status}: {body}")));
        }

        // Status-only calls (read receipts) return {"success": true} with
        // no messages array.
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<SendResponse>(&body) {
            Ok(sent) => Ok(sent
                .messages
                .into_iter()
                .next()
                .map(|m| m.id)
                .unwrap_or_default()),
            Err(_) => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> GraphClient {
        GraphClient::new("EAAG-token".into(), "10987654321".into(), "v21.0".into())
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    #[test]
    fn missing_credentials_rejected() {
        assert!(GraphClient::new(String::new(), "1".into(), "v21.0".into()).is_err());
        assert!(GraphClient::new("t".into(), String::new(), "v21.0".into()).is_err());
    }

    #[tokio::test]
    async fn send_text_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/10987654321/messages"))
            .and(header("authorization", "Bearer EAAG-token"))
            .and(body_partial_json(serde_json::json!({
                "type": "text",
                "to": "15551230001",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "messages": [{"id": "wamid.ABC123"}]
            })))
            .mount(&server)
            .await;

        let id = client(&server.uri())
            .send_text("15551230001", "hey!")
            .await
            .unwrap();
        assert_eq!(id, "wamid.ABC123");
    }

    #[tokio::test]
    async fn send_media_references_uploaded_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/10987654321/messages"))
            .and(body_partial_json(serde_json::json!({
                "type": "audio",
                "audio": {"id": "media-77"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "wamid.AUDIO"}]
            })))
            .mount(&server)
            .await;

        let id = client(&server.uri())
            .send_media("15551230001", "audio", "media-77")
            .await
            .unwrap();
        assert_eq!(id, "wamid.AUDIO");
    }

    #[tokio::test]
    async fn mark_as_read_accepts_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/10987654321/messages"))
            .and(body_partial_json(serde_json::json!({"status": "read"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
            )
            .mount(&server)
            .await;

        client(&server.uri()).mark_as_read("wamid.IN").await.unwrap();
    }

    #[tokio::test]
    async fn send_reaction_posts_emoji() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/10987654321/messages"))
            .and(body_partial_json(serde_json::json!({
                "type": "reaction",
                "reaction": {"message_id": "wamid.IN", "emoji": "👀"},
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
            )
            .mount(&server)
            .await;

        client(&server.uri())
            .send_reaction("15551230001", "wamid.IN", "👀")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upload_media_returns_media_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/10987654321/media"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "media-42"})),
            )
            .mount(&server)
            .await;

        let id = client(&server.uri())
            .upload_media(vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(id, "media-42");
    }

    #[tokio::test]
    async fn download_media_follows_metadata_url() {
        let server = MockServer::start().await;
        let media_url = format!("{}/binary/media-9", server.uri());

        Mock::given(method("GET"))
            .and(path("/v21.0/media-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": media_url,
                "mime_type": "audio/ogg",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/binary/media-9"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7, 8, 9]))
            .mount(&server)
            .await;

        let media = client(&server.uri()).download_media("media-9").await.unwrap();
        assert_eq!(media.data, vec![7, 8, 9]);
        assert_eq!(media.mime_type, "audio/ogg");
    }

    #[tokio::test]
    async fn graph_error_surfaces_as_channel_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/10987654321/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Invalid OAuth access token"}
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .send_text("15551230001", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, KindredError::Channel { .. }));
        assert!(err.to_string().contains("401"));
    }
}
