// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway implementing ChannelAdapter.
//!
//! The gateway hosts two surfaces on one axum server: the WhatsApp
//! webhook (verification + event ingestion, forwarded to the WhatsApp
//! channel's ingress) and a debug message API that drives the same turn
//! path as a transport channel. By implementing [`ChannelAdapter`], the
//! debug API reuses the agent loop and session handling unchanged.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use kindred_core::types::{
    ChannelCapabilities, InboundMessage, MessageId, OutboundMessage, OutboundPayload,
};
use kindred_core::{AdapterType, ChannelAdapter, HealthStatus, KindredError, PluginAdapter};
use kindred_whatsapp::WhatsAppIngress;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::auth::AuthConfig;
use crate::server::{GatewayState, ServerConfig};

/// Gateway channel configuration.
#[derive(Clone)]
pub struct GatewayChannelConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Bearer token for the debug API. `None` keeps it fail-closed.
    pub bearer_token: Option<String>,
    /// Expected webhook verification token.
    pub verify_token: Option<String>,
    /// WhatsApp ingress for webhook-delivered messages.
    pub whatsapp: Option<WhatsAppIngress>,
}

impl std::fmt::Debug for GatewayChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayChannelConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[redacted]"))
            .field("verify_token", &self.verify_token.as_ref().map(|_| "[redacted]"))
            .field("whatsapp", &self.whatsapp.is_some())
            .finish()
    }
}

/// HTTP gateway implementing [`ChannelAdapter`] for the debug API.
///
/// The axum server runs as a background task. Debug-API handlers create
/// inbound messages and push them to an mpsc channel; `receive()` reads
/// from it, and `send()` routes replies back to the waiting handler via
/// a oneshot map keyed by request id.
pub struct GatewayChannel {
    config: GatewayChannelConfig,
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    response_map: Arc<DashMap<String, oneshot::Sender<String>>>,
    server_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl GatewayChannel {
    /// Create a new gateway channel.
    pub fn new(config: GatewayChannelConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(256);
        Self {
            config,
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            response_map: Arc::new(DashMap::new()),
            server_handle: Mutex::new(None),
        }
    }
}

/// Renders an outbound payload as debug-API text.
fn payload_to_text(payload: &OutboundPayload) -> String {
    match payload {
        OutboundPayload::Text(text) => text.clone(),
        OutboundPayload::Audio { data, .. } => {
            format!("[voice reply, {} bytes of audio]", data.len())
        }
        OutboundPayload::Image { caption, data, .. } => match caption {
            Some(caption) => format!("[image reply, {} bytes] {caption}", data.len()),
            None => format!("[image reply, {} bytes]", data.len()),
        },
    }
}

/// Extracts the request id from outbound metadata.
fn extract_request_id(msg: &OutboundMessage) -> Option<String> {
    msg.metadata.as_ref().and_then(|m| {
        serde_json::from_str::<serde_json::Value>(m)
            .ok()
            .and_then(|v| {
                v.get("request_id")
                    .and_then(|r| r.as_str())
                    .map(String::from)
            })
    })
}

#[async_trait]
impl PluginAdapter for GatewayChannel {
    fn name(&self) -> &str {
        "gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        let handle = self.server_handle.lock().await;
        if handle.is_some() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("server not started".to_string()))
        }
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        let mut handle = self.server_handle.lock().await;
        if let Some(h) = handle.take() {
            h.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for GatewayChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_voice: false,
            supports_images: false,
            supports_reactions: false,
            supports_read_receipts: false,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), KindredError> {
        let server_config = ServerConfig {
            host: self.config.host.clone(),
            port: self.config.port,
        };

        let state = GatewayState {
            inbound_tx: self.inbound_tx.clone(),
            response_map: Arc::clone(&self.response_map),
            auth: AuthConfig {
                bearer_token: self.config.bearer_token.clone(),
            },
            verify_token: self.config.verify_token.clone(),
            whatsapp: self.config.whatsapp.clone(),
            start_time: std::time::Instant::now(),
        };

        let handle = tokio::spawn(async move {
            if let Err(e) = server::start_server(&server_config, state).await {
                tracing::error!("gateway server error: {e}");
            }
        });

        let mut server_handle = self.server_handle.lock().await;
        *server_handle = Some(handle);

        tracing::info!(
            "gateway channel connected on {}:{}",
            self.config.host,
            self.config.port
        );
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, KindredError> {
        let request_id = extract_request_id(&msg).unwrap_or_default();
        let content = payload_to_text(&msg.payload);

        if !request_id.is_empty() {
            if let Some((_, sender)) = self.response_map.remove(&request_id) {
                let _ = sender.send(content);
                return Ok(MessageId(request_id));
            }
        }

        tracing::warn!(
            request_id = request_id.as_str(),
            "no waiting handler for debug response"
        );
        Ok(MessageId(request_id))
    }

    async fn receive(&self) -> Result<InboundMessage, KindredError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| KindredError::Channel {
            message: "gateway inbound channel closed".to_string(),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GatewayChannelConfig {
        GatewayChannelConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            bearer_token: Some("token".to_string()),
            verify_token: Some("verify".to_string()),
            whatsapp: None,
        }
    }

    #[test]
    fn channel_metadata() {
        let channel = GatewayChannel::new(test_config());
        assert_eq!(channel.name(), "gateway");
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }

    #[test]
    fn config_debug_redacts_secrets() {
        let output = format!("{:?}", test_config());
        assert!(!output.contains("token\""));
        assert!(output.contains("[redacted]"));
    }

    #[tokio::test]
    async fn health_is_unhealthy_before_connect() {
        let channel = GatewayChannel::new(test_config());
        match channel.health_check().await.unwrap() {
            HealthStatus::Unhealthy(msg) => assert!(msg.contains("not started")),
            other => panic!("expected Unhealthy, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_resolves_waiting_handler() {
        let channel = GatewayChannel::new(test_config());
        let (tx, rx) = oneshot::channel();
        channel.response_map.insert("req-1".to_string(), tx);

        let msg = OutboundMessage {
            session_id: Some("s1".to_string()),
            channel: "api".to_string(),
            payload: OutboundPayload::Text("the reply".to_string()),
            metadata: Some(r#"{"request_id":"req-1"}"#.to_string()),
        };
        channel.send(msg).await.unwrap();

        assert_eq!(rx.await.unwrap(), "the reply");
        assert!(channel.response_map.is_empty());
    }

    #[test]
    fn payload_rendering_for_debug_surface() {
        assert_eq!(
            payload_to_text(&OutboundPayload::Text("hi".into())),
            "hi"
        );
        let audio = payload_to_text(&OutboundPayload::Audio {
            data: vec![0; 10],
            mime_type: "audio/mpeg".into(),
        });
        assert!(audio.contains("voice reply"));
        let image = payload_to_text(&OutboundPayload::Image {
            data: vec![0; 5],
            mime_type: "image/png".into(),
            caption: Some("sunset".into()),
        });
        assert!(image.contains("sunset"));
    }

    #[test]
    fn extract_request_id_from_metadata() {
        let msg = OutboundMessage {
            session_id: None,
            channel: "api".into(),
            payload: OutboundPayload::Text("x".into()),
            metadata: Some(r#"{"request_id":"abc"}"#.into()),
        };
        assert_eq!(extract_request_id(&msg).as_deref(), Some("abc"));
    }
}
