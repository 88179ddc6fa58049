// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel multiplexer that aggregates multiple ChannelAdapters into one.
//!
//! The multiplexer spawns a receive task per child channel that forwards
//! inbound messages to a shared queue. Outbound messages are routed back
//! to the originating channel by the envelope's `channel` field.

use std::sync::Arc;

use async_trait::async_trait;
use kindred_core::types::{
    ChannelCapabilities, InboundMessage, MessageId, OutboundMessage,
};
use kindred_core::{
    AdapterType, ChannelAdapter, HealthStatus, KindredError, PluginAdapter,
};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

/// Aggregates multiple channel adapters behind a single [`ChannelAdapter`].
pub struct ChannelMultiplexer {
    /// Named child channels, held here until `connect()`.
    pending_channels: Vec<(String, Box<dyn ChannelAdapter>)>,
    /// Connected child channels.
    connected_channels: Vec<(String, Arc<dyn ChannelAdapter>)>,
    /// Shared inbound receiver.
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    /// Shared inbound sender, cloned per receive task.
    inbound_tx: mpsc::Sender<InboundMessage>,
}

impl Default for ChannelMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelMultiplexer {
    /// Create a new empty multiplexer.
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(512);
        Self {
            pending_channels: Vec::new(),
            connected_channels: Vec::new(),
            inbound_rx: Mutex::new(inbound_rx),
            inbound_tx,
        }
    }

    /// Add a named channel. Must be called before `connect()`; the name
    /// routes outbound messages back to the right channel.
    pub fn add_channel(&mut self, name: String, channel: Box<dyn ChannelAdapter>) {
        self.pending_channels.push((name, channel));
    }

    /// Number of channels registered.
    pub fn channel_count(&self) -> usize {
        self.pending_channels.len() + self.connected_channels.len()
    }

    /// Look up a connected child channel by name.
    fn channel_by_name(&self, name: &str) -> Option<&Arc<dyn ChannelAdapter>> {
        self.connected_channels
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }
}

#[async_trait]
impl PluginAdapter for ChannelMultiplexer {
    fn name(&self) -> &str {
        "multiplexer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        let mut problems = Vec::new();
        for (name, channel) in &self.connected_channels {
            match channel.health_check().await? {
                HealthStatus::Healthy => {}
                HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
                    problems.push(format!("{name}: {reason}"));
                }
            }
        }
        if problems.is_empty() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(problems.join("; ")))
        }
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        for (name, channel) in &self.connected_channels {
            if let Err(e) = channel.shutdown().await {
                warn!(channel = name.as_str(), error = %e, "channel shutdown error");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for ChannelMultiplexer {
    fn capabilities(&self) -> ChannelCapabilities {
        // The mux itself claims the union a caller can rely on per-message;
        // individual sends resolve against the target channel.
        ChannelCapabilities {
            supports_voice: true,
            supports_images: true,
            supports_reactions: true,
            supports_read_receipts: true,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), KindredError> {
        for (name, mut channel) in self.pending_channels.drain(..) {
            channel.connect().await?;
            let channel: Arc<dyn ChannelAdapter> = Arc::from(channel);

            let tx = self.inbound_tx.clone();
            let task_channel = Arc::clone(&channel);
            let task_name = name.clone();
            tokio::spawn(async move {
                loop {
                    match task_channel.receive().await {
                        Ok(mut inbound) => {
                            inbound.channel = task_name.clone();
                            if tx.send(inbound).await.is_err() {
                                warn!(
                                    channel = task_name.as_str(),
                                    "mux inbound queue closed, stopping receive task"
                                );
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(
                                channel = task_name.as_str(),
                                error = %e,
                                "channel receive failed, stopping receive task"
                            );
                            break;
                        }
                    }
                }
            });

            info!(channel = name.as_str(), "channel connected to multiplexer");
            self.connected_channels.push((name, channel));
        }
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, KindredError> {
        let Some(channel) = self.channel_by_name(&msg.channel) else {
            return Err(KindredError::Channel {
                message: format!("no channel named `{}` in multiplexer", msg.channel),
                source: None,
            });
        };
        channel.send(msg).await
    }

    async fn receive(&self) -> Result<InboundMessage, KindredError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| KindredError::Channel {
            message: "multiplexer inbound queue closed".into(),
            source: None,
        })
    }

    async fn react(
        &self,
        recipient: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), KindredError> {
        // Reactions are per-channel; callers route via send()'s channel
        // name, so try each child that supports reactions.
        for (_, channel) in &self.connected_channels {
            if channel.capabilities().supports_reactions {
                return channel.react(recipient, message_id, emoji).await;
            }
        }
        Ok(())
    }
}
