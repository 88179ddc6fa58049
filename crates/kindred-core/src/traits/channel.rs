// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging transport integrations (WhatsApp, debug API).

use async_trait::async_trait;

use crate::error::KindredError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundMessage, MessageId, OutboundMessage};

/// Adapter for bidirectional messaging transport integrations.
///
/// Channel adapters connect Kindred to external messaging platforms,
/// handling message ingestion and delivery. Reaction and read-receipt
/// methods default to no-ops for transports that do not support them.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging transport.
    async fn connect(&mut self) -> Result<(), KindredError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, KindredError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, KindredError>;

    /// Marks an inbound message as read (read receipts).
    async fn mark_read(&self, _message_id: &str) -> Result<(), KindredError> {
        Ok(())
    }

    /// Reacts to an inbound message with an emoji.
    async fn react(
        &self,
        _recipient: &str,
        _message_id: &str,
        _emoji: &str,
    ) -> Result<(), KindredError> {
        Ok(())
    }
}
