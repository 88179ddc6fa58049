// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound
//! messages and captured outbound messages for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use kindred_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MessageId, OutboundMessage,
};
use kindred_core::{ChannelAdapter, KindredError, PluginAdapter};

/// A mock messaging channel for testing.
///
/// Provides two queues: messages injected via `inject_message()` are
/// returned by `receive()`, and messages passed to `send()` are captured
/// for retrieval via `sent_messages()`.
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    reactions: Arc<Mutex<Vec<(String, String, String)>>>,
    notify: Arc<Notify>,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            reactions: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Inject an inbound message; the next `receive()` returns it.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// All messages sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// All (recipient, message_id, emoji) reactions sent.
    pub async fn reactions(&self) -> Vec<(String, String, String)> {
        self.reactions.lock().await.clone()
    }

    /// Clear captured sent messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
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
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_voice: true,
            supports_images: true,
            supports_reactions: true,
            supports_read_receipts: false,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), KindredError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, KindredError> {
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }

    async fn receive(&self) -> Result<InboundMessage, KindredError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn react(
        &self,
        recipient: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), KindredError> {
        self.reactions.lock().await.push((
            recipient.to_string(),
            message_id.to_string(),
            emoji.to_string(),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::types::{MessageContent, OutboundPayload};

    fn make_inbound(text: &str) -> InboundMessage {
        InboundMessage {
            id: format!("test-{}", uuid::Uuid::new_v4()),
            session_id: None,
            channel: "mock".to_string(),
            sender_id: "test-user".to_string(),
            content: MessageContent::Text(text.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn receive_returns_injected_messages_in_order() {
        let channel = MockChannel::new();
        channel.inject_message(make_inbound("first")).await;
        channel.inject_message(make_inbound("second")).await;

        let m1 = channel.receive().await.unwrap();
        let m2 = channel.receive().await.unwrap();
        match (&m1.content, &m2.content) {
            (MessageContent::Text(a), MessageContent::Text(b)) => {
                assert_eq!(a, "first");
                assert_eq!(b, "second");
            }
            _ => panic!("expected text content"),
        }
    }

    #[tokio::test]
    async fn send_captures_outbound() {
        let channel = MockChannel::new();
        let msg = OutboundMessage {
            session_id: Some("s1".to_string()),
            channel: "mock".to_string(),
            payload: OutboundPayload::Text("reply".to_string()),
            metadata: None,
        };
        channel.send(msg).await.unwrap();

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].session_id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let channel = Arc::new(MockChannel::new());
        let channel_clone = channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            channel_clone.inject_message(make_inbound("delayed")).await;
        });

        let received = tokio::time::timeout(
            tokio::time::Duration::from_secs(2),
            channel.receive(),
        )
        .await
        .expect("receive timed out")
        .unwrap();
        assert!(matches!(received.content, MessageContent::Text(t) if t == "delayed"));
    }

    #[tokio::test]
    async fn reactions_are_captured() {
        let channel = MockChannel::new();
        channel.react("user-1", "msg-1", "✅").await.unwrap();
        let reactions = channel.reactions().await;
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].2, "✅");
    }
}
