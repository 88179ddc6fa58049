// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent loop and session management for the Kindred companion.
//!
//! The [`AgentLoop`] is the central coordinator that:
//! - Receives messages from a channel adapter (usually the multiplexer)
//! - Resolves or creates the per-sender session
//! - Runs the turn controller through a session actor
//! - Delivers the resulting payloads back through the channel

pub mod channel_mux;
pub mod context;
pub mod prompts;
pub mod router;
pub mod schedule;
pub mod session;
pub mod turn;

use std::collections::HashMap;
use std::sync::Arc;

use kindred_core::types::{InboundMessage, Session};
use kindred_core::{ChannelAdapter, KindredError, StorageAdapter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use channel_mux::ChannelMultiplexer;
pub use context::ContextAssembler;
pub use router::{ResponseRouter, Workflow};
pub use session::SessionActor;
pub use turn::{MemorySystem, TurnController, TurnOutcome};

/// The main agent loop coordinating channel, sessions, and turn controller.
pub struct AgentLoop {
    channel: Box<dyn ChannelAdapter>,
    storage: Arc<dyn StorageAdapter>,
    turn: Arc<TurnController>,
    history_window: i64,
    sessions: HashMap<String, SessionActor>,
}

impl AgentLoop {
    /// Creates a new agent loop.
    pub fn new(
        channel: Box<dyn ChannelAdapter>,
        storage: Arc<dyn StorageAdapter>,
        turn: Arc<TurnController>,
        history_window: i64,
    ) -> Self {
        Self {
            channel,
            storage,
            turn,
            history_window,
            sessions: HashMap::new(),
        }
    }

    /// Runs the loop until the cancellation token is triggered.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), KindredError> {
        info!("agent loop running");

        loop {
            tokio::select! {
                msg = self.channel.receive() => {
                    match msg {
                        Ok(inbound) => {
                            if let Err(e) = self.handle_inbound(inbound).await {
                                error!(error = %e, "failed to handle inbound message");
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        self.storage.close().await?;
        info!("agent loop stopped");
        Ok(())
    }

    /// Handles a single inbound message: resolves the session, runs the
    /// turn, and delivers every payload.
    async fn handle_inbound(&mut self, inbound: InboundMessage) -> Result<(), KindredError> {
        let sender_id = inbound.sender_id.clone();
        let channel_name = inbound.channel.clone();
        let metadata = inbound.metadata.clone();

        debug!(
            sender_id = sender_id.as_str(),
            channel = channel_name.as_str(),
            "handling inbound message"
        );

        let session_key = format!("{channel_name}:{sender_id}");
        if !self.sessions.contains_key(&session_key) {
            let session_id = self
                .resolve_or_create_session(&sender_id, &channel_name)
                .await?;
            let actor = SessionActor::new(
                session_id,
                channel_name.clone(),
                self.storage.clone(),
                self.turn.clone(),
                self.history_window,
            );
            self.sessions.insert(session_key.clone(), actor);
        }

        let actor = self
            .sessions
            .get_mut(&session_key)
            .ok_or_else(|| KindredError::Internal(format!("no session actor for {session_key}")))?;

        let outbound = actor.handle_message(inbound).await;
        let session_id = actor.session_id().to_string();

        for msg in outbound {
            if let Err(e) = self.channel.send(msg).await {
                error!(error = %e, "failed to deliver outbound message");
            }
        }

        // Completion reaction, where the transport supports it.
        if let Some((recipient, message_id)) = reaction_target(&metadata) {
            if let Err(e) = self.channel.react(&recipient, &message_id, "✅").await {
                debug!(error = %e, "failed to send completion reaction");
            }
        }

        info!(session_id = session_id.as_str(), "turn delivered");
        Ok(())
    }

    /// Resolves an existing session for the sender or creates a new one.
    async fn resolve_or_create_session(
        &mut self,
        sender_id: &str,
        channel: &str,
    ) -> Result<String, KindredError> {
        // Look for an existing active session in storage.
        let active_sessions = self.storage.list_sessions(Some("active")).await?;
        for session in &active_sessions {
            if session.channel == channel && session.user_id.as_deref() == Some(sender_id) {
                debug!(session_id = session.id.as_str(), "resuming existing session");
                return Ok(session.id.clone());
            }
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let new_session = Session {
            id: session_id.clone(),
            channel: channel.to_string(),
            user_id: Some(sender_id.to_string()),
            state: "active".to_string(),
            metadata: None,
            created_at: now.clone(),
            updated_at: now,
        };
        self.storage.create_session(&new_session).await?;

        info!(
            session_id = session_id.as_str(),
            sender_id = sender_id,
            channel = channel,
            "created new session"
        );
        Ok(session_id)
    }
}

/// Extracts the (recipient, message id) pair for the completion reaction
/// from inbound metadata, when the transport provided one.
fn reaction_target(metadata: &Option<String>) -> Option<(String, String)> {
    let meta = metadata.as_ref()?;
    let value: serde_json::Value = serde_json::from_str(meta).ok()?;
    let recipient = value.get("recipient")?.as_str()?.to_string();
    let message_id = value.get("message_id")?.as_str()?.to_string();
    Some((recipient, message_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_target_from_whatsapp_metadata() {
        let meta = Some(r#"{"recipient":"15551230001","message_id":"wamid.X"}"#.to_string());
        let (recipient, message_id) = reaction_target(&meta).unwrap();
        assert_eq!(recipient, "15551230001");
        assert_eq!(message_id, "wamid.X");
    }

    #[test]
    fn reaction_target_absent_for_debug_api() {
        let meta = Some(r#"{"request_id":"abc"}"#.to_string());
        assert!(reaction_target(&meta).is_none());
        assert!(reaction_target(&None).is_none());
    }

    #[test]
    fn reaction_target_tolerates_bad_json() {
        let meta = Some("not json".to_string());
        assert!(reaction_target(&meta).is_none());
    }
}
