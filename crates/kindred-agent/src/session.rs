// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session actor owning persistence and turn execution.
//!
//! Each session moves through Idle -> Processing -> Idle per turn. The
//! actor loads the history window, runs the turn controller, persists
//! both sides of the exchange, and maps payloads to outbound messages.
//! Persistence failures are logged, never fatal to the turn.

use std::sync::Arc;

use kindred_core::types::{
    InboundMessage, MessageRecord, Modality, OutboundMessage,
};
use kindred_core::StorageAdapter;
use tracing::{debug, warn};

use crate::turn::TurnController;

/// States in the session FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for a new message.
    Idle,
    /// Running a turn.
    Processing,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Processing => write!(f, "processing"),
        }
    }
}

/// Manages turn execution and persistence for a single session.
pub struct SessionActor {
    session_id: String,
    channel: String,
    state: SessionState,
    storage: Arc<dyn StorageAdapter>,
    turn: Arc<TurnController>,
    history_window: i64,
}

impl SessionActor {
    /// Creates a new session actor.
    pub fn new(
        session_id: String,
        channel: String,
        storage: Arc<dyn StorageAdapter>,
        turn: Arc<TurnController>,
        history_window: i64,
    ) -> Self {
        Self {
            session_id,
            channel,
            state: SessionState::Idle,
            storage,
            turn,
            history_window,
        }
    }

    /// Returns the session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the channel this session belongs to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handles one inbound message end to end.
    ///
    /// Returns the outbound messages to deliver; the list is never empty
    /// because the turn controller always degrades to a text fallback.
    pub async fn handle_message(
        &mut self,
        mut inbound: InboundMessage,
    ) -> Vec<OutboundMessage> {
        self.state = SessionState::Processing;
        inbound.session_id = Some(self.session_id.clone());

        // History window, oldest first, excluding the current message.
        let history = match self
            .storage
            .get_messages(&self.session_id, Some(self.history_window))
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "failed to load history, running turn without it");
                vec![]
            }
        };

        let outcome = self.turn.run_turn(&inbound, &history).await;

        // Persist the inbound envelope with its normalized text.
        let now = chrono::Utc::now().to_rfc3339();
        let inbound_record = MessageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: self.session_id.clone(),
            direction: "inbound".to_string(),
            modality: outcome.modality,
            content: outcome.normalized_text.clone(),
            metadata: inbound.metadata.clone(),
            created_at: now.clone(),
        };
        if let Err(e) = self.storage.insert_message(&inbound_record).await {
            warn!(error = %e, "failed to persist inbound message");
        }

        // Persist the reply text (media replies log their caption text).
        let outbound_record = MessageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: self.session_id.clone(),
            direction: "outbound".to_string(),
            modality: Modality::Text,
            content: outcome.reply_text.clone(),
            metadata: None,
            created_at: now,
        };
        if let Err(e) = self.storage.insert_message(&outbound_record).await {
            warn!(error = %e, "failed to persist outbound message");
        }

        debug!(
            session_id = self.session_id.as_str(),
            payloads = outcome.payloads.len(),
            "turn persisted"
        );

        let messages = outcome
            .payloads
            .into_iter()
            .map(|payload| OutboundMessage {
                session_id: Some(self.session_id.clone()),
                channel: self.channel.clone(),
                payload,
                metadata: inbound.metadata.clone(),
            })
            .collect();

        self.state = SessionState::Idle;
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Processing.to_string(), "processing");
    }
}
