// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp webhook route handlers: verification handshake and event ingestion.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kindred_whatsapp::{classify_payload, WebhookEvent, WebhookPayload};
use tracing::{debug, info, warn};

use crate::server::GatewayState;

/// GET /webhook/whatsapp
///
/// Meta's verification handshake: echo `hub.challenge` when `hub.mode` is
/// "subscribe" and `hub.verify_token` matches the configured token.
pub async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);
    let challenge = params.get("hub.challenge").cloned().unwrap_or_default();

    let expected = state.verify_token.as_deref();
    if mode == Some("subscribe") && expected.is_some() && token == expected {
        info!("webhook verification succeeded");
        return (StatusCode::OK, challenge).into_response();
    }

    warn!(mode = ?mode, "webhook verification failed");
    (StatusCode::FORBIDDEN, "verification token mismatch").into_response()
}

/// POST /webhook/whatsapp
///
/// Ingests webhook events. User messages are handed to the WhatsApp
/// ingress on background tasks so the transport gets its ack immediately;
/// status updates and empty deliveries are acked and dropped. Malformed
/// JSON is rejected by the extractor with a client error before this
/// handler runs.
pub async fn receive_webhook(
    State(state): State<GatewayState>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    match classify_payload(payload) {
        WebhookEvent::Messages(messages) => {
            let Some(ingress) = state.whatsapp.clone() else {
                warn!("webhook delivered messages but no WhatsApp channel is configured");
                return (StatusCode::OK, "ignored").into_response();
            };

            debug!(count = messages.len(), "webhook messages received");
            for message in messages {
                let ingress = ingress.clone();
                tokio::spawn(async move {
                    ingress.accept(message).await;
                });
            }
            (StatusCode::OK, "processed").into_response()
        }
        WebhookEvent::Status => (StatusCode::OK, "status received").into_response(),
        WebhookEvent::Empty => (StatusCode::OK, "no messages").into_response(),
    }
}
