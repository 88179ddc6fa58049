// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debug message API and health handlers.
//!
//! The debug API drives the same turn-controller path as WhatsApp: the
//! handler enqueues a canonical inbound message tagged with a request id
//! and waits on a oneshot for the agent loop's reply.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kindred_core::types::{InboundMessage, MessageContent};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::server::GatewayState;

/// Request body for POST /v1/messages.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// Message text.
    pub content: String,
    /// Optional sender identity; defaults to a shared debug identity.
    #[serde(default)]
    pub sender_id: Option<String>,
}

/// Response body for POST /v1/messages.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Request id.
    pub id: String,
    /// Reply text from the companion.
    pub content: String,
    /// ISO 8601 timestamp of the request.
    pub created_at: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Seconds since gateway start.
    pub uptime_secs: u64,
}

/// POST /v1/messages
///
/// Runs one debug turn and returns the text reply.
pub async fn post_messages(
    State(state): State<GatewayState>,
    Json(body): Json<MessageRequest>,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let sender_id = body.sender_id.unwrap_or_else(|| "debug-user".to_string());

    let inbound = InboundMessage {
        id: request_id.clone(),
        session_id: None,
        channel: "api".to_string(),
        sender_id,
        content: MessageContent::Text(body.content),
        timestamp: now.clone(),
        metadata: Some(
            serde_json::json!({
                "request_id": request_id,
            })
            .to_string(),
        ),
    };

    let (tx, rx) = oneshot::channel::<String>();
    state.response_map.insert(request_id.clone(), tx);

    match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state.inbound_tx.send(inbound),
    )
    .await
    {
        Ok(Ok(())) => {}
        Ok(Err(_)) => {
            state.response_map.remove(&request_id);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "agent loop not accepting messages".to_string(),
                }),
            )
                .into_response();
        }
        Err(_) => {
            state.response_map.remove(&request_id);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "inbound channel full".to_string(),
                }),
            )
                .into_response();
        }
    }

    match tokio::time::timeout(std::time::Duration::from_secs(120), rx).await {
        Ok(Ok(content)) => (
            StatusCode::OK,
            Json(MessageResponse {
                id: request_id,
                content,
                created_at: now,
            }),
        )
            .into_response(),
        Ok(Err(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "response channel closed".to_string(),
            }),
        )
            .into_response(),
        Err(_) => {
            state.response_map.remove(&request_id);
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorResponse {
                    error: "response timeout (120s)".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_request_defaults_sender() {
        let req: MessageRequest = serde_json::from_str(r#"{"content": "hello"}"#).unwrap();
        assert_eq!(req.content, "hello");
        assert!(req.sender_id.is_none());
    }

    #[test]
    fn message_request_with_sender() {
        let req: MessageRequest =
            serde_json::from_str(r#"{"content": "hi", "sender_id": "alice"}"#).unwrap();
        assert_eq!(req.sender_id.as_deref(), Some("alice"));
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".into(),
            version: "0.1.0".into(),
            uptime_secs: 12,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":12"));
    }

    #[test]
    fn error_response_serializes() {
        let resp = ErrorResponse {
            error: "boom".into(),
        };
        assert!(serde_json::to_string(&resp).unwrap().contains("boom"));
    }
}
