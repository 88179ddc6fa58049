// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state:
//! - `GET /health`: unauthenticated liveness probe
//! - `GET/POST /webhook/whatsapp`: Meta verification handshake + events
//! - `POST /v1/messages`: bearer-authenticated debug message API

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use kindred_core::types::InboundMessage;
use kindred_core::KindredError;
use kindred_whatsapp::WhatsAppIngress;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;
use crate::webhook;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Channel for sending debug-API messages to the agent loop.
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    /// Map of request_id -> oneshot sender for debug-API response routing.
    pub response_map: Arc<DashMap<String, oneshot::Sender<String>>>,
    /// Authentication configuration for /v1 routes.
    pub auth: AuthConfig,
    /// Expected webhook verification token.
    pub verify_token: Option<String>,
    /// Ingress for parsed WhatsApp webhook messages, when the channel is up.
    pub whatsapp: Option<WhatsAppIngress>,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

/// Gateway server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router over the given state.
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/webhook/whatsapp",
            get(webhook::verify_webhook).post(webhook::receive_webhook),
        )
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/messages", post(handlers::post_messages))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway HTTP server and serve until the process exits.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), KindredError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| KindredError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| KindredError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

/// Build a minimal state for handler tests.
#[cfg(test)]
pub fn test_state(verify_token: Option<String>) -> GatewayState {
    let (tx, _rx) = mpsc::channel(8);
    GatewayState {
        inbound_tx: tx,
        response_map: Arc::new(DashMap::new()),
        auth: AuthConfig { bearer_token: None },
        verify_token,
        whatsapp: None,
        start_time: Instant::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_state_is_clone() {
        let state = test_state(Some("t".into()));
        let _cloned = state.clone();
    }

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
        };
        assert!(format!("{config:?}").contains("8080"));
    }
}
