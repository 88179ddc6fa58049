// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for Groq streamed chat completions.
//!
//! Converts a reqwest response byte stream into typed [`ChatChunk`]s using
//! the `eventsource-stream` crate. The OpenAI-compatible protocol sends
//! unnamed events whose data is a JSON chunk, terminated by a literal
//! `[DONE]` sentinel.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use kindred_core::KindredError;

use crate::types::ChatChunk;

/// Parses a reqwest streaming response into a stream of [`ChatChunk`]s.
///
/// The `[DONE]` sentinel ends the stream; data that fails to parse as a
/// chunk surfaces as a provider error so the consumer can abort cleanly.
pub fn parse_chunk_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, KindredError>> + Send>> {
    let event_stream = response.bytes_stream().eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = event.data.trim();
                if data == "[DONE]" || data.is_empty() {
                    return None;
                }
                Some(
                    serde_json::from_str::<ChatChunk>(data).map_err(|e| {
                        KindredError::Provider {
                            message: format!("failed to parse stream chunk: {e}"),
                            source: Some(Box::new(e)),
                        }
                    }),
                )
            }
            Err(e) => Some(Err(KindredError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}
