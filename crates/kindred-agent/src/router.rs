// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response-mode routing: conversation, image, or audio.
//!
//! Routing is an LLM call with a constrained prompt because the rules are
//! semantic (distinguishing "show me a picture" from "what's in this
//! picture"). Inputs carrying the user-image tag short-circuit to
//! conversation, and every failure path defaults to conversation.

use kindred_core::types::{ContentBlock, ProviderMessage, ProviderRequest};
use kindred_core::ProviderAdapter;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::prompts::{ROUTER_PROMPT, USER_IMAGE_TAG};

/// How the companion should respond this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    /// Plain text reply.
    Conversation,
    /// Generate and send an image.
    Image,
    /// Synthesize and send a voice note.
    Audio,
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Workflow::Conversation => write!(f, "conversation"),
            Workflow::Image => write!(f, "image"),
            Workflow::Audio => write!(f, "audio"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RouterVerdict {
    mode: String,
}

/// Routes each turn to a response mode via the small model.
pub struct ResponseRouter {
    /// Small model used for routing calls.
    model: String,
}

impl ResponseRouter {
    /// Creates a router using the given model.
    pub fn new(model: String) -> Self {
        Self { model }
    }

    /// Decide the workflow for the normalized input.
    ///
    /// `recent` is the last few conversation lines, oldest first, used to
    /// give the router minimal context. Never fails: user-image inputs and
    /// every error path resolve to [`Workflow::Conversation`].
    pub async fn route(
        &self,
        provider: &dyn ProviderAdapter,
        normalized_text: &str,
        recent: &[(String, String)],
    ) -> Workflow {
        // A photo from the user is always something to talk about.
        if normalized_text.contains(USER_IMAGE_TAG) {
            return Workflow::Conversation;
        }

        let mut conversation = String::new();
        for (role, text) in recent.iter().rev().take(4).rev() {
            conversation.push_str(&format!("{role}: {text}\n"));
        }
        conversation.push_str(&format!("user: {normalized_text}\n"));

        let prompt = ROUTER_PROMPT.replace("{conversation}", &conversation);
        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: None,
            messages: vec![ProviderMessage {
                role: "user".to_string(),
                content: vec![ContentBlock::Text { text: prompt }],
            }],
            max_tokens: 32,
            temperature: Some(0.0),
            stream: false,
            json_mode: true,
        };

        let verdict = match provider.complete(request).await {
            Ok(response) => parse_verdict(&response.content),
            Err(e) => {
                warn!(error = %e, "router call failed, defaulting to conversation");
                Workflow::Conversation
            }
        };

        debug!(workflow = %verdict, "turn routed");
        verdict
    }
}

/// Parse the router's response; anything unrecognized is conversation.
fn parse_verdict(response: &str) -> Workflow {
    let trimmed = response.trim();

    // Preferred shape: {"mode": "..."}
    if let Some(start) = trimmed.find('{')
        && let Some(end) = trimmed.rfind('}')
        && start < end
        && let Ok(verdict) = serde_json::from_str::<RouterVerdict>(&trimmed[start..=end])
    {
        return match verdict.mode.as_str() {
            "image" => Workflow::Image,
            "audio" => Workflow::Audio,
            _ => Workflow::Conversation,
        };
    }

    // Lenient fallback: bare keyword somewhere in the reply.
    let lower = trimmed.to_lowercase();
    if lower.contains("\"image\"") || lower == "image" {
        Workflow::Image
    } else if lower.contains("\"audio\"") || lower == "audio" {
        Workflow::Audio
    } else {
        Workflow::Conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_modes() {
        assert_eq!(parse_verdict(r#"{"mode": "conversation"}"#), Workflow::Conversation);
        assert_eq!(parse_verdict(r#"{"mode": "image"}"#), Workflow::Image);
        assert_eq!(parse_verdict(r#"{"mode": "audio"}"#), Workflow::Audio);
    }

    #[test]
    fn parse_fenced_json() {
        let response = "```json\n{\"mode\": \"image\"}\n```";
        assert_eq!(parse_verdict(response), Workflow::Image);
    }

    #[test]
    fn parse_bare_keyword() {
        assert_eq!(parse_verdict("audio"), Workflow::Audio);
        assert_eq!(parse_verdict("image"), Workflow::Image);
    }

    #[test]
    fn parse_garbage_defaults_to_conversation() {
        assert_eq!(parse_verdict("I think a picture would be nice"), Workflow::Conversation);
        assert_eq!(parse_verdict(""), Workflow::Conversation);
        assert_eq!(parse_verdict(r#"{"mode": "video"}"#), Workflow::Conversation);
    }

    #[test]
    fn workflow_display() {
        assert_eq!(Workflow::Conversation.to_string(), "conversation");
        assert_eq!(Workflow::Image.to_string(), "image");
        assert_eq!(Workflow::Audio.to_string(), "audio");
    }
}
