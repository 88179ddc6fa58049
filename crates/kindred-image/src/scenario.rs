// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-assisted scenario building and visual prompt enhancement.
//!
//! When the user asks for a picture, the companion first imagines a
//! first-person scene grounded in the recent conversation, then enriches
//! the visual prompt with style and lighting detail before handing it to
//! the image generator. Both steps fall back to canned output so a model
//! hiccup never blocks the image.

use kindred_core::types::{ContentBlock, ProviderMessage, ProviderRequest};
use kindred_core::ProviderAdapter;
use serde::Deserialize;
use tracing::warn;

/// Prompt asking the model to imagine a scene. `{chat_history}` is
/// substituted per call.
const SCENARIO_PROMPT: &str = r#"You are imagining a scene from your own life that fits the recent conversation below. Answer with a single JSON object holding two fields:
- "narrative": a short, casual first-person message describing what you're up to (one or two sentences)
- "image_prompt": a detailed visual description of that scene for an image generator (subject, setting, lighting, style)

Recent conversation:
{chat_history}

JSON:"#;

/// Prompt asking the model to enrich a raw visual prompt. `{prompt}` is
/// substituted per call.
const ENHANCEMENT_PROMPT: &str = r#"Rewrite the image prompt below into a single richer prompt for an image generator. Add concrete visual detail: setting, mood, lighting, composition, and style or camera hints where they fit. Keep it one paragraph. Answer with a JSON object: {"prompt": "..."}

Image prompt: {prompt}

JSON:"#;

/// A scene imagined from conversation context.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// First-person message sent alongside the image.
    pub narrative: String,
    /// Visual prompt handed to the image generator.
    pub image_prompt: String,
}

/// Enhancement response shape.
#[derive(Debug, Deserialize)]
struct EnhancedPrompt {
    prompt: String,
}

/// Builds scenarios and enhanced visual prompts via the provider.
pub struct ScenarioBuilder {
    /// Model used for both scenario and enhancement calls.
    model: String,
}

impl ScenarioBuilder {
    /// Creates a builder using the given model.
    pub fn new(model: String) -> Self {
        Self { model }
    }

    /// Imagines a scene from the last few conversation lines.
    ///
    /// Falls back to a generic scene on any provider or parse failure.
    pub async fn build_scenario(
        &self,
        provider: &dyn ProviderAdapter,
        history: &[(String, String)],
    ) -> Scenario {
        let formatted: String = history
            .iter()
            .rev()
            .take(5)
            .rev()
            .map(|(role, text)| format!("{role}: {text}\n"))
            .collect();
        let prompt = SCENARIO_PROMPT.replace("{chat_history}", &formatted);

        match self.json_call(provider, prompt).await {
            Some(value) => match serde_json::from_value::<Scenario>(value) {
                Ok(scenario)
                    if !scenario.narrative.trim().is_empty()
                        && !scenario.image_prompt.trim().is_empty() =>
                {
                    scenario
                }
                _ => fallback_scenario(),
            },
            None => fallback_scenario(),
        }
    }

    /// Enriches a visual prompt with detail.
    ///
    /// Falls back to the original prompt plus stock quality hints.
    pub async fn enhance_prompt(&self, provider: &dyn ProviderAdapter, prompt: &str) -> String {
        let request = ENHANCEMENT_PROMPT.replace("{prompt}", prompt);

        match self.json_call(provider, request).await {
            Some(value) => match serde_json::from_value::<EnhancedPrompt>(value) {
                Ok(enhanced) if !enhanced.prompt.trim().is_empty() => enhanced.prompt,
                _ => fallback_enhancement(prompt),
            },
            None => fallback_enhancement(prompt),
        }
    }

    /// One JSON-mode completion; `None` on any failure.
    async fn json_call(
        &self,
        provider: &dyn ProviderAdapter,
        prompt: String,
    ) -> Option<serde_json::Value> {
        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: None,
            messages: vec![ProviderMessage {
                role: "user".to_string(),
                content: vec![ContentBlock::Text { text: prompt }],
            }],
            max_tokens: 512,
            temperature: Some(0.7),
            stream: false,
            json_mode: true,
        };

        let response = match provider.complete(request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "scenario model call failed");
                return None;
            }
        };

        let content = response.content.trim();
        let start = content.find('{')?;
        let end = content.rfind('}')? + 1;
        if start >= end {
            return None;
        }
        match serde_json::from_str(&content[start..end]) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "scenario response was not valid JSON");
                None
            }
        }
    }
}

fn fallback_scenario() -> Scenario {
    Scenario {
        narrative: "just soaking in the view right now, wish you could see it".to_string(),
        image_prompt:
            "scenic landscape at golden hour, soft warm light, gentle haze, photorealistic, \
             high detail"
                .to_string(),
    }
}

fn fallback_enhancement(prompt: &str) -> String {
    format!("{prompt}, high quality, detailed, natural lighting, 4k")
}
