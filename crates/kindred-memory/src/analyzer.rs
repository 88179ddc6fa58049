// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based analysis of user messages for memory-worthy content.
//!
//! The analyzer asks a small model whether a message carries durable
//! personal information and, if so, reformats it as a standalone fact.
//! New facts are embedded and stored unless a near-duplicate already
//! exists (cosine similarity above the dedup threshold).

use kindred_core::types::{ContentBlock, ProviderMessage, ProviderRequest};
use kindred_core::{EmbeddingAdapter, KindredError, ProviderAdapter};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::MemoryStore;
use crate::types::{cosine_similarity, Memory, MemoryAnalysis, MemoryStatus};

/// Prompt for the analysis model. `{message}` is substituted per call.
const ANALYSIS_PROMPT: &str = r#"Decide whether the user's message contains durable personal information worth remembering across conversations, and reformat it if so.

Durable personal information includes:
- identity details (name, age, where they live)
- work and education (job, employer, field of study)
- tastes and preferences (favorites, likes, dislikes)
- relationships and life circumstances (family, pets, partner)
- goals, plans, and notable experiences

Rules:
1. Extract only stated facts, never requests or meta-commentary about remembering.
2. Rewrite the fact as a short third-person statement with no filler.
3. Greetings, questions, and small talk are not important.
4. Reply with a single JSON object: {"is_important": true/false, "formatted_memory": "..." or null}

Examples:
"btw I moved to Porto last month" -> {"is_important": true, "formatted_memory": "Lives in Porto"}
"my sister's name is Carla" -> {"is_important": true, "formatted_memory": "Has a sister named Carla"}
"can you remember things I tell you?" -> {"is_important": false, "formatted_memory": null}
"what's the weather like?" -> {"is_important": false, "formatted_memory": null}
"I teach high school physics" -> {"is_important": true, "formatted_memory": "Teaches high school physics"}

Message: {message}
JSON:"#;

/// Analyzes user messages and stores the resulting facts.
pub struct MemoryAnalyzer {
    /// Small model used for analysis calls.
    model: String,
    /// Cosine similarity above which a new fact is a duplicate.
    dedup_threshold: f64,
}

impl MemoryAnalyzer {
    /// Creates an analyzer using the given model and dedup threshold.
    pub fn new(model: String, dedup_threshold: f64) -> Self {
        Self {
            model,
            dedup_threshold,
        }
    }

    /// Asks the analysis model whether `message` is memory-worthy.
    ///
    /// Any provider failure or unparseable output is treated as
    /// not-important; analysis never fails the turn.
    pub async fn analyze(
        &self,
        provider: &dyn ProviderAdapter,
        message: &str,
    ) -> MemoryAnalysis {
        let prompt = ANALYSIS_PROMPT.replace("{message}", message);
        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: None,
            messages: vec![ProviderMessage {
                role: "user".to_string(),
                content: vec![ContentBlock::Text { text: prompt }],
            }],
            max_tokens: 256,
            temperature: Some(0.1),
            stream: false,
            json_mode: true,
        };

        match provider.complete(request).await {
            Ok(response) => parse_analysis_response(&response.content),
            Err(e) => {
                warn!(error = %e, "memory analysis call failed");
                MemoryAnalysis::not_important()
            }
        }
    }

    /// Analyzes `message` and stores a new memory when warranted.
    ///
    /// Returns the stored memory, or `None` when the message was not
    /// important, a near-duplicate exists, or the write was skipped due
    /// to an embedding/storage failure (logged, never propagated).
    pub async fn remember(
        &self,
        provider: &dyn ProviderAdapter,
        embedder: &dyn EmbeddingAdapter,
        store: &MemoryStore,
        message: &str,
        session_id: &str,
    ) -> Option<Memory> {
        if message.trim().is_empty() {
            return None;
        }

        let analysis = self.analyze(provider, message).await;
        let fact = match (analysis.is_important, analysis.formatted_memory) {
            (true, Some(fact)) if !fact.trim().is_empty() => fact,
            _ => {
                debug!("message not memory-worthy");
                return None;
            }
        };

        match self.store_fact(embedder, store, &fact, session_id).await {
            Ok(stored) => stored,
            Err(e) => {
                // Memory is best-effort: a failed write degrades nothing.
                warn!(error = %e, fact = fact.as_str(), "memory write skipped");
                None
            }
        }
    }

    /// Embeds a fact and saves it unless a near-duplicate is active.
    async fn store_fact(
        &self,
        embedder: &dyn EmbeddingAdapter,
        store: &MemoryStore,
        fact: &str,
        session_id: &str,
    ) -> Result<Option<Memory>, KindredError> {
        let output = embedder
            .embed(kindred_core::types::EmbeddingInput {
                texts: vec![fact.to_string()],
            })
            .await?;
        let embedding = output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| KindredError::Internal("embedder returned no vectors".to_string()))?;

        let active = store.get_active_embeddings().await?;
        if let Some((dup_id, similarity)) = find_most_similar(&embedding, &active)
            && similarity as f64 >= self.dedup_threshold
        {
            debug!(
                duplicate_of = dup_id.as_str(),
                similarity, "skipping near-duplicate memory"
            );
            return Ok(None);
        }

        let now = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        let memory = Memory {
            id: Uuid::new_v4().to_string(),
            content: fact.to_string(),
            embedding,
            status: MemoryStatus::Active,
            session_id: Some(session_id.to_string()),
            created_at: now.clone(),
            updated_at: now,
        };

        store.save(&memory).await?;
        debug!(id = memory.id.as_str(), "memory stored");
        Ok(Some(memory))
    }
}

/// Parse the analysis model's response into a [`MemoryAnalysis`].
///
/// Tolerates markdown code fences and surrounding prose; returns
/// not-important on any parse failure.
pub fn parse_analysis_response(response: &str) -> MemoryAnalysis {
    let trimmed = response.trim();
    let start = trimmed.find('{');
    let end = trimmed.rfind('}').map(|i| i + 1);

    let json_str = match (start, end) {
        (Some(s), Some(e)) if s < e => &trimmed[s..e],
        _ => {
            warn!("analysis response carried no JSON object");
            return MemoryAnalysis::not_important();
        }
    };

    match serde_json::from_str::<MemoryAnalysis>(json_str) {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(error = %e, "failed to parse analysis response");
            debug!(raw = response, "raw analysis response");
            MemoryAnalysis::not_important()
        }
    }
}

/// Find the most similar embedding in the active set.
fn find_most_similar(
    query: &[f32],
    active: &[(String, Vec<f32>)],
) -> Option<(String, f32)> {
    active
        .iter()
        .filter(|(_, emb)| emb.len() == query.len())
        .map(|(id, emb)| (id.clone(), cosine_similarity(query, emb)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_json_object() {
        let analysis = parse_analysis_response(
            r#"{"is_important": true, "formatted_memory": "Has a dog named Rex"}"#,
        );
        assert!(analysis.is_important);
        assert_eq!(analysis.formatted_memory.as_deref(), Some("Has a dog named Rex"));
    }

    #[test]
    fn parse_fenced_json() {
        let response = "```json\n{\"is_important\": false, \"formatted_memory\": null}\n```";
        let analysis = parse_analysis_response(response);
        assert!(!analysis.is_important);
    }

    #[test]
    fn parse_json_with_surrounding_prose() {
        let response = "Here is my verdict:\n{\"is_important\": true, \"formatted_memory\": \"Studies biology\"}\nDone.";
        let analysis = parse_analysis_response(response);
        assert!(analysis.is_important);
        assert_eq!(analysis.formatted_memory.as_deref(), Some("Studies biology"));
    }

    #[test]
    fn parse_garbage_falls_back_to_not_important() {
        let analysis = parse_analysis_response("I cannot answer that.");
        assert!(!analysis.is_important);
        assert!(analysis.formatted_memory.is_none());
    }

    #[test]
    fn parse_missing_memory_field_defaults_to_none() {
        let analysis = parse_analysis_response(r#"{"is_important": false}"#);
        assert!(!analysis.is_important);
        assert!(analysis.formatted_memory.is_none());
    }

    #[test]
    fn find_most_similar_picks_closest() {
        let query = vec![1.0, 0.0];
        let active = vec![
            ("far".to_string(), vec![0.0, 1.0]),
            ("near".to_string(), vec![0.95, 0.05]),
        ];
        let (id, sim) = find_most_similar(&query, &active).unwrap();
        assert_eq!(id, "near");
        assert!(sim > 0.9);
    }

    #[test]
    fn find_most_similar_skips_mismatched_dims() {
        let query = vec![1.0, 0.0];
        let active = vec![("bad".to_string(), vec![1.0, 0.0, 0.0])];
        assert!(find_most_similar(&query, &active).is_none());
    }

    #[test]
    fn prompt_template_substitutes_message() {
        let prompt = ANALYSIS_PROMPT.replace("{message}", "I live in Kyoto");
        assert!(prompt.contains("Message: I live in Kyoto"));
        assert!(!prompt.contains("{message}"));
    }
}
