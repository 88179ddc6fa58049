// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context assembly for generation calls.
//!
//! Builds the provider request for a turn from three layers: the persona
//! character card (with memories and current activity substituted in),
//! the conversation history window from storage, and the normalized
//! current input.

use chrono::Local;
use kindred_config::model::AgentConfig;
use kindred_core::types::{ContentBlock, MessageRecord, ProviderMessage, ProviderRequest};
use kindred_memory::ScoredMemory;
use tracing::info;

use crate::prompts::{render_character_card, CHARACTER_CARD};
use crate::schedule;

/// Assembles provider requests for conversation turns.
pub struct ContextAssembler {
    persona_card: String,
    name: String,
    model: String,
    max_tokens: u32,
}

impl ContextAssembler {
    /// Creates an assembler, resolving the persona card from config.
    ///
    /// # Persona resolution
    /// 1. `agent.persona_file` -- read from disk
    /// 2. `agent.persona` -- inline string
    /// 3. Built-in default card
    pub async fn load(config: &AgentConfig, model: String, max_tokens: u32) -> Self {
        let persona_card = load_persona_card(config).await;
        Self {
            persona_card,
            name: config.name.clone(),
            model,
            max_tokens,
        }
    }

    /// Returns the raw persona card template.
    pub fn persona_card(&self) -> &str {
        &self.persona_card
    }

    /// Builds the generation request for a turn.
    ///
    /// `history` is the window of prior envelopes, oldest first;
    /// `normalized_text` is the current input after modality resolution.
    pub fn build_request(
        &self,
        history: &[MessageRecord],
        memories: &[ScoredMemory],
        normalized_text: &str,
    ) -> ProviderRequest {
        let system_prompt = render_character_card(
            &self.persona_card,
            &self.name,
            &format_memories(memories),
            schedule::current_activity(Local::now()),
        );

        let mut messages: Vec<ProviderMessage> = history
            .iter()
            .filter(|record| !record.content.trim().is_empty())
            .map(|record| ProviderMessage {
                role: direction_to_role(&record.direction).to_string(),
                content: vec![ContentBlock::Text {
                    text: record.content.clone(),
                }],
            })
            .collect();

        messages.push(ProviderMessage {
            role: "user".to_string(),
            content: vec![ContentBlock::Text {
                text: normalized_text.to_string(),
            }],
        });

        ProviderRequest {
            model: self.model.clone(),
            system_prompt: Some(system_prompt),
            messages,
            max_tokens: self.max_tokens,
            temperature: Some(0.7),
            stream: false,
            json_mode: false,
        }
    }
}

/// Maps an envelope direction to a chat role.
fn direction_to_role(direction: &str) -> &'static str {
    if direction == "outbound" {
        "assistant"
    } else {
        "user"
    }
}

/// Formats retrieved memories as a bullet list for the character card.
pub fn format_memories(memories: &[ScoredMemory]) -> String {
    let mut text = String::new();
    for scored in memories {
        text.push_str(&format!("- {}\n", scored.memory.content));
    }
    text
}

/// Flattens history into (role, text) pairs for router and scenario context.
pub fn history_pairs(history: &[MessageRecord]) -> Vec<(String, String)> {
    history
        .iter()
        .map(|record| {
            (
                direction_to_role(&record.direction).to_string(),
                record.content.clone(),
            )
        })
        .collect()
}

/// Loads the persona card following config priority: file > inline > default.
async fn load_persona_card(config: &AgentConfig) -> String {
    if let Some(ref file_path) = config.persona_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) => {
                let trimmed = content.trim().to_string();
                if !trimmed.is_empty() {
                    info!(path = file_path.as_str(), "loaded persona card from file");
                    return trimmed;
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = file_path.as_str(),
                    error = %e,
                    "failed to read persona file, falling back"
                );
            }
        }
    }

    if let Some(ref persona) = config.persona
        && !persona.is_empty()
    {
        return persona.clone();
    }

    CHARACTER_CARD.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::types::Modality;
    use kindred_memory::{Memory, MemoryStatus};

    fn record(direction: &str, content: &str) -> MessageRecord {
        MessageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: "s1".to_string(),
            direction: direction.to_string(),
            modality: Modality::Text,
            content: content.to_string(),
            metadata: None,
            created_at: "2026-05-01T00:00:00.000Z".to_string(),
        }
    }

    fn scored(content: &str) -> ScoredMemory {
        ScoredMemory {
            memory: Memory {
                id: uuid::Uuid::new_v4().to_string(),
                content: content.to_string(),
                embedding: vec![],
                status: MemoryStatus::Active,
                session_id: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
            score: 0.5,
        }
    }

    async fn assembler() -> ContextAssembler {
        ContextAssembler::load(&AgentConfig::default(), "test-model".into(), 512).await
    }

    #[tokio::test]
    async fn default_persona_card_is_used() {
        let assembler = assembler().await;
        assert!(assembler.persona_card().contains("{name}"));
    }

    #[tokio::test]
    async fn inline_persona_overrides_default() {
        let config = AgentConfig {
            persona: Some("You are {name}, a lighthouse keeper.".into()),
            ..Default::default()
        };
        let assembler = ContextAssembler::load(&config, "m".into(), 512).await;
        assert!(assembler.persona_card().contains("lighthouse keeper"));
    }

    #[tokio::test]
    async fn persona_file_overrides_inline() {
        let dir = std::env::temp_dir().join("kindred-context-test");
        let _ = std::fs::create_dir_all(&dir);
        let file_path = dir.join("persona.md");
        std::fs::write(&file_path, "File persona for {name}.").unwrap();

        let config = AgentConfig {
            persona: Some("Inline persona.".into()),
            persona_file: Some(file_path.to_string_lossy().into_owned()),
            ..Default::default()
        };
        let assembler = ContextAssembler::load(&config, "m".into(), 512).await;
        assert_eq!(assembler.persona_card(), "File persona for {name}.");

        let _ = std::fs::remove_file(&file_path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[tokio::test]
    async fn request_threads_history_and_input() {
        let assembler = assembler().await;
        let history = vec![
            record("inbound", "hey"),
            record("outbound", "hey! what's up"),
        ];
        let request = assembler.build_request(&history, &[], "not much, you?");

        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[1].role, "assistant");
        assert_eq!(request.messages[2].role, "user");
        match &request.messages[2].content[0] {
            ContentBlock::Text { text } => assert_eq!(text, "not much, you?"),
            other => panic!("expected text block, got {other:?}"),
        }
        assert!(request.system_prompt.is_some());
        assert!(!request.json_mode);
    }

    #[tokio::test]
    async fn memories_are_rendered_into_system_prompt() {
        let assembler = assembler().await;
        let memories = vec![scored("Has a cat named Miso"), scored("Works nights")];
        let request = assembler.build_request(&[], &memories, "hi");

        let system = request.system_prompt.unwrap();
        assert!(system.contains("- Has a cat named Miso"));
        assert!(system.contains("- Works nights"));
    }

    #[tokio::test]
    async fn empty_history_records_are_skipped() {
        let assembler = assembler().await;
        let history = vec![record("inbound", "   "), record("inbound", "real one")];
        let request = assembler.build_request(&history, &[], "hi");
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn history_pairs_map_directions() {
        let history = vec![record("inbound", "a"), record("outbound", "b")];
        let pairs = history_pairs(&history);
        assert_eq!(pairs[0], ("user".to_string(), "a".to_string()));
        assert_eq!(pairs[1], ("assistant".to_string(), "b".to_string()));
    }

    #[test]
    fn format_memories_bullets() {
        let formatted = format_memories(&[scored("Lives in Porto")]);
        assert_eq!(formatted, "- Lives in Porto\n");
        assert!(format_memories(&[]).is_empty());
    }
}
