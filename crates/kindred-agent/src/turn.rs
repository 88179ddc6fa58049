// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The turn controller: one inbound message in, zero or more outbound
//! payloads out.
//!
//! Steps, branching on modality and content:
//! 1. **Normalize** -- transcribe voice, describe images, merge captions.
//! 2. **Remember** -- retrieve related facts from long-term memory.
//! 3. **Route** -- decide conversation / image / audio.
//! 4. **Generate** -- assemble context and call the provider.
//! 5. **Memorize** -- store durable personal facts from the user's text.
//! 6. **Render** -- produce payloads, degrading media failures to text.
//!
//! Failure policy: any adapter failure degrades the turn to a best-effort
//! text reply. The controller itself never returns an error and never
//! produces an empty payload list.

use std::sync::Arc;

use kindred_core::types::{
    InboundMessage, MessageContent, MessageRecord, Modality, OutboundPayload,
};
use kindred_core::{
    EmbeddingAdapter, ImageGenAdapter, KindredError, ProviderAdapter, SpeechToTextAdapter,
    TextToSpeechAdapter, VisionAdapter,
};
use kindred_image::ScenarioBuilder;
use kindred_memory::{MemoryAnalyzer, MemoryRetriever, MemoryStore, ScoredMemory};
use tracing::{debug, info, warn};

use crate::context::{history_pairs, ContextAssembler};
use crate::prompts::{
    DEFAULT_IMAGE_QUESTION, GENERATION_FALLBACK, TRANSCRIPTION_FALLBACK, USER_IMAGE_TAG,
};
use crate::router::{ResponseRouter, Workflow};

/// The wired-up long-term memory subsystem.
pub struct MemorySystem {
    pub store: Arc<MemoryStore>,
    pub embedder: Arc<dyn EmbeddingAdapter>,
    pub retriever: Arc<MemoryRetriever>,
    pub analyzer: Arc<MemoryAnalyzer>,
    /// Facts injected into context per turn.
    pub top_k: usize,
}

/// Everything one turn produced.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Input text after modality resolution (what gets persisted).
    pub normalized_text: String,
    /// Modality of the inbound message.
    pub modality: Modality,
    /// The textual reply (also persisted when media is sent instead).
    pub reply_text: String,
    /// Payloads to deliver; never empty.
    pub payloads: Vec<OutboundPayload>,
    /// The workflow the turn resolved to.
    pub workflow: Workflow,
}

/// Runs the conversation-handling step graph for each turn.
pub struct TurnController {
    provider: Arc<dyn ProviderAdapter>,
    assembler: ContextAssembler,
    router: ResponseRouter,
    scenario: ScenarioBuilder,
    speech_to_text: Option<Arc<dyn SpeechToTextAdapter>>,
    text_to_speech: Option<Arc<dyn TextToSpeechAdapter>>,
    vision: Option<Arc<dyn VisionAdapter>>,
    image_gen: Option<Arc<dyn ImageGenAdapter>>,
    memory: Option<MemorySystem>,
}

impl TurnController {
    /// Creates a controller with the required pieces; modality adapters
    /// and memory attach via the `with_*` builders.
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        assembler: ContextAssembler,
        router: ResponseRouter,
        scenario: ScenarioBuilder,
    ) -> Self {
        Self {
            provider,
            assembler,
            router,
            scenario,
            speech_to_text: None,
            text_to_speech: None,
            vision: None,
            image_gen: None,
            memory: None,
        }
    }

    pub fn with_speech(
        mut self,
        stt: Arc<dyn SpeechToTextAdapter>,
        tts: Option<Arc<dyn TextToSpeechAdapter>>,
    ) -> Self {
        self.speech_to_text = Some(stt);
        self.text_to_speech = tts;
        self
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionAdapter>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_image_gen(mut self, image_gen: Arc<dyn ImageGenAdapter>) -> Self {
        self.image_gen = Some(image_gen);
        self
    }

    pub fn with_memory(mut self, memory: MemorySystem) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Runs one turn against the given history window (oldest first,
    /// excluding the current message).
    pub async fn run_turn(
        &self,
        inbound: &InboundMessage,
        history: &[MessageRecord],
    ) -> TurnOutcome {
        let modality = inbound.content.modality();

        // Step 1: normalize the input to text.
        let normalized_text = match self.normalize(&inbound.content).await {
            Ok(text) => text,
            Err(e) => {
                // Transcription is the one unrecoverable normalization:
                // there is nothing to converse about. Still reply.
                warn!(error = %e, "voice normalization failed, sending fallback");
                return TurnOutcome {
                    normalized_text: "[voice note, transcription unavailable]".to_string(),
                    modality,
                    reply_text: TRANSCRIPTION_FALLBACK.to_string(),
                    payloads: vec![OutboundPayload::Text(TRANSCRIPTION_FALLBACK.to_string())],
                    workflow: Workflow::Conversation,
                };
            }
        };

        // Step 2: retrieve related memories.
        let memories = self.retrieve_memories(&normalized_text).await;

        // Step 3: route the response mode.
        let pairs = history_pairs(history);
        let workflow = self
            .router
            .route(self.provider.as_ref(), &normalized_text, &pairs)
            .await;

        // Step 4: generate the reply.
        let request = self
            .assembler
            .build_request(history, &memories, &normalized_text);
        let (reply_text, generated) = match self.provider.complete(request).await {
            Ok(response) => {
                let text = response.content.trim().to_string();
                if text.is_empty() {
                    warn!("provider returned an empty reply, using fallback");
                    (GENERATION_FALLBACK.to_string(), false)
                } else {
                    (text, true)
                }
            }
            Err(e) => {
                warn!(error = %e, "generation failed, using fallback");
                (GENERATION_FALLBACK.to_string(), false)
            }
        };

        // Step 5: memorize durable personal information (best-effort).
        if let Some(ref memory) = self.memory {
            let session_id = inbound.session_id.clone().unwrap_or_default();
            memory
                .analyzer
                .remember(
                    self.provider.as_ref(),
                    memory.embedder.as_ref(),
                    &memory.store,
                    &normalized_text,
                    &session_id,
                )
                .await;
        }

        // Step 6: render. A failed generation always degrades to text;
        // side-effect workflows only run on a real reply.
        let payloads = if generated {
            match workflow {
                Workflow::Conversation => vec![OutboundPayload::Text(reply_text.clone())],
                Workflow::Audio => self.render_audio(&reply_text).await,
                Workflow::Image => self.render_image(&reply_text, &pairs, &normalized_text).await,
            }
        } else {
            vec![OutboundPayload::Text(reply_text.clone())]
        };

        info!(
            workflow = %workflow,
            modality = %modality,
            payloads = payloads.len(),
            "turn complete"
        );

        TurnOutcome {
            normalized_text,
            modality,
            reply_text,
            payloads,
            workflow,
        }
    }

    /// Resolves the inbound content to text.
    ///
    /// Voice requires a working transcriber; image analysis degrades to a
    /// tagged placeholder so the turn continues.
    async fn normalize(&self, content: &MessageContent) -> Result<String, KindredError> {
        match content {
            MessageContent::Text(text) => Ok(text.clone()),
            MessageContent::Voice { data, mime_type } => {
                let stt = self.speech_to_text.as_ref().ok_or_else(|| {
                    KindredError::Media {
                        message: "no speech-to-text adapter configured".into(),
                        source: None,
                    }
                })?;
                let text = stt.transcribe(data, mime_type).await?;
                debug!(chars = text.len(), "voice note normalized");
                Ok(text)
            }
            MessageContent::Image {
                data,
                mime_type,
                caption,
            } => {
                let question = caption
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or(DEFAULT_IMAGE_QUESTION);
                let mut text = format!("{USER_IMAGE_TAG} {question}");

                let analysis = match self.vision.as_ref() {
                    Some(vision) => match vision.describe_image(data, mime_type, question).await
                    {
                        Ok(description) => description,
                        Err(e) => {
                            warn!(error = %e, "image analysis failed");
                            "the image could not be analyzed".to_string()
                        }
                    },
                    None => "the image could not be analyzed".to_string(),
                };

                text.push_str(&format!("\n\n[Image Analysis: {analysis}]"));
                Ok(text)
            }
        }
    }

    /// Retrieves memories for the normalized text; failures yield none.
    async fn retrieve_memories(&self, query: &str) -> Vec<ScoredMemory> {
        let Some(ref memory) = self.memory else {
            return vec![];
        };
        match memory.retriever.retrieve(query, memory.top_k).await {
            Ok(memories) => {
                debug!(count = memories.len(), "memories retrieved");
                memories
            }
            Err(e) => {
                warn!(error = %e, "memory retrieval failed");
                vec![]
            }
        }
    }

    /// Synthesizes the reply as audio; degrades to the text reply.
    async fn render_audio(&self, reply_text: &str) -> Vec<OutboundPayload> {
        let Some(ref tts) = self.text_to_speech else {
            debug!("no text-to-speech adapter, sending text instead");
            return vec![OutboundPayload::Text(reply_text.to_string())];
        };

        match tts.synthesize(reply_text).await {
            Ok(clip) => vec![OutboundPayload::Audio {
                data: clip.data,
                mime_type: clip.mime_type,
            }],
            Err(e) => {
                warn!(error = %e, "speech synthesis failed, sending text instead");
                vec![OutboundPayload::Text(reply_text.to_string())]
            }
        }
    }

    /// Generates an image from an imagined scene; degrades to the text reply.
    async fn render_image(
        &self,
        reply_text: &str,
        history: &[(String, String)],
        normalized_text: &str,
    ) -> Vec<OutboundPayload> {
        let Some(ref image_gen) = self.image_gen else {
            debug!("no image generation adapter, sending text instead");
            return vec![OutboundPayload::Text(reply_text.to_string())];
        };

        let mut context = history.to_vec();
        context.push(("user".to_string(), normalized_text.to_string()));

        let scenario = self
            .scenario
            .build_scenario(self.provider.as_ref(), &context)
            .await;
        let prompt = self
            .scenario
            .enhance_prompt(self.provider.as_ref(), &scenario.image_prompt)
            .await;

        match image_gen.generate(&prompt).await {
            Ok(data) => vec![OutboundPayload::Image {
                data,
                mime_type: "image/jpeg".to_string(),
                caption: Some(reply_text.to_string()),
            }],
            Err(e) => {
                warn!(error = %e, "image generation failed, sending text instead");
                vec![OutboundPayload::Text(reply_text.to_string())]
            }
        }
    }
}
