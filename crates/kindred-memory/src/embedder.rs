// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local embedding inference with the quantized all-MiniLM-L6-v2 ONNX model.
//!
//! Produces 384-dimensional L2-normalized sentence embeddings on CPU with
//! zero external API calls, mirroring the sentence-transformers pipeline:
//! tokenize, run the transformer, attention-masked mean pooling, normalize.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use kindred_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use kindred_core::{EmbeddingAdapter, KindredError, PluginAdapter};

/// Embedding dimensions for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

fn model_err(context: &str, e: impl std::fmt::Display) -> KindredError {
    KindredError::Internal(format!("{context}: {e}"))
}

/// Tokenized input ready for the ONNX graph.
struct EncodedText {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

/// Sentence embedder backed by a local MiniLM ONNX session.
///
/// The session is not `Sync`; it is guarded by a `Mutex` and inference
/// runs single-threaded, sized for small-VPS deployments.
pub struct MiniLmEmbedder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// Safety: the Session is only touched under the Mutex; the tokenizer is
// thread-safe for encoding.
unsafe impl Send for MiniLmEmbedder {}
unsafe impl Sync for MiniLmEmbedder {}

impl MiniLmEmbedder {
    /// Loads the embedder from a directory containing `model.onnx` and
    /// `tokenizer.json`.
    pub fn load(model_dir: &Path) -> Result<Self, KindredError> {
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            model_err(
                &format!("failed to load tokenizer from {}", tokenizer_path.display()),
                e,
            )
        })?;

        let model_path = model_dir.join("model.onnx");
        let session = Session::builder()
            .map_err(|e| model_err("failed to create ONNX session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| model_err("failed to set optimization level", e))?
            .with_intra_threads(1)
            .map_err(|e| model_err("failed to set thread count", e))?
            .commit_from_file(&model_path)
            .map_err(|e| {
                model_err(
                    &format!("failed to load ONNX model from {}", model_path.display()),
                    e,
                )
            })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn encode(&self, text: &str) -> Result<EncodedText, KindredError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| model_err("tokenization failed", e))?;

        Ok(EncodedText {
            input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            attention_mask: encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect(),
            token_type_ids: encoding.get_type_ids().iter().map(|&t| t as i64).collect(),
        })
    }

    /// Embed a single text, returning a 384-dim L2-normalized vector.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, KindredError> {
        let encoded = self.encode(text)?;
        let seq_len = encoded.input_ids.len();

        let input_ids = Array2::from_shape_vec((1, seq_len), encoded.input_ids)
            .map_err(|e| model_err("failed to shape input_ids", e))?;
        let attention_mask_vec = encoded.attention_mask.clone();
        let attention_mask = Array2::from_shape_vec((1, seq_len), encoded.attention_mask)
            .map_err(|e| model_err("failed to shape attention_mask", e))?;
        let token_type_ids = Array2::from_shape_vec((1, seq_len), encoded.token_type_ids)
            .map_err(|e| model_err("failed to shape token_type_ids", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| model_err("failed to lock ONNX session", e))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => TensorRef::from_array_view(&input_ids)
                    .map_err(|e| model_err("input_ids tensor", e))?,
                "attention_mask" => TensorRef::from_array_view(&attention_mask)
                    .map_err(|e| model_err("attention_mask tensor", e))?,
                "token_type_ids" => TensorRef::from_array_view(&token_type_ids)
                    .map_err(|e| model_err("token_type_ids tensor", e))?
            ])
            .map_err(|e| model_err("ONNX inference failed", e))?;

        // Output shape: [1, seq_len, hidden]
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| model_err("failed to extract output tensor", e))?;
        let hidden = shape[shape.len() - 1] as usize;

        Ok(pool_and_normalize(data, &attention_mask_vec, seq_len, hidden))
    }
}

/// Attention-masked mean pooling followed by L2 normalization.
fn pool_and_normalize(
    token_embeddings: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden: usize,
) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];
    let mut count = 0.0f32;

    for (i, &mask) in attention_mask.iter().enumerate().take(seq_len) {
        if mask > 0 {
            for (j, value) in pooled.iter_mut().enumerate() {
                *value += token_embeddings[i * hidden + j];
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for value in &mut pooled {
            *value /= count;
        }
    }

    let norm: f32 = pooled.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in &mut pooled {
            *value /= norm;
        }
    }
    pooled
}

#[async_trait]
impl PluginAdapter for MiniLmEmbedder {
    fn name(&self) -> &str {
        "minilm-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        match self.session.lock() {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "session lock poisoned: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MiniLmEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, KindredError> {
        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in &input.texts {
            embeddings.push(self.embed_text(text)?);
        }
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: EMBEDDING_DIM,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // MiniLmEmbedder::load requires real model files; inference is covered
    // by integration tests with the downloaded model. The pooling math is
    // testable in isolation.

    #[test]
    fn pooling_ignores_padding_tokens() {
        // 2 tokens, hidden=3, token 0 is padding.
        let embeddings = vec![
            9.0, 9.0, 9.0, // token 0 (masked out)
            3.0, 0.0, 4.0, // token 1
        ];
        let mask = vec![0, 1];
        let result = pool_and_normalize(&embeddings, &mask, 2, 3);
        // Mean = [3, 0, 4], norm 5 -> [0.6, 0.0, 0.8]
        assert!((result[0] - 0.6).abs() < 1e-6);
        assert!(result[1].abs() < 1e-6);
        assert!((result[2] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn pooling_averages_real_tokens() {
        let embeddings = vec![
            1.0, 2.0, // token 0
            3.0, 4.0, // token 1
        ];
        let mask = vec![1, 1];
        let result = pool_and_normalize(&embeddings, &mask, 2, 2);
        // Mean = [2, 3], then normalized to unit length.
        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!((result[1] / result[0] - 1.5).abs() < 1e-5);
    }

    #[test]
    fn pooling_of_all_masked_is_zero_vector() {
        let embeddings = vec![1.0, 2.0, 3.0, 4.0];
        let mask = vec![0, 0];
        let result = pool_and_normalize(&embeddings, &mask, 2, 2);
        assert_eq!(result, vec![0.0, 0.0]);
    }
}
