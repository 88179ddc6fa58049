// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech adapter traits: speech-to-text and text-to-speech.

use async_trait::async_trait;

use crate::error::KindredError;
use crate::traits::adapter::PluginAdapter;
use crate::types::AudioClip;

/// Adapter that transcribes voice audio to text.
///
/// A single request/response call to a hosted model; no internal state.
#[async_trait]
pub trait SpeechToTextAdapter: PluginAdapter {
    /// Transcribes the given audio bytes.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, KindredError>;
}

/// Adapter that synthesizes spoken audio from text.
#[async_trait]
pub trait TextToSpeechAdapter: PluginAdapter {
    /// Synthesizes the given text into an audio clip.
    async fn synthesize(&self, text: &str) -> Result<AudioClip, KindredError>;
}
