// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock modality adapters: transcription, synthesis, vision, image
//! generation. Each can be built in a succeeding or failing variant to
//! exercise the turn controller's degradation paths.

use std::sync::Mutex;

use async_trait::async_trait;

use kindred_core::types::{AdapterType, AudioClip, HealthStatus};
use kindred_core::{
    ImageGenAdapter, KindredError, PluginAdapter, SpeechToTextAdapter, TextToSpeechAdapter,
    VisionAdapter,
};

fn mock_media_err(what: &str) -> KindredError {
    KindredError::Media {
        message: format!("mock {what} configured to fail"),
        source: None,
    }
}

macro_rules! impl_plugin_adapter {
    ($type:ty, $name:literal, $adapter_type:expr) => {
        #[async_trait]
        impl PluginAdapter for $type {
            fn name(&self) -> &str {
                $name
            }
            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }
            fn adapter_type(&self) -> AdapterType {
                $adapter_type
            }
            async fn health_check(&self) -> Result<HealthStatus, KindredError> {
                Ok(HealthStatus::Healthy)
            }
            async fn shutdown(&self) -> Result<(), KindredError> {
                Ok(())
            }
        }
    };
}

/// Mock speech-to-text adapter.
pub struct MockTranscriber {
    result: Option<String>,
}

impl MockTranscriber {
    /// Always transcribes to the given text.
    pub fn returning(text: &str) -> Self {
        Self {
            result: Some(text.to_string()),
        }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self { result: None }
    }
}

impl_plugin_adapter!(MockTranscriber, "mock-stt", AdapterType::Speech);

#[async_trait]
impl SpeechToTextAdapter for MockTranscriber {
    async fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> Result<String, KindredError> {
        self.result
            .clone()
            .ok_or_else(|| mock_media_err("transcriber"))
    }
}

/// Mock text-to-speech adapter.
pub struct MockSynthesizer {
    result: Option<Vec<u8>>,
}

impl MockSynthesizer {
    /// Always synthesizes the given bytes (as audio/mpeg).
    pub fn returning(data: Vec<u8>) -> Self {
        Self { result: Some(data) }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self { result: None }
    }
}

impl_plugin_adapter!(MockSynthesizer, "mock-tts", AdapterType::Speech);

#[async_trait]
impl TextToSpeechAdapter for MockSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<AudioClip, KindredError> {
        match &self.result {
            Some(data) => Ok(AudioClip {
                data: data.clone(),
                mime_type: "audio/mpeg".to_string(),
            }),
            None => Err(mock_media_err("synthesizer")),
        }
    }
}

/// Mock vision adapter; records the last prompt it was asked with.
pub struct MockVision {
    result: Option<String>,
    last_prompt: Mutex<Option<String>>,
}

impl MockVision {
    /// Always describes images with the given text.
    pub fn returning(description: &str) -> Self {
        Self {
            result: Some(description.to_string()),
            last_prompt: Mutex::new(None),
        }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self {
            result: None,
            last_prompt: Mutex::new(None),
        }
    }

    /// The prompt from the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().expect("lock poisoned").clone()
    }
}

impl_plugin_adapter!(MockVision, "mock-vision", AdapterType::Vision);

#[async_trait]
impl VisionAdapter for MockVision {
    async fn describe_image(
        &self,
        _image: &[u8],
        _mime_type: &str,
        prompt: &str,
    ) -> Result<String, KindredError> {
        *self.last_prompt.lock().expect("lock poisoned") = Some(prompt.to_string());
        self.result.clone().ok_or_else(|| mock_media_err("vision"))
    }
}

/// Mock image generation adapter; records the last prompt.
pub struct MockImageGen {
    result: Option<Vec<u8>>,
    last_prompt: Mutex<Option<String>>,
}

impl MockImageGen {
    /// Always generates the given bytes.
    pub fn returning(data: Vec<u8>) -> Self {
        Self {
            result: Some(data),
            last_prompt: Mutex::new(None),
        }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self {
            result: None,
            last_prompt: Mutex::new(None),
        }
    }

    /// The prompt from the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().expect("lock poisoned").clone()
    }
}

impl_plugin_adapter!(MockImageGen, "mock-image-gen", AdapterType::ImageGen);

#[async_trait]
impl ImageGenAdapter for MockImageGen {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, KindredError> {
        *self.last_prompt.lock().expect("lock poisoned") = Some(prompt.to_string());
        self.result
            .clone()
            .ok_or_else(|| mock_media_err("image generator"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transcriber_variants() {
        let ok = MockTranscriber::returning("hello");
        assert_eq!(ok.transcribe(&[1], "audio/ogg").await.unwrap(), "hello");

        let bad = MockTranscriber::failing();
        assert!(bad.transcribe(&[1], "audio/ogg").await.is_err());
    }

    #[tokio::test]
    async fn synthesizer_variants() {
        let ok = MockSynthesizer::returning(vec![1, 2]);
        let clip = ok.synthesize("hi").await.unwrap();
        assert_eq!(clip.data, vec![1, 2]);
        assert_eq!(clip.mime_type, "audio/mpeg");

        assert!(MockSynthesizer::failing().synthesize("hi").await.is_err());
    }

    #[tokio::test]
    async fn vision_records_prompt() {
        let vision = MockVision::returning("a dog");
        vision
            .describe_image(&[1], "image/png", "what breed?")
            .await
            .unwrap();
        assert_eq!(vision.last_prompt().as_deref(), Some("what breed?"));
    }

    #[tokio::test]
    async fn image_gen_records_prompt() {
        let generator = MockImageGen::returning(vec![9]);
        generator.generate("a fox in a raincoat").await.unwrap();
        assert_eq!(
            generator.last_prompt().as_deref(),
            Some("a fox in a raincoat")
        );
        assert!(MockImageGen::failing().generate("x").await.is_err());
    }
}
