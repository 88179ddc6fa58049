// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-speech via the ElevenLabs synthesis API.
//!
//! Returns MP3 audio for a given reply text, which the channel adapter
//! uploads as a voice message.

use async_trait::async_trait;
use kindred_core::types::{AdapterType, AudioClip, HealthStatus};
use kindred_core::{KindredError, PluginAdapter, TextToSpeechAdapter};
use serde::Serialize;
use tracing::debug;

const API_BASE_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Synthesis request body.
#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs-backed text-to-speech adapter.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    api_key: String,
    voice_id: String,
    model: String,
    base_url: String,
}

impl ElevenLabsSynthesizer {
    /// Creates a synthesizer for the given voice and model.
    pub fn new(api_key: String, voice_id: String, model: String) -> Result<Self, KindredError> {
        if api_key.is_empty() {
            return Err(KindredError::Config(
                "ElevenLabs API key is required for voice replies".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| KindredError::Media {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            voice_id,
            model,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[async_trait]
impl PluginAdapter for ElevenLabsSynthesizer {
    fn name(&self) -> &str {
        "elevenlabs-tts"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        Ok(())
    }
}

#[async_trait]
impl TextToSpeechAdapter for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, KindredError> {
        if text.trim().is_empty() {
            return Err(KindredError::Media {
                message: "cannot synthesize empty text".into(),
                source: None,
            });
        }

        let url = format!("{}/{}", self.base_url, self.voice_id);
        let body = SynthesisRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| KindredError::Media {
                message: format!("synthesis request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KindredError::Media {
                message: format!("synthesis API returned {status}: {body}"),
                source: None,
            });
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| KindredError::Media {
                message: format!("failed to read synthesized audio: {e}"),
                source: Some(Box::new(e)),
            })?
            .to_vec();

        if data.is_empty() {
            return Err(KindredError::Media {
                message: "synthesis returned no audio".into(),
                source: None,
            });
        }

        debug!(bytes = data.len(), "speech synthesized");
        Ok(AudioClip {
            data,
            mime_type: "audio/mpeg".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn synthesizer(base_url: &str) -> ElevenLabsSynthesizer {
        ElevenLabsSynthesizer::new(
            "el-test-key".into(),
            "test-voice".into(),
            "eleven_flash_v2_5".into(),
        )
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(ElevenLabsSynthesizer::new(String::new(), "v".into(), "m".into()).is_err());
    }

    #[tokio::test]
    async fn synthesize_returns_mp3_clip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-voice"))
            .and(header("xi-api-key", "el-test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(vec![0xFF, 0xFB, 0x90, 0x00]),
            )
            .mount(&server)
            .await;

        let clip = synthesizer(&server.uri()).synthesize("hello!").await.unwrap();
        assert_eq!(clip.mime_type, "audio/mpeg");
        assert_eq!(clip.data, vec![0xFF, 0xFB, 0x90, 0x00]);
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_call() {
        let result = synthesizer("http://127.0.0.1:1").synthesize("   ").await;
        assert!(matches!(result, Err(KindredError::Media { .. })));
    }

    #[tokio::test]
    async fn api_error_surfaces_as_media_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-voice"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let result = synthesizer(&server.uri()).synthesize("hello").await;
        match result {
            Err(KindredError::Media { message, .. }) => assert!(message.contains("401")),
            other => panic!("expected Media error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_audio_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-voice"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::<u8>::new()))
            .mount(&server)
            .await;

        let result = synthesizer(&server.uri()).synthesize("hello").await;
        assert!(result.is_err());
    }
}
