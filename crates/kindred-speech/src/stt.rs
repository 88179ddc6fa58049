// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech-to-text via the Whisper transcription endpoint served by Groq.
//!
//! Voice notes arrive as OGG/Opus from WhatsApp; the audio bytes are
//! uploaded as-is in a multipart form and the endpoint returns the
//! transcription as JSON.

use async_trait::async_trait;
use kindred_core::types::{AdapterType, HealthStatus};
use kindred_core::{KindredError, PluginAdapter, SpeechToTextAdapter};
use serde::Deserialize;
use tracing::debug;

/// Transcription endpoint on the Groq OpenAI-compatible surface.
const API_BASE_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";

/// Transcription response body (`response_format=json`).
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Whisper-based speech-to-text adapter.
pub struct WhisperTranscriber {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl WhisperTranscriber {
    /// Creates a transcriber with the given API key and Whisper model.
    pub fn new(api_key: String, model: String) -> Result<Self, KindredError> {
        if api_key.is_empty() {
            return Err(KindredError::Config(
                "Groq API key is required for transcription".into(),
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

/// Pick a filename extension the endpoint recognizes for the upload part.
fn filename_for_mime(mime_type: &str) -> &'static str {
    match mime_type.split(';').next().unwrap_or("") {
        "audio/ogg" | "audio/opus" => "voice.ogg",
        "audio/mpeg" | "audio/mp3" => "voice.mp3",
        "audio/wav" | "audio/x-wav" => "voice.wav",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "voice.m4a",
        "audio/webm" => "voice.webm",
        _ => "voice.ogg",
    }
}

#[async_trait]
impl PluginAdapter for WhisperTranscriber {
    fn name(&self) -> &str {
        "whisper-stt"
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
impl SpeechToTextAdapter for WhisperTranscriber {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, KindredError> {
        if audio.is_empty() {
            return Err(KindredError::Media {
                message: "audio data is empty".into(),
                source: None,
            });
        }

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(filename_for_mime(mime_type))
            .mime_str(mime_type.split(';').next().unwrap_or("audio/ogg"))
            .map_err(|e| KindredError::Media {
                message: format!("invalid audio mime type `{mime_type}`: {e}"),
                source: Some(Box::new(e)),
            })?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| KindredError::Media {
                message: format!("transcription request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KindredError::Media {
                message: format!("transcription API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: TranscriptionResponse =
            response.json().await.map_err(|e| KindredError::Media {
                message: format!("failed to parse transcription response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(KindredError::Media {
                message: "transcription came back empty".into(),
                source: None,
            });
        }

        debug!(chars = text.len(), "voice note transcribed");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transcriber(base_url: &str) -> WhisperTranscriber {
        WhisperTranscriber::new("gsk-test".into(), "whisper-large-v3-turbo".into())
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(WhisperTranscriber::new(String::new(), "whisper".into()).is_err());
    }

    #[test]
    fn filename_matches_mime() {
        assert_eq!(filename_for_mime("audio/ogg"), "voice.ogg");
        assert_eq!(filename_for_mime("audio/ogg; codecs=opus"), "voice.ogg");
        assert_eq!(filename_for_mime("audio/mpeg"), "voice.mp3");
        assert_eq!(filename_for_mime("audio/wav"), "voice.wav");
        assert_eq!(filename_for_mime("application/octet-stream"), "voice.ogg");
    }

    #[tokio::test]
    async fn transcribe_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "hey, are you free tonight?"
            })))
            .mount(&server)
            .await;

        let text = transcriber(&server.uri())
            .transcribe(&[0u8; 64], "audio/ogg; codecs=opus")
            .await
            .unwrap();
        assert_eq!(text, "hey, are you free tonight?");
    }

    #[tokio::test]
    async fn empty_audio_is_rejected_before_any_call() {
        let result = transcriber("http://127.0.0.1:1").transcribe(&[], "audio/ogg").await;
        assert!(matches!(result, Err(KindredError::Media { .. })));
    }

    #[tokio::test]
    async fn api_error_surfaces_as_media_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(413).set_body_string("payload too large"))
            .mount(&server)
            .await;

        let result = transcriber(&server.uri())
            .transcribe(&[0u8; 8], "audio/ogg")
            .await;
        match result {
            Err(KindredError::Media { message, .. }) => assert!(message.contains("413")),
            other => panic!("expected Media error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_transcription_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "  "})),
            )
            .mount(&server)
            .await;

        let result = transcriber(&server.uri())
            .transcribe(&[0u8; 8], "audio/ogg")
            .await;
        assert!(result.is_err());
    }
}
