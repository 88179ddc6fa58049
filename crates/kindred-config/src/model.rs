// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Kindred companion.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Kindred configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; only API credentials have no default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KindredConfig {
    /// Companion identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Groq API settings (text generation, routing, vision).
    #[serde(default)]
    pub groq: GroqConfig,

    /// Speech settings (Whisper transcription, ElevenLabs synthesis).
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Image generation settings.
    #[serde(default)]
    pub image: ImageConfig,

    /// WhatsApp Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// HTTP gateway settings (webhook + debug API).
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Long-term memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Companion identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the companion persona.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline persona character card. Overridden by `persona_file` if both set.
    #[serde(default)]
    pub persona: Option<String>,

    /// Path to a markdown file containing the persona character card.
    /// Takes precedence over `persona` if both are set.
    #[serde(default)]
    pub persona_file: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            persona: None,
            persona_file: None,
        }
    }
}

fn default_agent_name() -> String {
    "kindred".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Groq API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GroqConfig {
    /// Groq API key. `None` requires the `GROQ_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for conversation replies.
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Small model used for routing and memory analysis.
    #[serde(default = "default_router_model")]
    pub router_model: String,

    /// Model used for image understanding.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            text_model: default_text_model(),
            router_model: default_router_model(),
            vision_model: default_vision_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_text_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_router_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_vision_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

/// Speech configuration: transcription and synthesis.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    /// ElevenLabs API key. `None` disables voice replies.
    #[serde(default)]
    pub elevenlabs_api_key: Option<String>,

    /// ElevenLabs voice identifier.
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// ElevenLabs synthesis model.
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Whisper model used for transcription (served by Groq).
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            elevenlabs_api_key: None,
            voice_id: default_voice_id(),
            tts_model: default_tts_model(),
            whisper_model: default_whisper_model(),
        }
    }
}

fn default_voice_id() -> String {
    "EXAVITQu4vr4xnSDxMaL".to_string()
}

fn default_tts_model() -> String {
    "eleven_flash_v2_5".to_string()
}

fn default_whisper_model() -> String {
    "whisper-large-v3-turbo".to_string()
}

/// Image generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    /// Base URL of the image generation endpoint.
    #[serde(default = "default_image_base_url")]
    pub base_url: String,

    /// Generated image width in pixels.
    #[serde(default = "default_image_width")]
    pub width: u32,

    /// Generated image height in pixels.
    #[serde(default = "default_image_height")]
    pub height: u32,

    /// Generation model tag passed to the endpoint.
    #[serde(default = "default_image_model")]
    pub model: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_base_url(),
            width: default_image_width(),
            height: default_image_height(),
            model: default_image_model(),
        }
    }
}

fn default_image_base_url() -> String {
    "https://image.pollinations.ai/prompt".to_string()
}

fn default_image_width() -> u32 {
    1024
}

fn default_image_height() -> u32 {
    768
}

fn default_image_model() -> String {
    "flux".to_string()
}

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Graph API access token. `None` disables the WhatsApp channel.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Business phone number id the companion sends from.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Token expected during the webhook verification handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// Graph API version segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            api_version: default_api_version(),
        }
    }
}

fn default_api_version() -> String {
    "v21.0".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Enable the gateway server.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token protecting the debug message API. `None` disables it.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("kindred").join("kindred.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("kindred.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Long-term memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable the memory system. When false, no memory operations occur.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Number of memories injected into context per turn.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a memory to count as a retrieval
    /// candidate (0.0-1.0).
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Cosine similarity above which a new fact is treated as a duplicate
    /// of an existing memory and skipped (0.0-1.0).
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f64,

    /// Directory holding the embedding model files (`model.onnx`,
    /// `tokenizer.json`). `None` uses the XDG data dir.
    #[serde(default)]
    pub model_dir: Option<String>,

    /// Name of the embedding model.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Number of recent messages included as conversation history.
    #[serde(default = "default_history_window")]
    pub history_window: i64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            dedup_threshold: default_dedup_threshold(),
            model_dir: None,
            model_name: default_model_name(),
            history_window: default_history_window(),
        }
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_top_k() -> usize {
    5
}

fn default_similarity_threshold() -> f64 {
    0.35
}

fn default_dedup_threshold() -> f64 {
    0.9
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_history_window() -> i64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = KindredConfig::default();
        assert_eq!(config.agent.name, "kindred");
        assert_eq!(config.agent.log_level, "info");
        assert_eq!(config.groq.text_model, "llama-3.3-70b-versatile");
        assert_eq!(config.groq.max_tokens, 1024);
        assert_eq!(config.whatsapp.api_version, "v21.0");
        assert_eq!(config.gateway.port, 8080);
        assert!(config.gateway.enabled);
        assert!(config.memory.enabled);
        assert_eq!(config.memory.top_k, 5);
        assert!(config.memory.dedup_threshold > config.memory.similarity_threshold);
    }

    #[test]
    fn database_path_defaults_to_data_dir() {
        let config = StorageConfig::default();
        assert!(config.database_path.ends_with("kindred.db"));
        assert!(config.wal_mode);
    }

    #[test]
    fn speech_defaults() {
        let config = SpeechConfig::default();
        assert!(config.elevenlabs_api_key.is_none());
        assert_eq!(config.whisper_model, "whisper-large-v3-turbo");
    }

    #[test]
    fn image_defaults() {
        let config = ImageConfig::default();
        assert!(config.base_url.starts_with("https://"));
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 768);
        assert_eq!(config.model, "flux");
    }
}
