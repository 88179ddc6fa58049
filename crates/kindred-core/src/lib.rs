// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Kindred companion.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Kindred workspace. All adapters
//! implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KindredError;
pub use types::{AdapterType, HealthStatus, MessageId, Modality, SessionId};

// Re-export all adapter traits at crate root.
pub use traits::{
    ChannelAdapter, EmbeddingAdapter, ImageGenAdapter, PluginAdapter, ProviderAdapter,
    SpeechToTextAdapter, StorageAdapter, TextToSpeechAdapter, VisionAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kindred_error_variants_construct() {
        let _config = KindredError::Config("test".into());
        let _storage = KindredError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = KindredError::Channel {
            message: "test".into(),
            source: None,
        };
        let _provider = KindredError::Provider {
            message: "test".into(),
            source: None,
        };
        let _media = KindredError::Media {
            message: "test".into(),
            source: None,
        };
        let _health = KindredError::HealthCheckFailed {
            name: "test".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = KindredError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = KindredError::Internal("test".into());
    }

    #[test]
    fn error_display_includes_context() {
        let err = KindredError::Provider {
            message: "model not found".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "provider error: model not found");

        let err = KindredError::Media {
            message: "transcription failed".into(),
            source: None,
        };
        assert!(err.to_string().contains("transcription failed"));
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that every adapter trait is reachable from
        // the crate root. A missing module fails this test at build time.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_stt_adapter<T: SpeechToTextAdapter>() {}
        fn _assert_tts_adapter<T: TextToSpeechAdapter>() {}
        fn _assert_vision_adapter<T: VisionAdapter>() {}
        fn _assert_image_gen_adapter<T: ImageGenAdapter>() {}
    }

    #[test]
    fn adapter_type_has_seven_variants() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Channel,
            AdapterType::Provider,
            AdapterType::Storage,
            AdapterType::Embedding,
            AdapterType::Speech,
            AdapterType::Vision,
            AdapterType::ImageGen,
        ];
        assert_eq!(variants.len(), 7);

        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }
}
