// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech adapters for the Kindred companion.
//!
//! - [`WhisperTranscriber`]: speech-to-text via the Whisper endpoint
//!   served by Groq.
//! - [`ElevenLabsSynthesizer`]: text-to-speech via ElevenLabs.
//!
//! Both are stateless single-call adapters; failures surface as
//! [`kindred_core::KindredError::Media`] and the turn controller degrades
//! to a text reply.

pub mod stt;
pub mod tts;

pub use stt::WhisperTranscriber;
pub use tts::ElevenLabsSynthesizer;
