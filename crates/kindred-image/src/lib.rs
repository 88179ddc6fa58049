// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generation for the Kindred companion.
//!
//! [`PollinationsGenerator`] fetches images from the Pollinations HTTP
//! endpoint; [`ScenarioBuilder`] uses the LLM provider to imagine a scene
//! from conversation context and enrich the visual prompt first.

pub mod generator;
pub mod scenario;

pub use generator::PollinationsGenerator;
pub use scenario::{Scenario, ScenarioBuilder};
