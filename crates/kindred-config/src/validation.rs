// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as threshold ranges and cross-field relationships.

use crate::diagnostic::ConfigError;
use crate::model::KindredConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KindredConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Gateway host must be a plausible IP or hostname.
    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Memory thresholds live in [0, 1] and dedup must sit above retrieval.
    for (key, value) in [
        ("memory.similarity_threshold", config.memory.similarity_threshold),
        ("memory.dedup_threshold", config.memory.dedup_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be between 0.0 and 1.0, got {value}"),
            });
        }
    }
    if config.memory.dedup_threshold < config.memory.similarity_threshold {
        errors.push(ConfigError::Validation {
            message: format!(
                "memory.dedup_threshold ({}) must not be below memory.similarity_threshold ({})",
                config.memory.dedup_threshold, config.memory.similarity_threshold
            ),
        });
    }

    if config.memory.top_k == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.top_k must be at least 1".to_string(),
        });
    }

    if config.memory.history_window < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "memory.history_window must be at least 1, got {}",
                config.memory.history_window
            ),
        });
    }

    // The Graph API version segment is always "v<major>.<minor>".
    if !config.whatsapp.api_version.starts_with('v') {
        errors.push(ConfigError::Validation {
            message: format!(
                "whatsapp.api_version must start with `v`, got `{}`",
                config.whatsapp.api_version
            ),
        });
    }

    if config.image.width == 0 || config.image.height == 0 {
        errors.push(ConfigError::Validation {
            message: "image.width and image.height must be non-zero".to_string(),
        });
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of {}, got `{}`",
                valid_levels.join(", "),
                config.agent.log_level
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
