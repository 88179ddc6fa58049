// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading, merging, and diagnostics.

use kindred_config::{load_and_validate_str, ConfigError};

#[test]
fn empty_config_yields_defaults() {
    let config = load_and_validate_str("").unwrap();
    assert_eq!(config.agent.name, "kindred");
    assert_eq!(config.gateway.port, 8080);
    assert!(config.whatsapp.access_token.is_none());
}

#[test]
fn sections_override_defaults() {
    let toml = r#"
[agent]
name = "nadia"
log_level = "debug"

[groq]
text_model = "llama-3.1-70b"
max_tokens = 2048

[whatsapp]
access_token = "EAAG-test"
phone_number_id = "1234567890"
verify_token = "hunter2"

[gateway]
port = 9090
bearer_token = "secret"

[memory]
top_k = 8
"#;
    let config = load_and_validate_str(toml).unwrap();
    assert_eq!(config.agent.name, "nadia");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.groq.text_model, "llama-3.1-70b");
    assert_eq!(config.groq.max_tokens, 2048);
    assert_eq!(config.whatsapp.access_token.as_deref(), Some("EAAG-test"));
    assert_eq!(config.gateway.port, 9090);
    assert_eq!(config.memory.top_k, 8);
    // Untouched sections keep defaults.
    assert_eq!(config.image.model, "flux");
}

#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[agent]
nmae = "typo"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey { key, suggestion, .. } => {
                Some((key.clone(), suggestion.clone()))
            }
            _ => None,
        })
        .expect("expected an UnknownKey error");
    assert!(unknown.0.contains("nmae"));
    assert_eq!(unknown.1.as_deref(), Some("name"));
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telgram]
bot_token = "nope"
"#;
    assert!(load_and_validate_str(toml).is_err());
}

#[test]
fn wrong_type_is_rejected() {
    let toml = r#"
[gateway]
port = "eighty-eighty"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
fn validation_errors_surface_after_successful_parse() {
    let toml = r#"
[memory]
similarity_threshold = 2.0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| e.to_string().contains("similarity_threshold")));
}
