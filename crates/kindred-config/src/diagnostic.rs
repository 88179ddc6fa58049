// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Converts Figment deserialization errors into miette diagnostics with
//! valid key listings and "did you mean?" suggestions using Jaro-Winkler
//! string similarity.

use miette::Diagnostic;
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
/// 0.75 catches common typos like `naem` -> `name` while filtering noise.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(kindred::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// The unrecognized key name.
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        /// List of valid keys for the section.
        valid_keys: String,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(kindred::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// The key with the wrong type.
        key: String,
        /// Description of the type mismatch.
        detail: String,
        /// What type was expected.
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(kindred::config::missing_key),
        help("add `{key} = <value>` to your kindred.toml")
    )]
    MissingKey {
        /// The missing key name.
        key: String,
    },

    /// A validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(kindred::config::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(kindred::config::other))]
    Other(String),
}

/// Format the help message for unknown key errors.
fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a `figment::Error` into a list of `ConfigError` diagnostics.
///
/// A figment error may contain multiple underlying errors; each is
/// converted to the most specific variant available, with fuzzy-match
/// suggestions for unknown field errors.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    use figment::error::Kind;

    let mut errors = Vec::new();

    for error in err {
        let path = error.path.join(".");
        let config_error = match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let suggestion = suggest_key(field, &valid_keys);
                ConfigError::UnknownKey {
                    key: qualify_key(&path, field),
                    suggestion,
                    valid_keys: valid_keys.join(", "),
                }
            }
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: path.clone(),
                detail: format!("found {actual}"),
                expected: expected.clone(),
            },
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: qualify_key(&path, field),
            },
            other => ConfigError::Other(other.to_string()),
        };
        errors.push(config_error);
    }

    if errors.is_empty() {
        errors.push(ConfigError::Other("unknown configuration error".into()));
    }

    errors
}

/// Qualify a bare field name with its section path when available.
fn qualify_key(path: &str, field: &str) -> String {
    if path.is_empty() || path == field {
        field.to_string()
    } else if path.ends_with(field) {
        path.to_string()
    } else {
        format!("{path}.{field}")
    }
}

/// Suggest the closest valid key via Jaro-Winkler similarity.
fn suggest_key(input: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|k| (*k, strsim::jaro_winkler(input, k)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(k, _)| k.to_string())
}

/// Render a list of config errors to stderr as miette reports.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!(
            "{:?}",
            miette::Report::msg(error.to_string()).wrap_err("invalid configuration")
        );
        if let Some(help) = error.help() {
            eprintln!("  help: {help}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_key_catches_typos() {
        let valid = ["name", "log_level", "persona", "persona_file"];
        assert_eq!(suggest_key("naem", &valid), Some("name".to_string()));
        assert_eq!(
            suggest_key("log_lvl", &valid),
            Some("log_level".to_string())
        );
        assert_eq!(
            suggest_key("persona_fiel", &valid),
            Some("persona_file".to_string())
        );
    }

    #[test]
    fn suggest_key_rejects_noise() {
        let valid = ["name", "log_level"];
        assert_eq!(suggest_key("zzzzqqq", &valid), None);
    }

    #[test]
    fn unknown_key_help_includes_suggestion() {
        let help = format_unknown_key_help(Some("name"), "name, log_level");
        assert!(help.contains("did you mean `name`?"));
        assert!(help.contains("name, log_level"));
    }

    #[test]
    fn unknown_key_help_without_suggestion() {
        let help = format_unknown_key_help(None, "name, log_level");
        assert!(help.starts_with("valid keys:"));
    }

    #[test]
    fn qualify_key_joins_section_and_field() {
        assert_eq!(qualify_key("agent", "naem"), "agent.naem");
        assert_eq!(qualify_key("", "naem"), "naem");
        assert_eq!(qualify_key("agent.naem", "naem"), "agent.naem");
    }

    #[test]
    fn figment_errors_convert_to_diagnostics() {
        let err = crate::loader::load_config_from_str("[agent]\nnaem = \"x\"").unwrap_err();
        let errors = figment_to_config_errors(err);
        assert!(!errors.is_empty());
        match &errors[0] {
            ConfigError::UnknownKey { key, suggestion, .. } => {
                assert!(key.contains("naem"));
                assert_eq!(suggestion.as_deref(), Some("name"));
            }
            other => panic!("expected UnknownKey, got {other:?}"),
        }
    }
}
