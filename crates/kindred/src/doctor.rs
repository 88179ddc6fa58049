// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kindred doctor` command implementation.
//!
//! Checks configuration, credentials, and local state without making any
//! billable API calls. Each check prints one line; the command fails only
//! when the companion could not start at all.

use std::path::PathBuf;

use kindred_config::KindredConfig;
use kindred_core::{KindredError, PluginAdapter, StorageAdapter};
use kindred_memory::ModelFiles;
use kindred_storage::SqliteStorage;

enum CheckResult {
    Ok(String),
    Warn(String),
    Fail(String),
}

fn print_check(name: &str, result: &CheckResult) {
    match result {
        CheckResult::Ok(detail) => println!("  ok    {name}: {detail}"),
        CheckResult::Warn(detail) => println!("  warn  {name}: {detail}"),
        CheckResult::Fail(detail) => println!("  FAIL  {name}: {detail}"),
    }
}

/// Runs the `kindred doctor` command.
pub async fn run_doctor(config: KindredConfig) -> Result<(), KindredError> {
    println!("kindred doctor");

    let mut failed = false;
    let mut check = |name: &str, result: CheckResult| {
        if matches!(result, CheckResult::Fail(_)) {
            failed = true;
        }
        print_check(name, &result);
    };

    // Groq credentials gate generation, routing, vision, and transcription.
    check(
        "groq api key",
        match kindred_groq::resolve_api_key(&config.groq.api_key) {
            Ok(_) => CheckResult::Ok(format!("present (text model {})", config.groq.text_model)),
            Err(e) => CheckResult::Fail(e.to_string()),
        },
    );

    // WhatsApp credentials: optional, but all-or-nothing.
    check(
        "whatsapp",
        match (
            &config.whatsapp.access_token,
            &config.whatsapp.phone_number_id,
            &config.whatsapp.verify_token,
        ) {
            (Some(_), Some(id), Some(_)) => {
                CheckResult::Ok(format!("configured (phone number id {id})"))
            }
            (None, _, _) => CheckResult::Warn(
                "not configured; only the debug API will be reachable".to_string(),
            ),
            _ => CheckResult::Fail(
                "partially configured: access_token, phone_number_id, and verify_token are all required"
                    .to_string(),
            ),
        },
    );

    check(
        "voice replies",
        match &config.speech.elevenlabs_api_key {
            Some(key) if !key.is_empty() => {
                CheckResult::Ok(format!("elevenlabs configured (voice {})", config.speech.voice_id))
            }
            _ => CheckResult::Warn("no elevenlabs key; audio requests degrade to text".to_string()),
        },
    );

    check(
        "debug api",
        match &config.gateway.bearer_token {
            _ if !config.gateway.enabled => CheckResult::Warn("gateway disabled".to_string()),
            Some(_) => CheckResult::Ok(format!(
                "enabled on {}:{}",
                config.gateway.host, config.gateway.port
            )),
            None => CheckResult::Warn(
                "no bearer token; /v1/messages will reject every request".to_string(),
            ),
        },
    );

    // Storage: open, migrate, health-check, close.
    let storage_result = async {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        storage.health_check().await?;
        storage.close().await?;
        Ok::<(), KindredError>(())
    }
    .await;
    check(
        "storage",
        match storage_result {
            Ok(()) => CheckResult::Ok(config.storage.database_path.clone()),
            Err(e) => CheckResult::Fail(e.to_string()),
        },
    );

    // Memory model files (informational; serve downloads them on demand).
    let data_dir = dirs::data_dir()
        .map(|d| d.join("kindred"))
        .unwrap_or_else(|| PathBuf::from("."));
    let model_files = ModelFiles::new(config.memory.model_dir.as_deref(), &data_dir);
    check(
        "memory model",
        if !config.memory.enabled {
            CheckResult::Warn("memory disabled by configuration".to_string())
        } else if model_files.is_available() {
            CheckResult::Ok(model_files.model_dir().display().to_string())
        } else {
            CheckResult::Warn(format!(
                "not downloaded yet (will fetch to {} on first serve)",
                model_files.model_dir().display()
            ))
        },
    );

    if failed {
        Err(KindredError::Config(
            "doctor found blocking problems".to_string(),
        ))
    } else {
        println!("all checks passed");
        Ok(())
    }
}
