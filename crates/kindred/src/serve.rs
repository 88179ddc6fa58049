// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kindred serve` command implementation.
//!
//! Wires the full companion: SQLite storage, the Groq provider, modality
//! adapters, long-term memory, the WhatsApp channel, the gateway (webhook
//! + debug API), and the agent loop. Supports graceful shutdown on
//! Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use kindred_agent::{
    AgentLoop, ChannelMultiplexer, ContextAssembler, MemorySystem, ResponseRouter,
    TurnController,
};
use kindred_config::KindredConfig;
use kindred_core::{
    ChannelAdapter, EmbeddingAdapter, KindredError, ProviderAdapter, StorageAdapter,
};
use kindred_gateway::{GatewayChannel, GatewayChannelConfig};
use kindred_groq::{GroqProvider, ImageDescriber};
use kindred_image::{PollinationsGenerator, ScenarioBuilder};
use kindred_memory::{
    MemoryAnalyzer, MemoryRetriever, MemoryStore, MiniLmEmbedder, ModelFiles,
};
use kindred_speech::{ElevenLabsSynthesizer, WhisperTranscriber};
use kindred_storage::SqliteStorage;
use kindred_whatsapp::WhatsAppChannel;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs the `kindred serve` command.
pub async fn run_serve(config: KindredConfig) -> Result<(), KindredError> {
    init_tracing(&config.agent.log_level);

    info!("starting kindred serve");

    // Storage first: everything else hangs off the database.
    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    let storage: Arc<dyn StorageAdapter> = storage;

    // Groq provider (generation, routing, memory analysis).
    let provider = Arc::new(GroqProvider::new(&config).map_err(|e| {
        error!(error = %e, "failed to initialize Groq provider");
        eprintln!(
            "error: Groq API key required. Set groq.api_key in kindred.toml or the GROQ_API_KEY environment variable."
        );
        e
    })?);
    let groq_client = provider.client();
    let provider: Arc<dyn ProviderAdapter> = provider;

    // Turn controller core.
    let assembler = ContextAssembler::load(
        &config.agent,
        config.groq.text_model.clone(),
        config.groq.max_tokens,
    )
    .await;
    let mut turn = TurnController::new(
        provider.clone(),
        assembler,
        ResponseRouter::new(config.groq.router_model.clone()),
        ScenarioBuilder::new(config.groq.router_model.clone()),
    );

    // Vision rides on the same Groq credentials.
    turn = turn.with_vision(Arc::new(ImageDescriber::new(
        groq_client,
        config.groq.vision_model.clone(),
    )));

    // Speech: transcription always (same key as the provider), synthesis
    // only when ElevenLabs credentials are present.
    let groq_key = kindred_groq::resolve_api_key(&config.groq.api_key)?;
    let transcriber = Arc::new(WhisperTranscriber::new(
        groq_key,
        config.speech.whisper_model.clone(),
    )?);
    let synthesizer = match config.speech.elevenlabs_api_key {
        Some(ref key) if !key.is_empty() => {
            let tts = ElevenLabsSynthesizer::new(
                key.clone(),
                config.speech.voice_id.clone(),
                config.speech.tts_model.clone(),
            )?;
            Some(Arc::new(tts) as Arc<dyn kindred_core::TextToSpeechAdapter>)
        }
        _ => {
            info!("no ElevenLabs key configured, voice replies degrade to text");
            None
        }
    };
    turn = turn.with_speech(transcriber, synthesizer);

    // Image generation.
    turn = turn.with_image_gen(Arc::new(PollinationsGenerator::new(config.image.clone())?));

    // Long-term memory (best-effort: a failed model download just means
    // the companion runs without memory).
    if config.memory.enabled {
        match initialize_memory(&config).await {
            Ok(memory) => {
                turn = turn.with_memory(memory);
                info!("memory system initialized");
            }
            Err(e) => {
                warn!(error = %e, "memory initialization failed, continuing without memory");
            }
        }
    } else {
        info!("memory system disabled by configuration");
    }

    let turn = Arc::new(turn);

    // Channels.
    let mut mux = ChannelMultiplexer::new();

    let whatsapp_ingress = if config.whatsapp.access_token.is_some() {
        let channel = WhatsAppChannel::new(&config.whatsapp)?;
        let ingress = channel.ingress();
        mux.add_channel("whatsapp".to_string(), Box::new(channel));
        info!("whatsapp channel added");
        Some(ingress)
    } else {
        info!("whatsapp channel skipped (no access_token configured)");
        None
    };

    if config.gateway.enabled {
        if config.whatsapp.access_token.is_some() && config.whatsapp.verify_token.is_none() {
            return Err(KindredError::Config(
                "whatsapp.verify_token is required when the WhatsApp webhook is enabled".into(),
            ));
        }
        let gateway = GatewayChannel::new(GatewayChannelConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
            bearer_token: config.gateway.bearer_token.clone(),
            verify_token: config.whatsapp.verify_token.clone(),
            whatsapp: whatsapp_ingress,
        });
        mux.add_channel("api".to_string(), Box::new(gateway));
        info!(
            host = config.gateway.host.as_str(),
            port = config.gateway.port,
            "gateway channel added"
        );
    } else if whatsapp_ingress.is_some() {
        warn!("whatsapp is configured but the gateway is disabled; no webhook will be served");
    }

    mux.connect().await?;
    info!(channels = mux.channel_count(), "channel multiplexer connected");

    // Run the loop until Ctrl-C.
    let mut agent_loop = AgentLoop::new(
        Box::new(mux),
        storage,
        turn,
        config.memory.history_window,
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            signal_cancel.cancel();
        }
    });

    agent_loop.run(cancel).await
}

/// Builds the memory subsystem: model files, embedder, store, retriever,
/// analyzer.
async fn initialize_memory(config: &KindredConfig) -> Result<MemorySystem, KindredError> {
    let data_dir = dirs::data_dir()
        .map(|d| d.join("kindred"))
        .unwrap_or_else(|| PathBuf::from("."));

    let model_files = ModelFiles::new(config.memory.model_dir.as_deref(), &data_dir);
    let model_dir = model_files.ensure().await?;

    let embedder = Arc::new(MiniLmEmbedder::load(&model_dir)?);
    let embedder: Arc<dyn EmbeddingAdapter> = embedder;

    let store = Arc::new(MemoryStore::open(&config.storage.database_path).await?);
    let retriever = Arc::new(MemoryRetriever::new(
        store.clone(),
        embedder.clone(),
        config.memory.clone(),
    ));
    let analyzer = Arc::new(MemoryAnalyzer::new(
        config.groq.router_model.clone(),
        config.memory.dedup_threshold,
    ));

    Ok(MemorySystem {
        store,
        embedder,
        retriever,
        analyzer,
        top_k: config.memory.top_k,
    })
}

/// Initializes the tracing subscriber from the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
