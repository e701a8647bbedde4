//! quatuor binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Open the stored credential and build the HTTP transport
//! 3. Set up voice playback through the configured TTS program
//! 4. Run the interactive loop until EOF, `/quit` or Ctrl-C

mod cli;
mod render;
mod repl;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use quatuor_chat::{AuthStore, ChatState, ConversationOrchestrator, FileAuthStore, HttpTransport};
use quatuor_core::QuatuorConfig;
use quatuor_speech::{CommandSynthesizer, SpeechCoordinator, Voice, VoiceSettings};

use cli::CliArgs;
use repl::Repl;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = QuatuorConfig::load_or_default(&config_file);
    config.backend.base_url = args.resolve_backend_url(&config);

    // Tracing. Logs go to stderr so they never interleave with the transcript.
    let log_level = args.resolve_log_level(&config);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting quatuor v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");
    config.validate()?;

    // Credential.
    let data_dir = args.resolve_data_dir(&config);
    let auth = Arc::new(FileAuthStore::open(data_dir.join("token")));
    if let Some(token) = args.resolve_token() {
        auth.set_token(&token)?;
        tracing::info!(path = %auth.path().display(), "Access token saved");
    }

    // Transport and conversation logic.
    let transport = Arc::new(HttpTransport::from_config(&config.backend, auth)?);
    tracing::info!(base_url = %transport.base_url(), "Backend configured");
    let orchestrator =
        ConversationOrchestrator::new(transport.clone()).with_file_store(transport.clone());

    // Voice playback.
    let language = args.resolve_language(&config);
    let (speech_tx, speech_rx) = mpsc::unbounded_channel();
    let settings = VoiceSettings::new(
        config.speech.rate,
        config.speech.pitch,
        config.speech.volume,
    );
    let mut speech = SpeechCoordinator::new(language.code(), settings)
        .with_enabled(args.resolve_speech_enabled(&config));
    if config.speech.tts_command.trim().is_empty() {
        tracing::info!("No TTS program configured, voice playback unavailable");
    } else {
        let voices = config
            .speech
            .voices
            .iter()
            .map(|v| Voice::new(v.name.clone(), v.lang.clone()))
            .collect();
        speech = speech.with_synthesizer(Box::new(CommandSynthesizer::new(
            config.speech.tts_command.clone(),
            voices,
            speech_tx,
        )));
        tracing::info!(program = %config.speech.tts_command, "Voice playback ready");
    }

    let state = ChatState::new(language, args.resolve_mode(&config));
    Repl::new(orchestrator, transport, state, speech)
        .run(speech_rx)
        .await?;

    tracing::info!("quatuor stopped");
    Ok(())
}
