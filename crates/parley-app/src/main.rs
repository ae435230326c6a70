//! Parley application binary - composition root.
//!
//! Ties together all Parley crates into a single executable:
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the REST capability clients from the services config
//! 4. Wire the conversation orchestrator
//! 5. Run the conversation loop over the chosen modality port

mod cli;
mod console;
mod speech;

use std::path::PathBuf;

use clap::Parser;

use parley_chat::{Capabilities, ConversationOrchestrator};
use parley_clients::{
    FileFrameSource, ModalityPort, RestBlobStore, RestChatCompletion, RestImageGeneration,
    RestSceneCaption,
};
use parley_core::config::ParleyConfig;

use crate::cli::{CliArgs, Modality};
use crate::console::ConsolePort;
use crate::speech::SpeechPort;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = ParleyConfig::load_or_default(&config_file);

    // Tracing. RUST_LOG wins over the flag, the flag over the config file.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Data directory for snapshots and generated images.
    let data_dir = resolve_data_dir(&args.resolve_data_dir(&config.general.data_dir));
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    // Capability clients over the configured service endpoints. The camera
    // collaborator reads whatever frame was last dropped at the snapshot path.
    let capabilities = Capabilities {
        chat: Box::new(RestChatCompletion::from_config(&config.services)?),
        vision: Box::new(RestSceneCaption::from_config(&config.services)?),
        imaging: Box::new(RestImageGeneration::from_config(&config.services)?),
        blobs: Box::new(RestBlobStore::from_config(&config.services)),
        frames: Box::new(FileFrameSource::new(
            data_dir.join(&config.generation.snapshot_file),
        )),
    };

    let mut orchestrator =
        ConversationOrchestrator::new(&config, capabilities).with_output_dir(&data_dir);

    // Modality port.
    let mut port: Box<dyn ModalityPort> = match args.modality {
        Modality::Console => Box::new(ConsolePort::new()),
        Modality::Speech => {
            let speech = SpeechPort::new(&config.speech);
            if !speech.is_available() {
                tracing::warn!("Speech backend unavailable; responses fall back to stdout");
            }
            Box::new(speech)
        }
    };

    orchestrator.run(port.as_mut()).await?;
    Ok(())
}
