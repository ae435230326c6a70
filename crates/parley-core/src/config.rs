use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};

/// Top-level configuration for the Parley assistant.
///
/// Loaded from `~/.parley/config.toml` by default. Each section corresponds
/// to one component or cross-cutting concern. Defaults reproduce the
/// Brazilian-Portuguese persona the assistant ships with; every keyword set
/// and reply phrase can be swapped out for another locale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where snapshots and generated images are written.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.parley/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Assistant persona: system profile and every user-facing reply phrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// System profile sent ahead of the history on every completion call.
    pub system_profile: String,
    /// Spoken/printed when the session starts.
    pub greeting: String,
    /// Emitted for an empty utterance; the turn is not stored.
    pub fallback_reply: String,
    /// Acknowledgement emitted before an image-generation job.
    pub generation_ack: String,
    /// Acknowledgement emitted before a scene description.
    pub describe_ack: String,
    /// Appended between the question and the scene caption.
    pub describe_suffix: String,
    /// Emitted before the imagine-the-scene generation overlay.
    pub imagine_reply: String,
    /// Emitted when a capability call fails; the loop continues.
    pub apology: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            system_profile: "Você é uma agente de inovação senior do mercado de tecnologia \
                             chamada Faustina. As respostas devem ser formais e objetivas \
                             com no máximo 100 caracteres."
                .to_string(),
            greeting: "Olá, eu me chamo Faustina. Como posso te ajudar hoje?".to_string(),
            fallback_reply: "Desculpe, não entendi sua pergunta. Poderia repetir?".to_string(),
            generation_ack: "Claro, me dê um instante".to_string(),
            describe_ack: "Deixe me pensar por um momento".to_string(),
            describe_suffix: "Elabore uma pequena descrição para".to_string(),
            imagine_reply: "Eu imagino a cena da seguinte maneira".to_string(),
            apology: "Desculpe, algo deu errado ao processar sua pergunta. Vamos tentar \
                      novamente?"
                .to_string(),
        }
    }
}

/// Keyword sets that drive intent classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Exact (case-insensitive) matches that end the session.
    pub exit_words: Vec<String>,
    /// Exact (case-insensitive) matches that clear the history.
    pub restart_words: Vec<String>,
    /// Substrings that trigger image generation.
    pub generate_triggers: Vec<String>,
    /// Substrings that trigger scene description.
    pub describe_triggers: Vec<String>,
    /// Substrings that trigger the imagine-the-scene overlay.
    pub imagine_triggers: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let words = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            exit_words: words(&[":q", "quit", "exit", "sair", "pare", "parar"]),
            restart_words: words(&["limpar", "clear", "restart", "reiniciar", "limpe", "reinicie"]),
            generate_triggers: words(&["gerar", "imagem"]),
            describe_triggers: words(&["que você vê"]),
            imagine_triggers: words(&["imagine a cena"]),
        }
    }
}

/// Dialogue history bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of user/assistant pairs retained in history.
    pub window_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { window_limit: 3 }
    }
}

/// Image-generation job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on poll attempts before the job is abandoned.
    ///
    /// The upstream protocol has no timeout of its own; this cap is a
    /// deliberate liveness guard on top of it.
    pub max_poll_attempts: u32,
    /// File name for the downloaded generation result.
    pub output_file: String,
    /// File name for camera snapshots before upload.
    pub snapshot_file: String,
    /// Blob container that receives uploaded snapshots.
    pub container: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_poll_attempts: 60,
            output_file: "gen_image.jpg".to_string(),
            snapshot_file: "snapshot.jpg".to_string(),
            container: "images".to_string(),
        }
    }
}

/// Endpoints and credentials for the remote capability services.
///
/// The API key itself never lives in the file; `api_key_env` names the
/// environment variable that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Base URL of the OpenAI-compatible service (trailing slash included).
    pub endpoint: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Chat-completion deployment name.
    pub chat_deployment: String,
    /// API version query parameter for chat completions.
    pub api_version: String,
    /// API version query parameter for image generation.
    pub image_api_version: String,
    /// Base URL of the image-analysis (captioning) service.
    pub vision_endpoint: String,
    /// Language requested from the captioning service.
    pub caption_language: String,
    /// Base URL of the blob store.
    pub blob_endpoint: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key_env: "PARLEY_API_KEY".to_string(),
            chat_deployment: "gpt-35-turbo-16k".to_string(),
            api_version: "2023-03-15-preview".to_string(),
            image_api_version: "2023-09-15-preview".to_string(),
            vision_endpoint: String::new(),
            caption_language: "pt".to_string(),
            blob_endpoint: String::new(),
        }
    }
}

/// Speech channel settings, consumed by the spoken modality port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// BCP-47 tag for speech recognition.
    pub recognition_language: String,
    /// Synthesis voice name.
    pub synthesis_voice: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            recognition_language: "pt-BR".to_string(),
            synthesis_voice: "pt-BR-GiovannaNeural".to_string(),
        }
    }
}
