use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{QuatuorError, Result};
use crate::labels::UiLanguage;
use crate::types::ChatMode;

/// Top-level configuration for the quatuor client.
///
/// Loaded from `~/.quatuor/config.toml` by default. Each section corresponds
/// to one concern of the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuatuorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl QuatuorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: QuatuorConfig = toml::from_str(&content)?;
        config.validate()?;
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
            toml::to_string_pretty(self).map_err(|e| QuatuorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(QuatuorError::Config("backend.base_url is empty".into()));
        }
        if !(0.0..=1.0).contains(&self.speech.volume) {
            return Err(QuatuorError::Config(format!(
                "speech.volume must be within [0, 1], got {}",
                self.speech.volume
            )));
        }
        if self.speech.rate <= 0.0 || self.speech.pitch < 0.0 {
            return Err(QuatuorError::Config(
                "speech.rate must be positive and speech.pitch non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// General client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory for the stored credential and other client files.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Interface language code (en, fr, de).
    pub language: UiLanguage,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.quatuor".to_string(),
            log_level: "warn".to_string(),
            language: UiLanguage::En,
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the chat backend; API routes live under `/api`.
    pub base_url: String,
    /// Per-request timeout enforced by the HTTP transport.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Mode selected at startup.
    pub default_mode: ChatMode,
}

/// A synthesis voice exposed by the command-line TTS backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceEntry {
    /// Name passed to the TTS program.
    pub name: String,
    /// BCP 47 language tag, e.g. `fr-FR`.
    pub lang: String,
}

/// Voice playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Whether replies are read aloud at startup.
    pub enabled: bool,
    pub rate: f32,
    pub pitch: f32,
    /// Playback volume in [0, 1].
    pub volume: f32,
    /// TTS program; empty disables synthesis.
    pub tts_command: String,
    /// Voices the TTS program offers.
    pub voices: Vec<VoiceEntry>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 1.0,
            pitch: 1.0,
            volume: 0.8,
            tts_command: "espeak-ng".to_string(),
            voices: vec![
                VoiceEntry {
                    name: "en-us".to_string(),
                    lang: "en-US".to_string(),
                },
                VoiceEntry {
                    name: "fr-fr".to_string(),
                    lang: "fr-FR".to_string(),
                },
                VoiceEntry {
                    name: "de".to_string(),
                    lang: "de-DE".to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provider;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = QuatuorConfig::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.language, UiLanguage::En);
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.chat.default_mode, ChatMode::Compare);
        assert!(config.speech.enabled);
        assert_eq!(config.speech.volume, 0.8);
        assert_eq!(config.speech.voices.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
language = "fr"
log_level = "debug"

[backend]
base_url = "https://chat.example.org"

[chat]
default_mode = "claude"

[speech]
enabled = false
volume = 0.5
"#;
        let file = create_temp_config(content);
        let config = QuatuorConfig::load(file.path()).unwrap();
        assert_eq!(config.general.language, UiLanguage::Fr);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.backend.base_url, "https://chat.example.org");
        assert_eq!(config.backend.request_timeout_secs, 120);
        assert_eq!(config.chat.default_mode, ChatMode::Single(Provider::Claude));
        assert!(!config.speech.enabled);
        assert_eq!(config.speech.volume, 0.5);
        assert_eq!(config.speech.rate, 1.0);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let file = create_temp_config("");
        let config = QuatuorConfig::load(file.path()).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_load_unknown_mode_fails() {
        let file = create_temp_config("[chat]\ndefault_mode = \"llama\"\n");
        let result = QuatuorConfig::load(file.path());
        assert!(matches!(result, Err(QuatuorError::Config(_))));
    }

    #[test]
    fn test_load_out_of_range_volume_fails() {
        let file = create_temp_config("[speech]\nvolume = 1.5\n");
        assert!(QuatuorConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = QuatuorConfig::load_or_default(Path::new("/nonexistent/quatuor.toml"));
        assert_eq!(config.general.log_level, "warn");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = QuatuorConfig::default();
        config.general.language = UiLanguage::De;
        config.chat.default_mode = ChatMode::Single(Provider::Gemini);
        config.save(&path).unwrap();

        let loaded = QuatuorConfig::load(&path).unwrap();
        assert_eq!(loaded.general.language, UiLanguage::De);
        assert_eq!(loaded.chat.default_mode, ChatMode::Single(Provider::Gemini));
    }
}
