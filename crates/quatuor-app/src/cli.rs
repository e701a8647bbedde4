//! CLI argument definitions for the quatuor client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use quatuor_core::{ChatMode, QuatuorConfig, UiLanguage};

/// quatuor: ask ChatGPT, Gemini, DeepSeek and Claude at once, by text or voice.
#[derive(Parser, Debug)]
#[command(name = "quatuor", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the chat backend.
    #[arg(short = 'b', long = "backend-url")]
    pub backend_url: Option<String>,

    /// Directory for the saved access token.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Interface language (en, fr, de).
    #[arg(long = "language")]
    pub language: Option<String>,

    /// Starting mode: compare, chatgpt, gemini, deepseek or claude.
    #[arg(short = 'm', long = "mode")]
    pub mode: Option<ChatMode>,

    /// Access token to use and save, instead of signing in.
    #[arg(long = "token")]
    pub token: Option<String>,

    /// Start with voice playback off.
    #[arg(long = "no-speech")]
    pub no_speech: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > QUATUOR_CONFIG env var > ~/.quatuor/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("QUATUOR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --backend-url flag > QUATUOR_BACKEND_URL env var > config file value.
    pub fn resolve_backend_url(&self, config: &QuatuorConfig) -> String {
        if let Some(ref url) = self.backend_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("QUATUOR_BACKEND_URL") {
            if !url.trim().is_empty() {
                return url;
            }
        }
        config.backend.base_url.clone()
    }

    /// Priority: --data-dir flag > config file value, with `~` expanded.
    pub fn resolve_data_dir(&self, config: &QuatuorConfig) -> PathBuf {
        match self.data_dir {
            Some(ref p) => p.clone(),
            None => expand_home(&config.general.data_dir),
        }
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config: &QuatuorConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }

    pub fn resolve_language(&self, config: &QuatuorConfig) -> UiLanguage {
        self.language
            .as_deref()
            .map(UiLanguage::from_code)
            .unwrap_or(config.general.language)
    }

    pub fn resolve_mode(&self, config: &QuatuorConfig) -> ChatMode {
        self.mode.unwrap_or(config.chat.default_mode)
    }

    /// Priority: --token flag > QUATUOR_TOKEN env var. `None` keeps the saved token.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(ref t) = self.token {
            return Some(t.clone());
        }
        std::env::var("QUATUOR_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
    }

    pub fn resolve_speech_enabled(&self, config: &QuatuorConfig) -> bool {
        config.speech.enabled && !self.no_speech
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".quatuor").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
