//! Configuration management for helpdesk.
//!
//! This module provides a unified configuration system that separates
//! secrets (from environment variables) from settings (from TOML files).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `OPENAI_API_KEY` - generation API key (name configurable via
//!   `generation.api_key_env`)
//!
//! ## Settings (TOML File)
//! Located at `~/.config/helpdesk/config.toml` (or `$HELPDESK_CONFIG_DIR`):
//! ```toml
//! [gateway]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [knowledge]
//! corpus_path = "knowledge.txt"
//! max_results = 3
//!
//! [generation]
//! model = "gpt-3.5-turbo"
//! timeout_seconds = 30
//! ```

mod secrets;
mod settings;

use std::path::Path;

pub use secrets::{Secrets, SecretsError};
pub use settings::{
    DatabaseSettings, EscalationSettings, GatewaySettings, GenerationSettings,
    KnowledgeSettings, LoggingSettings, OfflineAnswer, PromptSettings, Settings, SettingsError,
};

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("knowledge.max_results must be at least 1")]
    NoResultsAllowed,

    #[error("generation.max_concurrent must be at least 1")]
    NoConcurrencyAllowed,

    #[error("generation.timeout_seconds must be at least 1")]
    ZeroTimeout,

    #[error("prompt.max_chars ({0}) is too small to hold any question")]
    PromptBudgetTooSmall(usize),
}

/// Smallest prompt budget accepted at startup.
pub const MIN_PROMPT_CHARS: usize = 512;

impl Config {
    /// Load configuration from all sources.
    ///
    /// This loads:
    /// 1. Settings from the TOML file (creating defaults if needed)
    /// 2. Secrets from environment variables (after `.env`)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Settings::load()?;
        Self::from_settings(settings)
    }

    /// Load configuration using a specific settings file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let settings = Settings::load_from_path(path)?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env(&settings.generation.api_key_env)?;
        let config = Self { secrets, settings };
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the pipeline unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.settings;
        if settings.knowledge.max_results == 0 {
            return Err(ConfigError::NoResultsAllowed);
        }
        if settings.generation.max_concurrent == 0 {
            return Err(ConfigError::NoConcurrencyAllowed);
        }
        if settings.generation.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if settings.prompt.max_chars < MIN_PROMPT_CHARS {
            return Err(ConfigError::PromptBudgetTooSmall(settings.prompt.max_chars));
        }
        Ok(())
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        self.settings.bind_addr()
    }

    /// Get the generation API key (if configured).
    pub fn generation_api_key(&self) -> Option<&str> {
        self.secrets.generation_api_key.as_deref()
    }
}

/// Load .env file if it exists (for development convenience).
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
