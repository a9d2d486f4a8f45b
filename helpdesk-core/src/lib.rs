//! helpdesk-core: configuration shared by the helpdesk crates.

pub mod config;

pub use config::{
    Config, ConfigError, DatabaseSettings, EscalationSettings, GatewaySettings,
    GenerationSettings, KnowledgeSettings, LoggingSettings, OfflineAnswer, PromptSettings,
    Secrets, SecretsError, Settings, SettingsError, load_dotenv,
};

#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
