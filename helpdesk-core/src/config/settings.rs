//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/helpdesk/config.toml).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content, written on first start.
const DEFAULT_CONFIG_TOML: &str = r#"# helpdesk configuration file
# Located at: ~/.config/helpdesk/config.toml
#
# This file contains non-sensitive configuration.
# Secrets (API keys) are loaded from environment variables:
#   - OPENAI_API_KEY (or the variable named by generation.api_key_env)

[gateway]
host = "127.0.0.1"
port = 8000
cors_origins = ["http://localhost:3000"]

[logging]
level = "info"

[database]
# path = "/var/lib/helpdesk/helpdesk.sqlite3"

[knowledge]
corpus_path = "knowledge.txt"
max_results = 3
min_overlap = 1
normalize_scores = false
# stopwords = ["the", "a", "an"]

[prompt]
max_chars = 6000

[generation]
base_url = "https://api.openai.com/v1"
model = "gpt-3.5-turbo"
api_key_env = "OPENAI_API_KEY"
timeout_seconds = 30
max_tokens = 500
temperature = 0.7
max_concurrent = 16

[escalation]
ticket_notice = "I've created a support ticket for your question. Our team will get back to you soon."
generation_failure_notice = "Note: this is an automated fallback answer because the assistant is unavailable. A support ticket has been created for your question."

# Phrases that mark a generated answer as unsatisfactory.
# Set a built-in phrase to false to disable it.
[escalation.fallback_phrases]
# "i'm sorry, but" = false
# "we could not find" = true

[[escalation.offline_answers]]
keywords = ["password", "reset", "forgot"]
answer = "To reset your password, click the 'Forgot Password' link on the login page. Enter your email address, and we'll send you a password reset link. Click the link in the email to create a new password."

[[escalation.offline_answers]]
keywords = ["account", "create", "signup", "sign up"]
answer = "To create an account, visit our website and click the 'Sign Up' button. You'll need to provide your email address, create a password, and verify your email address."

[[escalation.offline_answers]]
keywords = ["billing", "payment", "pay", "subscription"]
answer = "We accept all major credit cards, PayPal, and bank transfers. You can update your billing information in your account settings under Billing > Payment Methods."

[[escalation.offline_answers]]
keywords = ["upload", "file", "document"]
answer = "To upload files, click the 'Upload' button in the main interface. You can drag and drop files directly into the upload area or click to browse your computer."

[[escalation.offline_answers]]
keywords = ["share", "collaborate", "permission"]
answer = "You can share documents by clicking the 'Share' button on any document. Enter the email addresses of people you want to share with and set their permission level."

[[escalation.offline_answers]]
keywords = ["support", "help", "contact"]
answer = "You can contact our support team by email, through the live chat on our website, or by phone during business hours."

[[escalation.offline_answers]]
keywords = ["mobile", "app", "phone"]
answer = "Yes, we have mobile apps available for iOS and Android devices. You can download them from the App Store or Google Play Store."

[[escalation.offline_answers]]
keywords = ["security", "privacy", "data"]
answer = "We take data security seriously. All data is encrypted in transit and at rest, and we follow industry-standard security practices."

[[escalation.offline_answers]]
keywords = ["limit", "storage", "quota"]
answer = "Free accounts can upload up to 1GB of files. Paid plans offer 10GB, 100GB, and unlimited storage depending on your subscription level."
"#;

/// Settings loaded from TOML configuration file.
///
/// These are non-sensitive configuration values that can be safely
/// stored in files and version controlled (excluding secrets).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Gateway server configuration
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Ticket database location
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Knowledge corpus and retrieval tuning
    #[serde(default)]
    pub knowledge: KnowledgeSettings,

    /// Prompt assembly limits
    #[serde(default)]
    pub prompt: PromptSettings,

    /// Language model endpoint
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Fallback detection and ticket notices
    #[serde(default)]
    pub escalation: EscalationSettings,
}

/// Gateway server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySettings {
    /// Host to bind to
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer (empty = same-origin only)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace), used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Database settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseSettings {
    /// Override for the SQLite file (defaults to the XDG data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Knowledge corpus settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KnowledgeSettings {
    /// Path of the plain-text corpus
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Maximum number of sections returned per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Minimum number of shared tokens for a section to count as relevant
    #[serde(default = "default_min_overlap")]
    pub min_overlap: usize,

    /// Rank by overlap divided by sqrt(section token count)
    #[serde(default)]
    pub normalize_scores: bool,

    /// Replaces the built-in stopword list when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
}

/// Prompt assembly settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptSettings {
    /// Character budget for system + user prompt text
    #[serde(default = "default_prompt_max_chars")]
    pub max_chars: usize,

    /// Replaces the built-in instruction preamble when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
}

/// Generation endpoint settings (OpenAI-compatible Chat Completions)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationSettings {
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Name of the env var holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Upper bound for a single generation call, including queueing
    #[serde(default = "default_generation_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_generation_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_generation_temperature")]
    pub temperature: f32,

    /// Maximum number of generation calls in flight at once
    #[serde(default = "default_generation_max_concurrent")]
    pub max_concurrent: usize,
}

/// Escalation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EscalationSettings {
    /// Appended to a fallback answer after its ticket is created
    #[serde(default = "default_ticket_notice")]
    pub ticket_notice: String,

    /// Appended to the offline answer when generation failed
    #[serde(default = "default_generation_failure_notice")]
    pub generation_failure_notice: String,

    /// Offline answer used when no keyword rule or corpus section applies
    #[serde(default = "default_offline_answer")]
    pub default_answer: String,

    /// Phrase -> marks-fallback overrides, merged over the built-in list
    #[serde(default)]
    pub fallback_phrases: BTreeMap<String, bool>,

    /// Keyword rules for offline answers, checked in order.
    ///
    /// Empty by default: the built-in rules ship only in the config file
    /// written on first run, so `Settings::default()` answers offline from
    /// the corpus and `default_answer` alone.
    #[serde(default)]
    pub offline_answers: Vec<OfflineAnswer>,
}

/// Canned answer chosen when any keyword appears in the question.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OfflineAnswer {
    pub keywords: Vec<String>,
    pub answer: String,
}

// Default value functions

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_corpus_path() -> String {
    "knowledge.txt".to_string()
}

fn default_max_results() -> usize {
    3
}

fn default_min_overlap() -> usize {
    1
}

fn default_prompt_max_chars() -> usize {
    6000
}

fn default_generation_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_generation_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_generation_timeout_seconds() -> u64 {
    30
}

fn default_generation_max_tokens() -> u32 {
    500
}

fn default_generation_temperature() -> f32 {
    0.7
}

fn default_generation_max_concurrent() -> usize {
    16
}

fn default_ticket_notice() -> String {
    "I've created a support ticket for your question. Our team will get back to you soon."
        .to_string()
}

fn default_generation_failure_notice() -> String {
    "Note: this is an automated fallback answer because the assistant is unavailable. \
     A support ticket has been created for your question."
        .to_string()
}

fn default_offline_answer() -> String {
    "I'm sorry, but I don't have enough information to answer your question.".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            max_results: default_max_results(),
            min_overlap: default_min_overlap(),
            normalize_scores: false,
            stopwords: None,
        }
    }
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            max_chars: default_prompt_max_chars(),
            preamble: None,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            model: default_generation_model(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_generation_timeout_seconds(),
            max_tokens: default_generation_max_tokens(),
            temperature: default_generation_temperature(),
            max_concurrent: default_generation_max_concurrent(),
        }
    }
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            ticket_notice: default_ticket_notice(),
            generation_failure_notice: default_generation_failure_notice(),
            default_answer: default_offline_answer(),
            fallback_phrases: BTreeMap::new(),
            offline_answers: Vec::new(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    /// The file is located at `~/.config/helpdesk/config.toml`.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        Self::load_from_path(&config_path)
    }

    /// Load settings from a specific TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the configuration file path.
    ///
    /// Uses XDG config directory: `~/.config/helpdesk/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("HELPDESK_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("helpdesk");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.gateway.host, "127.0.0.1");
        assert_eq!(settings.gateway.port, 8000);
        assert!(settings.gateway.cors_origins.is_empty());

        assert_eq!(settings.logging.level, "info");
        assert!(settings.database.path.is_none());

        assert_eq!(settings.knowledge.corpus_path, "knowledge.txt");
        assert_eq!(settings.knowledge.max_results, 3);
        assert_eq!(settings.knowledge.min_overlap, 1);
        assert!(!settings.knowledge.normalize_scores);
        assert!(settings.knowledge.stopwords.is_none());

        assert_eq!(settings.prompt.max_chars, 6000);
        assert_eq!(settings.generation.model, "gpt-3.5-turbo");
        assert_eq!(settings.generation.max_tokens, 500);
        assert_eq!(settings.generation.api_key_env, "OPENAI_API_KEY");

        assert!(settings.escalation.fallback_phrases.is_empty());
        assert!(settings.escalation.offline_answers.is_empty());
    }

    #[test]
    fn test_bind_addr() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_default_config_file_parses() {
        let settings = Settings::from_toml(DEFAULT_CONFIG_TOML).unwrap();

        assert_eq!(settings.gateway.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(settings.generation.timeout_seconds, 30);
        assert_eq!(settings.escalation.offline_answers.len(), 9);
        assert!(
            settings.escalation.offline_answers[0]
                .keywords
                .contains(&"password".to_string())
        );
        assert!(settings.escalation.fallback_phrases.is_empty());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
[gateway]
host = "0.0.0.0"
port = 9000

[knowledge]
corpus_path = "/srv/faq.md"
max_results = 5
normalize_scores = true
stopwords = ["the"]

[prompt]
max_chars = 2000
preamble = "Answer briefly."

[generation]
base_url = "http://127.0.0.1:11434/v1"
model = "llama3.1"
timeout_seconds = 5

[escalation.fallback_phrases]
"i'm sorry, but" = false
"please contact us" = true
"#;

        let settings = Settings::from_toml(toml).unwrap();

        assert_eq!(settings.bind_addr(), "0.0.0.0:9000");
        assert_eq!(settings.knowledge.corpus_path, "/srv/faq.md");
        assert_eq!(settings.knowledge.max_results, 5);
        assert_eq!(settings.knowledge.min_overlap, 1);
        assert!(settings.knowledge.normalize_scores);
        assert_eq!(settings.knowledge.stopwords, Some(vec!["the".to_string()]));
        assert_eq!(settings.prompt.max_chars, 2000);
        assert_eq!(settings.prompt.preamble.as_deref(), Some("Answer briefly."));
        assert_eq!(settings.generation.model, "llama3.1");
        assert_eq!(settings.generation.max_tokens, 500);
        assert_eq!(
            settings.escalation.fallback_phrases.get("i'm sorry, but"),
            Some(&false)
        );
        assert_eq!(
            settings.escalation.fallback_phrases.get("please contact us"),
            Some(&true)
        );
    }

    #[test]
    fn test_from_toml_partial() {
        let settings = Settings::from_toml("[gateway]\nport = 3001\n").unwrap();
        assert_eq!(settings.gateway.port, 3001);
        assert_eq!(settings.gateway.host, "127.0.0.1");
        assert_eq!(settings.knowledge.max_results, 3);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let mut settings = Settings::default();
        settings.knowledge.max_results = 7;
        settings
            .escalation
            .fallback_phrases
            .insert("no idea".to_string(), true);

        let content = settings.to_toml().unwrap();
        let parsed = Settings::from_toml(&content).unwrap();
        assert_eq!(parsed.knowledge.max_results, 7);
        assert_eq!(parsed.escalation.fallback_phrases.get("no idea"), Some(&true));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let settings = Settings::load_from_path(&path).unwrap();
        assert_eq!(settings.logging.level, "debug");
    }
}
