//! Secrets configuration loaded from environment variables only.
//!
//! This module handles sensitive configuration like API keys that should
//! never be stored in files. All secrets are read from environment variables.

use std::env;

/// Secrets loaded exclusively from environment variables.
///
/// These are sensitive values that should never be written to disk
/// or committed to version control.
#[derive(Clone, Default)]
pub struct Secrets {
    /// Generation API key (env: OPENAI_API_KEY unless overridden)
    pub generation_api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field(
                "generation_api_key",
                &self.generation_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Errors that can occur when loading secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Invalid secret name: {0}")]
    InvalidName(String),
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// This function also loads .env file if present (for development),
    /// but production should rely on actual environment variables.
    pub fn from_env(api_key_env: &str) -> Result<Self, SecretsError> {
        let _ = dotenvy::dotenv();

        Self::from_env_inner(api_key_env)
    }

    /// Internal method to load from environment without loading .env
    pub(crate) fn from_env_inner(api_key_env: &str) -> Result<Self, SecretsError> {
        let name = api_key_env.trim();
        if name.is_empty() || name.contains('=') {
            return Err(SecretsError::InvalidName(api_key_env.to_string()));
        }

        let generation_api_key = env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self { generation_api_key })
    }

    /// Whether a generation API key is available
    pub fn has_generation_key(&self) -> bool {
        self.generation_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ENV_MUTEX;

    #[test]
    fn test_secrets_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { env::set_var("HELPDESK_TEST_KEY_A", "sk-test") }

        let secrets = Secrets::from_env_inner("HELPDESK_TEST_KEY_A").unwrap();
        assert_eq!(secrets.generation_api_key, Some("sk-test".to_string()));
        assert!(secrets.has_generation_key());

        unsafe { env::remove_var("HELPDESK_TEST_KEY_A") }
    }

    #[test]
    fn test_missing_key_is_not_an_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { env::remove_var("HELPDESK_TEST_KEY_B") }

        let secrets = Secrets::from_env_inner("HELPDESK_TEST_KEY_B").unwrap();
        assert!(!secrets.has_generation_key());
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { env::set_var("HELPDESK_TEST_KEY_C", "   ") }

        let secrets = Secrets::from_env_inner("HELPDESK_TEST_KEY_C").unwrap();
        assert!(!secrets.has_generation_key());

        unsafe { env::remove_var("HELPDESK_TEST_KEY_C") }
    }

    #[test]
    fn test_invalid_env_name() {
        assert!(matches!(
            Secrets::from_env_inner(""),
            Err(SecretsError::InvalidName(_))
        ));
        assert!(matches!(
            Secrets::from_env_inner("A=B"),
            Err(SecretsError::InvalidName(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let secrets = Secrets {
            generation_api_key: Some("sk-secret".to_string()),
        };
        let rendered = format!("{:?}", secrets);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("redacted"));
    }
}
