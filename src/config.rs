use std::env;
use std::time::Duration;

use crate::error::{PhotorealError, Result};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GENERATE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_EDIT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub generate_model: String,
    pub edit_model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            generate_model: DEFAULT_GENERATE_MODEL.to_string(),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

// Keeps the key out of debug output.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.masked_key())
            .field("api_base", &self.api_base)
            .field("generate_model", &self.generate_model)
            .field("edit_model", &self.edit_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = non_empty_env("GEMINI_API_KEY")
            .or_else(|| non_empty_env("API_KEY"))
            .or_else(|| non_empty_env("GOOGLE_API_KEY"));
        let api_base = non_empty_env("GEMINI_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let generate_model = non_empty_env("PHOTOREAL_GENERATE_MODEL")
            .unwrap_or_else(|| DEFAULT_GENERATE_MODEL.to_string());
        let edit_model =
            non_empty_env("PHOTOREAL_EDIT_MODEL").unwrap_or_else(|| DEFAULT_EDIT_MODEL.to_string());
        let timeout = non_empty_env("PHOTOREAL_TIMEOUT_SECS")
            .and_then(|secs| secs.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        GeminiConfig {
            api_key,
            api_base,
            generate_model,
            edit_model,
            timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_generate_model(mut self, model: impl Into<String>) -> Self {
        self.generate_model = model.into();
        self
    }

    pub fn with_edit_model(mut self, model: impl Into<String>) -> Self {
        self.edit_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the API key or a `ConfigError` naming the variables that were checked.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PhotorealError::ConfigError(
                    "GEMINI_API_KEY, API_KEY or GOOGLE_API_KEY not set".to_string(),
                )
            })
    }

    pub fn masked_key(&self) -> String {
        match self.api_key.as_deref() {
            Some(key) if key.chars().count() > 4 => {
                format!("{}****", key.chars().take(4).collect::<String>())
            }
            Some(_) => "****".to_string(),
            None => "<unset>".to_string(),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = GeminiConfig::new()
            .with_api_key("abcdef123")
            .with_api_base("http://localhost:9000/")
            .with_generate_model("imagen-test")
            .with_edit_model("gemini-test")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.api_base, "http://localhost:9000");
        assert_eq!(config.generate_model, "imagen-test");
        assert_eq!(config.edit_model, "gemini-test");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.require_api_key().unwrap(), "abcdef123");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = GeminiConfig::new();
        assert!(matches!(
            config.require_api_key(),
            Err(PhotorealError::ConfigError(_))
        ));

        let blank = GeminiConfig::new().with_api_key("   ");
        assert!(blank.require_api_key().is_err());
    }

    #[test]
    fn test_debug_masks_key() {
        let config = GeminiConfig::new().with_api_key("secret-key-value");
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("secr****"));
        assert!(!rendered.contains("secret-key-value"));
    }
}
