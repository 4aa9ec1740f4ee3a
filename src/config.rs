//! Provider configuration.
//!
//! The host passes the provider block as a JSON object. The API token may be
//! omitted there, in which case it is taken from the `DEPLOY_TOKEN`
//! environment variable.

use serde::Deserialize;
use url::Url;

use crate::error::{ProviderError, Result};
use crate::schema::{Attribute, Schema};

/// Environment variable consulted when `api_token` is not configured.
pub const TOKEN_ENV_VAR: &str = "DEPLOY_TOKEN";

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://dash.deno.com";

/// Resolved provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Bearer token used for every request. Empty means anonymous.
    pub api_token: String,
    /// Base endpoint all API paths are resolved against.
    pub base_url: Url,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
}

impl ProviderConfig {
    /// Build a configuration for the default endpoint.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL"),
        }
    }

    /// Point the configuration at another endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url)?;
        Ok(self)
    }

    /// Resolve the configuration from the host's provider block.
    ///
    /// A null value is treated as an empty block.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Self::from_value_with_env(value, |key| std::env::var(key).ok())
    }

    /// Like [`ProviderConfig::from_value`] with an explicit environment lookup.
    pub fn from_value_with_env(
        value: serde_json::Value,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let raw: RawConfig = if value.is_null() {
            RawConfig::default()
        } else {
            serde_json::from_value(value)
                .map_err(|e| ProviderError::Configuration(format!("invalid provider block: {e}")))?
        };

        let api_token = raw
            .api_token
            .filter(|t| !t.is_empty())
            .or_else(|| env(TOKEN_ENV_VAR).filter(|t| !t.is_empty()))
            .ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "api_token must be set in the provider block or through {TOKEN_ENV_VAR}"
                ))
            })?;

        let config = Self::new(api_token);
        match raw.base_url {
            Some(base_url) => config.with_base_url(&base_url),
            None => Ok(config),
        }
    }

    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "api_token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("API Token used for accessing Deno Deploy"),
            )
            .with_attribute(
                "base_url",
                Attribute::optional_string()
                    .with_description("API endpoint")
                    .with_default(serde_json::Value::String(DEFAULT_BASE_URL.to_string())),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_token_from_block() {
        let config =
            ProviderConfig::from_value_with_env(json!({"api_token": "ddp_abc"}), no_env).unwrap();
        assert_eq!(config.api_token, "ddp_abc");
        assert_eq!(config.base_url.as_str(), "https://dash.deno.com/");
    }

    #[test]
    fn test_token_from_env_fallback() {
        let config = ProviderConfig::from_value_with_env(json!({}), |key| {
            (key == TOKEN_ENV_VAR).then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(config.api_token, "from-env");

        let config = ProviderConfig::from_value_with_env(serde_json::Value::Null, |_| {
            Some("null-block".to_string())
        })
        .unwrap();
        assert_eq!(config.api_token, "null-block");
    }

    #[test]
    fn test_block_wins_over_env() {
        let config = ProviderConfig::from_value_with_env(json!({"api_token": "block"}), |_| {
            Some("env".to_string())
        })
        .unwrap();
        assert_eq!(config.api_token, "block");
    }

    #[test]
    fn test_missing_token() {
        let err = ProviderConfig::from_value_with_env(json!({"api_token": ""}), no_env).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_base_url_override() {
        let config = ProviderConfig::from_value_with_env(
            json!({"api_token": "t", "base_url": "http://127.0.0.1:8080"}),
            no_env,
        )
        .unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8080/");

        let err = ProviderConfig::from_value_with_env(
            json!({"api_token": "t", "base_url": "not a url"}),
            no_env,
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Url(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ProviderConfig::new("secret-token");
        assert!(!format!("{:?}", config).contains("secret-token"));
    }
}
