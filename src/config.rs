//! Configuration management for the CRPT client.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CrptError, Result};
use crate::ratelimit::TimeWindow;

/// Registry endpoint used when none is configured.
pub const DEFAULT_API_URL: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";
/// Product group used when a submission does not name one.
pub const DEFAULT_PRODUCT_GROUP: &str = "clothes";

/// Main configuration for the CRPT client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrptConfig {
    /// HTTP client configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Registry "create document" endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Product group sent as `pg` when the caller does not pick one
    #[serde(default = "default_product_group")]
    pub default_product_group: String,

    /// Bearer token sent with every submission
    #[serde(default = "default_token")]
    pub token: String,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            default_product_group: default_product_group(),
            token: default_token(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_product_group() -> String {
    DEFAULT_PRODUCT_GROUP.to_string()
}

fn default_token() -> String {
    "token".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Window unit; the limit applies over one unit of this length
    #[serde(default = "default_window")]
    pub window: TimeWindow,

    /// Maximum submissions per window, must be positive
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: i64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            requests_per_window: default_requests_per_window(),
        }
    }
}

fn default_window() -> TimeWindow {
    TimeWindow::Second
}

fn default_requests_per_window() -> i64 {
    5
}

impl CrptConfig {
    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| CrptError::Config(e.to_string()))
    }

    /// Load configuration from an optional file overlaid with `CRPT__*`
    /// environment variables, e.g. `CRPT__RATE_LIMITING__REQUESTS_PER_WINDOW=10`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(Environment::with_prefix("CRPT").separator("__"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CrptError::Config(format!("Failed to load configuration: {}", e)))
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limiting.requests_per_window <= 0 {
            return Err(CrptError::Config(format!(
                "requests_per_window must be positive, got {}",
                self.rate_limiting.requests_per_window
            )));
        }
        reqwest::Url::parse(&self.client.api_url)
            .map_err(|e| CrptError::Config(format!("invalid api_url {}: {}", self.client.api_url, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrptConfig::default();
        assert_eq!(config.client.api_url, DEFAULT_API_URL);
        assert_eq!(config.client.default_product_group, "clothes");
        assert_eq!(config.client.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.rate_limiting.window, TimeWindow::Second);
        assert_eq!(config.rate_limiting.requests_per_window, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
client:
  default_product_group: milk
rate_limiting:
  window: minute
  requests_per_window: 100
"#;
        let config = CrptConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.client.default_product_group, "milk");
        assert_eq!(config.client.api_url, DEFAULT_API_URL);
        assert_eq!(config.rate_limiting.window, TimeWindow::Minute);
        assert_eq!(config.rate_limiting.requests_per_window, 100);
    }

    #[test]
    fn test_validate_rejects_non_positive_limit() {
        let yaml = "rate_limiting:\n  requests_per_window: 0\n";
        let config = CrptConfig::from_yaml(yaml).unwrap();
        assert!(matches!(config.validate(), Err(CrptError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = CrptConfig::default();
        config.client.api_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(CrptError::Config(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = CrptConfig::from_yaml("rate_limiting: [1, 2");
        assert!(matches!(result, Err(CrptError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("crpt-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "client:\n  token: secret\nrate_limiting:\n  window: hour\n  requests_per_window: 7\n",
        )
        .unwrap();

        let config = CrptConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.client.token, "secret");
        assert_eq!(config.rate_limiting.window, TimeWindow::Hour);
        assert_eq!(config.rate_limiting.requests_per_window, 7);
    }
}
