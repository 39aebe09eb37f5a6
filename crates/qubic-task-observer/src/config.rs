/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed and validated observer configuration
[POS]:    Configuration layer - gateway and polling setup
[UPDATE]: When adding new configuration options
*/

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use qubic_task_adapter::{ClientConfig, DEFAULT_BASE_URL, GatewayClient};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the task observer
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ObserverConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

/// API gateway connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token; the prototype gateway accepts requests without one
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Status polling cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Stop polling once a terminal status has been observed
    #[serde(default = "default_stop_on_terminal")]
    pub stop_on_terminal: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            stop_on_terminal: default_stop_on_terminal(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    3_000
}

fn default_stop_on_terminal() -> bool {
    true
}

impl ObserverConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse config yaml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling.interval_ms == 0 {
            return Err(anyhow!("polling.interval_ms must be greater than zero"));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(anyhow!("gateway.timeout_secs must be greater than zero"));
        }
        if self
            .gateway
            .auth_token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            return Err(anyhow!("gateway.auth_token must not be blank when set"));
        }
        // Building the client parses the base URL.
        self.build_client().context("invalid gateway settings")?;
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.gateway.timeout_secs),
            connect_timeout: Duration::from_secs(self.gateway.connect_timeout_secs),
        }
    }

    pub fn build_client(&self) -> Result<GatewayClient> {
        let mut client =
            GatewayClient::with_config_and_base_url(self.client_config(), &self.gateway.base_url)
                .map_err(|err| anyhow!("create GatewayClient failed: {err}"))?;
        if let Some(token) = &self.gateway.auth_token {
            client.set_auth_token(token.clone());
        }
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = ObserverConfig::from_yaml("{}").unwrap();
        assert_eq!(config.gateway.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.polling.interval(), Duration::from_secs(3));
        assert!(config.polling.stop_on_terminal);
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
gateway:
  base_url: "http://gateway.internal:9000/api"
  auth_token: "tok"
polling:
  interval_ms: 250
"#;
        let config = ObserverConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.polling.interval_ms, 250);
        assert_eq!(config.gateway.timeout_secs, 30);
        let client = config.build_client().unwrap();
        assert_eq!(client.auth_token(), Some("tok"));
        assert_eq!(client.base_url().as_str(), "http://gateway.internal:9000/api/");
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = ObserverConfig::from_yaml("polling:\n  interval_ms: 0\n").unwrap_err();
        assert!(err.to_string().contains("interval_ms"));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(ObserverConfig::from_yaml("gateway:\n  base_url: \"not a url\"\n").is_err());
    }
}
