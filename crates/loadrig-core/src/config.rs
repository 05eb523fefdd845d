use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub report: ReportConfig,
    pub requests: Vec<RequestSpec>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Checks the invariants a run depends on. A config that fails here is
    /// rejected by `start` before the loop is entered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests.is_empty() {
            return Err(ConfigError::NoRequests);
        }
        for (index, spec) in self.requests.iter().enumerate() {
            if spec.endpoint.is_empty() {
                return Err(ConfigError::EmptyEndpoint { index });
            }
        }
        if self.batch.size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.report.interval_ms == 0 {
            return Err(ConfigError::ZeroReportInterval);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Base URL every request endpoint is resolved against
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl TargetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of dispatches launched per batch
    #[serde(default = "default_batch_size")]
    pub size: u32,
    /// Pause between launching successive dispatches within a batch
    #[serde(default = "default_intra_delay_ms")]
    pub intra_delay_ms: u64,
    /// Pause between batches
    #[serde(default = "default_inter_delay_ms")]
    pub inter_delay_ms: u64,
}

impl BatchConfig {
    pub fn intra_delay(&self) -> Duration {
        Duration::from_millis(self.intra_delay_ms)
    }

    pub fn inter_delay(&self) -> Duration {
        Duration::from_millis(self.inter_delay_ms)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            intra_delay_ms: default_intra_delay_ms(),
            inter_delay_ms: default_inter_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// How often the stats reporter logs a snapshot, in milliseconds
    #[serde(default = "default_report_interval_ms")]
    pub interval_ms: u64,
}

impl ReportConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_report_interval_ms(),
        }
    }
}

/// One request the generator cycles through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Path relative to the target base URL
    pub endpoint: String,
    #[serde(default)]
    pub method: Method,
    /// Payload for POST requests, sent as application/json
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_batch_size() -> u32 {
    100
}

fn default_intra_delay_ms() -> u64 {
    100
}

fn default_inter_delay_ms() -> u64 {
    1_000
}

fn default_report_interval_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde() {
        let config_str = r#"
[target]
base_url = "http://127.0.0.1:3000"
timeout_ms = 2000

[batch]
size = 10
intra_delay_ms = 50
inter_delay_ms = 500

[report]
interval_ms = 1000

[[requests]]
endpoint = "index.html"

[[requests]]
endpoint = "api/data"
method = "POST"
body = '{ "ping": true }'
        "#;

        let config: Config = toml::from_str(config_str).unwrap();
        assert_eq!(config.target.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.target.timeout_ms, 2000);
        assert_eq!(config.batch.size, 10);
        assert_eq!(config.batch.intra_delay_ms, 50);
        assert_eq!(config.batch.inter_delay_ms, 500);
        assert_eq!(config.report.interval_ms, 1000);
        assert_eq!(config.requests.len(), 2);
        assert_eq!(config.requests[0].method, Method::Get);
        assert_eq!(config.requests[1].method, Method::Post);
        assert_eq!(
            config.requests[1].body.as_deref(),
            Some(r#"{ "ping": true }"#)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_applied() {
        let config_str = r#"
[target]
base_url = "http://127.0.0.1:3000"

[[requests]]
endpoint = "index.html"
        "#;

        let config: Config = toml::from_str(config_str).unwrap();
        assert_eq!(config.target.timeout_ms, 5_000);
        assert_eq!(config.batch.size, 100);
        assert_eq!(config.batch.intra_delay_ms, 100);
        assert_eq!(config.batch.inter_delay_ms, 1_000);
        assert_eq!(config.report.interval_ms, 5_000);
    }

    fn valid_config() -> Config {
        Config {
            target: TargetConfig {
                base_url: "http://127.0.0.1:3000".to_string(),
                timeout_ms: 1000,
            },
            batch: BatchConfig::default(),
            report: ReportConfig::default(),
            requests: vec![RequestSpec {
                endpoint: "index.html".to_string(),
                method: Method::Get,
                body: None,
            }],
        }
    }

    #[test]
    fn test_validate_rejects_empty_request_list() {
        let mut config = valid_config();
        config.requests.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoRequests));
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let mut config = valid_config();
        config.requests[0].endpoint.clear();
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyEndpoint { index: 0 })
        );
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut config = valid_config();
        config.batch.size = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroBatchSize));
    }

    #[test]
    fn test_validate_rejects_zero_report_interval() {
        let mut config = valid_config();
        config.report.interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroReportInterval));
    }
}
