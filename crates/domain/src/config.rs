use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Static key/value pairs exposed to templates via the metadata
    /// lookup function.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_dns_port")]
    pub dns_port: u16,
    #[serde(default = "default_rules_file")]
    pub rules_file: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Per-attempt receive timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Overall bound on the retry loop for one query.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_dns_port() -> u16 {
    1053
}
fn default_rules_file() -> String {
    "rules.conf".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_timeout_ms() -> u64 {
    1000
}
fn default_deadline_ms() -> u64 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            dns_port: default_dns_port(),
            rules_file: default_rules_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            deadline_ms: default_deadline_ms(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("synthdns.toml").exists() {
            Self::from_file("synthdns.toml")?
        } else if std::path::Path::new("/etc/synthdns/config.toml").exists() {
            Self::from_file("/etc/synthdns/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(rules) = overrides.rules_file {
            self.server.rules_file = rules;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }
        if self.upstream.timeout_ms == 0 || self.upstream.deadline_ms == 0 {
            return Err(ConfigError::Validation(
                "Upstream timeout and deadline must be non-zero".to_string(),
            ));
        }
        if self.upstream.timeout_ms > self.upstream.deadline_ms {
            return Err(ConfigError::Validation(
                "Upstream per-attempt timeout cannot exceed the deadline".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub rules_file: Option<String>,
    pub log_level: Option<String>,
}
