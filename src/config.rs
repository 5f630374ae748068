//! Configuration management for rabbitmq-zabbix
//!
//! Handles loading and validating configuration from YAML files, and layering
//! command-line/environment overrides on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::{Cli, LogLevel};
use crate::error::FilterError;
use crate::transformer::FilterSpec;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Management API connection
    #[serde(default)]
    pub rabbitmq: RabbitMqConfig,

    /// zabbix_sender invocation
    #[serde(default)]
    pub sender: SenderConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default entity filters, same shape as `--filters`
    #[serde(default)]
    pub filters: Option<serde_json::Value>,
}

/// Management API scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Management API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RabbitMqConfig {
    #[serde(default)]
    pub protocol: Protocol,

    /// Broker host; also the default node for the `server` check
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_credential")]
    pub username: String,

    #[serde(default = "default_credential")]
    pub password: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// zabbix_sender settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Sender binary
    #[serde(default = "default_sender_program")]
    pub program: String,

    /// Zabbix agent configuration passed with `-c`
    #[serde(default = "default_agent_config")]
    pub agent_config: PathBuf,

    /// Host name passed with `-s`; the agent config decides when unset
    pub hostname: Option<String>,
}

/// Log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Append logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

// Default value functions
/// This machine's host name; `localhost` when it cannot be read
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn default_host() -> String {
    local_hostname()
}

fn default_port() -> u16 {
    15672
}

fn default_credential() -> String {
    "guest".to_string()
}

fn default_timeout() -> u64 {
    5000
}

fn default_sender_program() -> String {
    "zabbix_sender".to_string()
}

fn default_agent_config() -> PathBuf {
    PathBuf::from("/etc/zabbix/zabbix_agentd.conf")
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for RabbitMqConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            host: default_host(),
            port: default_port(),
            username: default_credential(),
            password: default_credential(),
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            program: default_sender_program(),
            agent_config: default_agent_config(),
            hostname: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file given with `--config`, or start from defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Layer command-line and environment values over the file values
    ///
    /// Precedence: CLI arguments, environment variables, configuration file,
    /// defaults. clap resolves the first two.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(protocol) = cli.protocol {
            self.rabbitmq.protocol = protocol;
        }
        if let Some(host) = &cli.hostname {
            self.rabbitmq.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.rabbitmq.port = port;
        }
        if let Some(username) = &cli.username {
            self.rabbitmq.username = username.clone();
        }
        if let Some(password) = &cli.password {
            self.rabbitmq.password = password.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.rabbitmq.timeout_ms = timeout;
        }
        if let Some(program) = &cli.sender_program {
            self.sender.program = program.clone();
        }
        if let Some(conf) = &cli.conf {
            self.sender.agent_config = conf.clone();
        }
        if let Some(hostname) = &cli.sender_hostname {
            self.sender.hostname = Some(hostname.clone());
        }
        if let Some(level) = cli.log_level {
            self.logging.level = level;
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = Some(file.clone());
        }
    }

    /// Resolve the active filters: `--filters` wins over the file's `filters`
    pub fn filter_spec(&self, override_json: Option<&str>) -> Result<FilterSpec, FilterError> {
        match (override_json, &self.filters) {
            (Some(json), _) => FilterSpec::parse(json),
            (None, Some(value)) => FilterSpec::from_json(value.clone()),
            (None, None) => Ok(FilterSpec::match_all()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rabbitmq.port == 0 {
            return Err(ConfigError::ValidationError(
                "RabbitMQ API port must be greater than 0".to_string(),
            ));
        }

        if self.rabbitmq.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "RabbitMQ API host must not be empty".to_string(),
            ));
        }

        if self.rabbitmq.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.sender.program.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Sender program must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
