//! CLI argument parsing for rabbitmq-zabbix
//!
//! This module provides the command-line interface using clap derive macros.
//! Option names follow the Zabbix `UserParameter` lines already deployed for
//! this tool, so `--senderhostname`, `--logfile` and `--loglevel` keep their
//! unhyphenated spelling.
//!
//! # Options
//!
//! - `--check`: Check to run (required)
//! - `--username` / `--password`: Management API credentials (env: RABBITMQ_ZABBIX_USERNAME / _PASSWORD)
//! - `--hostname` / `--port` / `--protocol`: Management API location
//! - `--timeout`: HTTP timeout in milliseconds
//! - `--metric`: Metric to read for `--check server`
//! - `--node`: Node to read for `--check server` (defaults to `--hostname`)
//! - `--filters`: JSON filter object or array of objects
//! - `--conf`: Zabbix agent configuration passed to zabbix_sender
//! - `--senderhostname`: Host name passed to zabbix_sender
//! - `--sender-program`: zabbix_sender binary
//! - `--logfile` / `--loglevel`: Log destination and level
//! - `--config` / `-c`: YAML configuration file
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Protocol;

/// rabbitmq-zabbix - RabbitMQ metrics and discovery for Zabbix
///
/// Polls the RabbitMQ management API and either prints low-level discovery
/// JSON, sends queue/consumer values through zabbix_sender, or prints a
/// single server value.
#[derive(Parser, Debug)]
#[command(name = "rabbitmq-zabbix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Type of check
    #[arg(long, value_enum, value_name = "CHECK")]
    pub check: Check,

    /// YAML configuration file
    #[arg(short, long, value_name = "FILE", env = "RABBITMQ_ZABBIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// RabbitMQ API username
    #[arg(long, value_name = "USERNAME", env = "RABBITMQ_ZABBIX_USERNAME")]
    pub username: Option<String>,

    /// RabbitMQ API password
    #[arg(long, value_name = "PASSWORD", env = "RABBITMQ_ZABBIX_PASSWORD")]
    pub password: Option<String>,

    /// RabbitMQ API host
    #[arg(long, value_name = "HOST", env = "RABBITMQ_ZABBIX_HOSTNAME")]
    pub hostname: Option<String>,

    /// Use http or https
    #[arg(long, value_enum, value_name = "PROTOCOL", env = "RABBITMQ_ZABBIX_PROTOCOL")]
    pub protocol: Option<Protocol>,

    /// RabbitMQ API port
    #[arg(long, value_name = "PORT", env = "RABBITMQ_ZABBIX_PORT")]
    pub port: Option<u16>,

    /// RabbitMQ API timeout in milliseconds
    #[arg(long, value_name = "MS", env = "RABBITMQ_ZABBIX_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Which metric to evaluate (valid for --check=server)
    #[arg(long, value_name = "METRIC")]
    pub metric: Option<String>,

    /// Which node to check (valid for --check=server)
    #[arg(long, value_name = "NODE")]
    pub node: Option<String>,

    /// Filter queues/consumers: a JSON object or an array of objects
    #[arg(long, value_name = "JSON", env = "RABBITMQ_ZABBIX_FILTERS")]
    pub filters: Option<String>,

    /// Zabbix agent configuration file passed to zabbix_sender
    #[arg(long, value_name = "FILE", env = "RABBITMQ_ZABBIX_CONF")]
    pub conf: Option<PathBuf>,

    /// Host name passed to zabbix_sender
    #[arg(
        long = "senderhostname",
        alias = "sender-hostname",
        value_name = "HOST",
        env = "RABBITMQ_ZABBIX_SENDER_HOSTNAME"
    )]
    pub sender_hostname: Option<String>,

    /// zabbix_sender binary
    #[arg(long, value_name = "PROGRAM", env = "RABBITMQ_ZABBIX_SENDER_PROGRAM")]
    pub sender_program: Option<String>,

    /// File to append logs to (defaults to stderr)
    #[arg(
        long = "logfile",
        alias = "log-file",
        value_name = "FILE",
        env = "RABBITMQ_ZABBIX_LOGFILE"
    )]
    pub log_file: Option<PathBuf>,

    /// Log level
    #[arg(
        long = "loglevel",
        alias = "log-level",
        value_enum,
        ignore_case = true,
        env = "RABBITMQ_ZABBIX_LOGLEVEL"
    )]
    pub log_level: Option<LogLevel>,
}

/// Checks selectable with `--check`
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Check {
    /// Queue discovery JSON
    #[value(name = "list_queues")]
    ListQueues,
    /// Consumer discovery JSON
    #[value(name = "list_consumers")]
    ListConsumers,
    /// Node discovery JSON
    #[value(name = "list_nodes")]
    ListNodes,
    /// Send queue values through zabbix_sender
    #[value(name = "queues")]
    Queues,
    /// Send consumer values through zabbix_sender
    #[value(name = "consumers")]
    Consumers,
    /// Print the aliveness-test status of the default vhost
    #[value(name = "check_aliveness")]
    CheckAliveness,
    /// Print one overview or node value
    #[value(name = "server")]
    Server,
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Check::ListQueues => "list_queues",
            Check::ListConsumers => "list_consumers",
            Check::ListNodes => "list_nodes",
            Check::Queues => "queues",
            Check::Consumers => "consumers",
            Check::CheckAliveness => "check_aliveness",
            Check::Server => "server",
        };
        f.write_str(name)
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}
