//! rabbitmq-zabbix - RabbitMQ metrics and discovery for Zabbix
//!
//! Intended to be run by the Zabbix agent, once per item check.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use rabbitmq_zabbix::checks::Checks;
use rabbitmq_zabbix::cli::{Check, Cli};
use rabbitmq_zabbix::collector::ManagementClient;
use rabbitmq_zabbix::config::Config;
use rabbitmq_zabbix::error::AppError;
use rabbitmq_zabbix::sink::ZabbixSender;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration, then layer CLI/env overrides on top
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.validate()?;

    // Initialize logging
    let _guard = rabbitmq_zabbix::init_logging(
        &config.logging.level.to_string(),
        config.logging.file.as_deref(),
    )?;

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        check = %cli.check,
        host = %config.rabbitmq.host,
        "Starting rabbitmq-zabbix"
    );

    // Fail fast on bad input before touching the network
    let filters = config.filter_spec(cli.filters.as_deref())?;
    if cli.check == Check::Server && cli.metric.as_deref().unwrap_or_default().is_empty() {
        return Err(AppError::MissingMetric.into());
    }

    let client = ManagementClient::new(
        config.rabbitmq.protocol.as_str(),
        &config.rabbitmq.host,
        config.rabbitmq.port,
        config.rabbitmq.timeout_ms,
    )?
    .with_auth(&config.rabbitmq.username, &config.rabbitmq.password);
    let sender = ZabbixSender::from_config(&config.sender);
    let checks = Checks::new(client, sender, filters);

    let node = cli.node.as_deref().unwrap_or(&config.rabbitmq.host);
    let output = match checks.run(cli.check, cli.metric.as_deref(), node).await {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, check = %cli.check, "Check failed");
            return Err(e.into());
        }
    };

    println!("{}", output.render()?);

    Ok(ExitCode::from(output.exit_code().clamp(0, 255) as u8))
}
