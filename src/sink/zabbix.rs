//! `zabbix_sender` process sink

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info, instrument};

use super::ReportSink;
use crate::config::SenderConfig;
use crate::error::SinkError;
use crate::transformer::{MetricLine, SenderFormatter};

/// Sends batches through `zabbix_sender -vv -c <agent config> -i - [-s <host>]`
///
/// The batch is written to the child's stdin once, stdin is closed, and the
/// exit code becomes the send status.
#[derive(Debug, Clone)]
pub struct ZabbixSender {
    program: String,
    agent_config: PathBuf,
    sender_hostname: Option<String>,
    formatter: SenderFormatter,
}

impl ZabbixSender {
    /// Create a sender for the given binary and agent configuration file
    pub fn new(program: impl Into<String>, agent_config: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            agent_config: agent_config.into(),
            sender_hostname: None,
            formatter: SenderFormatter::new(),
        }
    }

    /// Build from the `sender` configuration section
    pub fn from_config(config: &SenderConfig) -> Self {
        let sender = Self::new(&config.program, &config.agent_config);
        match &config.hostname {
            Some(hostname) => sender.with_sender_hostname(hostname),
            None => sender,
        }
    }

    /// Host name the values are reported for (`-s`)
    pub fn with_sender_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.sender_hostname = Some(hostname.into());
        self
    }

    /// Program that is spawned
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments passed to the program
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-vv".to_string(),
            "-c".to_string(),
            self.agent_config.display().to_string(),
            "-i".to_string(),
            "-".to_string(),
        ];
        if let Some(hostname) = &self.sender_hostname {
            args.push("-s".to_string());
            args.push(hostname.clone());
        }
        args
    }
}

impl ReportSink for ZabbixSender {
    #[instrument(skip(self, batch), fields(program = %self.program, lines = batch.len()))]
    async fn send(&self, batch: &[MetricLine]) -> Result<i32, SinkError> {
        let payload = self.formatter.format(batch);

        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SinkError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // stdout/stderr are drained while the batch is written; -vv output
        // fills the pipes long before a large batch is consumed
        let stdin = child.stdin.take();
        let write = async {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(payload.as_bytes()).await {
                    Ok(()) => {}
                    // the exit status tells us what happened
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        debug!("Sender closed stdin before reading the whole batch");
                    }
                    Err(e) => return Err(SinkError::from(e)),
                }
            }
            Ok(())
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        written?;
        let output = output?;
        debug!("Finished sending data");

        let code = output.status.code().ok_or_else(|| SinkError::Terminated {
            program: self.program.clone(),
        })?;
        info!(return_code = code, "Found return code");

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if code != 0 {
            error!(
                return_code = code,
                stdout = %stdout.trim_end(),
                stderr = %stderr.trim_end(),
                batch = %payload.trim_end(),
                "zabbix_sender did not accept the batch"
            );
        } else {
            debug!(stdout = %stdout.trim_end(), stderr = %stderr.trim_end(), "zabbix_sender output");
        }

        Ok(code)
    }
}
