//! zabbix_sender input format
//!
//! This module renders metric lines into the input accepted by
//! `zabbix_sender -i -`, one item per line:
//!
//! ```text
//! <hostname> <key> <value>
//! ```
//!
//! The hostname column is always `-`, which makes zabbix_sender use the host
//! given with `-s` or the agent configuration.

use super::extractor::MetricLine;
use crate::collector::FieldValue;

/// zabbix_sender input formatter
///
/// # Example
///
/// ```ignore
/// use rabbitmq_zabbix::transformer::{MetricLine, SenderFormatter};
///
/// let lines = vec![MetricLine::new("rabbitmq.queues[/,queue_messages,orders]", 5)];
/// let batch = SenderFormatter::new().format(&lines);
/// assert_eq!(batch, "- \"rabbitmq.queues[/,queue_messages,orders]\" 5\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SenderFormatter;

impl SenderFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self
    }

    /// Format a batch, one newline-terminated line per metric
    pub fn format(&self, lines: &[MetricLine]) -> String {
        let mut output = String::with_capacity(lines.len() * 64);
        for line in lines {
            output.push_str(&self.format_line(line));
            output.push('\n');
        }
        output
    }

    /// Format a single line without the trailing newline
    pub fn format_line(&self, line: &MetricLine) -> String {
        format!(
            "- {} {}",
            Self::quote(&line.key),
            Self::format_value(&line.value)
        )
    }

    /// Render a value, quoting it when zabbix_sender would split it
    fn format_value(value: &FieldValue) -> String {
        let rendered = value.to_string();
        if rendered.is_empty() || rendered.chars().any(|c| c.is_whitespace() || c == '"') {
            Self::quote(&rendered)
        } else {
            rendered
        }
    }

    /// Wrap in double quotes, escaping backslash and double-quote
    fn quote(text: &str) -> String {
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push('"');
        for c in text.chars() {
            match c {
                '\\' => quoted.push_str("\\\\"),
                '"' => quoted.push_str("\\\""),
                _ => quoted.push(c),
            }
        }
        quoted.push('"');
        quoted
    }
}
