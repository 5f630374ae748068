//! Metric delivery
//!
//! A [`ReportSink`] accepts a batch of metric lines and returns the delivery
//! status code. [`ZabbixSender`] pipes the batch into the `zabbix_sender`
//! binary; tests substitute a recording fake.

mod zabbix;

pub use zabbix::ZabbixSender;

use crate::error::SinkError;
use crate::transformer::MetricLine;

/// Destination for metric batches
///
/// The returned code follows zabbix_sender: `0` means every value was
/// accepted, `1` means at least one value was rejected.
#[allow(async_fn_in_trait)]
pub trait ReportSink {
    /// Deliver one batch
    async fn send(&self, batch: &[MetricLine]) -> Result<i32, SinkError>;
}
