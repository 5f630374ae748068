//! Check orchestration
//!
//! Each check is a single linear pass: fetch from the management API, filter,
//! extract or build discovery entries, then print or send. Nothing is kept
//! between runs.

use std::fmt;

use tracing::{debug, info, instrument};

use crate::cli::Check;
use crate::collector::{CollectResult, EntityRecord, EntitySource, FieldValue, Resource};
use crate::error::{AppError, AppResult, CollectorError};
use crate::sink::ReportSink;
use crate::transformer::{
    DiscoveryFormatter, DiscoveryPayload, EntityKind, FilterSpec, MetricExtractor, MetricLine,
    OverviewMetric, MISSING_VALUE,
};

/// Result of one check, ready to print
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutput {
    /// Low-level discovery JSON
    Discovery(DiscoveryPayload),
    /// zabbix_sender return code
    ReturnCode(i32),
    /// Aliveness status string
    Status(String),
    /// Single overview or node value
    Value(FieldValue),
}

impl CheckOutput {
    /// Text written to stdout
    pub fn render(&self) -> AppResult<String> {
        Ok(match self {
            CheckOutput::Discovery(payload) => payload.to_json()?,
            CheckOutput::ReturnCode(code) => code.to_string(),
            CheckOutput::Status(status) => status.clone(),
            CheckOutput::Value(value) => value.to_string(),
        })
    }

    /// Process exit code for this output
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckOutput::ReturnCode(code) => *code,
            _ => 0,
        }
    }
}

impl fmt::Display for CheckOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Wires an entity source and a report sink to the filtering engine
pub struct Checks<S, K> {
    source: S,
    sink: K,
    filters: FilterSpec,
    extractor: MetricExtractor,
    discovery: DiscoveryFormatter,
}

impl<S: EntitySource, K: ReportSink> Checks<S, K> {
    /// Create a check runner
    pub fn new(source: S, sink: K, filters: FilterSpec) -> Self {
        Self {
            source,
            sink,
            filters,
            extractor: MetricExtractor::new(),
            discovery: DiscoveryFormatter::new(),
        }
    }

    /// Active filters
    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    /// The entity source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The report sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one check
    ///
    /// `metric` is required for [`Check::Server`] and validated before any
    /// request is made. `node` is the node looked up for non-overview metrics.
    #[instrument(skip_all, fields(check = %check))]
    pub async fn run(&self, check: Check, metric: Option<&str>, node: &str) -> AppResult<CheckOutput> {
        debug!("Started trying to process data");
        match check {
            Check::ListQueues => self.list_queues().await.map(CheckOutput::Discovery),
            Check::ListConsumers => self.list_consumers().await.map(CheckOutput::Discovery),
            Check::ListNodes => self.list_nodes().await.map(CheckOutput::Discovery),
            Check::Queues => self.check_queues().await.map(CheckOutput::ReturnCode),
            Check::Consumers => self.check_consumers().await.map(CheckOutput::ReturnCode),
            Check::CheckAliveness => self.check_aliveness().await.map(CheckOutput::Status),
            Check::Server => {
                let metric = metric
                    .filter(|m| !m.is_empty())
                    .ok_or(AppError::MissingMetric)?;
                self.check_server(metric, node).await.map(CheckOutput::Value)
            }
        }
    }

    /// Discovery entries for matching queues
    pub async fn list_queues(&self) -> AppResult<DiscoveryPayload> {
        let queues = self.fetch_or_empty(Resource::Queues).await?;
        Ok(self
            .discovery
            .payload(&queues, EntityKind::Queue, &self.filters))
    }

    /// Discovery entries for matching consumers
    pub async fn list_consumers(&self) -> AppResult<DiscoveryPayload> {
        let consumers = self.fetch_or_empty(Resource::Consumers).await?;
        Ok(self
            .discovery
            .payload(&consumers, EntityKind::Consumer, &self.filters))
    }

    /// Discovery entries for matching cluster nodes
    pub async fn list_nodes(&self) -> AppResult<DiscoveryPayload> {
        let nodes = self.source.fetch(Resource::Nodes).await?;
        Ok(self.discovery.payload(&nodes, EntityKind::Node, &self.filters))
    }

    /// Send values of matching queues; returns the sender's return code
    pub async fn check_queues(&self) -> AppResult<i32> {
        let queues = self.fetch_or_empty(Resource::Queues).await?;
        let batch = self.collect_lines(&queues, EntityKind::Queue);
        self.send_batch(&batch).await
    }

    /// Send states of matching consumers; returns the sender's return code
    pub async fn check_consumers(&self) -> AppResult<i32> {
        let consumers = self.fetch_or_empty(Resource::Consumers).await?;
        let batch = self.collect_lines(&consumers, EntityKind::Consumer);
        self.send_batch(&batch).await
    }

    /// Aliveness-test status of the default vhost
    pub async fn check_aliveness(&self) -> AppResult<String> {
        let records = self.source.fetch(Resource::Aliveness).await?;
        records
            .first()
            .and_then(|r| r.get("status"))
            .map(|status| match status {
                FieldValue::Null => MISSING_VALUE.to_string(),
                status => status.to_string(),
            })
            .ok_or_else(|| {
                CollectorError::JsonParse("aliveness-test response has no status".to_string())
                    .into()
            })
    }

    /// One overview value, or one field of the node matching `node`
    pub async fn check_server(&self, metric: &str, node: &str) -> AppResult<FieldValue> {
        if let Some(overview_metric) = OverviewMetric::from_name(metric) {
            let records = self.source.fetch(Resource::Overview).await?;
            let overview = records.into_iter().next().unwrap_or_default();
            return Ok(self.extractor.overview_value(&overview, overview_metric));
        }

        let nodes = self.source.fetch(Resource::Nodes).await?;
        Ok(self.extractor.node_value(&nodes, node, metric))
    }

    /// Fetch a listing, treating 404 as an empty listing
    async fn fetch_or_empty(&self, resource: Resource) -> CollectResult<Vec<EntityRecord>> {
        match self.source.fetch(resource).await {
            Err(e) if e.is_not_found() => {
                debug!(resource = %resource, "Resource not found, treating as empty");
                Ok(Vec::new())
            }
            result => result,
        }
    }

    fn collect_lines(&self, records: &[EntityRecord], kind: EntityKind) -> Vec<MetricLine> {
        debug!(filters = ?self.filters, "Filtering out by");
        let batch: Vec<MetricLine> = records
            .iter()
            .filter(|record| self.filters.matches(record))
            .flat_map(|record| self.extractor.extract(record, kind))
            .collect();

        for line in &batch {
            debug!("SENDER_DATA: - \"{}\" {}", line.key, line.value);
        }
        batch
    }

    async fn send_batch(&self, batch: &[MetricLine]) -> AppResult<i32> {
        if batch.is_empty() {
            info!("No matching entities, nothing to send");
            return Ok(0);
        }
        Ok(self.sink.send(batch).await?)
    }
}
