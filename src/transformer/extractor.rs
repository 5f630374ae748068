//! Metric extraction
//!
//! Turns matched broker entities into Zabbix item key/value pairs. The key
//! templates are the contract with the Zabbix item configuration and must not
//! be reordered:
//!
//! ```text
//! rabbitmq.<kind plural>[<vhost>,<kind>_<metric>,<entity name>]
//! ```

use std::fmt;

use crate::collector::{EntityRecord, FieldValue};

/// Value reported when a requested node is not part of the cluster
pub const NODE_NOT_FOUND: &str = "Not Found";

/// Value reported when a node or overview field is absent
pub const MISSING_VALUE: &str = "None";

/// Top-level queue fields reported for every matched queue
const QUEUE_FIELDS: &[&str] = &["memory", "messages", "messages_unacknowledged", "consumers"];

/// Fields read from the queue's `message_stats` object
const QUEUE_MESSAGE_STATS: &[&str] = &["deliver_get", "publish", "ack"];

/// Category of broker resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Queue,
    Consumer,
    Node,
    Overview,
}

impl EntityKind {
    /// Singular name, used as metric prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Queue => "queue",
            EntityKind::Consumer => "consumer",
            EntityKind::Node => "node",
            EntityKind::Overview => "overview",
        }
    }

    /// Plural name, used as item key namespace
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Queue => "queues",
            EntityKind::Consumer => "consumers",
            EntityKind::Node => "nodes",
            EntityKind::Overview => "overview",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One Zabbix item value
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    /// Item key, e.g. `rabbitmq.queues[/,queue_messages,orders]`
    pub key: String,
    /// Item value
    pub value: FieldValue,
}

impl MetricLine {
    /// Create a new line
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.value)
    }
}

/// Build an item key
pub fn metric_key(kind: EntityKind, vhost: &str, metric: &str, name: &str) -> String {
    format!(
        "rabbitmq.{}[{},{}_{},{}]",
        kind.plural(),
        vhost,
        kind.as_str(),
        metric,
        name
    )
}

/// Server-wide values read from `GET /api/overview`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewMetric {
    MessageStatsDeliverGet,
    MessageStatsPublish,
    MessageStatsAck,
    MessageCountTotal,
    MessageCountReady,
    MessageCountUnacknowledged,
    RabbitmqVersion,
}

impl OverviewMetric {
    /// All overview metrics
    pub const ALL: [OverviewMetric; 7] = [
        OverviewMetric::MessageStatsDeliverGet,
        OverviewMetric::MessageStatsPublish,
        OverviewMetric::MessageStatsAck,
        OverviewMetric::MessageCountTotal,
        OverviewMetric::MessageCountReady,
        OverviewMetric::MessageCountUnacknowledged,
        OverviewMetric::RabbitmqVersion,
    ];

    /// Resolve a `--metric` name; `None` means the name is a node field
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Metric name as given on the command line
    pub fn name(&self) -> &'static str {
        match self {
            OverviewMetric::MessageStatsDeliverGet => "message_stats_deliver_get",
            OverviewMetric::MessageStatsPublish => "message_stats_publish",
            OverviewMetric::MessageStatsAck => "message_stats_ack",
            OverviewMetric::MessageCountTotal => "message_count_total",
            OverviewMetric::MessageCountReady => "message_count_ready",
            OverviewMetric::MessageCountUnacknowledged => "message_count_unacknowledged",
            OverviewMetric::RabbitmqVersion => "rabbitmq_version",
        }
    }

    /// Path inside the overview document
    pub fn path(&self) -> &'static [&'static str] {
        match self {
            OverviewMetric::MessageStatsDeliverGet => {
                &["message_stats", "deliver_get_details", "rate"]
            }
            OverviewMetric::MessageStatsPublish => &["message_stats", "publish_details", "rate"],
            OverviewMetric::MessageStatsAck => &["message_stats", "ack_details", "rate"],
            OverviewMetric::MessageCountTotal => &["queue_totals", "messages"],
            OverviewMetric::MessageCountReady => &["queue_totals", "messages_ready"],
            OverviewMetric::MessageCountUnacknowledged => {
                &["queue_totals", "messages_unacknowledged"]
            }
            OverviewMetric::RabbitmqVersion => &["rabbitmq_version"],
        }
    }

    /// Value reported when the path is missing
    pub fn default_value(&self) -> FieldValue {
        match self {
            OverviewMetric::RabbitmqVersion => FieldValue::from(MISSING_VALUE),
            _ => FieldValue::Integer(0),
        }
    }
}

/// Computes metric values for matched entities
///
/// Pure: the extractor never performs I/O, callers batch and send the lines.
#[derive(Debug, Clone, Default)]
pub struct MetricExtractor;

impl MetricExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    /// Metric lines for one matched record
    ///
    /// Queues and consumers produce keyed lines. Nodes and the overview are
    /// read on demand through [`node_value`](Self::node_value) and
    /// [`overview_value`](Self::overview_value) and produce no lines here.
    pub fn extract(&self, record: &EntityRecord, kind: EntityKind) -> Vec<MetricLine> {
        match kind {
            EntityKind::Queue => self.extract_queue(record),
            EntityKind::Consumer => self.extract_consumer(record),
            EntityKind::Node | EntityKind::Overview => Vec::new(),
        }
    }

    fn extract_queue(&self, record: &EntityRecord) -> Vec<MetricLine> {
        let vhost = record.text("vhost");
        let name = record.text("name");

        let direct = QUEUE_FIELDS.iter().map(|field| {
            MetricLine::new(
                metric_key(EntityKind::Queue, &vhost, field, &name),
                record.value_or(field, 0),
            )
        });

        let stats = QUEUE_MESSAGE_STATS.iter().map(|field| {
            MetricLine::new(
                metric_key(
                    EntityKind::Queue,
                    &vhost,
                    &format!("message_stats_{}", field),
                    &name,
                ),
                record.path_or(&["message_stats", *field], 0),
            )
        });

        direct.chain(stats).collect()
    }

    fn extract_consumer(&self, record: &EntityRecord) -> Vec<MetricLine> {
        let vhost = record.path_text(&["queue", "vhost"]);
        let name = record.path_text(&["queue", "name"]);

        // consumers without an explicit state are alive
        vec![MetricLine::new(
            metric_key(EntityKind::Consumer, &vhost, "state", &name),
            record.value_or("state", 1),
        )]
    }

    /// Look up a server-wide value in the overview document
    pub fn overview_value(&self, overview: &EntityRecord, metric: OverviewMetric) -> FieldValue {
        overview.path_or(metric.path(), metric.default_value())
    }

    /// Look up `item` on the node matching `requested`
    ///
    /// `requested` is reduced to its short host name (`host1.example.com` becomes
    /// `host1`) and matched as a substring of each node's `name`
    /// (`rabbit@host1`). A single-node cluster always matches. Returns
    /// [`NODE_NOT_FOUND`] when no node matches and [`MISSING_VALUE`] when the
    /// node lacks the field.
    pub fn node_value(&self, nodes: &[EntityRecord], requested: &str, item: &str) -> FieldValue {
        let short_name = requested.split('.').next().unwrap_or(requested);
        let single = nodes.len() == 1;

        for node in nodes {
            let name = node.text("name");
            tracing::debug!(
                requested = short_name,
                node = %name,
                item,
                nodes = nodes.len(),
                "Checking node name"
            );
            if single || name.contains(short_name) {
                let value = node.value_or(item, MISSING_VALUE);
                tracing::debug!(node = %name, value = %value, "Got data from node");
                return value;
            }
        }

        FieldValue::from(NODE_NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::parse_records;

    fn record(json: &str) -> EntityRecord {
        parse_records(json).unwrap().remove(0)
    }

    fn value_of<'a>(lines: &'a [MetricLine], key: &str) -> Option<&'a FieldValue> {
        lines.iter().find(|l| l.key == key).map(|l| &l.value)
    }

    #[test]
    fn test_metric_key_template() {
        assert_eq!(
            metric_key(EntityKind::Queue, "/", "memory", "orders"),
            "rabbitmq.queues[/,queue_memory,orders]"
        );
        assert_eq!(
            metric_key(EntityKind::Consumer, "prod", "state", "billing"),
            "rabbitmq.consumers[prod,consumer_state,billing]"
        );
    }

    #[test]
    fn test_queue_lines_in_fixed_order() {
        let queue = record(
            r#"{"vhost": "/", "name": "orders", "node": "rabbit@host1", "memory": 1024, "messages": 5}"#,
        );
        let lines = MetricExtractor::new().extract(&queue, EntityKind::Queue);

        let keys: Vec<&str> = lines.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "rabbitmq.queues[/,queue_memory,orders]",
                "rabbitmq.queues[/,queue_messages,orders]",
                "rabbitmq.queues[/,queue_messages_unacknowledged,orders]",
                "rabbitmq.queues[/,queue_consumers,orders]",
                "rabbitmq.queues[/,queue_message_stats_deliver_get,orders]",
                "rabbitmq.queues[/,queue_message_stats_publish,orders]",
                "rabbitmq.queues[/,queue_message_stats_ack,orders]",
            ]
        );
        assert_eq!(lines[0].to_string(), "rabbitmq.queues[/,queue_memory,orders] 1024");
        assert_eq!(lines[1].to_string(), "rabbitmq.queues[/,queue_messages,orders] 5");
        assert_eq!(lines[2].value, FieldValue::Integer(0));
    }

    #[test]
    fn test_queue_without_message_stats_defaults_to_zero() {
        let queue = record(r#"{"vhost": "/", "name": "orders"}"#);
        let lines = MetricExtractor::new().extract(&queue, EntityKind::Queue);

        for stat in ["deliver_get", "publish", "ack"] {
            let key = format!("rabbitmq.queues[/,queue_message_stats_{},orders]", stat);
            assert_eq!(value_of(&lines, &key), Some(&FieldValue::Integer(0)));
        }
    }

    #[test]
    fn test_queue_message_stats_partial() {
        let queue = record(
            r#"{"vhost": "/", "name": "orders", "message_stats": {"publish": 42, "publish_details": {"rate": 1.5}}}"#,
        );
        let lines = MetricExtractor::new().extract(&queue, EntityKind::Queue);
        assert_eq!(
            value_of(&lines, "rabbitmq.queues[/,queue_message_stats_publish,orders]"),
            Some(&FieldValue::Integer(42))
        );
        assert_eq!(
            value_of(&lines, "rabbitmq.queues[/,queue_message_stats_ack,orders]"),
            Some(&FieldValue::Integer(0))
        );
    }

    #[test]
    fn test_consumer_state_defaults_to_alive() {
        let consumer = record(r#"{"queue": {"name": "orders", "vhost": "/"}, "consumer_tag": "ctag"}"#);
        let lines = MetricExtractor::new().extract(&consumer, EntityKind::Consumer);
        assert_eq!(
            lines,
            vec![MetricLine::new(
                "rabbitmq.consumers[/,consumer_state,orders]",
                1
            )]
        );
    }

    #[test]
    fn test_consumer_state_passthrough() {
        let consumer = record(r#"{"queue": {"name": "orders", "vhost": "/"}, "state": "running"}"#);
        let lines = MetricExtractor::new().extract(&consumer, EntityKind::Consumer);
        assert_eq!(lines[0].value, FieldValue::from("running"));
    }

    #[test]
    fn test_nodes_produce_no_lines() {
        let node = record(r#"{"name": "rabbit@host1", "running": true}"#);
        assert!(MetricExtractor::new()
            .extract(&node, EntityKind::Node)
            .is_empty());
    }

    #[test]
    fn test_overview_values() {
        let overview = record(
            r#"{
                "rabbitmq_version": "3.12.1",
                "message_stats": {"publish_details": {"rate": 2.5}},
                "queue_totals": {"messages": 10, "messages_ready": 7}
            }"#,
        );
        let extractor = MetricExtractor::new();
        assert_eq!(
            extractor.overview_value(&overview, OverviewMetric::MessageStatsPublish),
            FieldValue::Float(2.5)
        );
        assert_eq!(
            extractor.overview_value(&overview, OverviewMetric::MessageStatsAck),
            FieldValue::Integer(0)
        );
        assert_eq!(
            extractor.overview_value(&overview, OverviewMetric::MessageCountReady),
            FieldValue::Integer(7)
        );
        assert_eq!(
            extractor.overview_value(&overview, OverviewMetric::RabbitmqVersion),
            FieldValue::from("3.12.1")
        );
        assert_eq!(
            extractor.overview_value(&EntityRecord::default(), OverviewMetric::RabbitmqVersion),
            FieldValue::from("None")
        );
    }

    #[test]
    fn test_overview_metric_names() {
        for metric in OverviewMetric::ALL {
            assert_eq!(OverviewMetric::from_name(metric.name()), Some(metric));
        }
        assert_eq!(OverviewMetric::from_name("mem_used"), None);
    }

    #[test]
    fn test_single_node_cluster_ignores_name() {
        let nodes = parse_records(r#"[{"name": "rabbit@host1", "running": true}]"#).unwrap();
        assert_eq!(
            MetricExtractor::new().node_value(&nodes, "host2", "running"),
            FieldValue::Boolean(true)
        );
    }

    #[test]
    fn test_node_substring_match() {
        let nodes = parse_records(
            r#"[{"name": "rabbit@host1", "mem_used": 100}, {"name": "rabbit@host2", "mem_used": 200}]"#,
        )
        .unwrap();
        let extractor = MetricExtractor::new();
        assert_eq!(
            extractor.node_value(&nodes, "host2.example.com", "mem_used"),
            FieldValue::Integer(200)
        );
        assert_eq!(
            extractor.node_value(&nodes, "host1", "fd_used"),
            FieldValue::from(MISSING_VALUE)
        );
    }

    #[test]
    fn test_node_not_found() {
        let nodes =
            parse_records(r#"[{"name": "rabbit@host1"}, {"name": "rabbit@host2"}]"#).unwrap();
        assert_eq!(
            MetricExtractor::new().node_value(&nodes, "host3", "running"),
            FieldValue::from(NODE_NOT_FOUND)
        );
        assert_eq!(
            MetricExtractor::new().node_value(&[], "host3", "running"),
            FieldValue::from(NODE_NOT_FOUND)
        );
    }
}
