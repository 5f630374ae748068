//! Zabbix low-level discovery payloads
//!
//! Discovery output is a single JSON object whose `data` key holds one entry
//! per matched entity, in the order the broker returned them:
//!
//! ```text
//! {"data": [{"{#NODENAME}": "rabbit@host1", "{#VHOSTNAME}": "/", "{#QUEUENAME}": "orders"}]}
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use super::extractor::EntityKind;
use super::filter::FilterSpec;
use crate::collector::EntityRecord;

pub const NODENAME_MACRO: &str = "{#NODENAME}";
pub const VHOSTNAME_MACRO: &str = "{#VHOSTNAME}";
pub const QUEUENAME_MACRO: &str = "{#QUEUENAME}";
pub const SHOVELNAME_MACRO: &str = "{#SHOVELNAME}";
pub const NODETYPE_MACRO: &str = "{#NODETYPE}";

/// Macro values for one discovered entity, in fixed macro order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryEntry {
    macros: Vec<(&'static str, String)>,
}

impl DiscoveryEntry {
    fn with(mut self, name: &'static str, value: String) -> Self {
        self.macros.push((name, value));
        self
    }

    /// Value of a macro
    pub fn get(&self, name: &str) -> Option<&str> {
        self.macros
            .iter()
            .find(|(macro_name, _)| *macro_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Macro names in output order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.macros.iter().map(|(name, _)| *name)
    }
}

impl Serialize for DiscoveryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.macros.len()))?;
        for (name, value) in &self.macros {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// `{"data": [...]}`
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct DiscoveryPayload {
    pub data: Vec<DiscoveryEntry>,
}

impl DiscoveryPayload {
    /// Compact JSON rendering
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Builds discovery entries from matched records
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFormatter;

impl DiscoveryFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self
    }

    /// Entries for every record matching `filters`, preserving input order
    pub fn format(
        &self,
        records: &[EntityRecord],
        kind: EntityKind,
        filters: &FilterSpec,
    ) -> Vec<DiscoveryEntry> {
        records
            .iter()
            .filter(|record| filters.matches(record))
            .filter_map(|record| self.entry(record, kind))
            .collect()
    }

    /// Wrap matched entries into the `data` envelope
    pub fn payload(
        &self,
        records: &[EntityRecord],
        kind: EntityKind,
        filters: &FilterSpec,
    ) -> DiscoveryPayload {
        DiscoveryPayload {
            data: self.format(records, kind, filters),
        }
    }

    /// Entry for a single record; the overview is not discoverable
    pub fn entry(&self, record: &EntityRecord, kind: EntityKind) -> Option<DiscoveryEntry> {
        let entry = match kind {
            EntityKind::Queue => {
                let vhost = record.text("vhost");
                let name = record.text("name");
                debug!(vhost = %vhost, queue = %name, "Discovered queue");
                DiscoveryEntry::default()
                    .with(NODENAME_MACRO, record.text("node"))
                    .with(VHOSTNAME_MACRO, vhost)
                    .with(QUEUENAME_MACRO, name)
            }
            EntityKind::Consumer => {
                let vhost = record.path_text(&["queue", "vhost"]);
                let name = record.path_text(&["queue", "name"]);
                debug!(vhost = %vhost, queue = %name, "Discovered consumer");
                DiscoveryEntry::default()
                    .with(VHOSTNAME_MACRO, vhost)
                    .with(SHOVELNAME_MACRO, name)
            }
            EntityKind::Node => {
                // Zabbix item parameters cannot contain '@'
                let name = record.text("name");
                let host = match name.split_once('@') {
                    Some((_, host)) => host.to_string(),
                    None => name,
                };
                let node_type = record.text("type");
                debug!(node = %host, node_type = %node_type, "Discovered node");
                DiscoveryEntry::default()
                    .with(NODENAME_MACRO, host)
                    .with(NODETYPE_MACRO, node_type)
            }
            EntityKind::Overview => return None,
        };
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::parse_records;

    #[test]
    fn test_queue_entry() {
        let records =
            parse_records(r#"[{"vhost": "/", "name": "orders", "node": "rabbit@host1"}]"#).unwrap();
        let entries =
            DiscoveryFormatter::new().format(&records, EntityKind::Queue, &FilterSpec::default());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].get(NODENAME_MACRO), Some("rabbit@host1"));
        assert_eq!(entries[0].get(VHOSTNAME_MACRO), Some("/"));
        assert_eq!(entries[0].get(QUEUENAME_MACRO), Some("orders"));
    }

    #[test]
    fn test_consumer_entry_uses_nested_queue() {
        let records =
            parse_records(r#"[{"queue": {"name": "shovel-1", "vhost": "prod"}, "channel_details": {}}]"#)
                .unwrap();
        let entries = DiscoveryFormatter::new().format(
            &records,
            EntityKind::Consumer,
            &FilterSpec::default(),
        );
        assert_eq!(
            entries[0].names().collect::<Vec<_>>(),
            vec![VHOSTNAME_MACRO, SHOVELNAME_MACRO]
        );
        assert_eq!(entries[0].get(SHOVELNAME_MACRO), Some("shovel-1"));
    }

    #[test]
    fn test_node_entry_strips_short_name() {
        let records = parse_records(
            r#"[{"name": "rabbit@host1", "type": "disc"}, {"name": "standalone", "type": "ram"}]"#,
        )
        .unwrap();
        let entries =
            DiscoveryFormatter::new().format(&records, EntityKind::Node, &FilterSpec::default());
        assert_eq!(entries[0].get(NODENAME_MACRO), Some("host1"));
        assert_eq!(entries[0].get(NODETYPE_MACRO), Some("disc"));
        assert_eq!(entries[1].get(NODENAME_MACRO), Some("standalone"));
    }

    #[test]
    fn test_order_preserved_for_matches() {
        let records = parse_records(
            r#"[
                {"vhost": "/", "name": "a", "durable": false},
                {"vhost": "/", "name": "b", "durable": true},
                {"vhost": "/", "name": "c", "durable": true}
            ]"#,
        )
        .unwrap();
        let filters = FilterSpec::parse(r#"{"durable": true}"#).unwrap();
        let entries = DiscoveryFormatter::new().format(&records, EntityKind::Queue, &filters);

        let names: Vec<_> = entries.iter().filter_map(|e| e.get(QUEUENAME_MACRO)).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_payload_json_shape() {
        let records =
            parse_records(r#"[{"vhost": "/", "name": "orders", "node": "rabbit@host1"}]"#).unwrap();
        let json = DiscoveryFormatter::new()
            .payload(&records, EntityKind::Queue, &FilterSpec::default())
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"data":[{"{#NODENAME}":"rabbit@host1","{#VHOSTNAME}":"/","{#QUEUENAME}":"orders"}]}"#
        );
    }

    #[test]
    fn test_empty_payload() {
        let json = DiscoveryPayload::default().to_json().unwrap();
        assert_eq!(json, r#"{"data":[]}"#);
    }

    #[test]
    fn test_overview_not_discoverable() {
        let formatter = DiscoveryFormatter::new();
        assert!(formatter
            .entry(&EntityRecord::default(), EntityKind::Overview)
            .is_none());
    }
}
