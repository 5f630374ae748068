//! Filtering and extraction engine
//!
//! This module decides which broker entities match the user's filters and
//! turns matched entities into Zabbix item values or discovery entries.
//!
//! - [`filter`]: OR-of-AND predicate matching
//! - [`extractor`]: per-kind metric keys and values, overview and node lookups
//! - [`discovery`]: low-level discovery payloads
//! - [`formatter`]: zabbix_sender input rendering

pub mod discovery;
pub mod extractor;
pub mod filter;
pub mod formatter;

pub use discovery::{DiscoveryEntry, DiscoveryFormatter, DiscoveryPayload};
pub use extractor::{
    metric_key, EntityKind, MetricExtractor, MetricLine, OverviewMetric, MISSING_VALUE,
    NODE_NOT_FOUND,
};
pub use filter::{FilterPredicate, FilterSpec};
pub use formatter::SenderFormatter;
