//! Entity filtering
//!
//! A [`FilterSpec`] is a disjunction of [`FilterPredicate`]s and each predicate
//! is a conjunction of exact field matches:
//!
//! ```text
//! matches(record) = any(p in spec: all((field, value) in p: record[field] == value))
//! ```
//!
//! Extra fields on the record never disqualify a match. A field name such as
//! `queue.vhost` reaches one level into a nested object when the record has no
//! literal field of that name.

use serde_json::Value;

use crate::collector::{EntityRecord, FieldValue};
use crate::error::FilterError;

/// A conjunctive set of required field values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPredicate {
    fields: Vec<(String, FieldValue)>,
}

impl FilterPredicate {
    /// Create an empty predicate, which matches every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    /// Required (field, value) pairs
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Every named field is present on the record with an equal value
    pub fn matches(&self, record: &EntityRecord) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| {
                record
                    .lookup(field)
                    .is_some_and(|actual| values_match(actual, expected))
            })
    }
}

/// Field equality for filters; booleans also equal the numbers 1 and 0
fn values_match(actual: &FieldValue, expected: &FieldValue) -> bool {
    match (actual, expected) {
        (FieldValue::Boolean(flag), number) | (number, FieldValue::Boolean(flag))
            if number.as_f64().is_some() =>
        {
            number.as_f64() == Some(if *flag { 1.0 } else { 0.0 })
        }
        _ => actual == expected,
    }
}

/// An ordered disjunction of predicates
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    predicates: Vec<FilterPredicate>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::match_all()
    }
}

impl FilterSpec {
    /// The default filter: a single empty predicate
    pub fn match_all() -> Self {
        Self {
            predicates: vec![FilterPredicate::new()],
        }
    }

    /// Build a spec from predicates; an empty list matches every record
    pub fn new(predicates: Vec<FilterPredicate>) -> Self {
        if predicates.is_empty() {
            return Self::match_all();
        }
        Self { predicates }
    }

    /// Parse the `--filters` JSON string
    ///
    /// # Errors
    /// Returns [`FilterError`] for malformed JSON or a predicate that is not an object.
    pub fn parse(json: &str) -> Result<Self, FilterError> {
        let value: Value = serde_json::from_str(json).map_err(FilterError::InvalidJson)?;
        Self::from_json(value)
    }

    /// Normalize a decoded filter value
    ///
    /// - object: one-element sequence
    /// - array: taken as-is, each element must be an object
    /// - null: no filter
    /// - any other scalar: wrapped, then rejected as a non-object predicate
    pub fn from_json(value: Value) -> Result<Self, FilterError> {
        let items = match value {
            Value::Null => return Ok(Self::match_all()),
            Value::Array(items) => items,
            other => vec![other],
        };

        let predicates = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(FilterPredicate {
                    fields: map
                        .into_iter()
                        .map(|(k, v)| (k, FieldValue::from(v)))
                        .collect(),
                }),
                other => Err(FilterError::InvalidPredicate {
                    index,
                    found: other.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(predicates))
    }

    /// Predicates in declaration order
    pub fn predicates(&self) -> &[FilterPredicate] {
        &self.predicates
    }

    /// The record satisfies at least one predicate
    pub fn matches(&self, record: &EntityRecord) -> bool {
        self.predicates.iter().any(|p| p.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::parse_records;

    fn queue() -> EntityRecord {
        parse_records(
            r#"[{"vhost": "/", "name": "orders", "node": "rabbit@host1", "durable": true, "messages": 5}]"#,
        )
        .unwrap()
        .remove(0)
    }

    #[test]
    fn test_default_matches_everything() {
        let spec = FilterSpec::default();
        assert_eq!(spec, FilterSpec::match_all());
        assert!(spec.matches(&queue()));
        assert!(spec.matches(&EntityRecord::default()));
    }

    #[test]
    fn test_empty_list_matches_everything() {
        let spec = FilterSpec::parse("[]").unwrap();
        assert!(spec.matches(&queue()));
        assert_eq!(spec, FilterSpec::match_all());
    }

    #[test]
    fn test_subset_match() {
        let spec = FilterSpec::parse(r#"{"vhost": "/", "name": "orders"}"#).unwrap();
        assert!(spec.matches(&queue()));
    }

    #[test]
    fn test_partial_match_is_not_a_match() {
        let spec = FilterSpec::parse(r#"{"vhost": "/", "name": "billing"}"#).unwrap();
        assert!(!spec.matches(&queue()));
    }

    #[test]
    fn test_missing_field_fails_predicate() {
        let spec = FilterSpec::parse(r#"{"policy": "ha-all"}"#).unwrap();
        assert!(!spec.matches(&queue()));
    }

    #[test]
    fn test_any_predicate_matches() {
        let spec =
            FilterSpec::parse(r#"[{"name": "billing"}, {"durable": true, "node": "rabbit@host1"}]"#)
                .unwrap();
        assert!(spec.matches(&queue()));
    }

    #[test]
    fn test_value_types_must_agree() {
        assert!(!FilterSpec::parse(r#"{"durable": "true"}"#)
            .unwrap()
            .matches(&queue()));
        assert!(FilterSpec::parse(r#"{"messages": 5.0}"#)
            .unwrap()
            .matches(&queue()));
    }

    #[test]
    fn test_nested_field_match() {
        let consumer = parse_records(r#"[{"queue": {"name": "orders", "vhost": "/"}}]"#)
            .unwrap()
            .remove(0);
        assert!(FilterSpec::parse(r#"{"queue.vhost": "/"}"#)
            .unwrap()
            .matches(&consumer));
        assert!(!FilterSpec::parse(r#"{"queue.vhost": "prod"}"#)
            .unwrap()
            .matches(&consumer));
    }

    #[test]
    fn test_object_and_single_element_array_are_equivalent() {
        let bare = FilterSpec::parse(r#"{"vhost": "/", "name": "orders"}"#).unwrap();
        let wrapped = FilterSpec::parse(r#"[{"vhost": "/", "name": "orders"}]"#).unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn test_null_means_no_filter() {
        assert_eq!(FilterSpec::parse("null").unwrap(), FilterSpec::match_all());
    }

    #[test]
    fn test_invalid_filters() {
        assert!(matches!(
            FilterSpec::parse("{not json"),
            Err(FilterError::InvalidJson(_))
        ));
        assert!(matches!(
            FilterSpec::parse(r#""orders""#),
            Err(FilterError::InvalidPredicate { index: 0, .. })
        ));
        assert!(matches!(
            FilterSpec::parse(r#"[{"name": "a"}, 3]"#),
            Err(FilterError::InvalidPredicate { index: 1, .. })
        ));
    }

    #[test]
    fn test_builder_predicate() {
        let spec = FilterSpec::new(vec![FilterPredicate::new()
            .with("vhost", "/")
            .with("messages", 5)]);
        assert!(spec.matches(&queue()));
        assert_ne!(spec, FilterSpec::match_all());
    }

    #[test]
    fn test_boolean_field_matches_numeric_filter() {
        let spec = FilterSpec::parse(r#"{"durable": 1}"#).unwrap();
        assert!(spec.matches(&queue()));

        let spec = FilterSpec::parse(r#"{"durable": 0}"#).unwrap();
        assert!(!spec.matches(&queue()));

        let spec = FilterSpec::parse(r#"{"messages": true}"#).unwrap();
        assert!(!spec.matches(&queue()));

        let spec = FilterSpec::parse(r#"{"durable": "true"}"#).unwrap();
        assert!(!spec.matches(&queue()));
    }
}
