//! RabbitMQ 관리 API 응답 파서
//!
//! 관리 API의 JSON 응답을 `EntityRecord` 목록으로 변환합니다.
//! 필드가 없거나 `null`인 경우는 오류가 아니라 기본값으로 처리합니다.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::CollectorError;

/// Collector 작업 결과 타입
pub type CollectResult<T> = Result<T, CollectorError>;

/// 엔티티 필드 값
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 정수
    Integer(i64),
    /// 실수
    Float(f64),
    /// 문자열
    String(String),
    /// 불리언
    Boolean(bool),
    /// Null
    Null,
    /// 중첩 객체
    Object(HashMap<String, FieldValue>),
    /// 배열
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// 숫자로 변환 시도
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Null 여부
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// 중첩 객체의 필드 조회
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Object(map) => map.get(name),
            _ => None,
        }
    }
}

/// 숫자는 값으로 비교합니다 (`5` == `5.0`).
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
            (FieldValue::Integer(_) | FieldValue::Float(_), FieldValue::Integer(_) | FieldValue::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            (FieldValue::String(a), FieldValue::String(b)) => a == b,
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Object(a), FieldValue::Object(b)) => a == b,
            (FieldValue::Array(a), FieldValue::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                // u64 above i64::MAX, or a real number
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::String(s),
            Value::Array(arr) => FieldValue::Array(arr.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Null => f.write_str("null"),
            FieldValue::Object(_) | FieldValue::Array(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

/// 관리 API가 반환한 엔티티 하나 (queue, consumer, node, overview)
///
/// 조회 시점마다 새로 만들어지며 변경되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRecord {
    fields: HashMap<String, FieldValue>,
}

impl EntityRecord {
    /// 필드 맵으로부터 생성
    pub fn new(fields: HashMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    /// JSON 객체로부터 생성
    pub fn from_json(value: Value) -> CollectResult<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                fields: map
                    .into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            }),
            other => Err(CollectorError::JsonParse(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// 최상위 필드 조회 (`null` 포함)
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// 중첩 경로 조회 (예: `["message_stats", "ack"]`)
    pub fn get_path(&self, path: &[&str]) -> Option<&FieldValue> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.fields.get(*first)?, |value, name| value.field(name))
    }

    /// 필터용 조회: 최상위 필드가 없으면 `queue.vhost` 형태를 한 단계만 따라갑니다.
    pub fn lookup(&self, field: &str) -> Option<&FieldValue> {
        if let Some(value) = self.fields.get(field) {
            return Some(value);
        }
        let (parent, child) = field.split_once('.')?;
        self.fields.get(parent)?.field(child)
    }

    /// 필드 값, 없거나 `null`이면 기본값
    pub fn value_or(&self, field: &str, default: impl Into<FieldValue>) -> FieldValue {
        present(self.get(field)).unwrap_or_else(|| default.into())
    }

    /// 중첩 경로 값, 없거나 `null`이면 기본값
    pub fn path_or(&self, path: &[&str], default: impl Into<FieldValue>) -> FieldValue {
        present(self.get_path(path)).unwrap_or_else(|| default.into())
    }

    /// 식별자용 문자열 (없으면 빈 문자열)
    pub fn text(&self, field: &str) -> String {
        self.path_text(&[field])
    }

    /// 중첩 경로의 식별자용 문자열 (없으면 빈 문자열)
    pub fn path_text(&self, path: &[&str]) -> String {
        present(self.get_path(path))
            .map(|v| v.to_string())
            .unwrap_or_default()
    }
}

fn present(value: Option<&FieldValue>) -> Option<FieldValue> {
    value.filter(|v| !v.is_null()).cloned()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 응답 본문 파싱
///
/// 배열 응답(`queues`, `consumers`, `nodes`)은 원소마다 레코드 하나,
/// 단일 객체 응답(`overview`, `aliveness-test`)은 레코드 하나로 변환합니다.
pub fn parse_records(json: &str) -> CollectResult<Vec<EntityRecord>> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| CollectorError::JsonParse(e.to_string()))?;

    match value {
        Value::Array(items) => items.into_iter().map(EntityRecord::from_json).collect(),
        Value::Object(_) => Ok(vec![EntityRecord::from_json(value)?]),
        other => Err(CollectorError::JsonParse(format!(
            "expected a JSON array or object, got {}",
            json_type_name(&other)
        ))),
    }
}
