//! Runtime values exchanged with PostgreSQL
//!
//! Every bound parameter is a [`PostgresValue`]. Rust values convert by type
//! (`&str` is always TEXT, `Uuid` always UUID); `serde_json::Value`s go
//! through [`PostgresValue::from_json`], which classifies strings. Decoded
//! columns travel the other way through [`PostgresValue::into_json`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PostgresValue {
    Text(String),
    Integer(i32),
    BigInt(i64),
    SmallInt(i16),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Decimal(String), // Store as string to preserve precision
    Json(Value),
    Array(Vec<PostgresValue>),
    Null,
}

impl PostgresValue {
    /// Classify a JSON parameter.
    ///
    /// Strings that parse as RFC3339 timestamps or UUIDs are sent with those
    /// types, every other string is TEXT. Pass a `PostgresValue::Text` (or a
    /// plain `&str`) to keep such a string as text. Integers use INT4 when they fit and INT8
    /// otherwise. Arrays whose elements all classify to the same scalar type
    /// become PostgreSQL arrays, anything else structured is sent as JSONB.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => PostgresValue::Null,
            Value::Bool(b) => PostgresValue::Boolean(b),
            Value::Number(n) => Self::from_number(&n),
            Value::String(s) => Self::from_string(s),
            Value::Array(items) => Self::from_array(items),
            object @ Value::Object(_) => PostgresValue::Json(object),
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            match i32::try_from(i) {
                Ok(small) => PostgresValue::Integer(small),
                Err(_) => PostgresValue::BigInt(i),
            }
        } else if n.is_u64() {
            // above i64::MAX
            PostgresValue::Decimal(n.to_string())
        } else {
            n.as_f64()
                .map_or_else(|| PostgresValue::Decimal(n.to_string()), PostgresValue::Float)
        }
    }

    fn from_string(s: String) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            PostgresValue::Timestamp(dt.with_timezone(&Utc))
        } else if let Ok(uuid) = Uuid::parse_str(&s) {
            PostgresValue::Uuid(uuid)
        } else {
            PostgresValue::Text(s)
        }
    }

    fn from_array(items: Vec<Value>) -> Self {
        Self::array(items.into_iter().map(Self::from_json).collect())
    }

    /// Build an array parameter. Elements of one scalar kind become a
    /// PostgreSQL array; mixed, nested or null-holding lists are sent as JSONB.
    pub fn array(elements: Vec<PostgresValue>) -> Self {
        let mut elements = elements;

        // Mixed INT4/INT8 elements are widened to INT8
        if elements.iter().any(|e| matches!(e, PostgresValue::BigInt(_)))
            && elements
                .iter()
                .all(|e| matches!(e, PostgresValue::Integer(_) | PostgresValue::BigInt(_)))
        {
            elements = elements
                .into_iter()
                .map(|e| match e {
                    PostgresValue::Integer(i) => PostgresValue::BigInt(i64::from(i)),
                    other => other,
                })
                .collect();
        }

        let homogeneous = match elements.first() {
            None => true,
            Some(first) => {
                first.is_array_element()
                    && elements
                        .iter()
                        .all(|e| std::mem::discriminant(e) == std::mem::discriminant(first))
            }
        };

        if homogeneous {
            PostgresValue::Array(elements)
        } else {
            PostgresValue::Json(PostgresValue::Array(elements).into_json())
        }
    }

    fn is_array_element(&self) -> bool {
        !matches!(
            self,
            PostgresValue::Null | PostgresValue::Json(_) | PostgresValue::Array(_)
        )
    }

    /// Convert back to JSON for result rows
    pub fn into_json(self) -> Value {
        match self {
            PostgresValue::Text(s) | PostgresValue::Decimal(s) => Value::String(s),
            PostgresValue::Integer(i) => Value::from(i),
            PostgresValue::BigInt(i) => Value::from(i),
            PostgresValue::SmallInt(i) => Value::from(i),
            PostgresValue::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            PostgresValue::Boolean(b) => Value::Bool(b),
            PostgresValue::Uuid(u) => Value::String(u.to_string()),
            PostgresValue::Timestamp(dt) => Value::String(dt.to_rfc3339()),
            PostgresValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            PostgresValue::Json(v) => v,
            PostgresValue::Array(items) => {
                Value::Array(items.into_iter().map(PostgresValue::into_json).collect())
            }
            PostgresValue::Null => Value::Null,
        }
    }

    /// PostgreSQL type name the value is sent as, for logging
    pub fn type_name(&self) -> &'static str {
        match self {
            PostgresValue::Text(_) => "TEXT",
            PostgresValue::Integer(_) => "INT4",
            PostgresValue::BigInt(_) => "INT8",
            PostgresValue::SmallInt(_) => "INT2",
            PostgresValue::Float(_) => "FLOAT8",
            PostgresValue::Boolean(_) => "BOOL",
            PostgresValue::Uuid(_) => "UUID",
            PostgresValue::Timestamp(_) => "TIMESTAMPTZ",
            PostgresValue::Date(_) => "DATE",
            PostgresValue::Decimal(_) => "NUMERIC",
            PostgresValue::Json(_) => "JSONB",
            PostgresValue::Array(_) => "ARRAY",
            PostgresValue::Null => "NULL",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PostgresValue::Null)
    }
}

impl From<String> for PostgresValue {
    fn from(val: String) -> Self {
        PostgresValue::Text(val)
    }
}

impl From<&str> for PostgresValue {
    fn from(val: &str) -> Self {
        PostgresValue::Text(val.to_string())
    }
}

impl From<Value> for PostgresValue {
    fn from(val: Value) -> Self {
        PostgresValue::from_json(val)
    }
}

impl From<&String> for PostgresValue {
    fn from(val: &String) -> Self {
        PostgresValue::Text(val.clone())
    }
}

impl From<i32> for PostgresValue {
    fn from(val: i32) -> Self {
        PostgresValue::Integer(val)
    }
}

impl From<i64> for PostgresValue {
    fn from(val: i64) -> Self {
        PostgresValue::BigInt(val)
    }
}

impl From<i16> for PostgresValue {
    fn from(val: i16) -> Self {
        PostgresValue::SmallInt(val)
    }
}

impl From<u32> for PostgresValue {
    fn from(val: u32) -> Self {
        PostgresValue::BigInt(i64::from(val))
    }
}

impl From<u64> for PostgresValue {
    fn from(val: u64) -> Self {
        match i64::try_from(val) {
            Ok(i) => PostgresValue::BigInt(i),
            Err(_) => PostgresValue::Decimal(val.to_string()),
        }
    }
}

impl From<f32> for PostgresValue {
    fn from(val: f32) -> Self {
        PostgresValue::Float(f64::from(val))
    }
}

impl From<f64> for PostgresValue {
    fn from(val: f64) -> Self {
        PostgresValue::Float(val)
    }
}

impl From<bool> for PostgresValue {
    fn from(val: bool) -> Self {
        PostgresValue::Boolean(val)
    }
}

impl From<Uuid> for PostgresValue {
    fn from(val: Uuid) -> Self {
        PostgresValue::Uuid(val)
    }
}

impl From<DateTime<Utc>> for PostgresValue {
    fn from(val: DateTime<Utc>) -> Self {
        PostgresValue::Timestamp(val)
    }
}

impl From<NaiveDate> for PostgresValue {
    fn from(val: NaiveDate) -> Self {
        PostgresValue::Date(val)
    }
}

impl<T> From<Vec<T>> for PostgresValue
where
    T: Into<PostgresValue>,
{
    fn from(val: Vec<T>) -> Self {
        PostgresValue::array(val.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for PostgresValue
where
    T: Into<PostgresValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => PostgresValue::Null,
        }
    }
}
