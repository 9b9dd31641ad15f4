//! Row decoding
//!
//! Result rows are turned into JSON records column by column, using the
//! PostgreSQL type of each column to pick the Rust type it is read as.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use ipnetwork::IpNetwork;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::postgres::types::{PgInterval, PgTimeTz};
use sqlx::postgres::{PgRow, PgTypeKind, PgValueFormat};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use type_mapping::{pg_type_category, PgTypeCategory, PostgresValue};
use uuid::Uuid;

use crate::errors::FluentSqlError;

/// A decoded row keyed by column name
pub type Record = Map<String, Value>;

/// Shape of rows returned by `get_all_with`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// JSON object keyed by column name
    #[default]
    Assoc,
    /// JSON array in column order
    Num,
    /// JSON object keyed by both column name and column index
    Both,
}

/// Decode every column of a row into a record. When two columns share a
/// name the later one wins; alias them to keep both.
pub fn decode_row(row: &PgRow) -> Result<Record, FluentSqlError> {
    let mut record = Map::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        record.insert(column.name().to_string(), decode_column(row, index)?);
    }
    Ok(record)
}

/// Decode a row in the requested shape
pub fn decode_row_with(row: &PgRow, mode: FetchMode) -> Result<Value, FluentSqlError> {
    match mode {
        FetchMode::Assoc => decode_row(row).map(Value::Object),
        FetchMode::Num => (0..row.len())
            .map(|index| decode_column(row, index))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        FetchMode::Both => {
            let mut record = Map::with_capacity(row.len() * 2);
            for (index, column) in row.columns().iter().enumerate() {
                let value = decode_column(row, index)?;
                record.insert(index.to_string(), value.clone());
                record.insert(column.name().to_string(), value);
            }
            Ok(Value::Object(record))
        }
    }
}

/// Decode a single column by position
pub fn decode_column(row: &PgRow, index: usize) -> Result<Value, FluentSqlError> {
    let column = row
        .columns()
        .get(index)
        .ok_or_else(|| FluentSqlError::ColumnNotFound(index.to_string()))?;
    let name = column.name();

    let raw = row
        .try_get_raw(index)
        .map_err(|e| FluentSqlError::decode(name, e))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = column.type_info().name();
    let category = pg_type_category(type_name);

    crate::trace_log!(column = name, pg_type = type_name, ?category, "decoding column");

    decode_as(row, index, category)
        .map(PostgresValue::into_json)
        .map_err(|e| FluentSqlError::decode(name, format!("{} (type {})", e, type_name)))
}

fn decode_as(
    row: &PgRow,
    index: usize,
    category: PgTypeCategory,
) -> Result<PostgresValue, sqlx::Error> {
    Ok(match category {
        PgTypeCategory::Boolean => PostgresValue::Boolean(row.try_get(index)?),
        PgTypeCategory::SmallInt => PostgresValue::SmallInt(row.try_get(index)?),
        PgTypeCategory::Integer => PostgresValue::Integer(row.try_get(index)?),
        PgTypeCategory::BigInt => PostgresValue::BigInt(row.try_get(index)?),
        PgTypeCategory::Real => PostgresValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        PgTypeCategory::Double => PostgresValue::Float(row.try_get(index)?),
        PgTypeCategory::Numeric => decode_numeric(row, index)?,
        PgTypeCategory::Text => PostgresValue::Text(row.try_get(index)?),
        PgTypeCategory::Uuid => PostgresValue::Uuid(row.try_get::<Uuid, _>(index)?),
        PgTypeCategory::Timestamp => {
            PostgresValue::Timestamp(row.try_get::<NaiveDateTime, _>(index)?.and_utc())
        }
        PgTypeCategory::TimestampTz => {
            PostgresValue::Timestamp(row.try_get::<DateTime<Utc>, _>(index)?)
        }
        PgTypeCategory::Date => PostgresValue::Date(row.try_get::<NaiveDate, _>(index)?),
        PgTypeCategory::Time => {
            PostgresValue::Text(row.try_get::<NaiveTime, _>(index)?.to_string())
        }
        PgTypeCategory::TimeTz => {
            let value: PgTimeTz<NaiveTime, FixedOffset> = row.try_get(index)?;
            PostgresValue::Text(format!("{}{}", value.time, value.offset))
        }
        PgTypeCategory::Interval => {
            PostgresValue::Text(interval_text(&row.try_get::<PgInterval, _>(index)?))
        }
        PgTypeCategory::Json => PostgresValue::Json(row.try_get::<Value, _>(index)?),
        PgTypeCategory::Bytea => {
            let bytes: Vec<u8> = row.try_get(index)?;
            PostgresValue::Text(bytea_text(&bytes))
        }
        PgTypeCategory::Inet => PostgresValue::Text(inet_text(row.try_get(index)?)),
        PgTypeCategory::Cidr => PostgresValue::Text(row.try_get::<IpNetwork, _>(index)?.to_string()),
        PgTypeCategory::BooleanArray => array(row.try_get::<Vec<Option<bool>>, _>(index)?),
        PgTypeCategory::TextArray => array(row.try_get::<Vec<Option<String>>, _>(index)?),
        PgTypeCategory::SmallIntArray => array(row.try_get::<Vec<Option<i16>>, _>(index)?),
        PgTypeCategory::IntegerArray => array(row.try_get::<Vec<Option<i32>>, _>(index)?),
        PgTypeCategory::BigIntArray => array(row.try_get::<Vec<Option<i64>>, _>(index)?),
        PgTypeCategory::RealArray => array(row.try_get::<Vec<Option<f32>>, _>(index)?),
        PgTypeCategory::DoubleArray => array(row.try_get::<Vec<Option<f64>>, _>(index)?),
        PgTypeCategory::NumericArray => {
            let items: Vec<Option<Decimal>> = row.try_get(index)?;
            array(items.into_iter().map(|d| d.map(|d| PostgresValue::Decimal(d.to_string()))).collect())
        }
        PgTypeCategory::UuidArray => array(row.try_get::<Vec<Option<Uuid>>, _>(index)?),
        PgTypeCategory::TimestampArray => {
            let items: Vec<Option<NaiveDateTime>> = row.try_get(index)?;
            array(items.into_iter().map(|ts| ts.map(|ts| ts.and_utc())).collect())
        }
        PgTypeCategory::TimestampTzArray => {
            array(row.try_get::<Vec<Option<DateTime<Utc>>>, _>(index)?)
        }
        PgTypeCategory::DateArray => array(row.try_get::<Vec<Option<NaiveDate>>, _>(index)?),
        PgTypeCategory::Other => decode_textual(row, index)?,
    })
}

/// NUMERIC through rust_decimal, falling back to the wire digits for values
/// it cannot hold (NaN, infinities, more than 28 significant digits)
fn decode_numeric(row: &PgRow, index: usize) -> Result<PostgresValue, sqlx::Error> {
    match row.try_get::<Decimal, _>(index) {
        Ok(decimal) => Ok(PostgresValue::Decimal(decimal.to_string())),
        Err(error) => {
            let raw = row.try_get_raw(index)?;
            let text = match raw.format() {
                PgValueFormat::Text => raw.as_str().map(str::to_string).ok(),
                PgValueFormat::Binary => raw.as_bytes().ok().and_then(numeric_text),
            };
            text.map(PostgresValue::Decimal).ok_or(error)
        }
    }
}

/// Types without a dedicated category. Text-format values and enum labels
/// are plain UTF-8; binary encodings of anything else are not guessed at.
fn decode_textual(row: &PgRow, index: usize) -> Result<PostgresValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    let is_enum = matches!(raw.type_info().kind(), PgTypeKind::Enum(_));

    if matches!(raw.format(), PgValueFormat::Text) || is_enum {
        return raw
            .as_str()
            .map(|s| PostgresValue::Text(s.to_string()))
            .map_err(sqlx::Error::Decode);
    }

    Err(sqlx::Error::Decode(
        format!(
            "no decoder for binary values of type {}; cast the column to text",
            raw.type_info().name()
        )
        .into(),
    ))
}

/// Render the binary NUMERIC wire format (ndigits, weight, sign, dscale,
/// then base-10000 digits) as decimal text
fn numeric_text(bytes: &[u8]) -> Option<String> {
    let word = |i: usize| {
        bytes
            .get(i * 2..i * 2 + 2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
    };

    let ndigits = usize::try_from(word(0)?).ok()?;
    let weight = i32::from(word(1)?);
    let sign = word(2)? as u16;
    let dscale = usize::try_from(word(3)?).ok()?;

    match sign {
        0xC000 => return Some("NaN".to_string()),
        0xD000 => return Some("Infinity".to_string()),
        0xF000 => return Some("-Infinity".to_string()),
        _ => {}
    }

    let digits = (0..ndigits)
        .map(|i| word(4 + i))
        .collect::<Option<Vec<i16>>>()?;
    let group = |position: i32| {
        usize::try_from(position)
            .ok()
            .and_then(|p| digits.get(p).copied())
            .unwrap_or(0)
    };

    let mut text = String::new();
    if sign == 0x4000 {
        text.push('-');
    }

    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(&group(0).to_string());
        for position in 1..=weight {
            text.push_str(&format!("{:04}", group(position)));
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut position = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", group(position)));
            position += 1;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }

    Some(text)
}

/// INTERVAL in PostgreSQL's default output style (`1 year 2 mons 3 days 04:05:06`)
fn interval_text(interval: &PgInterval) -> String {
    fn unit(parts: &mut Vec<String>, amount: i32, singular: &str, plural: &str) {
        if amount != 0 {
            let name = if amount.abs() == 1 { singular } else { plural };
            parts.push(format!("{} {}", amount, name));
        }
    }

    let mut parts = Vec::new();
    unit(&mut parts, interval.months / 12, "year", "years");
    unit(&mut parts, interval.months % 12, "mon", "mons");
    unit(&mut parts, interval.days, "day", "days");

    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let seconds = micros / 1_000_000;
        let mut clock = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            seconds / 3600,
            seconds % 3600 / 60,
            seconds % 60
        );
        let fraction = micros % 1_000_000;
        if fraction > 0 {
            let digits = format!("{:06}", fraction);
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }

    parts.join(" ")
}

/// INET prints a host address without its full-length prefix
fn inet_text(network: IpNetwork) -> String {
    let host_prefix = match network {
        IpNetwork::V4(_) => 32,
        IpNetwork::V6(_) => 128,
    };
    if network.prefix() == host_prefix {
        network.ip().to_string()
    } else {
        network.to_string()
    }
}

fn array<T: Into<PostgresValue>>(items: Vec<Option<T>>) -> PostgresValue {
    PostgresValue::Array(items.into_iter().map(PostgresValue::from).collect())
}

/// BYTEA in PostgreSQL's `hex` output format
fn bytea_text(bytes: &[u8]) -> String {
    format!("\\x{}", hex::encode(bytes))
}

/// Interpret an aggregate result as a number; NULL (no rows) is 0
pub(crate) fn value_as_f64(column: &str, value: &Value) -> Result<f64, FluentSqlError> {
    match value {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| FluentSqlError::decode(column, "number out of range")),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| FluentSqlError::decode(column, e)),
        other => Err(FluentSqlError::decode(
            column,
            format!("expected a number, got {}", other),
        )),
    }
}
