//! PostgreSQL type names
//!
//! Column type names as reported by the server (`INT4`, `TIMESTAMPTZ`,
//! `TEXT[]`, ...) are grouped into the categories the row decoder knows how
//! to read.

/// Decode category of a result column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgTypeCategory {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Text,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    TimeTz,
    Interval,
    Json,
    Bytea,
    Inet,
    Cidr,
    BooleanArray,
    TextArray,
    SmallIntArray,
    IntegerArray,
    BigIntArray,
    RealArray,
    DoubleArray,
    NumericArray,
    UuidArray,
    TimestampArray,
    TimestampTzArray,
    DateArray,
    /// Anything else (enums, domains, geometric types). Readable only when
    /// the server sent it in text format, or when it is an enum label.
    Other,
}

/// Map a PostgreSQL type name to its decode category.
///
/// Accepts both the catalog names (`INT4`, `_TEXT`) and the SQL spellings
/// (`INTEGER`, `TEXT[]`, `character varying`).
pub fn pg_type_category(type_name: &str) -> PgTypeCategory {
    let normalized = type_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();

    if let Some(element) = normalized
        .strip_suffix("[]")
        .or_else(|| normalized.strip_prefix('_'))
    {
        return match pg_type_category(element) {
            PgTypeCategory::Boolean => PgTypeCategory::BooleanArray,
            PgTypeCategory::Text => PgTypeCategory::TextArray,
            PgTypeCategory::SmallInt => PgTypeCategory::SmallIntArray,
            PgTypeCategory::Integer => PgTypeCategory::IntegerArray,
            PgTypeCategory::BigInt => PgTypeCategory::BigIntArray,
            PgTypeCategory::Real => PgTypeCategory::RealArray,
            PgTypeCategory::Double => PgTypeCategory::DoubleArray,
            PgTypeCategory::Numeric => PgTypeCategory::NumericArray,
            PgTypeCategory::Uuid => PgTypeCategory::UuidArray,
            PgTypeCategory::Timestamp => PgTypeCategory::TimestampArray,
            PgTypeCategory::TimestampTz => PgTypeCategory::TimestampTzArray,
            PgTypeCategory::Date => PgTypeCategory::DateArray,
            _ => PgTypeCategory::Other,
        };
    }

    match normalized.as_str() {
        "BOOL" | "BOOLEAN" => PgTypeCategory::Boolean,
        "INT2" | "SMALLINT" | "SMALLSERIAL" => PgTypeCategory::SmallInt,
        "INT4" | "INT" | "INTEGER" | "SERIAL" => PgTypeCategory::Integer,
        "INT8" | "BIGINT" | "BIGSERIAL" => PgTypeCategory::BigInt,
        "FLOAT4" | "REAL" => PgTypeCategory::Real,
        "FLOAT8" | "DOUBLE PRECISION" => PgTypeCategory::Double,
        "NUMERIC" | "DECIMAL" => PgTypeCategory::Numeric,
        "TEXT" | "VARCHAR" | "CHARACTER VARYING" | "CHAR" | "CHARACTER" | "BPCHAR" | "NAME"
        | "CITEXT" => PgTypeCategory::Text,
        "UUID" => PgTypeCategory::Uuid,
        "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => PgTypeCategory::Timestamp,
        "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => PgTypeCategory::TimestampTz,
        "DATE" => PgTypeCategory::Date,
        "TIME" | "TIME WITHOUT TIME ZONE" => PgTypeCategory::Time,
        "TIMETZ" | "TIME WITH TIME ZONE" => PgTypeCategory::TimeTz,
        "INTERVAL" => PgTypeCategory::Interval,
        "JSON" | "JSONB" => PgTypeCategory::Json,
        "BYTEA" => PgTypeCategory::Bytea,
        "INET" => PgTypeCategory::Inet,
        "CIDR" => PgTypeCategory::Cidr,
        _ => PgTypeCategory::Other,
    }
}
