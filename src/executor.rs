//! Statement execution
//!
//! A [`QueryExecutor`] runs rendered SQL either on the pool or on the
//! connection of an open transaction. Each [`PostgresValue`] parameter is
//! bound with the PostgreSQL type it names.

use chrono::{DateTime, NaiveDate, Utc};
use config::QueryConfig;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres};
use type_mapping::PostgresValue;
use uuid::Uuid;

use crate::errors::FluentSqlError;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

pub(crate) enum Target<'c> {
    Pool(&'c PgPool),
    Connection(&'c mut PgConnection),
}

/// Where a statement runs, plus the settings it is built with
pub struct QueryExecutor<'c> {
    target: Target<'c>,
    settings: &'c QueryConfig,
}

impl<'c> QueryExecutor<'c> {
    pub(crate) fn pool(pool: &'c PgPool, settings: &'c QueryConfig) -> Self {
        Self {
            target: Target::Pool(pool),
            settings,
        }
    }

    pub(crate) fn connection(conn: &'c mut PgConnection, settings: &'c QueryConfig) -> Self {
        Self {
            target: Target::Connection(conn),
            settings,
        }
    }

    /// Table name with the configured prefix applied
    pub(crate) fn table(&self, name: &str) -> String {
        self.settings.prefixed(name)
    }

    pub(crate) async fn fetch_all(
        self,
        sql: &str,
        params: Vec<PostgresValue>,
    ) -> Result<Vec<PgRow>, FluentSqlError> {
        self.log(sql, &params);
        let query = bind_all(sqlx::query(sql), params);
        let result = match self.target {
            Target::Pool(pool) => query.fetch_all(pool).await,
            Target::Connection(conn) => query.fetch_all(conn).await,
        };
        result.map_err(|source| execution_error(sql, source))
    }

    pub(crate) async fn fetch_optional(
        self,
        sql: &str,
        params: Vec<PostgresValue>,
    ) -> Result<Option<PgRow>, FluentSqlError> {
        self.log(sql, &params);
        let query = bind_all(sqlx::query(sql), params);
        let result = match self.target {
            Target::Pool(pool) => query.fetch_optional(pool).await,
            Target::Connection(conn) => query.fetch_optional(conn).await,
        };
        result.map_err(|source| execution_error(sql, source))
    }

    /// Run a statement and return the number of rows it affected
    pub(crate) async fn execute(
        self,
        sql: &str,
        params: Vec<PostgresValue>,
    ) -> Result<u64, FluentSqlError> {
        self.log(sql, &params);
        let query = bind_all(sqlx::query(sql), params);
        let result = match self.target {
            Target::Pool(pool) => query.execute(pool).await,
            Target::Connection(conn) => query.execute(conn).await,
        };
        result
            .map(|done| done.rows_affected())
            .map_err(|source| execution_error(sql, source))
    }

    fn log(&self, sql: &str, params: &[PostgresValue]) {
        if self.settings.log_statements {
            tracing::info!(sql = %sql, params = ?params, "executing statement");
        } else {
            tracing::debug!(sql = %sql, params = ?params, "executing statement");
        }
    }
}

fn execution_error(sql: &str, source: sqlx::Error) -> FluentSqlError {
    tracing::warn!(sql = %sql, error = %source, "statement failed");
    FluentSqlError::QueryExecution {
        sql: sql.to_string(),
        source,
    }
}

fn bind_all(query: PgQuery<'_>, params: Vec<PostgresValue>) -> PgQuery<'_> {
    params.into_iter().fold(query, bind_value)
}

/// Collect the elements of a homogeneous array of one variant
macro_rules! elements {
    ($items:expr, $variant:ident) => {
        $items
            .into_iter()
            .filter_map(|item| match item {
                PostgresValue::$variant(value) => Some(value),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
}

fn bind_value(query: PgQuery<'_>, value: PostgresValue) -> PgQuery<'_> {
    crate::trace_log!(pg_type = value.type_name(), "binding parameter");

    match value {
        PostgresValue::Text(s) => query.bind(s),
        PostgresValue::Integer(i) => query.bind(i),
        PostgresValue::BigInt(i) => query.bind(i),
        PostgresValue::SmallInt(i) => query.bind(i),
        PostgresValue::Float(f) => query.bind(f),
        PostgresValue::Boolean(b) => query.bind(b),
        PostgresValue::Uuid(u) => query.bind(u),
        PostgresValue::Timestamp(dt) => query.bind(dt),
        PostgresValue::Date(d) => query.bind(d),
        PostgresValue::Decimal(s) => match s.parse::<rust_decimal::Decimal>() {
            Ok(decimal) => query.bind(decimal),
            Err(_) => query.bind(s),
        },
        PostgresValue::Json(v) => query.bind(v),
        PostgresValue::Array(items) => bind_array(query, items),
        PostgresValue::Null => query.bind(Option::<String>::None),
    }
}

fn bind_array(query: PgQuery<'_>, items: Vec<PostgresValue>) -> PgQuery<'_> {
    // Hand-built arrays may still be mixed or hold nulls
    let items = match PostgresValue::array(items) {
        PostgresValue::Array(items) => items,
        other => return bind_value(query, other),
    };
    let element_type = items.first().map_or("TEXT", PostgresValue::type_name);

    match element_type {
        "TEXT" => query.bind(elements!(items, Text)),
        "INT4" => query.bind(elements!(items, Integer)),
        "INT8" => query.bind(elements!(items, BigInt)),
        "INT2" => query.bind(elements!(items, SmallInt)),
        "FLOAT8" => query.bind(elements!(items, Float)),
        "BOOL" => query.bind(elements!(items, Boolean)),
        "UUID" => query.bind::<Vec<Uuid>>(elements!(items, Uuid)),
        "TIMESTAMPTZ" => query.bind::<Vec<DateTime<Utc>>>(elements!(items, Timestamp)),
        "DATE" => query.bind::<Vec<NaiveDate>>(elements!(items, Date)),
        "NUMERIC" => {
            let digits = elements!(items, Decimal);
            match digits
                .iter()
                .map(|s| s.parse::<rust_decimal::Decimal>())
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(decimals) => query.bind(decimals),
                // Out of rust_decimal's range; the server casts text[] itself
                Err(_) => query.bind(digits),
            }
        }
        _ => query.bind(PostgresValue::Array(items).into_json()),
    }
}
