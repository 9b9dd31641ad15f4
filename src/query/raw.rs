//! Hand-written SQL with positional parameters

use sqlx::postgres::PgRow;
use sqlx::{Decode, FromRow, Postgres, Type};
use type_mapping::PostgresValue;

use crate::errors::FluentSqlError;
use crate::executor::QueryExecutor;
use crate::query::select::read_value;
use crate::row::{decode_row, Record};

/// SQL passed through verbatim; `$1..$n` are bound in `bind` order.
/// A bound null is sent as a TEXT-typed NULL, so cast it in the SQL
/// (`$1::int`) when the column has another type.
pub struct RawQuery<'c> {
    executor: QueryExecutor<'c>,
    sql: String,
    params: Vec<PostgresValue>,
}

impl<'c> RawQuery<'c> {
    pub(crate) fn new(executor: QueryExecutor<'c>, sql: impl Into<String>) -> Self {
        Self {
            executor,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<PostgresValue>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[PostgresValue] {
        &self.params
    }

    pub async fn execute(self) -> Result<u64, FluentSqlError> {
        self.executor.execute(&self.sql, self.params).await
    }

    pub async fn get_all(self) -> Result<Vec<Record>, FluentSqlError> {
        let rows = self.executor.fetch_all(&self.sql, self.params).await?;
        rows.iter().map(decode_row).collect()
    }

    pub async fn get_all_as<T>(self) -> Result<Vec<T>, FluentSqlError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let rows = self.executor.fetch_all(&self.sql, self.params).await?;
        Ok(rows.iter().map(T::from_row).collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn get_one(self) -> Result<Option<Record>, FluentSqlError> {
        let row = self.executor.fetch_optional(&self.sql, self.params).await?;
        row.as_ref().map(decode_row).transpose()
    }

    pub async fn get_value<T>(self, column: Option<&str>) -> Result<Option<T>, FluentSqlError>
    where
        T: for<'r> Decode<'r, Postgres> + Type<Postgres>,
    {
        match self.executor.fetch_optional(&self.sql, self.params).await? {
            Some(row) => read_value(&row, column),
            None => Ok(None),
        }
    }
}
