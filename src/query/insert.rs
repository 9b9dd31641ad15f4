//! INSERT builder

use serde::Serialize;
use sql_builder::query_builder::InsertStatement;
use sqlx::{Decode, Postgres, Type};
use type_mapping::PostgresValue;

use super::columns_of;
use crate::errors::FluentSqlError;
use crate::executor::QueryExecutor;
use crate::query::select::read_value;
use crate::row::{decode_row, Record};

pub struct InsertQuery<'c> {
    executor: QueryExecutor<'c>,
    statement: InsertStatement,
}

impl<'c> InsertQuery<'c> {
    pub(crate) fn new(executor: QueryExecutor<'c>, table: &str) -> Self {
        let statement = InsertStatement::new(executor.table(table));
        Self {
            executor,
            statement,
        }
    }

    pub fn set(mut self, column: &str, value: impl Into<PostgresValue>) -> Self {
        self.statement = self.statement.set(column, value.into());
        self
    }

    pub fn set_many<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PostgresValue>,
    {
        for (column, value) in values {
            self.statement = self.statement.set(column, value.into());
        }
        self
    }

    /// Set every field of a serializable struct as a column
    pub fn set_from<T: Serialize + ?Sized>(self, source: &T) -> Result<Self, FluentSqlError> {
        Ok(self.set_many(columns_of(source)?))
    }

    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statement = self.statement.returning(columns);
        self
    }

    pub fn to_sql(&self) -> Result<(String, Vec<PostgresValue>), FluentSqlError> {
        Ok(self.statement.to_sql()?)
    }

    /// Run the insert; returns the number of rows written
    pub async fn execute(self) -> Result<u64, FluentSqlError> {
        let (sql, params) = self.statement.to_sql()?;
        self.executor.execute(&sql, params).await
    }

    /// Run the insert and decode the RETURNING rows
    pub async fn fetch_returning(self) -> Result<Vec<Record>, FluentSqlError> {
        let (sql, params) = self.statement.to_sql()?;
        let rows = self.executor.fetch_all(&sql, params).await?;
        rows.iter().map(decode_row).collect()
    }

    /// Insert and return the generated key from `RETURNING <primary_key>`
    pub async fn insert_get_id<T>(self, primary_key: &str) -> Result<T, FluentSqlError>
    where
        T: for<'r> Decode<'r, Postgres> + Type<Postgres>,
    {
        let (sql, params) = self.statement.returning([primary_key]).to_sql()?;
        let row = self
            .executor
            .fetch_optional(&sql, params)
            .await?
            .ok_or_else(|| FluentSqlError::ColumnNotFound(primary_key.to_string()))?;

        read_value(&row, Some(primary_key))?
            .ok_or_else(|| FluentSqlError::decode(primary_key, "generated key is NULL"))
    }
}
