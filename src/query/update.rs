//! UPDATE builder

use serde::Serialize;
use sql_builder::query_builder::{Conditional, UpdateOperation, UpdateStatement, WhereClause};
use type_mapping::PostgresValue;

use super::columns_of;
use crate::errors::FluentSqlError;
use crate::executor::QueryExecutor;
use crate::row::{decode_row, Record};

pub struct UpdateQuery<'c> {
    executor: QueryExecutor<'c>,
    statement: UpdateStatement,
}

impl<'c> UpdateQuery<'c> {
    pub(crate) fn new(executor: QueryExecutor<'c>, table: &str) -> Self {
        let statement = UpdateStatement::new(executor.table(table));
        Self {
            executor,
            statement,
        }
    }

    fn operation(mut self, column: &str, operation: UpdateOperation) -> Self {
        self.statement = self.statement.set_operation(column, operation);
        self
    }

    pub fn set(self, column: &str, value: impl Into<PostgresValue>) -> Self {
        self.operation(column, UpdateOperation::Set(value.into()))
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

    pub fn set_from<T: Serialize + ?Sized>(self, source: &T) -> Result<Self, FluentSqlError> {
        Ok(self.set_many(columns_of(source)?))
    }

    /// `column = column + value`
    pub fn increment(self, column: &str, value: impl Into<PostgresValue>) -> Self {
        self.operation(column, UpdateOperation::Increment(value.into()))
    }

    pub fn decrement(self, column: &str, value: impl Into<PostgresValue>) -> Self {
        self.operation(column, UpdateOperation::Decrement(value.into()))
    }

    pub fn multiply(self, column: &str, value: impl Into<PostgresValue>) -> Self {
        self.operation(column, UpdateOperation::Multiply(value.into()))
    }

    pub fn divide(self, column: &str, value: impl Into<PostgresValue>) -> Self {
        self.operation(column, UpdateOperation::Divide(value.into()))
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

    /// Run the update; returns the number of rows changed
    pub async fn execute(self) -> Result<u64, FluentSqlError> {
        if !self.statement.has_conditions() {
            tracing::warn!(table = self.statement.table(), "UPDATE without WHERE touches every row");
        }
        let (sql, params) = self.statement.to_sql()?;
        self.executor.execute(&sql, params).await
    }

    pub async fn fetch_returning(self) -> Result<Vec<Record>, FluentSqlError> {
        let (sql, params) = self.statement.to_sql()?;
        let rows = self.executor.fetch_all(&sql, params).await?;
        rows.iter().map(decode_row).collect()
    }
}

impl Conditional for UpdateQuery<'_> {
    fn conditions_mut(&mut self) -> &mut WhereClause {
        self.statement.conditions_mut()
    }
}
