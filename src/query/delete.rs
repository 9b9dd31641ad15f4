//! DELETE builder

use type_mapping::PostgresValue;
use sql_builder::query_builder::{Conditional, DeleteStatement, WhereClause};

use crate::errors::FluentSqlError;
use crate::executor::QueryExecutor;
use crate::row::{decode_row, Record};

pub struct DeleteQuery<'c> {
    executor: QueryExecutor<'c>,
    statement: DeleteStatement,
}

impl<'c> DeleteQuery<'c> {
    pub(crate) fn new(executor: QueryExecutor<'c>, table: &str) -> Self {
        let statement = DeleteStatement::new(executor.table(table));
        Self {
            executor,
            statement,
        }
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

    /// Run the delete; returns the number of rows removed
    pub async fn execute(self) -> Result<u64, FluentSqlError> {
        if !self.statement.has_conditions() {
            tracing::warn!(table = self.statement.table(), "DELETE without WHERE removes every row");
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

impl Conditional for DeleteQuery<'_> {
    fn conditions_mut(&mut self) -> &mut WhereClause {
        self.statement.conditions_mut()
    }
}
