//! Transaction support
//!
//! A [`FluentTransaction`] offers the same entry points as
//! [`FluentSql`](crate::FluentSql), running every statement on the
//! transaction's connection. Dropping it without `commit` rolls back.

use sqlx::{PgConnection, Postgres, Transaction};

use crate::errors::FluentSqlError;
use crate::executor::QueryExecutor;
use crate::query::{DeleteQuery, InsertQuery, RawQuery, SelectQuery, UpdateQuery};
use config::QueryConfig;

pub struct FluentTransaction {
    tx: Transaction<'static, Postgres>,
    settings: QueryConfig,
}

impl FluentTransaction {
    pub(crate) fn new(tx: Transaction<'static, Postgres>, settings: QueryConfig) -> Self {
        Self { tx, settings }
    }

    fn executor(&mut self) -> QueryExecutor<'_> {
        QueryExecutor::connection(&mut *self.tx, &self.settings)
    }

    pub fn select<I, S>(&mut self, columns: I) -> SelectQuery<'_>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SelectQuery::new(self.executor(), columns)
    }

    pub fn insert(&mut self, table: &str) -> InsertQuery<'_> {
        InsertQuery::new(self.executor(), table)
    }

    pub fn update(&mut self, table: &str) -> UpdateQuery<'_> {
        UpdateQuery::new(self.executor(), table)
    }

    pub fn delete(&mut self, table: &str) -> DeleteQuery<'_> {
        DeleteQuery::new(self.executor(), table)
    }

    pub fn raw(&mut self, sql: impl Into<String>) -> RawQuery<'_> {
        RawQuery::new(self.executor(), sql)
    }

    /// Table name with the configured prefix
    pub fn table(&self, name: &str) -> String {
        self.settings.prefixed(name)
    }

    /// The transaction's connection, for running plain sqlx queries
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    /// Commit the transaction
    pub async fn commit(self) -> Result<(), FluentSqlError> {
        self.tx.commit().await?;
        crate::debug_log!("transaction committed");
        Ok(())
    }

    /// Rollback the transaction
    pub async fn rollback(self) -> Result<(), FluentSqlError> {
        self.tx.rollback().await?;
        crate::debug_log!("transaction rolled back");
        Ok(())
    }
}
