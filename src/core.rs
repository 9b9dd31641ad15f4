//! Core FluentSql functionality
//!
//! This module contains the connection handle: pool setup, the optional
//! process-wide instance and the query entry points.

use futures::future::BoxFuture;
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::errors::FluentSqlError;
use crate::executor::QueryExecutor;
use crate::query::{DeleteQuery, InsertQuery, RawQuery, SelectQuery, UpdateQuery};
use crate::transaction::FluentTransaction;
use config::{AppConfig, DatabaseConfig, QueryConfig};

static GLOBAL: OnceCell<FluentSql> = OnceCell::const_new();

/// Connection handle that hands out query builders
///
/// Cloning is cheap; clones share the pool.
#[derive(Clone, Debug)]
pub struct FluentSql {
    pool: PgPool,
    settings: QueryConfig,
}

impl FluentSql {
    /// Connect using the given configuration
    pub async fn new(config: &AppConfig) -> Result<Self, FluentSqlError> {
        config.validate()?;
        let db = &config.database;

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .acquire_timeout(Duration::from_secs(db.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(db.idle_timeout_seconds));

        // Set max lifetime if specified
        if db.max_lifetime_seconds > 0 {
            pool_options = pool_options.max_lifetime(Duration::from_secs(db.max_lifetime_seconds));
        }

        let pool = pool_options.connect_with(connect_options(db)).await?;

        tracing::info!(
            host = %db.host,
            database = %db.database,
            max_connections = db.max_connections,
            "connected to PostgreSQL"
        );

        Ok(Self::from_pool(pool, config.query.clone()))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool, settings: QueryConfig) -> Self {
        Self { pool, settings }
    }

    /// Initialise the process-wide instance
    pub async fn init_global(config: &AppConfig) -> Result<&'static FluentSql, FluentSqlError> {
        if GLOBAL.initialized() {
            return Err(FluentSqlError::AlreadyInitialized);
        }
        let instance = Self::new(config).await?;
        GLOBAL
            .set(instance)
            .map_err(|_| FluentSqlError::AlreadyInitialized)?;
        Self::global()
    }

    /// The process-wide instance, if `init_global` or `get_instance` ran
    pub fn global() -> Result<&'static FluentSql, FluentSqlError> {
        GLOBAL.get().ok_or(FluentSqlError::NotInitialized)
    }

    /// The process-wide instance, created from `AppConfig::load()` on first use
    pub async fn get_instance() -> Result<&'static FluentSql, FluentSqlError> {
        GLOBAL
            .get_or_try_init(|| async {
                let config = AppConfig::load()?;
                Self::new(&config).await
            })
            .await
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn settings(&self) -> &QueryConfig {
        &self.settings
    }

    pub fn table_prefix(&self) -> &str {
        &self.settings.table_prefix
    }

    /// Table name with the configured prefix
    pub fn table(&self, name: &str) -> String {
        self.settings.prefixed(name)
    }

    fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::pool(&self.pool, &self.settings)
    }

    /// Start a SELECT; an empty column list selects `*`
    pub fn select<I, S>(&self, columns: I) -> SelectQuery<'_>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SelectQuery::new(self.executor(), columns)
    }

    pub fn insert(&self, table: &str) -> InsertQuery<'_> {
        InsertQuery::new(self.executor(), table)
    }

    pub fn update(&self, table: &str) -> UpdateQuery<'_> {
        UpdateQuery::new(self.executor(), table)
    }

    pub fn delete(&self, table: &str) -> DeleteQuery<'_> {
        DeleteQuery::new(self.executor(), table)
    }

    pub fn raw(&self, sql: impl Into<String>) -> RawQuery<'_> {
        RawQuery::new(self.executor(), sql)
    }

    /// Begin a transaction
    pub async fn begin(&self) -> Result<FluentTransaction, FluentSqlError> {
        let tx = self.pool.begin().await?;
        crate::debug_log!("transaction started");
        Ok(FluentTransaction::new(tx, self.settings.clone()))
    }

    /// Run `work` inside a transaction: commit when it returns `Ok`, roll
    /// back when it returns `Err`.
    ///
    /// ```rust,no_run
    /// # use fluentsql::prelude::*;
    /// # async fn demo(db: &FluentSql) -> Result<(), FluentSqlError> {
    /// db.transaction(|tx| {
    ///     Box::pin(async move {
    ///         tx.update("accounts").decrement("balance", 50).where_eq("id", 1).execute().await?;
    ///         tx.update("accounts").increment("balance", 50).where_eq("id", 2).execute().await?;
    ///         Ok(())
    ///     })
    /// })
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn transaction<T, F>(&self, work: F) -> Result<T, FluentSqlError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut FluentTransaction) -> BoxFuture<'t, Result<T, FluentSqlError>>,
    {
        let mut tx = self.begin().await?;
        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::warn!(error = %rollback_error, "rollback after failed transaction failed");
                }
                Err(error)
            }
        }
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), FluentSqlError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Driver connect options. Fields are passed through as-is, so no URL
/// escaping applies and IPv6 hosts need no brackets. An empty password
/// leaves `PGPASSWORD` / `.pgpass` in charge.
pub(crate) fn connect_options(db: &DatabaseConfig) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.username)
        .database(&db.database);

    if !db.password.is_empty() {
        options = options.password(&db.password);
    }
    if !db.charset.is_empty() {
        options = options.options([("client_encoding", db.charset.as_str())]);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_builder::query_builder::Conditional;
    use sqlx::postgres::PgPoolOptions;
    use type_mapping::PostgresValue;

    fn lazy() -> FluentSql {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://postgres@localhost/fluentsql")
            .unwrap();
        FluentSql::from_pool(pool, QueryConfig::default().with_table_prefix("t_"))
    }

    #[tokio::test]
    async fn test_entry_points_apply_prefix() {
        let db = lazy();
        assert_eq!(db.table_prefix(), "t_");
        assert_eq!(db.table("users"), "t_users");
        assert!(!db.settings().log_statements);

        let (sql, _) = db.delete("users").where_eq("id", 1).to_sql().unwrap();
        assert_eq!(sql, "DELETE FROM t_users WHERE id = $1");

        let (sql, _) = db.update("users").set("name", "x").to_sql().unwrap();
        assert_eq!(sql, "UPDATE t_users SET name = $1");

        let (sql, _) = db.select(Vec::<&str>::new()).from("users").to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM t_users");
    }

    #[test]
    fn test_connect_options_take_fields_verbatim() {
        let db = DatabaseConfig::new(
            "::1".to_string(),
            6543,
            "shop".to_string(),
            "app user".to_string(),
            "p@ss:w/rd".to_string(),
            1,
            5,
            30,
            600,
            0,
        )
        .with_charset("LATIN1");

        let options = connect_options(&db);
        assert_eq!(options.get_host(), "::1");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "app user");
        assert_eq!(options.get_database(), Some("shop"));
        assert!(options
            .get_options()
            .is_some_and(|o| o.contains("client_encoding=LATIN1")));

        if std::env::var_os("PGOPTIONS").is_none() {
            let plain = connect_options(&db.with_charset(""));
            assert!(plain.get_options().is_none());
        }
    }

    #[tokio::test]
    async fn test_raw_keeps_sql_and_binds() {
        let db = lazy();
        let raw = db.raw("SELECT * FROM users WHERE id = $1").bind(5);
        assert_eq!(raw.sql(), "SELECT * FROM users WHERE id = $1");
        assert_eq!(raw.params(), &[PostgresValue::Integer(5)]);
    }
}
