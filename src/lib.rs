//! # FluentSQL
//!
//! A fluent query builder for PostgreSQL. Chainable builders assemble a
//! parameterized statement, bind every value as a `$n` placeholder and run it
//! on a sqlx pool or transaction, returning rows as JSON records, typed
//! structs or scalars.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fluentsql::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), FluentSqlError> {
//!     let database = DatabaseConfig::new(
//!         "localhost".to_string(), 5432, "shop".to_string(),
//!         "postgres".to_string(), "password".to_string(),
//!         1, 5, 30, 600, 3600,
//!     );
//!     let config = AppConfig::new(database, QueryConfig::default());
//!     let db = FluentSql::new(&config).await?;
//!
//!     let id: i64 = db
//!         .insert("users")
//!         .set("name", "Ada")
//!         .set("email", "ada@example.com")
//!         .insert_get_id("id")
//!         .await?;
//!
//!     let users = db
//!         .select(["id", "name"])
//!         .from("users")
//!         .where_eq("id", id)
//!         .order_by_desc("id")
//!         .get_all()
//!         .await?;
//!     println!("{users:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Parameter types
//!
//! Values are bound as [`PostgresValue`]s. Rust values keep their own type:
//! a `&str` is always TEXT, a `chrono::DateTime<Utc>` TIMESTAMPTZ, a `Uuid`
//! UUID. `serde_json::Value`s (`json!(...)`, `set_from` structs) are
//! classified, so an RFC3339 string becomes TIMESTAMPTZ and a UUID-shaped
//! string becomes UUID. Wrap a string in `PostgresValue::Text` to keep it
//! as text regardless of its shape.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod executor;
pub mod prelude;
pub mod query;
pub mod row;
pub mod transaction;

// Re-export the main public types for convenience
pub use core::FluentSql;
pub use errors::FluentSqlError;
pub use executor::QueryExecutor;
pub use row::{FetchMode, Record};
pub use transaction::FluentTransaction;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig, QueryConfig};

// Re-export internal crates used by the public API
pub use sql_builder;
pub use type_mapping;
pub use type_mapping::PostgresValue;

// Re-export external dependencies used in public API
pub use sqlx;
