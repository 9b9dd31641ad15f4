//! Convenience re-exports for common FluentSQL usage
//!
//! ```rust
//! use fluentsql::prelude::*;
//! ```

// Core components
pub use crate::core::FluentSql;
pub use crate::errors::FluentSqlError;
pub use crate::query::{DeleteQuery, InsertQuery, RawQuery, SelectQuery, UpdateQuery};
pub use crate::row::{FetchMode, Record};
pub use crate::transaction::FluentTransaction;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, QueryConfig};

// Statement building blocks, including the `Conditional` trait for where_* methods
pub use sql_builder::prelude::*;

pub use type_mapping::PostgresValue;

// Common external dependencies
pub use serde_json::{Value, json};
pub use sqlx;
pub use tokio;

// Commonly used sqlx types
pub use sqlx::{FromRow, PgPool, Row};
