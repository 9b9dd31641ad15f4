//! Error types for the FluentSQL crate
//!
//! This module contains all error types that can be returned by FluentSQL operations.

use config::ConfigError;
use sql_builder::BuildError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FluentSqlError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Query failed: {source} [SQL: {sql}]")]
    QueryExecution {
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid statement: {0}")]
    Build(#[from] BuildError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Global FluentSql instance is not initialized")]
    NotInitialized,

    #[error("Global FluentSql instance is already initialized")]
    AlreadyInitialized,
}

impl FluentSqlError {
    pub(crate) fn decode(column: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.to_string(),
        }
    }

    /// SQL text of the failed statement, when the error came from executing one
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::QueryExecution { sql, .. } => Some(sql),
            _ => None,
        }
    }
}
