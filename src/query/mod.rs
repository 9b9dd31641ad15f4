//! Fluent query builders bound to a pool or transaction
//!
//! Each entry point on [`FluentSql`](crate::FluentSql) or
//! [`FluentTransaction`](crate::FluentTransaction) hands out a fresh builder;
//! terminal methods consume it.

pub mod delete;
pub mod insert;
pub mod raw;
pub mod select;
pub mod update;

pub use delete::DeleteQuery;
pub use insert::InsertQuery;
pub use raw::RawQuery;
pub use select::SelectQuery;
pub use update::UpdateQuery;

use serde::Serialize;
use serde_json::Value;

use crate::errors::FluentSqlError;

/// Serialize a struct into its column/value pairs
pub(crate) fn columns_of<T: Serialize + ?Sized>(
    source: &T,
) -> Result<Vec<(String, Value)>, FluentSqlError> {
    match serde_json::to_value(source)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(FluentSqlError::Build(sql_builder::BuildError::invalid_value(
            "set_from",
            format!("expected a struct or map, got {}", other),
        ))),
    }
}
