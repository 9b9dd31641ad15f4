//! SQL statement models for FluentSQL
//!
//! This crate turns SELECT / INSERT / UPDATE / DELETE models into
//! PostgreSQL text with `$n` placeholders plus the ordered values to bind.
//! It never touches a connection.

pub mod errors;
pub mod prelude;
pub mod query_builder;
pub mod validation;

pub use errors::BuildError;
pub use query_builder::{
    Conditional, DeleteStatement, InsertStatement, JoinClause, JoinType, QueryFilter,
    QueryOperator, SelectField, SelectStatement, SortOrder, UpdateOperation, UpdateStatement,
};
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};
