//! Type mapping between JSON parameters, PostgreSQL types and decoded values
//! Shared by the statement binder and the row decoder

pub mod sql;
pub mod types;

pub use sql::{pg_type_category, PgTypeCategory};
pub use types::PostgresValue;
