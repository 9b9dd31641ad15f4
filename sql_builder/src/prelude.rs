//! Convenience re-exports for building statements

pub use crate::errors::BuildError;
pub use crate::query_builder::{
    AggregateFunction, Conditional, DeleteStatement, GroupBy, InsertStatement, JoinClause,
    JoinType, LogicalOperator, QueryFilter, QueryOperator, SelectField, SelectStatement,
    SortOrder, UnionType, UpdateOperation, UpdateSet, UpdateStatement,
};
pub use crate::validation::{ValidatedFieldName, ValidatedTableName, ValidationError};
