//! Statement models and SQL rendering

pub mod aggregation;
pub mod delete;
pub mod filter;
pub mod grouping;
pub mod insert;
pub mod join;
pub mod ordering;
pub mod pagination;
pub mod select;
pub mod sql_generation;
pub mod update;

#[cfg(test)]
mod tests;


pub use aggregation::{AggregateFunction, SelectField};
pub use delete::DeleteStatement;
pub use filter::{Conditional, LogicalOperator, QueryCondition, QueryFilter, QueryOperator, WhereClause};
pub use grouping::GroupBy;
pub use insert::InsertStatement;
pub use join::{JoinClause, JoinCondition, JoinType};
pub use ordering::SortOrder;
pub use pagination::{Pagination, DEFAULT_PAGING};
pub use select::{SelectStatement, UnionType};
pub use sql_generation::{ParamSink, SqlGenerator};
pub use update::{UpdateOperation, UpdateSet, UpdateStatement};
