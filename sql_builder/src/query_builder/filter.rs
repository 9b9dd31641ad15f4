//! WHERE / HAVING conditions
//!
//! Conditions are kept as data until render time, so placeholders can be
//! numbered across every clause of a statement.

use crate::errors::BuildError;
use std::fmt;
use std::str::FromStr;
use type_mapping::PostgresValue;

/// Query condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Gte,       // >=
    Lt,        // <
    Lte,       // <=
    Like,      // LIKE
    ILike,     // ILIKE (case insensitive)
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

impl QueryOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            QueryOperator::Eq => "=",
            QueryOperator::Ne => "!=",
            QueryOperator::Gt => ">",
            QueryOperator::Gte => ">=",
            QueryOperator::Lt => "<",
            QueryOperator::Lte => "<=",
            QueryOperator::Like => "LIKE",
            QueryOperator::ILike => "ILIKE",
            QueryOperator::In => "IN",
            QueryOperator::NotIn => "NOT IN",
            QueryOperator::IsNull => "IS NULL",
            QueryOperator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Operators that take no right-hand value
    pub fn is_unary(&self) -> bool {
        matches!(self, QueryOperator::IsNull | QueryOperator::IsNotNull)
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

impl FromStr for QueryOperator {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "=" => Ok(QueryOperator::Eq),
            "!=" | "<>" => Ok(QueryOperator::Ne),
            ">" => Ok(QueryOperator::Gt),
            ">=" => Ok(QueryOperator::Gte),
            "<" => Ok(QueryOperator::Lt),
            "<=" => Ok(QueryOperator::Lte),
            "LIKE" => Ok(QueryOperator::Like),
            "ILIKE" => Ok(QueryOperator::ILike),
            "IN" => Ok(QueryOperator::In),
            "NOT IN" => Ok(QueryOperator::NotIn),
            "IS NULL" => Ok(QueryOperator::IsNull),
            "IS NOT NULL" => Ok(QueryOperator::IsNotNull),
            _ => Err(BuildError::UnsupportedOperator(s.to_string())),
        }
    }
}

/// Single condition in WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<PostgresValue>, // None for IS NULL/IS NOT NULL
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
    /// Verbatim SQL fragment. Never validated: do not build it from user input.
    Raw(String),
}

impl QueryFilter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, value: Option<PostgresValue>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    /// Create AND group
    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// Create OR group
    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    /// Raw SQL condition
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    pub fn eq(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Eq, Some(value.into()))
    }

    pub fn ne(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Ne, Some(value.into()))
    }

    pub fn gt(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Gt, Some(value.into()))
    }

    pub fn gte(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Gte, Some(value.into()))
    }

    pub fn lt(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Lt, Some(value.into()))
    }

    pub fn lte(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Lte, Some(value.into()))
    }

    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::Like,
            Some(PostgresValue::Text(pattern.to_string())),
        )
    }

    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::ILike,
            Some(PostgresValue::Text(pattern.to_string())),
        )
    }

    /// One placeholder per element; the list is never sent as an array
    pub fn in_values(field: &str, values: Vec<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::In, Some(PostgresValue::Array(values)))
    }

    pub fn not_in_values(field: &str, values: Vec<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(PostgresValue::Array(values)))
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }
}

/// Ordered chain of conditions, joined left to right with the connector
/// each one was added with. The connector of the first entry is ignored.
///
/// A build error raised while chaining (for example an unknown operator
/// string) is parked here and surfaces when the statement is rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    entries: Vec<(LogicalOperator, QueryFilter)>,
    deferred: Option<BuildError>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, connector: LogicalOperator, filter: QueryFilter) {
        self.entries.push((connector, filter));
    }

    /// Remember the first error raised while chaining
    pub fn defer(&mut self, error: BuildError) {
        if self.deferred.is_none() {
            self.deferred = Some(error);
        }
    }

    pub fn deferred(&self) -> Option<&BuildError> {
        self.deferred.as_ref()
    }

    pub fn entries(&self) -> &[(LogicalOperator, QueryFilter)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Chainable WHERE building shared by every statement that has a WHERE clause
pub trait Conditional: Sized {
    fn conditions_mut(&mut self) -> &mut WhereClause;

    /// Add a filter joined with AND
    fn filter(mut self, filter: QueryFilter) -> Self {
        self.conditions_mut().push(LogicalOperator::And, filter);
        self
    }

    /// Add a filter joined with OR
    fn or_filter(mut self, filter: QueryFilter) -> Self {
        self.conditions_mut().push(LogicalOperator::Or, filter);
        self
    }

    /// `column <operator> value`, joined with AND
    fn and_where(self, column: &str, operator: QueryOperator, value: impl Into<PostgresValue>) -> Self {
        let filter = operator_filter(column, operator, value.into());
        self.filter(filter)
    }

    /// `column <operator> value`, joined with OR
    fn or_where(self, column: &str, operator: QueryOperator, value: impl Into<PostgresValue>) -> Self {
        let filter = operator_filter(column, operator, value.into());
        self.or_filter(filter)
    }

    /// Like `and_where`, with the operator given as SQL text (`"="`, `">="`, `"IN"`...)
    fn where_op(mut self, column: &str, operator: &str, value: impl Into<PostgresValue>) -> Self {
        match operator.parse::<QueryOperator>() {
            Ok(op) => self.and_where(column, op, value),
            Err(error) => {
                self.conditions_mut().defer(error);
                self
            }
        }
    }

    /// Like `or_where`, with the operator given as SQL text
    fn or_where_op(mut self, column: &str, operator: &str, value: impl Into<PostgresValue>) -> Self {
        match operator.parse::<QueryOperator>() {
            Ok(op) => self.or_where(column, op, value),
            Err(error) => {
                self.conditions_mut().defer(error);
                self
            }
        }
    }

    fn where_eq(self, column: &str, value: impl Into<PostgresValue>) -> Self {
        self.and_where(column, QueryOperator::Eq, value)
    }

    fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PostgresValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(QueryFilter::in_values(column, values))
    }

    fn where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PostgresValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(QueryFilter::not_in_values(column, values))
    }

    fn where_null(self, column: &str) -> Self {
        self.filter(QueryFilter::is_null(column))
    }

    fn where_not_null(self, column: &str) -> Self {
        self.filter(QueryFilter::is_not_null(column))
    }

    /// Append a verbatim condition. Not escaped: never pass user input.
    fn where_raw(self, sql: impl Into<String>) -> Self {
        self.filter(QueryFilter::raw(sql))
    }
}

fn operator_filter(column: &str, operator: QueryOperator, value: PostgresValue) -> QueryFilter {
    if operator.is_unary() {
        QueryFilter::condition(column, operator, None)
    } else {
        QueryFilter::condition(column, operator, Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Chain(WhereClause);

    impl Conditional for Chain {
        fn conditions_mut(&mut self) -> &mut WhereClause {
            &mut self.0
        }
    }

    #[test]
    fn test_operator_from_str() {
        assert_eq!("=".parse::<QueryOperator>().unwrap(), QueryOperator::Eq);
        assert_eq!("<>".parse::<QueryOperator>().unwrap(), QueryOperator::Ne);
        assert_eq!("in".parse::<QueryOperator>().unwrap(), QueryOperator::In);
        assert_eq!(
            "not   in".parse::<QueryOperator>().unwrap(),
            QueryOperator::NotIn
        );
        assert_eq!(
            "is not null".parse::<QueryOperator>().unwrap(),
            QueryOperator::IsNotNull
        );
        assert_eq!(
            "=>".parse::<QueryOperator>().unwrap_err(),
            BuildError::UnsupportedOperator("=>".to_string())
        );
    }

    #[test]
    fn test_operator_display_round_trips() {
        let operators = [
            QueryOperator::Eq,
            QueryOperator::Ne,
            QueryOperator::Gte,
            QueryOperator::ILike,
            QueryOperator::NotIn,
            QueryOperator::IsNull,
        ];
        for op in operators {
            assert_eq!(op.to_string().parse::<QueryOperator>().unwrap(), op);
        }
    }

    #[test]
    fn test_conditional_chain_keeps_connectors() {
        let chain = Chain::default()
            .where_eq("status", "active")
            .or_where("role", QueryOperator::Eq, "admin")
            .where_null("deleted_at");

        let entries = chain.0.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].0, LogicalOperator::And);
        assert_eq!(entries[1].0, LogicalOperator::Or);
        assert_eq!(entries[2].1, QueryFilter::is_null("deleted_at"));
    }

    #[test]
    fn test_unknown_operator_is_deferred() {
        let chain = Chain::default()
            .where_op("age", "BETWEEN", 5)
            .where_op("name", "~", "x");

        assert!(chain.0.is_empty());
        assert_eq!(
            chain.0.deferred(),
            Some(&BuildError::UnsupportedOperator("BETWEEN".to_string()))
        );
    }

    #[test]
    fn test_typed_values_are_not_reclassified() {
        let chain = Chain::default()
            .where_eq("label", "2024-03-01")
            .where_eq("code", PostgresValue::Text("67e55044-10b1-426f-9247-bb680e5fe0c8".into()))
            .where_eq("starts_at", json!("2024-03-01T00:00:00Z"));

        let values: Vec<_> = chain
            .0
            .entries()
            .iter()
            .map(|(_, filter)| match filter {
                QueryFilter::Condition(condition) => condition.value.clone(),
                _ => None,
            })
            .collect();

        assert!(matches!(&values[0], Some(PostgresValue::Text(s)) if s == "2024-03-01"));
        assert!(matches!(&values[1], Some(PostgresValue::Text(_))));
        assert!(matches!(&values[2], Some(PostgresValue::Timestamp(_))));
    }

    #[test]
    fn test_unary_operator_drops_value() {
        let chain = Chain::default().and_where("email", QueryOperator::IsNotNull, json!("ignored"));
        assert_eq!(chain.0.entries()[0].1, QueryFilter::is_not_null("email"));
    }
}
