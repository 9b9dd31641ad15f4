//! DELETE statements

use crate::errors::BuildError;
use crate::query_builder::filter::{Conditional, WhereClause};
use crate::query_builder::sql_generation::{ParamSink, SqlGenerator};
use type_mapping::PostgresValue;

/// `DELETE FROM table [WHERE ...] [RETURNING ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    table: String,
    conditions: WhereClause,
    returning: Vec<String>,
}

impl DeleteStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            conditions: WhereClause::new(),
            returning: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    pub fn to_sql(&self) -> Result<(String, Vec<PostgresValue>), BuildError> {
        let mut sink = ParamSink::new();
        let table = SqlGenerator::table(&self.table)?;
        let where_clause = SqlGenerator::build_where_clause(&self.conditions, &mut sink)?;
        let returning = SqlGenerator::build_returning_clause(&self.returning)?;

        let sql = SqlGenerator::assemble(&["DELETE FROM", &table, &where_clause, &returning]);
        Ok((sql, sink.into_values()))
    }
}

impl Conditional for DeleteStatement {
    fn conditions_mut(&mut self) -> &mut WhereClause {
        &mut self.conditions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::filter::QueryOperator;
    use serde_json::json;

    #[test]
    fn test_delete_sql() {
        let (sql, values) = DeleteStatement::new("sessions")
            .and_where("expires_at", QueryOperator::Lt, json!("2024-01-01T00:00:00Z"))
            .or_where("revoked", QueryOperator::Eq, true)
            .returning(["id"])
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "DELETE FROM sessions WHERE expires_at < $1 OR revoked = $2 RETURNING id"
        );
        assert!(matches!(values[0], PostgresValue::Timestamp(_)));
        assert_eq!(values[1], PostgresValue::Boolean(true));
    }

    #[test]
    fn test_delete_without_where() {
        let statement = DeleteStatement::new("cache_entries");
        assert!(!statement.has_conditions());
        assert_eq!(statement.to_sql().unwrap().0, "DELETE FROM cache_entries");
    }

    #[test]
    fn test_delete_deferred_operator_error() {
        let result = DeleteStatement::new("users").where_op("id", "===", 1).to_sql();
        assert_eq!(
            result.unwrap_err(),
            BuildError::UnsupportedOperator("===".to_string())
        );
    }
}
