//! UPDATE statements

use crate::errors::BuildError;
use crate::query_builder::filter::{Conditional, WhereClause};
use crate::query_builder::sql_generation::{ParamSink, SqlGenerator};
use type_mapping::PostgresValue;

/// Type of update operation to perform on a field
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOperation {
    /// Set field to a specific value: field = $N
    Set(PostgresValue),

    /// Increment field by a value: field = field + $N
    Increment(PostgresValue),

    /// Decrement field by a value: field = field - $N
    Decrement(PostgresValue),

    /// Multiply field by a value: field = field * $N
    Multiply(PostgresValue),

    /// Divide field by a value: field = field / $N
    Divide(PostgresValue),
}

impl UpdateOperation {
    /// Render `field = <expr>` with the given placeholder
    pub fn to_sql(&self, field_name: &str, placeholder: &str) -> String {
        match self {
            UpdateOperation::Set(_) => format!("{} = {}", field_name, placeholder),
            UpdateOperation::Increment(_) => {
                format!("{} = {} + {}", field_name, field_name, placeholder)
            }
            UpdateOperation::Decrement(_) => {
                format!("{} = {} - {}", field_name, field_name, placeholder)
            }
            UpdateOperation::Multiply(_) => {
                format!("{} = {} * {}", field_name, field_name, placeholder)
            }
            UpdateOperation::Divide(_) => {
                format!("{} = {} / {}", field_name, field_name, placeholder)
            }
        }
    }

    /// Get the value to bind as a parameter
    pub fn value(&self) -> &PostgresValue {
        match self {
            UpdateOperation::Set(v)
            | UpdateOperation::Increment(v)
            | UpdateOperation::Decrement(v)
            | UpdateOperation::Multiply(v)
            | UpdateOperation::Divide(v) => v,
        }
    }
}

/// Ordered SET list. Assigning a column twice replaces the earlier
/// operation but keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet {
    operations: Vec<(String, UpdateOperation)>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, operation: UpdateOperation) {
        let field = field.into();
        match self.operations.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = operation,
            None => self.operations.push((field, operation)),
        }
    }

    /// Set a field to a specific value
    pub fn set(mut self, field: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        self.push(field, UpdateOperation::Set(value.into()));
        self
    }

    /// Increment a field by a value (atomic: field = field + value)
    pub fn increment(mut self, field: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        self.push(field, UpdateOperation::Increment(value.into()));
        self
    }

    /// Decrement a field by a value (atomic: field = field - value)
    pub fn decrement(mut self, field: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        self.push(field, UpdateOperation::Decrement(value.into()));
        self
    }

    /// Multiply a field by a value (atomic: field = field * value)
    pub fn multiply(mut self, field: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        self.push(field, UpdateOperation::Multiply(value.into()));
        self
    }

    /// Divide a field by a value (atomic: field = field / value)
    pub fn divide(mut self, field: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        self.push(field, UpdateOperation::Divide(value.into()));
        self
    }

    pub fn operations(&self) -> &[(String, UpdateOperation)] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    fn to_sql(&self, sink: &mut ParamSink) -> Result<String, BuildError> {
        let assignments = self
            .operations
            .iter()
            .map(|(field, operation)| {
                let field = SqlGenerator::column(field)?;
                let placeholder = sink.push(operation.value().clone());
                Ok(operation.to_sql(&field, &placeholder))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        Ok(assignments.join(", "))
    }
}

/// `UPDATE table SET ... [WHERE ...] [RETURNING ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    table: String,
    set: UpdateSet,
    conditions: WhereClause,
    returning: Vec<String>,
}

impl UpdateStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            set: UpdateSet::new(),
            conditions: WhereClause::new(),
            returning: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn set_operation(mut self, field: impl Into<String>, operation: UpdateOperation) -> Self {
        self.set.push(field, operation);
        self
    }

    pub fn set(self, field: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        self.set_operation(field, UpdateOperation::Set(value.into()))
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

    pub fn update_set(&self) -> &UpdateSet {
        &self.set
    }

    pub fn to_sql(&self) -> Result<(String, Vec<PostgresValue>), BuildError> {
        if self.set.is_empty() {
            return Err(BuildError::EmptyValues("UPDATE"));
        }

        let mut sink = ParamSink::new();
        let table = SqlGenerator::table(&self.table)?;
        let assignments = self.set.to_sql(&mut sink)?;
        let where_clause = SqlGenerator::build_where_clause(&self.conditions, &mut sink)?;
        let returning = SqlGenerator::build_returning_clause(&self.returning)?;

        let sql = SqlGenerator::assemble(&[
            "UPDATE",
            &table,
            "SET",
            &assignments,
            &where_clause,
            &returning,
        ]);

        Ok((sql, sink.into_values()))
    }
}

impl Conditional for UpdateStatement {
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
    fn test_update_operation_sql() {
        assert_eq!(UpdateOperation::Set(json!(1).into()).to_sql("qty", "$1"), "qty = $1");
        assert_eq!(
            UpdateOperation::Increment(json!(1).into()).to_sql("qty", "$2"),
            "qty = qty + $2"
        );
        assert_eq!(
            UpdateOperation::Divide(json!(2).into()).to_sql("qty", "$3"),
            "qty = qty / $3"
        );
    }

    #[test]
    fn test_update_set_replaces_in_place() {
        let set = UpdateSet::new()
            .set("name", json!("a"))
            .increment("visits", json!(1))
            .set("name", json!("b"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.operations()[0], ("name".to_string(), UpdateOperation::Set("b".into())));
    }

    #[test]
    fn test_update_numbers_set_before_where() {
        let statement = UpdateStatement::new("accounts")
            .set("status", json!("closed"))
            .set_operation("balance", UpdateOperation::Decrement(25.into()))
            .and_where("id", QueryOperator::Eq, 7)
            .returning(["id", "balance"]);

        let (sql, values) = statement.to_sql().unwrap();
        assert_eq!(
            sql,
            "UPDATE accounts SET status = $1, balance = balance - $2 WHERE id = $3 RETURNING id, balance"
        );
        assert_eq!(
            values,
            vec![
                PostgresValue::from("closed"),
                PostgresValue::Integer(25),
                PostgresValue::Integer(7)
            ]
        );
    }

    #[test]
    fn test_update_null_is_literal() {
        let (sql, values) = UpdateStatement::new("users")
            .set("deleted_at", PostgresValue::Null)
            .where_eq("id", 1)
            .to_sql()
            .unwrap();

        assert_eq!(sql, "UPDATE users SET deleted_at = NULL WHERE id = $1");
        assert_eq!(values, vec![PostgresValue::Integer(1)]);
    }

    #[test]
    fn test_update_without_values_fails() {
        let result = UpdateStatement::new("users").where_eq("id", 1).to_sql();
        assert_eq!(result.unwrap_err(), BuildError::EmptyValues("UPDATE"));
    }

    #[test]
    fn test_update_rejects_bad_column() {
        let result = UpdateStatement::new("users")
            .set("name = 'x', admin", json!(true))
            .to_sql();
        assert!(matches!(result, Err(BuildError::InvalidIdentifier(_))));
    }
}
