//! INSERT statements

use crate::errors::BuildError;
use crate::query_builder::sql_generation::{ParamSink, SqlGenerator};
use serde_json::Value;
use type_mapping::PostgresValue;

/// `INSERT INTO table (cols) VALUES (...) [RETURNING ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    table: String,
    columns: Vec<(String, PostgresValue)>,
    returning: Vec<String>,
}

impl InsertStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            returning: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Set a column value; setting the same column again replaces the value
    pub fn set(mut self, column: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
        self
    }

    /// Set every key of a JSON object as a column
    pub fn set_object(mut self, object: Value) -> Result<Self, BuildError> {
        match object {
            Value::Object(map) => {
                for (column, value) in map {
                    self = self.set(column, value);
                }
                Ok(self)
            }
            other => Err(BuildError::invalid_value(
                self.table.clone(),
                format!("expected an object of column values, got {}", other),
            )),
        }
    }

    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn columns(&self) -> &[(String, PostgresValue)] {
        &self.columns
    }

    pub fn to_sql(&self) -> Result<(String, Vec<PostgresValue>), BuildError> {
        if self.columns.is_empty() {
            return Err(BuildError::EmptyValues("INSERT"));
        }

        let mut sink = ParamSink::new();
        let table = SqlGenerator::table(&self.table)?;

        let mut names = Vec::with_capacity(self.columns.len());
        let mut placeholders = Vec::with_capacity(self.columns.len());
        for (column, value) in &self.columns {
            names.push(SqlGenerator::column(column)?);
            placeholders.push(sink.push(value.clone()));
        }

        let returning = SqlGenerator::build_returning_clause(&self.returning)?;
        let columns = format!("({})", names.join(", "));
        let values = format!("VALUES ({})", placeholders.join(", "));

        let sql = SqlGenerator::assemble(&["INSERT INTO", &table, &columns, &values, &returning]);
        Ok((sql, sink.into_values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_sql() {
        let (sql, values) = InsertStatement::new("users")
            .set("name", json!("Ada"))
            .set("email", json!("ada@example.com"))
            .returning(["id"])
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id"
        );
        assert_eq!(
            values,
            vec![PostgresValue::from("Ada"), PostgresValue::from("ada@example.com")]
        );
    }

    #[test]
    fn test_insert_null_and_replacement() {
        let (sql, values) = InsertStatement::new("users")
            .set("name", json!("first"))
            .set("nickname", Value::Null)
            .set("age", json!(40))
            .set("name", json!("second"))
            .to_sql()
            .unwrap();

        assert_eq!(sql, "INSERT INTO users (name, nickname, age) VALUES ($1, NULL, $2)");
        assert_eq!(values, vec![PostgresValue::from("second"), PostgresValue::Integer(40)]);
    }

    #[test]
    fn test_insert_from_object() {
        let statement = InsertStatement::new("tags")
            .set_object(json!({ "label": "rust" }))
            .unwrap();
        assert_eq!(statement.columns().len(), 1);

        let error = InsertStatement::new("tags").set_object(json!([1, 2])).unwrap_err();
        assert!(matches!(error, BuildError::InvalidValue { .. }));
    }

    #[test]
    fn test_insert_requires_values() {
        assert_eq!(
            InsertStatement::new("users").to_sql().unwrap_err(),
            BuildError::EmptyValues("INSERT")
        );
    }

    #[test]
    fn test_insert_rejects_bad_table() {
        let result = InsertStatement::new("users; DROP TABLE users")
            .set("a", json!(1))
            .to_sql();
        assert!(matches!(result, Err(BuildError::InvalidIdentifier(_))));
    }
}
