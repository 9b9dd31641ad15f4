//! JOIN clauses

use crate::errors::BuildError;
use crate::query_builder::sql_generation::SqlGenerator;
use crate::validation::ValidatedFieldName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    /// FULL OUTER JOIN
    Full,
    /// Cartesian product, rendered without a condition
    Cross,
}

impl JoinType {
    pub fn to_sql(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    /// `ON left = right`
    On {
        left_field: String,
        right_field: String,
    },
    /// `USING (a, b)`
    Using(Vec<String>),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub alias: Option<String>,
    pub condition: JoinCondition,
}

impl JoinClause {
    /// `<join_type> table ON left_field = right_field`
    pub fn new_on(
        join_type: JoinType,
        table: impl Into<String>,
        left_field: impl Into<String>,
        right_field: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            table: table.into(),
            alias: None,
            condition: JoinCondition::On {
                left_field: left_field.into(),
                right_field: right_field.into(),
            },
        }
    }

    /// `<join_type> table USING (columns)`
    pub fn new_using<I, S>(join_type: JoinType, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            join_type,
            table: table.into(),
            alias: None,
            condition: JoinCondition::Using(columns.into_iter().map(Into::into).collect()),
        }
    }

    pub fn inner(table: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::new_on(JoinType::Inner, table, left, right)
    }

    pub fn left(table: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::new_on(JoinType::Left, table, left, right)
    }

    pub fn right(table: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::new_on(JoinType::Right, table, left, right)
    }

    pub fn cross(table: impl Into<String>) -> Self {
        Self {
            join_type: JoinType::Cross,
            table: table.into(),
            alias: None,
            condition: JoinCondition::None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name the joined table is referenced by in the rest of the query
    pub fn table_ref(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    pub fn to_sql(&self) -> Result<String, BuildError> {
        let mut sql = format!(
            "{} {}",
            self.join_type.to_sql(),
            SqlGenerator::table(&self.table)?
        );

        if let Some(alias) = &self.alias {
            sql.push_str(&format!(" AS {}", ValidatedFieldName::new(alias)?));
        }

        match &self.condition {
            // A cross join never takes a condition
            _ if self.join_type == JoinType::Cross => {}
            JoinCondition::On {
                left_field,
                right_field,
            } => {
                sql.push_str(&format!(
                    " ON {} = {}",
                    SqlGenerator::column(left_field)?,
                    SqlGenerator::column(right_field)?
                ));
            }
            JoinCondition::Using(columns) => {
                let columns = columns
                    .iter()
                    .map(|c| Ok(ValidatedFieldName::new(c)?.into_string()))
                    .collect::<Result<Vec<_>, BuildError>>()?;
                sql.push_str(&format!(" USING ({})", columns.join(", ")));
            }
            JoinCondition::None => {}
        }

        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_join_with_alias() {
        let join = JoinClause::left("orders", "users.id", "o.user_id").with_alias("o");
        assert_eq!(join.table_ref(), "o");
        assert_eq!(
            join.to_sql().unwrap(),
            "LEFT JOIN orders AS o ON users.id = o.user_id"
        );
    }

    #[test]
    fn test_using_and_full_join() {
        let join = JoinClause::new_using(JoinType::Full, "profiles", ["user_id", "tenant_id"]);
        assert_eq!(join.table_ref(), "profiles");
        assert_eq!(
            join.to_sql().unwrap(),
            "FULL OUTER JOIN profiles USING (user_id, tenant_id)"
        );
    }

    #[test]
    fn test_cross_join_ignores_condition() {
        assert_eq!(JoinClause::cross("regions").to_sql().unwrap(), "CROSS JOIN regions");

        let mut join = JoinClause::inner("regions", "a.id", "b.id");
        join.join_type = JoinType::Cross;
        assert_eq!(join.to_sql().unwrap(), "CROSS JOIN regions");
    }

    #[test]
    fn test_join_rejects_injected_field() {
        let join = JoinClause::inner("orders", "users.id = 1 OR 1", "orders.user_id");
        assert!(matches!(join.to_sql(), Err(BuildError::InvalidIdentifier(_))));
    }
}
