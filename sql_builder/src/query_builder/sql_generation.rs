//! SQL text generation
//!
//! Every clause renders into a shared [`ParamSink`], so placeholders are
//! numbered `$1..$n` in the order they appear in the final statement.

use crate::errors::BuildError;
use crate::query_builder::aggregation::SelectField;
use crate::query_builder::filter::{
    LogicalOperator, QueryCondition, QueryFilter, QueryOperator, WhereClause,
};
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::SortOrder;
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use serde_json::Value;
use type_mapping::PostgresValue;

/// Collects bound values and hands out positional placeholders
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParamSink {
    values: Vec<PostgresValue>,
}

impl ParamSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value and return its placeholder. Null is written as a
    /// literal `NULL` so it takes the column's type instead of a guessed one.
    pub fn push(&mut self, value: PostgresValue) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        self.values.push(value);
        format!("${}", self.values.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[PostgresValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<PostgresValue> {
        self.values
    }
}

pub struct SqlGenerator;

impl SqlGenerator {
    /// Validate and return a table reference
    pub fn table(name: &str) -> Result<String, BuildError> {
        Ok(ValidatedTableName::qualified(name)?.into_string())
    }

    /// Validate and return a column reference
    pub fn column(name: &str) -> Result<String, BuildError> {
        Ok(ValidatedFieldName::qualified(name)?.into_string())
    }

    /// Build WHERE clause from conditions
    pub fn build_where_clause(
        conditions: &WhereClause,
        sink: &mut ParamSink,
    ) -> Result<String, BuildError> {
        if let Some(error) = conditions.deferred() {
            return Err(error.clone());
        }

        let body = Self::build_chain(conditions, sink)?;
        if body.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!("WHERE {}", body))
        }
    }

    fn build_chain(conditions: &WhereClause, sink: &mut ParamSink) -> Result<String, BuildError> {
        let mut sql = String::new();

        for (index, (connector, filter)) in conditions.entries().iter().enumerate() {
            if index > 0 {
                sql.push(' ');
                sql.push_str(connector.to_sql());
                sql.push(' ');
            }
            sql.push_str(&Self::build_condition_sql(filter, sink)?);
        }

        Ok(sql)
    }

    pub fn build_condition_sql(
        filter: &QueryFilter,
        sink: &mut ParamSink,
    ) -> Result<String, BuildError> {
        match filter {
            QueryFilter::Condition(condition) => Self::build_single_condition_sql(condition, sink),
            QueryFilter::Group { operator, filters } => {
                if filters.is_empty() {
                    // Neutral element of the group's operator
                    return Ok(match operator {
                        LogicalOperator::And => "1=1".to_string(),
                        LogicalOperator::Or => "1=0".to_string(),
                    });
                }

                let separator = format!(" {} ", operator.to_sql());
                let parts = filters
                    .iter()
                    .map(|f| Self::build_condition_sql(f, sink))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(format!("({})", parts.join(&separator)))
            }
            QueryFilter::Raw(sql) => Ok(format!("({})", sql)),
        }
    }

    fn build_single_condition_sql(
        condition: &QueryCondition,
        sink: &mut ParamSink,
    ) -> Result<String, BuildError> {
        let field = ValidatedFieldName::expression(&condition.field)?;

        match condition.operator {
            QueryOperator::IsNull | QueryOperator::IsNotNull => {
                Ok(format!("{} {}", field, condition.operator.to_sql()))
            }
            QueryOperator::In | QueryOperator::NotIn => {
                let negated = condition.operator == QueryOperator::NotIn;
                let items = match &condition.value {
                    Some(PostgresValue::Array(items)) => items.clone(),
                    Some(PostgresValue::Json(Value::Array(items))) => {
                        items.iter().cloned().map(PostgresValue::from_json).collect()
                    }
                    Some(PostgresValue::Null) | None => Vec::new(),
                    Some(single) => vec![single.clone()],
                };

                if items.is_empty() {
                    // x IN () matches nothing, x NOT IN () matches everything
                    return Ok(if negated { "1=1" } else { "1=0" }.to_string());
                }

                let placeholders: Vec<String> = items.into_iter().map(|v| sink.push(v)).collect();
                Ok(format!(
                    "{} {} ({})",
                    field,
                    condition.operator.to_sql(),
                    placeholders.join(", ")
                ))
            }
            QueryOperator::Eq | QueryOperator::Ne => match &condition.value {
                Some(PostgresValue::Null) | None => {
                    let test = if condition.operator == QueryOperator::Eq {
                        "IS NULL"
                    } else {
                        "IS NOT NULL"
                    };
                    Ok(format!("{} {}", field, test))
                }
                Some(value) => {
                    let param = sink.push(value.clone());
                    Ok(format!("{} {} {}", field, condition.operator.to_sql(), param))
                }
            },
            _ => match &condition.value {
                Some(value) if !value.is_null() => {
                    let param = sink.push(value.clone());
                    Ok(format!("{} {} {}", field, condition.operator.to_sql(), param))
                }
                _ => Ok("1=0".to_string()), // comparison against nothing
            },
        }
    }

    /// Build ORDER BY clause
    pub fn build_order_clause(order_by: &[(String, SortOrder)]) -> Result<String, BuildError> {
        if order_by.is_empty() {
            return Ok(String::new());
        }

        let order_items = order_by
            .iter()
            .map(|(field, order)| {
                ValidatedFieldName::expression(field)
                    .map(|field| format!("{} {}", field, order.to_sql()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!("ORDER BY {}", order_items.join(", ")))
    }

    /// Build SELECT clause from fields
    pub fn build_select_clause(fields: &[SelectField]) -> Result<String, BuildError> {
        if fields.is_empty() {
            return Ok("*".to_string());
        }

        let field_parts = fields
            .iter()
            .map(Self::build_select_field)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(field_parts.join(", "))
    }

    fn build_select_field(field: &SelectField) -> Result<String, BuildError> {
        Ok(match field {
            SelectField::All => "*".to_string(),
            SelectField::Field(name) => Self::column(name)?,
            SelectField::FieldWithAlias { field, alias } => {
                format!("{} AS {}", Self::column(field)?, ValidatedFieldName::new(alias)?)
            }
            SelectField::Aggregate {
                function,
                field,
                alias,
            } => {
                let field_part = match field {
                    Some(f) if function.is_distinct() => format!("DISTINCT {}", Self::column(f)?),
                    Some(f) => Self::column(f)?,
                    None => "*".to_string(),
                };

                let aggregate = format!("{}({})", function.to_sql(), field_part);

                match alias {
                    Some(alias) => format!("{} AS {}", aggregate, ValidatedFieldName::new(alias)?),
                    None => aggregate,
                }
            }
            SelectField::Raw(expression) => expression.clone(),
        })
    }

    /// Build JOIN clauses
    pub fn build_join_clause(joins: &[JoinClause]) -> Result<String, BuildError> {
        let parts = joins
            .iter()
            .map(JoinClause::to_sql)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(" "))
    }

    /// Build RETURNING clause
    pub fn build_returning_clause(columns: &[String]) -> Result<String, BuildError> {
        if columns.is_empty() {
            return Ok(String::new());
        }

        let columns = columns
            .iter()
            .map(|c| if c == "*" { Ok(c.clone()) } else { Self::column(c) })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!("RETURNING {}", columns.join(", ")))
    }

    /// Join non-empty clause fragments with single spaces
    pub fn assemble(parts: &[&str]) -> String {
        parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
