//! SELECT list entries and aggregate functions

use crate::validation::utils::is_valid_field_name;
use crate::validation::ValidatedFieldName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// SQL function name; `CountDistinct` renders as `COUNT(DISTINCT ..)`
    pub fn to_sql(self) -> &'static str {
        match self {
            AggregateFunction::Count | AggregateFunction::CountDistinct => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    pub fn is_distinct(self) -> bool {
        self == AggregateFunction::CountDistinct
    }
}

/// One entry of a SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectField {
    /// `*`
    All,
    /// `column` or `table.column`
    Field(String),
    /// `column AS alias`
    FieldWithAlias { field: String, alias: String },
    /// `FUNC(column)`; `field: None` means `*`
    Aggregate {
        function: AggregateFunction,
        field: Option<String>,
        alias: Option<String>,
    },
    /// Verbatim expression, rendered as given
    Raw(String),
}

impl SelectField {
    /// Interpret a column string the way `select(...)` receives it:
    /// `*`, `column`, `table.column`, `column AS alias`; anything else
    /// (function calls, casts) is kept as a raw expression.
    pub fn parse(column: &str) -> Self {
        let column = column.trim();
        if column == "*" {
            return SelectField::All;
        }

        let lowered = column.to_ascii_lowercase();
        if let Some(position) = lowered.rfind(" as ") {
            let field = column[..position].trim();
            let alias = column[position + 4..].trim();
            if is_valid_field_name(field) && ValidatedFieldName::new(alias).is_ok() {
                return SelectField::field_as(field, alias);
            }
        } else if is_valid_field_name(column) {
            return SelectField::field(column);
        }

        SelectField::Raw(column.to_string())
    }

    pub fn field(field: impl Into<String>) -> Self {
        SelectField::Field(field.into())
    }

    pub fn field_as(field: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectField::FieldWithAlias {
            field: field.into(),
            alias: alias.into(),
        }
    }

    fn aggregate(function: AggregateFunction, field: Option<String>) -> Self {
        SelectField::Aggregate {
            function,
            field,
            alias: None,
        }
    }

    /// `COUNT(*)`
    pub fn count_all() -> Self {
        Self::aggregate(AggregateFunction::Count, None)
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Count, Some(field.into()))
    }

    pub fn count_distinct(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::CountDistinct, Some(field.into()))
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Sum, Some(field.into()))
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Avg, Some(field.into()))
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Min, Some(field.into()))
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Max, Some(field.into()))
    }

    /// Alias a column or aggregate. `*` and raw expressions are returned
    /// unchanged; put the alias inside a raw expression instead.
    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        match self {
            SelectField::Field(field) | SelectField::FieldWithAlias { field, .. } => {
                SelectField::FieldWithAlias {
                    field,
                    alias: alias.into(),
                }
            }
            SelectField::Aggregate {
                function, field, ..
            } => SelectField::Aggregate {
                function,
                field,
                alias: Some(alias.into()),
            },
            other => other,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, SelectField::Aggregate { .. })
    }
}

impl From<&str> for SelectField {
    fn from(column: &str) -> Self {
        SelectField::parse(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select_columns() {
        assert_eq!(SelectField::parse("*"), SelectField::All);
        assert_eq!(SelectField::parse(" name "), SelectField::field("name"));
        assert_eq!(SelectField::parse("users.id"), SelectField::field("users.id"));
        assert_eq!(
            SelectField::parse("users.email as contact"),
            SelectField::field_as("users.email", "contact")
        );
        assert_eq!(
            SelectField::parse("COUNT(*)"),
            SelectField::Raw("COUNT(*)".to_string())
        );
        assert_eq!(
            SelectField::parse("price * 2 AS doubled"),
            SelectField::Raw("price * 2 AS doubled".to_string())
        );
    }

    #[test]
    fn test_count_distinct_shares_count_name() {
        assert_eq!(AggregateFunction::CountDistinct.to_sql(), "COUNT");
        assert!(AggregateFunction::CountDistinct.is_distinct());
        assert!(!AggregateFunction::Count.is_distinct());
    }

    #[test]
    fn test_constructors() {
        assert_eq!(
            SelectField::count_all(),
            SelectField::Aggregate {
                function: AggregateFunction::Count,
                field: None,
                alias: None,
            }
        );
        assert_eq!(
            SelectField::max("score"),
            SelectField::Aggregate {
                function: AggregateFunction::Max,
                field: Some("score".to_string()),
                alias: None,
            }
        );
        assert!(SelectField::avg("price").is_aggregate());
        assert!(!SelectField::field("price").is_aggregate());
    }

    #[test]
    fn test_with_alias() {
        assert_eq!(
            SelectField::field("user_name").with_alias("name"),
            SelectField::field_as("user_name", "name")
        );
        assert_eq!(
            SelectField::field_as("user_name", "a").with_alias("b"),
            SelectField::field_as("user_name", "b")
        );
        assert_eq!(
            SelectField::sum("amount").with_alias("total"),
            SelectField::Aggregate {
                function: AggregateFunction::Sum,
                field: Some("amount".to_string()),
                alias: Some("total".to_string()),
            }
        );
        assert_eq!(SelectField::All.with_alias("x"), SelectField::All);
    }
}
