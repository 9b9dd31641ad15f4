//! Identifier validation
//!
//! Table and column names are spliced into SQL text, so every identifier that
//! reaches the generator is checked against PostgreSQL identifier rules first.

use std::fmt;
use thiserror::Error;

/// PostgreSQL identifier length limit (NAMEDATALEN - 1)
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid characters in name '{0}': only alphanumeric characters and underscores are allowed")]
    InvalidCharacters(String),

    #[error("Name '{name}' is too long: {length} characters (max {max_length})")]
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },

    #[error("Name cannot be empty")]
    Empty,

    #[error("Name '{0}' must start with a letter or underscore")]
    InvalidStartCharacter(String),

    #[error("Name '{0}' is a reserved SQL keyword")]
    ReservedKeyword(String),

    /// `schema.table.column` at most
    #[error("Name '{0}' has too many dot-separated parts")]
    TooManyParts(String),

    #[error("'{0}' is not a column reference or aggregate call")]
    InvalidExpression(String),
}

/// Keywords PostgreSQL refuses as bare column or table names
const RESERVED_KEYWORDS: &[&str] = &[
    "ALL", "ANALYSE", "ANALYZE", "AND", "ANY", "ARRAY", "AS", "ASC", "ASYMMETRIC", "BOTH",
    "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "CONSTRAINT", "CREATE", "CURRENT_DATE",
    "CURRENT_ROLE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT",
    "DEFERRABLE", "DELETE", "DESC", "DISTINCT", "DO", "DROP", "ELSE", "END", "EXCEPT", "FALSE",
    "FETCH", "FOR", "FOREIGN", "FROM", "FULL", "GRANT", "GROUP", "HAVING", "IN", "INITIALLY",
    "INNER", "INSERT", "INTERSECT", "INTO", "JOIN", "LATERAL", "LEADING", "LEFT", "LIKE",
    "LIMIT", "LOCALTIME", "LOCALTIMESTAMP", "NOT", "NULL", "OFFSET", "ON", "ONLY", "OR",
    "ORDER", "OUTER", "PLACING", "PRIMARY", "REFERENCES", "RETURNING", "RIGHT", "SELECT",
    "SESSION_USER", "SET", "SOME", "SYMMETRIC", "TABLE", "THEN", "TO", "TRAILING", "TRUE",
    "UNION", "UNIQUE", "UPDATE", "USER", "USING", "VALUES", "VARIADIC", "WHEN", "WHERE",
    "WINDOW", "WITH",
];

fn is_reserved_keyword(name: &str) -> bool {
    RESERVED_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(name))
}

/// Check one unqualified identifier
fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    let first = name.chars().next().ok_or(ValidationError::Empty)?;

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            name: name.to_string(),
            length: name.len(),
            max_length: MAX_IDENTIFIER_LENGTH,
        });
    }
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(ValidationError::InvalidStartCharacter(name.to_string()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }
    if is_reserved_keyword(name) {
        return Err(ValidationError::ReservedKeyword(name.to_string()));
    }

    Ok(())
}

/// A validated table name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedTableName(String);

impl ValidatedTableName {
    /// Create a new validated table name
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        validate_identifier(name)?;
        Ok(Self(name.to_string()))
    }

    /// Validate a table name that may carry a schema (`schema.table`)
    pub fn qualified(name: &str) -> Result<Self, ValidationError> {
        validate_parts(name, 2, false)?;
        Ok(Self(name.to_string()))
    }

    /// Get the validated name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the validated name as a String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ValidatedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated field name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedFieldName(String);

impl ValidatedFieldName {
    /// Create a new validated field name
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        validate_identifier(name)?;
        Ok(Self(name.to_string()))
    }

    /// Validate a column reference that may be qualified (`table.column`,
    /// `schema.table.column`) or a qualified wildcard (`table.*`)
    pub fn qualified(name: &str) -> Result<Self, ValidationError> {
        validate_parts(name, 3, true)?;
        Ok(Self(name.to_string()))
    }

    /// Validate a column expression usable in WHERE, HAVING and ORDER BY:
    /// a qualified column or `COUNT|SUM|AVG|MIN|MAX([DISTINCT] column | *)`
    pub fn expression(expr: &str) -> Result<Self, ValidationError> {
        let trimmed = expr.trim();
        if let Some(open) = trimmed.find('(') {
            let function = trimmed[..open].trim().to_ascii_uppercase();
            let inner = trimmed[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| ValidationError::InvalidExpression(expr.to_string()))?
                .trim();

            if !matches!(function.as_str(), "COUNT" | "SUM" | "AVG" | "MIN" | "MAX") {
                return Err(ValidationError::InvalidExpression(expr.to_string()));
            }

            let argument = match inner.get(..9) {
                Some(prefix) if prefix.eq_ignore_ascii_case("DISTINCT ") => inner[9..].trim(),
                _ => inner,
            };

            if argument != "*" {
                validate_parts(argument, 3, false)
                    .map_err(|_| ValidationError::InvalidExpression(expr.to_string()))?;
            }

            return Ok(Self(trimmed.to_string()));
        }

        Self::qualified(trimmed)
    }

    /// Get the validated name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the validated name as a String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ValidatedFieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_parts(name: &str, max_parts: usize, allow_wildcard: bool) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > max_parts {
        return Err(ValidationError::TooManyParts(name.to_string()));
    }

    let last = parts.len() - 1;
    for (index, part) in parts.iter().enumerate() {
        if allow_wildcard && index == last && last > 0 && *part == "*" {
            continue;
        }
        validate_identifier(part)?;
    }

    Ok(())
}

/// Utility functions for validation
pub mod utils {
    use super::*;

    /// Check if a string is a valid table name without creating a ValidatedTableName
    pub fn is_valid_table_name(name: &str) -> bool {
        ValidatedTableName::qualified(name).is_ok()
    }

    /// Check if a string is a valid field name without creating a ValidatedFieldName
    pub fn is_valid_field_name(name: &str) -> bool {
        ValidatedFieldName::qualified(name).is_ok()
    }

    /// Check that a table prefix can be glued in front of a valid name.
    /// Empty prefixes are allowed.
    pub fn is_valid_prefix(prefix: &str) -> bool {
        prefix.is_empty()
            || (prefix.len() < MAX_IDENTIFIER_LENGTH
                && prefix
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    }

    /// Sanitize a name by replacing invalid characters with underscores
    /// Note: This should be used carefully as it may create naming conflicts
    pub fn sanitize_name(name: &str) -> String {
        let mut sanitized = String::with_capacity(name.len());

        for (i, c) in name.chars().enumerate() {
            let allowed = if i == 0 {
                c.is_ascii_alphabetic() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            };
            sanitized.push(if allowed { c } else { '_' });
        }

        if sanitized.len() > MAX_IDENTIFIER_LENGTH {
            sanitized.truncate(MAX_IDENTIFIER_LENGTH);
        }

        if sanitized.is_empty() {
            sanitized = "unnamed".to_string();
        }

        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejects(name: &str) -> ValidationError {
        ValidatedTableName::new(name).expect_err(name)
    }

    #[test]
    fn test_identifier_rules() {
        let longest = "t".repeat(MAX_IDENTIFIER_LENGTH);
        for name in ["users", "UserProfiles", "_private", "t2", longest.as_str()] {
            assert!(ValidatedTableName::new(name).is_ok(), "{}", name);
        }

        assert_eq!(rejects(""), ValidationError::Empty);
        assert_eq!(
            rejects("9lives"),
            ValidationError::InvalidStartCharacter("9lives".into())
        );
        assert_eq!(
            rejects("orders; DROP TABLE orders"),
            ValidationError::InvalidCharacters("orders; DROP TABLE orders".into())
        );
        assert_eq!(rejects("Where"), ValidationError::ReservedKeyword("Where".into()));
        assert!(matches!(
            rejects(&"t".repeat(64)),
            ValidationError::TooLong { length: 64, max_length: 63, .. }
        ));
    }

    #[test]
    fn test_qualified_names() {
        assert!(ValidatedTableName::qualified("billing.invoices").is_ok());
        assert!(ValidatedTableName::qualified("a.b.c").is_err());
        assert!(ValidatedFieldName::qualified("billing.invoices.total").is_ok());
        assert!(ValidatedFieldName::qualified("invoices.*").is_ok());
        assert!(ValidatedFieldName::qualified("*").is_err());
        assert!(ValidatedFieldName::qualified("invoices..total").is_err());
        assert_eq!(
            ValidatedFieldName::qualified("a.b.c.d").unwrap_err(),
            ValidationError::TooManyParts("a.b.c.d".into())
        );
    }

    #[test]
    fn test_expressions_allow_only_aggregates() {
        for ok in ["total", "COUNT(*)", "sum(orders.total)", "count(DISTINCT customer_id)"] {
            assert!(ValidatedFieldName::expression(ok).is_ok(), "{}", ok);
        }
        for bad in ["lower(name)", "COUNT(id) OR 1=1", "SUM(1); DROP", "MAX(total"] {
            assert!(ValidatedFieldName::expression(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_utils() {
        assert_eq!(utils::sanitize_name("unit-price"), "unit_price");
        assert_eq!(utils::sanitize_name("1st place"), "_st_place");
        assert_eq!(utils::sanitize_name(""), "unnamed");
        assert_eq!(utils::sanitize_name(&"x".repeat(80)).len(), MAX_IDENTIFIER_LENGTH);

        assert!(utils::is_valid_prefix(""));
        assert!(utils::is_valid_prefix("shop_"));
        assert!(!utils::is_valid_prefix("shop-"));
        assert!(!utils::is_valid_prefix("1shop_"));

        assert!(utils::is_valid_field_name("orders.total"));
        assert!(!utils::is_valid_table_name("orders.total.x"));
    }

    #[test]
    fn test_display_is_the_name() {
        assert_eq!(ValidatedTableName::new("users").unwrap().to_string(), "users");
        assert_eq!(ValidatedFieldName::qualified("u.id").unwrap().to_string(), "u.id");
    }
}
