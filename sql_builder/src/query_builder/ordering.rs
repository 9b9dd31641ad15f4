//! ORDER BY direction

use crate::errors::BuildError;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Split `"created_at DESC"` into the column and its direction.
    /// Without a trailing `ASC`/`DESC` the whole text is the column, ascending.
    pub fn split(column: &str) -> (&str, SortOrder) {
        let column = column.trim();
        if let Some((name, direction)) = column.rsplit_once(char::is_whitespace) {
            if let Ok(order) = direction.parse() {
                return (name.trim_end(), order);
            }
        }
        (column, SortOrder::Asc)
    }
}

impl FromStr for SortOrder {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortOrder::Desc)
        } else {
            Err(BuildError::invalid_value(
                "order",
                format!("unknown sort direction '{}'", s),
            ))
        }
    }
}
