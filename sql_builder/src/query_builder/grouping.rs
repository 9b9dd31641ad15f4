//! GROUP BY and HAVING

use crate::errors::BuildError;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::sql_generation::{ParamSink, SqlGenerator};

/// Grouping columns plus the HAVING conditions (ANDed) that filter groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupBy {
    pub fields: Vec<String>,
    pub having: Vec<QueryFilter>,
}

impl GroupBy {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            having: Vec::new(),
        }
    }

    pub fn add_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
    }

    pub fn add_having(&mut self, condition: QueryFilter) {
        self.having.push(condition);
    }

    pub fn has_having(&self) -> bool {
        !self.having.is_empty()
    }

    /// Render `GROUP BY ...` and `HAVING ...`; either part may be empty
    pub fn to_sql(&self, sink: &mut ParamSink) -> Result<(String, String), BuildError> {
        let group_by = if self.fields.is_empty() {
            String::new()
        } else {
            let fields = self
                .fields
                .iter()
                .map(|f| SqlGenerator::column(f))
                .collect::<Result<Vec<_>, _>>()?;
            format!("GROUP BY {}", fields.join(", "))
        };

        let having = if self.having.is_empty() {
            String::new()
        } else {
            let parts = self
                .having
                .iter()
                .map(|condition| SqlGenerator::build_condition_sql(condition, sink))
                .collect::<Result<Vec<_>, _>>()?;
            format!("HAVING {}", parts.join(" AND "))
        };

        Ok((group_by, having))
    }
}
