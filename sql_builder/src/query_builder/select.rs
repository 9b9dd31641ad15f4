//! SELECT statements and UNION compounds

use crate::errors::BuildError;
use crate::query_builder::aggregation::SelectField;
use crate::query_builder::filter::{Conditional, QueryFilter, WhereClause};
use crate::query_builder::grouping::GroupBy;
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::pagination::Pagination;
use crate::query_builder::sql_generation::{ParamSink, SqlGenerator};
use crate::validation::ValidatedFieldName;
use type_mapping::PostgresValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionType {
    /// UNION (duplicates removed)
    Distinct,
    /// UNION ALL
    All,
}

impl UnionType {
    pub fn to_sql(&self) -> &'static str {
        match self {
            UnionType::Distinct => "UNION",
            UnionType::All => "UNION ALL",
        }
    }
}

/// A SELECT statement under construction
///
/// With unions attached, the statement renders as
/// `(self) UNION (other) ...` and its own ORDER BY / LIMIT / OFFSET apply to
/// the whole compound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectStatement {
    distinct: bool,
    fields: Vec<SelectField>,
    from: Option<(String, Option<String>)>,
    joins: Vec<JoinClause>,
    conditions: WhereClause,
    group_by: Option<GroupBy>,
    order_by: Vec<(String, SortOrder)>,
    pagination: Pagination,
    unions: Vec<(UnionType, SelectStatement)>,
}

impl SelectStatement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append columns to the select list
    pub fn cols<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fields
            .extend(columns.into_iter().map(|c| SelectField::parse(c.as_ref())));
        self
    }

    /// Replace the select list
    pub fn reset_cols<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fields.clear();
        self.cols(columns)
    }

    pub fn field(mut self, field: SelectField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.from = Some((table.into(), None));
        self
    }

    pub fn from_as(mut self, table: impl Into<String>, alias: impl Into<String>) -> Self {
        self.from = Some((table.into(), Some(alias.into())));
        self
    }

    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// Add GROUP BY columns, keeping any HAVING conditions already set
    pub fn group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.get_or_insert_with(GroupBy::default).add_fields(fields);
        self
    }

    /// Add a HAVING condition (ANDed with the others)
    pub fn having(mut self, condition: QueryFilter) -> Self {
        self.group_by.get_or_insert_with(GroupBy::default).add_having(condition);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.pagination = self.pagination.with_limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.pagination = self.pagination.with_offset(offset);
        self
    }

    /// Rows per page used by `page`
    pub fn set_paging(mut self, paging: u64) -> Self {
        self.pagination = self.pagination.with_paging(paging);
        self
    }

    /// 1-based page number; 0 clears LIMIT and OFFSET
    pub fn page(mut self, page: u64) -> Self {
        self.pagination = self.pagination.with_page(page);
        self
    }

    /// Apply a LIMIT only when none is set yet
    pub fn limit_if_unset(self, limit: u64) -> Self {
        if self.pagination.limit.is_some() {
            self
        } else {
            self.limit(limit)
        }
    }

    pub fn union(mut self, other: SelectStatement) -> Self {
        self.unions.push((UnionType::Distinct, other));
        self
    }

    pub fn union_all(mut self, other: SelectStatement) -> Self {
        self.unions.push((UnionType::All, other));
        self
    }

    pub fn table(&self) -> Option<&str> {
        self.from.as_ref().map(|(table, _)| table.as_str())
    }

    pub fn fields(&self) -> &[SelectField] {
        &self.fields
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn to_sql(&self) -> Result<(String, Vec<PostgresValue>), BuildError> {
        let mut sink = ParamSink::new();
        let sql = self.render(&mut sink)?;

        #[cfg(feature = "debug-logging")]
        tracing::trace!(sql = %sql, params = sink.len(), "rendered SELECT");

        Ok((sql, sink.into_values()))
    }

    /// `SELECT COUNT(*) AS total ...` counting the rows this statement returns
    pub fn count_sql(&self) -> Result<(String, Vec<PostgresValue>), BuildError> {
        self.aggregate_sql(SelectField::count_all().with_alias("total"))
    }

    /// Evaluate a single aggregate over the rows this statement returns.
    ///
    /// Plain statements have their select list replaced; statements with
    /// DISTINCT, GROUP BY, UNION or a LIMIT/OFFSET are wrapped in a subquery.
    pub fn aggregate_sql(&self, aggregate: SelectField) -> Result<(String, Vec<PostgresValue>), BuildError> {
        let mut inner = self.clone();
        // ORDER BY only matters when it picks which rows LIMIT/OFFSET keep
        if self.pagination.is_empty() {
            inner.order_by.clear();
        }

        let mut sink = ParamSink::new();
        let sql = if self.is_plain() {
            inner.fields = vec![aggregate];
            inner.render(&mut sink)?
        } else {
            let select = SqlGenerator::build_select_clause(&[aggregate])?;
            format!(
                "SELECT {} FROM ({}) AS aggregated",
                select,
                inner.render(&mut sink)?
            )
        };

        Ok((sql, sink.into_values()))
    }

    fn is_plain(&self) -> bool {
        !self.distinct
            && self.group_by.is_none()
            && self.unions.is_empty()
            && self.pagination.is_empty()
    }

    fn render(&self, sink: &mut ParamSink) -> Result<String, BuildError> {
        let core = self.render_core(sink)?;
        let order = SqlGenerator::build_order_clause(&self.order_by)?;
        let pagination = self.pagination.to_sql()?;

        if self.unions.is_empty() {
            return Ok(SqlGenerator::assemble(&[&core, &order, &pagination]));
        }

        let mut compound = format!("({})", core);
        for (kind, member) in &self.unions {
            let member_sql = member.render(sink)?;
            compound.push_str(&format!(" {} ({})", kind.to_sql(), member_sql));
        }

        Ok(SqlGenerator::assemble(&[&compound, &order, &pagination]))
    }

    fn render_core(&self, sink: &mut ParamSink) -> Result<String, BuildError> {
        let (table, alias) = self.from.as_ref().ok_or(BuildError::MissingTable)?;

        let mut from = SqlGenerator::table(table)?;
        if let Some(alias) = alias {
            from = format!("{} AS {}", from, ValidatedFieldName::new(alias)?);
        }

        let select = if self.distinct {
            "SELECT DISTINCT"
        } else {
            "SELECT"
        };
        let fields = SqlGenerator::build_select_clause(&self.fields)?;
        let joins = SqlGenerator::build_join_clause(&self.joins)?;
        let where_clause = SqlGenerator::build_where_clause(&self.conditions, sink)?;
        let (group_by, having) = match &self.group_by {
            Some(group) => group.to_sql(sink)?,
            None => (String::new(), String::new()),
        };

        Ok(SqlGenerator::assemble(&[
            select,
            &fields,
            "FROM",
            &from,
            &joins,
            &where_clause,
            &group_by,
            &having,
        ]))
    }
}

impl Conditional for SelectStatement {
    fn conditions_mut(&mut self) -> &mut WhereClause {
        &mut self.conditions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::filter::QueryOperator;
    use crate::query_builder::join::JoinType;
    use serde_json::json;

    #[test]
    fn test_select_requires_table() {
        let result = SelectStatement::new().cols(["id"]).where_eq("id", 1).to_sql();
        assert_eq!(result.unwrap_err(), BuildError::MissingTable);
    }

    #[test]
    fn test_select_defaults_to_star() {
        let (sql, values) = SelectStatement::new().from("users").to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(values.is_empty());
    }

    #[test]
    fn test_select_full_clause_order() {
        let (sql, values) = SelectStatement::new()
            .distinct()
            .cols(["u.id", "u.name AS author", "COUNT(p.id) AS posts"])
            .from_as("users", "u")
            .join(JoinClause::new_on(JoinType::Left, "posts", "u.id", "p.user_id").with_alias("p"))
            .and_where("u.active", QueryOperator::Eq, true)
            .group_by(["u.id", "u.name"])
            .having(QueryFilter::gt("COUNT(p.id)", json!(3)))
            .order_by("u.name", SortOrder::Asc)
            .limit(20)
            .offset(40)
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT DISTINCT u.id, u.name AS author, COUNT(p.id) AS posts FROM users AS u \
             LEFT JOIN posts AS p ON u.id = p.user_id WHERE u.active = $1 \
             GROUP BY u.id, u.name HAVING COUNT(p.id) > $2 ORDER BY u.name ASC LIMIT 20 OFFSET 40"
        );
        assert_eq!(values, vec![PostgresValue::Boolean(true), PostgresValue::Integer(3)]);
    }

    #[test]
    fn test_where_chain_is_left_to_right() {
        let (sql, _) = SelectStatement::new()
            .from("items")
            .where_eq("a", 1)
            .or_where("b", QueryOperator::Gt, 2)
            .and_where("c", QueryOperator::Lte, 3)
            .to_sql()
            .unwrap();

        assert_eq!(sql, "SELECT * FROM items WHERE a = $1 OR b > $2 AND c <= $3");
    }

    #[test]
    fn test_grouped_or_keeps_precedence() {
        let (sql, values) = SelectStatement::new()
            .from("items")
            .where_eq("owner_id", 9)
            .filter(QueryFilter::or(vec![
                QueryFilter::eq("state", json!("open")),
                QueryFilter::eq("state", json!("held")),
            ]))
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT * FROM items WHERE owner_id = $1 AND (state = $2 OR state = $3)"
        );
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_page_sets_limit_and_offset() {
        let (sql, _) = SelectStatement::new()
            .from("posts")
            .set_paging(15)
            .page(3)
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM posts LIMIT 15 OFFSET 30");
    }

    #[test]
    fn test_page_offset_overflow_is_a_build_error() {
        let result = SelectStatement::new()
            .from("posts")
            .set_paging(1000)
            .page(u64::MAX / 10)
            .to_sql();
        assert!(matches!(result, Err(BuildError::InvalidValue { .. })));

        let count = SelectStatement::new().from("posts").limit(u64::MAX).count_sql();
        assert!(matches!(count, Err(BuildError::InvalidValue { .. })));
    }

    #[test]
    fn test_union_numbers_across_members() {
        let archived = SelectStatement::new()
            .cols(["id", "title"])
            .from("archived_posts")
            .where_eq("author_id", 5);

        let (sql, values) = SelectStatement::new()
            .cols(["id", "title"])
            .from("posts")
            .where_eq("author_id", 5)
            .union_all(archived)
            .order_by("title", SortOrder::Desc)
            .limit(10)
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "(SELECT id, title FROM posts WHERE author_id = $1) UNION ALL \
             (SELECT id, title FROM archived_posts WHERE author_id = $2) ORDER BY title DESC LIMIT 10"
        );
        assert_eq!(values, vec![PostgresValue::Integer(5), PostgresValue::Integer(5)]);
    }

    #[test]
    fn test_count_plain_statement() {
        let (sql, values) = SelectStatement::new()
            .cols(["id", "name"])
            .from("users")
            .where_eq("active", true)
            .order_by("name", SortOrder::Asc)
            .count_sql()
            .unwrap();

        assert_eq!(sql, "SELECT COUNT(*) AS total FROM users WHERE active = $1");
        assert_eq!(values, vec![PostgresValue::Boolean(true)]);
    }

    #[test]
    fn test_count_wraps_limited_statement() {
        let (sql, _) = SelectStatement::new()
            .from("users")
            .order_by("id", SortOrder::Asc)
            .limit(5)
            .count_sql()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT COUNT(*) AS total FROM (SELECT * FROM users ORDER BY id ASC LIMIT 5) AS aggregated"
        );
    }

    #[test]
    fn test_sum_aggregate() {
        let (sql, _) = SelectStatement::new()
            .from("orders")
            .where_eq("status", "paid")
            .aggregate_sql(SelectField::sum("amount").with_alias("total"))
            .unwrap();

        assert_eq!(sql, "SELECT SUM(amount) AS total FROM orders WHERE status = $1");
    }

    #[test]
    fn test_limit_if_unset() {
        let statement = SelectStatement::new().from("users").limit(3).limit_if_unset(1);
        assert_eq!(statement.pagination().limit, Some(3));

        let statement = SelectStatement::new().from("users").limit_if_unset(1);
        assert_eq!(statement.to_sql().unwrap().0, "SELECT * FROM users LIMIT 1");
    }

    #[test]
    fn test_reset_cols_replaces_fields() {
        let statement = SelectStatement::new()
            .cols(["id"])
            .cols(["name"])
            .reset_cols(["email"]);
        assert_eq!(statement.fields(), &[SelectField::field("email")]);
    }
}
