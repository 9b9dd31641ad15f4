//! SELECT builder with async terminals

use serde_json::Value;
use sql_builder::query_builder::{
    Conditional, JoinClause, QueryFilter, SelectField, SelectStatement, SortOrder,
    WhereClause,
};
use sqlx::postgres::PgRow;
use sqlx::{Decode, FromRow, Postgres, Row, Type};
use type_mapping::PostgresValue;

use crate::errors::FluentSqlError;
use crate::executor::QueryExecutor;
use crate::row::{decode_column, decode_row, decode_row_with, value_as_f64, FetchMode, Record};

/// Fluent SELECT bound to a pool or transaction
///
/// ```rust,no_run
/// # use fluentsql::prelude::*;
/// # async fn demo(db: &FluentSql) -> Result<(), FluentSqlError> {
/// let adults = db
///     .select(["id", "name"])
///     .from("users")
///     .where_op("age", ">=", 18)
///     .order_by("name")
///     .limit(20)
///     .get_all()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SelectQuery<'c> {
    executor: QueryExecutor<'c>,
    statement: SelectStatement,
}

impl<'c> SelectQuery<'c> {
    pub(crate) fn new<I, S>(executor: QueryExecutor<'c>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            executor,
            statement: SelectStatement::new().cols(columns),
        }
    }

    fn map(mut self, f: impl FnOnce(SelectStatement) -> SelectStatement) -> Self {
        self.statement = f(self.statement);
        self
    }

    pub fn from(self, table: &str) -> Self {
        let table = self.executor.table(table);
        self.map(|s| s.from(table))
    }

    pub fn from_as(self, table: &str, alias: &str) -> Self {
        let table = self.executor.table(table);
        self.map(|s| s.from_as(table, alias))
    }

    /// Append columns to the select list
    pub fn cols<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.map(|s| s.cols(columns))
    }

    /// Replace the select list
    pub fn reset_cols<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.map(|s| s.reset_cols(columns))
    }

    pub fn field(self, field: SelectField) -> Self {
        self.map(|s| s.field(field))
    }

    pub fn distinct(self) -> Self {
        self.map(SelectStatement::distinct)
    }

    /// Add a join; the joined table gets the table prefix
    pub fn join(self, mut join: JoinClause) -> Self {
        join.table = self.executor.table(&join.table);
        self.map(|s| s.join(join))
    }

    pub fn inner_join(self, table: &str, left_field: &str, right_field: &str) -> Self {
        self.join(JoinClause::inner(table, left_field, right_field))
    }

    pub fn left_join(self, table: &str, left_field: &str, right_field: &str) -> Self {
        self.join(JoinClause::left(table, left_field, right_field))
    }

    pub fn right_join(self, table: &str, left_field: &str, right_field: &str) -> Self {
        self.join(JoinClause::right(table, left_field, right_field))
    }

    pub fn group_by<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map(|s| s.group_by(fields))
    }

    pub fn having(self, condition: QueryFilter) -> Self {
        self.map(|s| s.having(condition))
    }

    /// Order by a column; a trailing `ASC` or `DESC` sets the direction
    /// (`"created_at DESC"`)
    pub fn order_by(self, field: &str) -> Self {
        let (field, order) = SortOrder::split(field);
        self.map(|s| s.order_by(field, order))
    }

    pub fn order_by_desc(self, field: &str) -> Self {
        self.map(|s| s.order_by(field, SortOrder::Desc))
    }

    pub fn limit(self, limit: u64) -> Self {
        self.map(|s| s.limit(limit))
    }

    pub fn offset(self, offset: u64) -> Self {
        self.map(|s| s.offset(offset))
    }

    /// Rows per page used by `page`
    pub fn set_paging(self, paging: u64) -> Self {
        self.map(|s| s.set_paging(paging))
    }

    /// 1-based page; 0 removes LIMIT and OFFSET
    pub fn page(self, page: u64) -> Self {
        self.map(|s| s.page(page))
    }

    pub fn union(self, other: impl Into<SelectStatement>) -> Self {
        let other = other.into();
        self.map(|s| s.union(other))
    }

    pub fn union_all(self, other: impl Into<SelectStatement>) -> Self {
        let other = other.into();
        self.map(|s| s.union_all(other))
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    /// Rendered SQL and its parameters, without executing
    pub fn to_sql(&self) -> Result<(String, Vec<PostgresValue>), FluentSqlError> {
        Ok(self.statement.to_sql()?)
    }

    async fn fetch_rows(self) -> Result<Vec<PgRow>, FluentSqlError> {
        let (sql, params) = self.statement.to_sql()?;
        self.executor.fetch_all(&sql, params).await
    }

    async fn fetch_first(self) -> Result<Option<PgRow>, FluentSqlError> {
        let (sql, params) = self.statement.limit_if_unset(1).to_sql()?;
        self.executor.fetch_optional(&sql, params).await
    }

    /// All rows as JSON records
    pub async fn get_all(self) -> Result<Vec<Record>, FluentSqlError> {
        self.fetch_rows().await?.iter().map(decode_row).collect()
    }

    /// All rows mapped through `FromRow`
    pub async fn get_all_as<T>(self) -> Result<Vec<T>, FluentSqlError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let rows = self.fetch_rows().await?;
        Ok(rows.iter().map(T::from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// All rows in the given shape
    pub async fn get_all_with(self, mode: FetchMode) -> Result<Vec<Value>, FluentSqlError> {
        self.fetch_rows()
            .await?
            .iter()
            .map(|row| decode_row_with(row, mode))
            .collect()
    }

    /// First row, or `None`. Adds `LIMIT 1` unless a limit is already set.
    pub async fn get_one(self) -> Result<Option<Record>, FluentSqlError> {
        self.fetch_first().await?.as_ref().map(decode_row).transpose()
    }

    pub async fn get_one_as<T>(self) -> Result<Option<T>, FluentSqlError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let row = self.fetch_first().await?;
        Ok(row.as_ref().map(T::from_row).transpose()?)
    }

    pub async fn exists(self) -> Result<bool, FluentSqlError> {
        Ok(self.fetch_first().await?.is_some())
    }

    /// A single value from the first row: the named column, or the first
    /// selected column when `column` is `None`. NULL and "no row" are `None`.
    pub async fn get_value<T>(self, column: Option<&str>) -> Result<Option<T>, FluentSqlError>
    where
        T: for<'r> Decode<'r, Postgres> + Type<Postgres> + Send + Unpin,
    {
        let Some(row) = self.fetch_first().await? else {
            return Ok(None);
        };
        read_value(&row, column)
    }

    /// Number of rows this query would return
    pub async fn get_count(self) -> Result<i64, FluentSqlError> {
        let (sql, params) = self.statement.count_sql()?;
        match self.executor.fetch_optional(&sql, params).await? {
            Some(row) => Ok(row.try_get::<i64, _>(0)?),
            None => Ok(0),
        }
    }

    /// `SUM(field)` over the matching rows; 0 when there are none
    pub async fn get_sum(self, field: &str) -> Result<f64, FluentSqlError> {
        let aggregate = SelectField::sum(field).with_alias("total");
        let (sql, params) = self.statement.aggregate_sql(aggregate)?;
        match self.executor.fetch_optional(&sql, params).await? {
            Some(row) => value_as_f64(field, &decode_column(&row, 0)?),
            None => Ok(0.0),
        }
    }
}

pub(crate) fn read_value<T>(row: &PgRow, column: Option<&str>) -> Result<Option<T>, FluentSqlError>
where
    T: for<'r> Decode<'r, Postgres> + Type<Postgres>,
{
    let value = match column {
        Some(name) => row.try_get::<Option<T>, _>(name).map_err(|e| match e {
            sqlx::Error::ColumnNotFound(name) => FluentSqlError::ColumnNotFound(name),
            other => FluentSqlError::decode(name, other),
        })?,
        None => row
            .try_get::<Option<T>, _>(0)
            .map_err(|e| FluentSqlError::decode("0", e))?,
    };
    Ok(value)
}

impl Conditional for SelectQuery<'_> {
    fn conditions_mut(&mut self) -> &mut WhereClause {
        self.statement.conditions_mut()
    }
}

impl From<SelectQuery<'_>> for SelectStatement {
    fn from(query: SelectQuery<'_>) -> Self {
        query.statement
    }
}
