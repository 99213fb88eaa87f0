//! The top-level statement assembler.
//!
//! A [`Query`] owns the target table(s), columns, joins, WHERE/HAVING trees, grouping,
//! ordering and paging of one logical statement. It renders to a [`Statement`] as a SELECT,
//! COUNT, DELETE or UPDATE; every terminal entry point works on a clone so the builder can be
//! reused as a base for several statements.
//!
//! # Usage
//!
//! ```ignore
//! use querykit::{Query, dialect::Postgres};
//!
//! let base = Query::table("users u")
//!     .add_and("u.active", true)
//!     .left_join("u.team_id", "teams.id")?
//!     .order_by("u.created_at", Some("desc"))?;
//!
//! let page = base.clone().limit(20).set_offset(40).select_statement(Some(&Postgres))?;
//! let total = base.count_statement(Some(&Postgres))?;
//! ```

mod execute;
mod render;


use crate::condition::{Condition, Conjunction, IntoOperator, Quoting};
use crate::error::{QueryError, QueryResult};
use crate::join::{IntoJoinOn, Join, JoinOn, JoinType, split_alias};
use crate::statement::Statement;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// What a query renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Select,
    Count,
    Delete,
    Update,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Select => "SELECT",
            Action::Count => "COUNT",
            Action::Delete => "DELETE",
            Action::Update => "UPDATE",
        }
    }
}

impl FromStr for Action {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SELECT" => Ok(Action::Select),
            "COUNT" => Ok(Action::Count),
            "DELETE" => Ok(Action::Delete),
            "UPDATE" => Ok(Action::Update),
            _ => Err(QueryError::UnknownAction(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A FROM-list source: a table name (or raw SQL) or a nested query.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Name(String),
    Query(Box<Query>),
}

/// Sort direction accepted by [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(QueryError::InvalidSortDirection(upper)),
        }
    }
}

/// SQL statement builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    action: Action,
    table: Option<TableSource>,
    alias: Option<String>,
    /// Extra FROM-list tables keyed by alias (the table name itself when unaliased).
    extra_tables: Vec<(String, TableSource)>,
    joins: Vec<Join>,
    filter: Condition,
    having: Option<Condition>,
    /// `(alias, expression)` pairs; the alias equals the expression when none was given.
    columns: Vec<(String, String)>,
    groups: Vec<String>,
    orders: Vec<String>,
    limit: Option<u64>,
    offset: u64,
    distinct: bool,
    update_values: Vec<(String, Value)>,
}

/// Mirror `Condition` mutators that take `(column, value)` onto the WHERE tree.
macro_rules! where_delegates {
    ($( $name:ident ),* $(,)?) => {
        $(
            #[doc = concat!("WHERE shortcut for [`Condition::", stringify!($name), "`].")]
            pub fn $name(mut self, column: &str, value: impl Into<Value>) -> Self {
                self.filter.$name(column, value);
                self
            }
        )*
    };
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a query on `name`, which may carry an alias (`"users u"`, `"users AS u"`).
    pub fn table(name: &str) -> Self {
        Self::new().set_table(name)
    }

    // ==================== Tables ====================

    /// Set the target table. `"table alias"` and `"table AS alias"` set the alias as well.
    pub fn set_table(mut self, name: &str) -> Self {
        let (table, alias) = split_alias(name);
        self.table = Some(TableSource::Name(table.to_string()));
        if let Some(alias) = alias {
            self.alias = Some(alias.to_string());
        }
        self
    }

    /// Set the target table with an explicit alias. The name is used as given.
    pub fn set_table_as(mut self, name: &str, alias: &str) -> Self {
        self.table = Some(TableSource::Name(name.to_string()));
        self.alias = non_empty(alias);
        self
    }

    /// Select from a nested query. The alias is required.
    pub fn set_subquery(mut self, query: Query, alias: &str) -> QueryResult<Self> {
        let alias = non_empty(alias)
            .ok_or_else(|| QueryError::MissingAlias("nested table query".to_string()))?;
        self.table = Some(TableSource::Query(Box::new(query)));
        self.alias = Some(alias);
        Ok(self)
    }

    pub fn set_alias(mut self, alias: &str) -> Self {
        self.alias = non_empty(alias);
        self
    }

    /// Add a table to the FROM list (an implicit cross join).
    ///
    /// A table already present under the same alias is replaced.
    pub fn add_table(mut self, name: &str) -> Self {
        let (table, alias) = split_alias(name);
        let key = alias.unwrap_or(table).to_string();
        self.put_extra_table(key, TableSource::Name(table.to_string()));
        self
    }

    /// Add a nested query to the FROM list. The alias is required.
    pub fn add_subquery_table(mut self, query: Query, alias: &str) -> QueryResult<Self> {
        let alias = non_empty(alias)
            .ok_or_else(|| QueryError::MissingAlias("nested table query".to_string()))?;
        self.put_extra_table(alias, TableSource::Query(Box::new(query)));
        Ok(self)
    }

    fn put_extra_table(&mut self, key: String, source: TableSource) {
        match self.extra_tables.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = source,
            None => self.extra_tables.push((key, source)),
        }
    }

    // ==================== Joins ====================

    /// Add a join.
    ///
    /// `table_or_column` and `on` follow [`Join::create`]. Without an ON clause an inner join
    /// adds the table to the FROM list instead, a cross join renders bare, and the outer
    /// flavours join `ON (1 = 1)`.
    pub fn add_join(
        mut self,
        table_or_column: &str,
        on: impl IntoJoinOn,
        join_type: JoinType,
    ) -> QueryResult<Self> {
        let on = on.into_join_on();
        if on.is_none() && join_type == JoinType::Inner {
            return Ok(self.add_table(table_or_column));
        }
        self.joins.push(Join::create(table_or_column, on, join_type)?);
        Ok(self)
    }

    pub fn join(self, table_or_column: &str, on: impl IntoJoinOn) -> QueryResult<Self> {
        self.add_join(table_or_column, on, JoinType::Inner)
    }

    pub fn inner_join(self, table_or_column: &str, on: impl IntoJoinOn) -> QueryResult<Self> {
        self.add_join(table_or_column, on, JoinType::Inner)
    }

    pub fn left_join(self, table_or_column: &str, on: impl IntoJoinOn) -> QueryResult<Self> {
        self.add_join(table_or_column, on, JoinType::Left)
    }

    pub fn right_join(self, table_or_column: &str, on: impl IntoJoinOn) -> QueryResult<Self> {
        self.add_join(table_or_column, on, JoinType::Right)
    }

    pub fn outer_join(self, table_or_column: &str, on: impl IntoJoinOn) -> QueryResult<Self> {
        self.add_join(table_or_column, on, JoinType::Outer)
    }

    pub fn cross_join(self, table: &str) -> QueryResult<Self> {
        self.add_join(table, None::<JoinOn>, JoinType::Cross)
    }

    /// Add a prebuilt join.
    pub fn add_join_spec(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Like [`Query::add_join`], but skip the join when the same table is already joined
    /// under the same alias (or both unaliased).
    pub fn join_once(
        self,
        table_or_column: &str,
        on: impl IntoJoinOn,
        join_type: JoinType,
    ) -> QueryResult<Self> {
        let on = on.into_join_on();
        if on.is_none() && join_type == JoinType::Inner {
            let (table, alias) = split_alias(table_or_column);
            let key = alias.unwrap_or(table);
            let present = self.extra_tables.iter().any(|(k, source)| {
                k == key && matches!(source, TableSource::Name(name) if name == table)
            });
            return Ok(if present {
                self
            } else {
                self.add_table(table_or_column)
            });
        }
        let join = Join::create(table_or_column, on, join_type)?;
        Ok(self.join_spec_once(join))
    }

    pub fn left_join_once(self, table_or_column: &str, on: impl IntoJoinOn) -> QueryResult<Self> {
        self.join_once(table_or_column, on, JoinType::Left)
    }

    pub fn right_join_once(self, table_or_column: &str, on: impl IntoJoinOn) -> QueryResult<Self> {
        self.join_once(table_or_column, on, JoinType::Right)
    }

    pub fn outer_join_once(self, table_or_column: &str, on: impl IntoJoinOn) -> QueryResult<Self> {
        self.join_once(table_or_column, on, JoinType::Outer)
    }

    /// Add a prebuilt join unless one for the same table and alias already exists.
    pub fn join_spec_once(mut self, join: Join) -> Self {
        if !self.joins.iter().any(|existing| existing.same_instance(&join)) {
            self.joins.push(join);
        }
        self
    }

    // ==================== WHERE ====================

    where_delegates!(
        add_and,
        add_or,
        and_not,
        or_not,
        and_like,
        or_like,
        and_not_like,
        or_not_like,
        and_ilike,
        or_ilike,
        and_greater,
        or_greater,
        and_greater_equal,
        or_greater_equal,
        and_less,
        or_less,
        and_less_equal,
        or_less_equal,
        and_begins_with,
        or_begins_with,
        and_ends_with,
        or_ends_with,
        and_contains,
        or_contains,
    );

    /// WHERE shortcut for [`Condition::add_and_op`].
    pub fn add_and_op(
        mut self,
        column: &str,
        value: impl Into<Value>,
        operator: impl IntoOperator,
    ) -> QueryResult<Self> {
        self.filter.add_and_op(column, value, operator)?;
        Ok(self)
    }

    /// WHERE shortcut for [`Condition::add_or_op`].
    pub fn add_or_op(
        mut self,
        column: &str,
        value: impl Into<Value>,
        operator: impl IntoOperator,
    ) -> QueryResult<Self> {
        self.filter.add_or_op(column, value, operator)?;
        Ok(self)
    }

    /// WHERE shortcut for [`Condition::add`].
    pub fn add(
        mut self,
        conjunction: Conjunction,
        column: &str,
        value: impl Into<Value>,
        operator: impl IntoOperator,
        quoting: Quoting,
    ) -> QueryResult<Self> {
        self.filter.add(conjunction, column, value, operator, quoting)?;
        Ok(self)
    }

    pub fn and_null(mut self, column: &str) -> Self {
        self.filter.and_null(column);
        self
    }

    pub fn or_null(mut self, column: &str) -> Self {
        self.filter.or_null(column);
        self
    }

    pub fn and_not_null(mut self, column: &str) -> Self {
        self.filter.and_not_null(column);
        self
    }

    pub fn or_not_null(mut self, column: &str) -> Self {
        self.filter.or_not_null(column);
        self
    }

    pub fn and_between(
        mut self,
        column: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.filter.and_between(column, from, to);
        self
    }

    pub fn or_between(
        mut self,
        column: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.filter.or_between(column, from, to);
        self
    }

    pub fn and_in<T: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.filter.and_in(column, values);
        self
    }

    pub fn or_in<T: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.filter.or_in(column, values);
        self
    }

    pub fn and_not_in<T: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.filter.and_not_in(column, values);
        self
    }

    pub fn or_not_in<T: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.filter.or_not_in(column, values);
        self
    }

    /// AND a copy of `group` into the WHERE tree. `None` is a no-op.
    pub fn and_group<'a>(mut self, group: impl Into<Option<&'a Condition>>) -> Self {
        self.filter.and_group(group);
        self
    }

    /// OR a copy of `group` into the WHERE tree. `None` is a no-op.
    pub fn or_group<'a>(mut self, group: impl Into<Option<&'a Condition>>) -> Self {
        self.filter.or_group(group);
        self
    }

    pub fn and_raw(mut self, sql: impl Into<Statement>) -> Self {
        self.filter.and_raw(sql);
        self
    }

    pub fn or_raw(mut self, sql: impl Into<Statement>) -> Self {
        self.filter.or_raw(sql);
        self
    }

    pub fn and_opt<V: Into<Value>>(mut self, column: &str, value: Option<V>) -> Self {
        self.filter.and_opt(column, value);
        self
    }

    pub fn or_opt<V: Into<Value>>(mut self, column: &str, value: Option<V>) -> Self {
        self.filter.or_opt(column, value);
        self
    }

    /// Replace the WHERE tree.
    pub fn set_where(mut self, condition: Condition) -> Self {
        self.filter = condition;
        self
    }

    pub fn where_mut(&mut self) -> &mut Condition {
        &mut self.filter
    }

    pub fn set_having(mut self, condition: Condition) -> Self {
        self.having = Some(condition);
        self
    }

    // ==================== Grouping & ordering ====================

    pub fn group_by(mut self, column: &str) -> Self {
        self.groups.push(column.to_string());
        self
    }

    /// Add an ORDER BY entry. The direction, if given, must be `ASC` or `DESC` (any case).
    pub fn order_by(mut self, column: &str, direction: Option<&str>) -> QueryResult<Self> {
        let entry = match direction.map(str::trim).filter(|d| !d.is_empty()) {
            Some(dir) => {
                let dir: SortDirection = dir.parse()?;
                format!("{} {}", column.trim(), dir.as_str())
            }
            None => column.trim().to_string(),
        };
        self.orders.push(entry);
        Ok(self)
    }

    pub fn remove_order_bys(mut self) -> Self {
        self.orders.clear();
        self
    }

    // ==================== Paging ====================

    pub fn set_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(self, limit: u64) -> Self {
        self.set_limit(Some(limit))
    }

    pub fn set_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    // ==================== Columns ====================

    pub fn set_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Select `expr`. Adding the same expression twice keeps one entry.
    pub fn add_column(mut self, expr: &str) -> Self {
        self.put_column(expr.to_string(), expr.to_string());
        self
    }

    /// Select `expr AS "alias"`. An alias already in use is re-pointed at `expr`.
    pub fn add_column_as(mut self, expr: &str, alias: &str) -> Self {
        let alias = if alias.is_empty() { expr } else { alias };
        self.put_column(alias.to_string(), expr.to_string());
        self
    }

    /// Replace the column list.
    pub fn set_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns.clear();
        for column in columns {
            let column = column.as_ref();
            self.put_column(column.to_string(), column.to_string());
        }
        self
    }

    fn put_column(&mut self, alias: String, expr: String) {
        match self.columns.iter_mut().find(|(a, _)| *a == alias) {
            Some(entry) => entry.1 = expr,
            None => self.columns.push((alias, expr)),
        }
    }

    pub fn set_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    // ==================== Accessors ====================

    pub fn action(&self) -> Action {
        self.action
    }

    /// The target table name, if one is set and it is not a nested query.
    pub fn table_name(&self) -> Option<&str> {
        match &self.table {
            Some(TableSource::Name(name)) => Some(name),
            _ => None,
        }
    }

    pub fn table_source(&self) -> Option<&TableSource> {
        self.table.as_ref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn extra_tables(&self) -> &[(String, TableSource)] {
        &self.extra_tables
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn where_condition(&self) -> &Condition {
        &self.filter
    }

    pub fn having(&self) -> Option<&Condition> {
        self.having.as_ref()
    }

    /// Selected columns as `(alias, expression)` pairs.
    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn orders(&self) -> &[String] {
        &self.orders
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn get_offset(&self) -> u64 {
        self.offset
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut query = self.clone();
        if query.table.is_none() {
            query.table = Some(TableSource::Name("{UNSPECIFIED-TABLE}".to_string()));
        }
        match query.build(None) {
            Ok(stmt) => f.write_str(&stmt.interpolate(None)),
            Err(e) => write!(f, "<invalid query: {e}>"),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
