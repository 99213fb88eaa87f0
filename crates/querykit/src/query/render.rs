//! Statement assembly for [`Query`].

use super::{Action, Query, TableSource};
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::statement::Statement;
use crate::value::Value;

impl Query {
    /// Render the query for its current action.
    ///
    /// Clauses are emitted in a fixed order: columns, tables, SET, joins, WHERE, GROUP BY,
    /// HAVING, ORDER BY (not for COUNT) and LIMIT. A COUNT that cannot be answered with a
    /// flat `count(0)` is wrapped as `SELECT count(0) FROM (<inner>) a`, with any LIMIT
    /// kept inside the wrap. A flat COUNT stops after WHERE.
    ///
    /// Without a dialect, LIMIT renders as `LIMIT offset, limit`. With one, the dialect
    /// applies it, after identifiers have been resolved if the dialect asks for that.
    pub fn build(&self, dialect: Option<&dyn Dialect>) -> QueryResult<Statement> {
        let table = self.table.as_ref().ok_or(QueryError::MissingTable)?;

        let mut stmt = match self.action {
            Action::Select | Action::Count => {
                let mut s = Statement::new("SELECT ");
                s.push_statement(self.columns_clause(table));
                s.push(" FROM ");
                s
            }
            Action::Delete => Statement::new("DELETE FROM "),
            Action::Update => Statement::new("UPDATE "),
        };

        stmt.push_statement(self.tables_clause(table, dialect)?);

        if self.action == Action::Update {
            stmt.push_statement(self.set_clause()?);
        }

        for join in &self.joins {
            stmt.push(" ");
            stmt.push_statement(join.to_statement(dialect)?);
        }

        let filter = self.filter.to_statement();
        if !filter.is_empty() {
            stmt.push(" WHERE ");
            stmt.push_statement(filter);
        }

        if !self.groups.is_empty() {
            stmt.push(" GROUP BY ");
            stmt.push_statement(column_list(&self.groups));
        }

        if let Some(having) = &self.having {
            let having = having.to_statement();
            if !having.is_empty() {
                stmt.push(" HAVING ");
                stmt.push_statement(having);
            }
        }

        if self.action != Action::Count && !self.orders.is_empty() {
            stmt.push(" ORDER BY ");
            stmt.push_statement(self.order_by_clause());
        }

        let complex_count = self.action == Action::Count && self.needs_complex_count();
        let limit = self
            .limit
            .filter(|_| self.action != Action::Count || complex_count);
        if let Some(limit) = limit {
            stmt = match dialect {
                Some(d) => {
                    let stmt = if d.requires_resolved_identifiers() {
                        stmt.resolve_identifiers(d)
                    } else {
                        stmt
                    };
                    d.apply_limit(stmt, self.offset, limit)?
                }
                None => {
                    stmt.push(" LIMIT ");
                    if self.offset > 0 {
                        stmt.push(&format!("{}, ", self.offset));
                    }
                    stmt.push(&limit.to_string());
                    stmt
                }
            };
        }

        if complex_count {
            stmt = stmt.wrap("SELECT count(0) FROM (", ") a");
        }

        Ok(stmt)
    }

    /// Render as SELECT. The builder itself is left untouched.
    pub fn select_statement(&self, dialect: Option<&dyn Dialect>) -> QueryResult<Statement> {
        self.clone().set_action(Action::Select).build(dialect)
    }

    /// Render as COUNT.
    pub fn count_statement(&self, dialect: Option<&dyn Dialect>) -> QueryResult<Statement> {
        self.clone().set_action(Action::Count).build(dialect)
    }

    /// Render as DELETE. Extra FROM-list tables are ignored.
    pub fn delete_statement(&self, dialect: Option<&dyn Dialect>) -> QueryResult<Statement> {
        self.clone().set_action(Action::Delete).build(dialect)
    }

    /// Render as UPDATE setting `values`, in iteration order.
    pub fn update_statement<K, V>(
        &self,
        values: impl IntoIterator<Item = (K, V)>,
        dialect: Option<&dyn Dialect>,
    ) -> QueryResult<Statement>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut query = self.clone().set_action(Action::Update);
        query.update_values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        query.build(dialect)
    }

    /// Whether a COUNT has to wrap the equivalent SELECT.
    pub(crate) fn needs_complex_count(&self) -> bool {
        self.has_aggregates() || self.having.is_some() || self.distinct
    }

    fn has_aggregates(&self) -> bool {
        !self.groups.is_empty() || self.columns.iter().any(|(_, expr)| expr.contains('('))
    }

    fn columns_clause(&self, table: &TableSource) -> Statement {
        if self.action == Action::Count {
            if !self.needs_complex_count() {
                return Statement::new("count(0)");
            }
            if self.having.is_none() {
                if !self.groups.is_empty() {
                    return column_list(&self.groups);
                }
                if !self.distinct {
                    let aggregates: Vec<_> = self
                        .columns
                        .iter()
                        .filter(|(_, expr)| expr.contains('('))
                        .collect();
                    if !aggregates.is_empty() {
                        return aliased_column_list(aggregates);
                    }
                }
            }
        }

        let mut out = Statement::empty();
        if self.distinct {
            out.push("DISTINCT ");
        }
        if !self.columns.is_empty() {
            out.push_statement(aliased_column_list(self.columns.iter()));
        } else if let Some(alias) = &self.alias {
            out.push(alias).push(".*");
        } else {
            match table {
                TableSource::Name(name) if !name.contains(' ') => {
                    out.push_ident(name.as_str()).push(".*");
                }
                _ => {
                    out.push("*");
                }
            }
        }
        out
    }

    fn tables_clause(
        &self,
        table: &TableSource,
        dialect: Option<&dyn Dialect>,
    ) -> QueryResult<Statement> {
        let mut main = source_statement(table, dialect)?;
        if let Some(alias) = &self.alias {
            main.push(" AS ").push(alias);
        }

        if self.action == Action::Delete || self.extra_tables.is_empty() {
            return Ok(main);
        }

        let mut out = main.wrap("(", "");
        for (alias, source) in &self.extra_tables {
            out.push(", ");
            out.push_statement(source_statement(source, dialect)?);
            let aliased = match source {
                TableSource::Name(name) => name != alias,
                TableSource::Query(_) => true,
            };
            if aliased {
                out.push(" AS ").push(alias);
            }
        }
        out.push(")");
        Ok(out)
    }

    fn set_clause(&self) -> QueryResult<Statement> {
        if self.update_values.is_empty() {
            return Err(QueryError::MissingUpdatePayload);
        }
        let mut out = Statement::new(" SET ");
        for (idx, (column, value)) in self.update_values.iter().enumerate() {
            if idx > 0 {
                out.push(", ");
            }
            out.push_ident(column.as_str()).push(" = ").push_bind(value.clone());
        }
        Ok(out)
    }

    /// `col [ASC|DESC]` entries get their column quoted; anything longer is raw SQL.
    fn order_by_clause(&self) -> Statement {
        let mut out = Statement::empty();
        for (idx, order) in self.orders.iter().enumerate() {
            if idx > 0 {
                out.push(", ");
            }
            let parts: Vec<&str> = order.split(' ').collect();
            match parts.as_slice() {
                [column] => {
                    out.push_column(column);
                }
                [column, direction] => {
                    out.push_column(column).push(" ").push(direction);
                }
                _ => {
                    out.push(order);
                }
            }
        }
        out
    }
}

/// A table name without spaces is an identifier; nested queries are parenthesized.
fn source_statement(source: &TableSource, dialect: Option<&dyn Dialect>) -> QueryResult<Statement> {
    match source {
        TableSource::Name(name) if name.contains(' ') => Ok(Statement::new(name.as_str())),
        TableSource::Name(name) => {
            let mut stmt = Statement::empty();
            stmt.push_ident(name.as_str());
            Ok(stmt)
        }
        TableSource::Query(query) => Ok(query.build(dialect)?.wrap("(", ")")),
    }
}

fn column_list(columns: &[String]) -> Statement {
    let mut out = Statement::empty();
    for (idx, column) in columns.iter().enumerate() {
        if idx > 0 {
            out.push(", ");
        }
        out.push_column(column);
    }
    out
}

fn aliased_column_list<'a>(columns: impl IntoIterator<Item = &'a (String, String)>) -> Statement {
    let mut out = Statement::empty();
    for (idx, (alias, expr)) in columns.into_iter().enumerate() {
        if idx > 0 {
            out.push(", ");
        }
        out.push_column(expr);
        if alias != expr {
            out.push(&format!(" AS \"{alias}\""));
        }
    }
    out
}
