//! Database dialects.
//!
//! A [`Dialect`] is consulted only at render time: it quotes identifiers, writes parameter
//! placeholders, and appends (or emulates) LIMIT/OFFSET. Builders never depend on a concrete
//! dialect.

use crate::error::{QueryError, QueryResult};
use crate::ident::Ident;
use crate::statement::Statement;
use crate::value::Value;
use std::fmt;
use std::fmt::Write as _;

/// Rendering rules for one database back-end.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Short name, used in logs.
    fn name(&self) -> &'static str;

    /// Opening and closing identifier delimiters.
    fn identifier_delimiters(&self) -> (char, char);

    /// Quote an identifier path part by part. `*` is left bare. A name that does not parse
    /// as a path is quoted whole as a single part, with the closing delimiter doubled.
    fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.identifier_delimiters();
        let mut out = String::with_capacity(name.len() + 4);
        match Ident::parse(name) {
            Ok(ident) => ident.write_quoted(open, close, &mut out),
            Err(_) => {
                out.push(open);
                for ch in name.chars() {
                    if ch == close {
                        out.push(close);
                    }
                    out.push(ch);
                }
                out.push(close);
            }
        }
        out
    }

    /// Write the placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize, out: &mut String);

    /// Render a value as a SQL literal (debug output only).
    fn quote_literal(&self, value: &Value) -> String {
        quote_literal(value)
    }

    /// Whether [`Dialect::apply_limit`] must receive a statement whose identifiers have
    /// already been resolved with [`Statement::resolve_identifiers`].
    fn requires_resolved_identifiers(&self) -> bool {
        false
    }

    /// Apply LIMIT/OFFSET to a fully assembled statement.
    fn apply_limit(&self, stmt: Statement, offset: u64, limit: u64) -> QueryResult<Statement> {
        let mut stmt = stmt;
        stmt.push(&format!(" LIMIT {limit}"));
        if offset > 0 {
            stmt.push(&format!(" OFFSET {offset}"));
        }
        Ok(stmt)
    }
}

/// PostgreSQL: `"ident"`, `$n` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn identifier_delimiters(&self) -> (char, char) {
        ('"', '"')
    }

    fn placeholder(&self, index: usize, out: &mut String) {
        out.push('$');
        let _ = write!(out, "{index}");
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Bytes(b) => format!("'\\x{}'::bytea", hex(b)),
            other => quote_literal(other),
        }
    }
}

/// MySQL / MariaDB: `` `ident` ``, `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_delimiters(&self) -> (char, char) {
        ('`', '`')
    }

    fn placeholder(&self, _index: usize, out: &mut String) {
        out.push('?');
    }
}

/// SQLite: `"ident"`, `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn identifier_delimiters(&self) -> (char, char) {
        ('"', '"')
    }

    fn placeholder(&self, _index: usize, out: &mut String) {
        out.push('?');
    }
}

/// SQL Server: `[ident]`, `@Pn` placeholders, LIMIT emulated with `TOP` / `ROW_NUMBER()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsSql;

impl MsSql {
    const ROW_NUM: &'static str = "[_row_num]";
}

impl Dialect for MsSql {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn identifier_delimiters(&self) -> (char, char) {
        ('[', ']')
    }

    fn placeholder(&self, index: usize, out: &mut String) {
        let _ = write!(out, "@P{index}");
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::Bytes(b) => format!("0x{}", hex(b)),
            other => quote_literal(other),
        }
    }

    fn requires_resolved_identifiers(&self) -> bool {
        true
    }

    fn apply_limit(&self, stmt: Statement, offset: u64, limit: u64) -> QueryResult<Statement> {
        if stmt.identifiers().next().is_some() {
            return Err(QueryError::UnsupportedLimit(
                "SQL Server limit emulation requires resolved identifiers".to_string(),
            ));
        }
        let Some(body) = stmt.strip_prefix("SELECT ") else {
            return Err(QueryError::UnsupportedLimit(
                "SQL Server limit emulation requires a SELECT statement".to_string(),
            ));
        };
        let distinct = body.strip_prefix("DISTINCT ");

        if offset == 0 {
            let (head, body) = match distinct {
                Some(rest) => ("SELECT DISTINCT TOP (", rest),
                None => ("SELECT TOP (", body),
            };
            let mut out = Statement::new(format!("{head}{limit}) "));
            out.push_statement(body);
            return Ok(out);
        }

        if distinct.is_some() {
            return Err(QueryError::UnsupportedLimit(
                "SQL Server limit emulation does not support DISTINCT with an offset".to_string(),
            ));
        }

        let (body, order) = match body.split_last_keyword(" ORDER BY ") {
            Some((body, order)) => (body, order),
            None => (body, Statement::new("(SELECT NULL)")),
        };
        let end = offset.saturating_add(limit);
        let row_num = Self::ROW_NUM;

        let mut out = Statement::new("SELECT * FROM (SELECT ROW_NUMBER() OVER (ORDER BY ");
        out.push_statement(order);
        out.push(&format!(") AS {row_num}, "));
        out.push_statement(body);
        out.push(&format!(
            ") AS [_paged] WHERE {row_num} > {offset} AND {row_num} <= {end} ORDER BY {row_num}"
        ));
        Ok(out)
    }
}

/// Resolve a driver name (`pgsql`, `mysql`, `sqlite`, `mssql`, ...) to its dialect.
pub fn dialect_for_driver(driver: &str) -> QueryResult<Box<dyn Dialect>> {
    match driver.trim().to_ascii_lowercase().as_str() {
        "pgsql" | "postgres" | "postgresql" => Ok(Box::new(Postgres)),
        "mysql" | "mariadb" => Ok(Box::new(MySql)),
        "sqlite" | "sqlite3" => Ok(Box::new(Sqlite)),
        "mssql" | "sqlsrv" | "dblib" => Ok(Box::new(MsSql)),
        other => Err(QueryError::config(format!("unknown driver: {other}"))),
    }
}

/// Standard SQL literal rendering, shared by the built-in dialects.
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => f.to_string(),
        Value::Float(f) => quote_text(&f.to_string()),
        Value::Text(s) => quote_text(s),
        Value::Bytes(b) => format!("X'{}'", hex(b)),
        Value::Json(j) => quote_text(&j.to_string()),
        Value::Uuid(u) => quote_text(&u.to_string()),
        Value::Timestamp(t) => quote_text(&t.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::Date(d) => quote_text(&d.to_string()),
        Value::List(items) => items.iter().map(quote_literal).collect::<Vec<_>>().join(","),
    }
}

fn quote_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_each_part_with_dialect_delimiters() {
        assert_eq!(Postgres.quote_identifier("public.users"), r#""public"."users""#);
        assert_eq!(MySql.quote_identifier("db.foo.bar_id"), "`db`.`foo`.`bar_id`");
        assert_eq!(MsSql.quote_identifier("t.*"), "[t].*");
    }

    #[test]
    fn quotes_unparseable_names_whole() {
        assert_eq!(Postgres.quote_identifier("my-table"), r#""my-table""#);
        assert_eq!(Sqlite.quote_identifier(r#"we"ird"#), r#""we""ird""#);
        assert_eq!(MySql.quote_identifier("a`b c"), "`a``b c`");
        assert_eq!(MsSql.quote_identifier("a]b"), "[a]]b]");
    }

    #[test]
    fn placeholders() {
        let mut out = String::new();
        Postgres.placeholder(12, &mut out);
        MySql.placeholder(3, &mut out);
        MsSql.placeholder(2, &mut out);
        assert_eq!(out, "$12?@P2");
    }

    #[test]
    fn literals() {
        assert_eq!(quote_literal(&Value::Text("it's".into())), "'it''s'");
        assert_eq!(quote_literal(&Value::Null), "NULL");
        assert_eq!(quote_literal(&Value::Bytes(vec![0xde, 0xad])), "X'dead'");
        assert_eq!(MsSql.quote_literal(&Value::Bool(true)), "1");
        assert_eq!(
            Postgres.quote_literal(&Value::Bytes(vec![1])),
            r"'\x01'::bytea"
        );
    }

    #[test]
    fn default_limit_appends_limit_offset() {
        let stmt = Postgres
            .apply_limit(Statement::new("SELECT * FROM t"), 20, 10)
            .unwrap();
        assert_eq!(stmt.to_sql(), "SELECT * FROM t LIMIT 10 OFFSET 20");

        let stmt = MySql
            .apply_limit(Statement::new("SELECT * FROM t"), 0, 5)
            .unwrap();
        assert_eq!(stmt.to_sql(), "SELECT * FROM t LIMIT 5");
    }

    #[test]
    fn mssql_uses_top_without_offset() {
        let stmt = MsSql
            .apply_limit(Statement::new("SELECT DISTINCT [a] FROM [t]"), 0, 5)
            .unwrap();
        assert_eq!(stmt.to_sql(), "SELECT DISTINCT TOP (5) [a] FROM [t]");
    }

    #[test]
    fn mssql_emulates_offset_with_row_number() {
        let mut stmt = Statement::new("SELECT [t].* FROM [t] WHERE [a] = ");
        stmt.push_bind(1).push(" ORDER BY [b] DESC");

        let out = MsSql.apply_limit(stmt, 20, 10).unwrap();
        assert_eq!(
            out.render(&MsSql),
            "SELECT * FROM (SELECT ROW_NUMBER() OVER (ORDER BY [b] DESC) AS [_row_num], \
             [t].* FROM [t] WHERE [a] = @P1) AS [_paged] \
             WHERE [_row_num] > 20 AND [_row_num] <= 30 ORDER BY [_row_num]"
        );
        assert_eq!(out.params(), &[Value::Int(1)]);
    }

    #[test]
    fn mssql_rejects_unresolved_identifiers() {
        let mut stmt = Statement::new("SELECT * FROM ");
        stmt.push_ident("t");
        assert!(matches!(
            MsSql.apply_limit(stmt, 0, 1),
            Err(QueryError::UnsupportedLimit(_))
        ));
    }

    #[test]
    fn driver_names() {
        assert_eq!(dialect_for_driver("pgsql").unwrap().name(), "postgres");
        assert_eq!(dialect_for_driver("MySQL").unwrap().name(), "mysql");
        assert_eq!(dialect_for_driver("sqlsrv").unwrap().name(), "mssql");
        assert!(dialect_for_driver("oracle").is_err());
    }
}
