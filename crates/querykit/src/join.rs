//! JOIN clauses.
//!
//! Besides the explicit `table` + `ON` form, [`Join::create`] understands the qualified-column
//! shorthand: `create("foo.bar_id", "foo2.bar_id")` joins `foo2` on
//! `foo.bar_id = foo2.bar_id`, with the target table inferred from the right-hand column.

use crate::condition::Condition;
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::ident::{Ident, is_qualified_column};
use crate::query::Query;
use crate::statement::Statement;
use std::fmt;
use std::str::FromStr;

/// JOIN flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
    Cross,
}

impl JoinType {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Outer => "OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

impl FromStr for JoinType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JOIN" | "INNER JOIN" | "INNER" => Ok(JoinType::Inner),
            "LEFT JOIN" | "LEFT" => Ok(JoinType::Left),
            "RIGHT JOIN" | "RIGHT" => Ok(JoinType::Right),
            "OUTER JOIN" | "OUTER" => Ok(JoinType::Outer),
            "CROSS JOIN" | "CROSS" => Ok(JoinType::Cross),
            _ => Err(QueryError::InvalidJoinType(s.to_string())),
        }
    }
}

/// What is being joined.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinTarget {
    Table(String),
    Query(Box<Query>),
}

/// The ON clause of a join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// Raw SQL, rendered inside `ON (...)` without escaping.
    Raw(String),
    Condition(Condition),
    /// `left = right`, both sides quoted as identifiers.
    Columns { left: String, right: String },
}

impl From<&str> for JoinOn {
    fn from(s: &str) -> Self {
        JoinOn::Raw(s.to_string())
    }
}

impl From<String> for JoinOn {
    fn from(s: String) -> Self {
        JoinOn::Raw(s)
    }
}

impl From<Condition> for JoinOn {
    fn from(c: Condition) -> Self {
        JoinOn::Condition(c)
    }
}

impl From<&Condition> for JoinOn {
    fn from(c: &Condition) -> Self {
        JoinOn::Condition(c.clone())
    }
}

/// Anything accepted as an optional ON clause: raw SQL, a [`Condition`], a [`JoinOn`], or
/// `None`.
pub trait IntoJoinOn {
    fn into_join_on(self) -> Option<JoinOn>;
}

impl IntoJoinOn for JoinOn {
    fn into_join_on(self) -> Option<JoinOn> {
        Some(self)
    }
}

impl IntoJoinOn for Option<JoinOn> {
    fn into_join_on(self) -> Option<JoinOn> {
        self
    }
}

impl IntoJoinOn for &str {
    fn into_join_on(self) -> Option<JoinOn> {
        Some(self.into())
    }
}

impl IntoJoinOn for String {
    fn into_join_on(self) -> Option<JoinOn> {
        Some(self.into())
    }
}

impl IntoJoinOn for Condition {
    fn into_join_on(self) -> Option<JoinOn> {
        Some(self.into())
    }
}

impl IntoJoinOn for &Condition {
    fn into_join_on(self) -> Option<JoinOn> {
        Some(self.into())
    }
}

/// One JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    target: JoinTarget,
    alias: Option<String>,
    on: Option<JoinOn>,
    join_type: JoinType,
}

impl Join {
    /// Build a join from a table (or qualified column) and an optional ON clause.
    ///
    /// - `left` and a raw `on` that are both qualified columns form the shorthand: the target
    ///   is the table portion of `on`, and the clause is `left = on`.
    /// - otherwise `left` is the table, optionally written `"table alias"` or
    ///   `"table AS alias"`, and `on` is used as given.
    pub fn create(
        left: &str,
        on: impl IntoJoinOn,
        join_type: JoinType,
    ) -> QueryResult<Join> {
        let on = on.into_join_on();
        if let Some(JoinOn::Raw(right)) = &on {
            if is_qualified_column(left) && is_qualified_column(right) {
                return Self::from_columns(left, right, join_type);
            }
        }

        let (table, alias) = split_alias(left);
        Ok(Join {
            target: JoinTarget::Table(table.to_string()),
            alias: alias.map(str::to_string),
            on,
            join_type,
        })
    }

    /// Join a nested query. The alias is required.
    pub fn subquery(
        query: Query,
        alias: &str,
        on: impl IntoJoinOn,
        join_type: JoinType,
    ) -> QueryResult<Join> {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(QueryError::MissingAlias("joined query".to_string()));
        }
        Ok(Join {
            target: JoinTarget::Query(Box::new(query)),
            alias: Some(alias.to_string()),
            on: on.into_join_on(),
            join_type,
        })
    }

    fn from_columns(left: &str, right: &str, join_type: JoinType) -> QueryResult<Join> {
        let shorthand_error = || QueryError::InvalidJoinShorthand(format!("{left} = {right}"));

        Ident::parse(left).map_err(|_| shorthand_error())?;
        let table = Ident::parse(right)
            .map_err(|_| shorthand_error())?
            .parent()
            .ok_or_else(shorthand_error)?;

        Ok(Join {
            target: JoinTarget::Table(table.to_sql()),
            alias: None,
            on: Some(JoinOn::Columns {
                left: left.to_string(),
                right: right.to_string(),
            }),
            join_type,
        })
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn target(&self) -> &JoinTarget {
        &self.target
    }

    /// The joined table name, if the target is not a nested query.
    pub fn table(&self) -> Option<&str> {
        match &self.target {
            JoinTarget::Table(t) => Some(t),
            JoinTarget::Query(_) => None,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn on(&self) -> Option<&JoinOn> {
        self.on.as_ref()
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// Whether `other` addresses the same table instance (same target, same alias).
    pub(crate) fn same_instance(&self, other: &Join) -> bool {
        self.target == other.target && self.alias == other.alias
    }

    /// Render `<TYPE> <table> [AS alias] ON (<on>)`.
    pub fn to_statement(&self, dialect: Option<&dyn Dialect>) -> QueryResult<Statement> {
        let mut stmt = Statement::new(self.join_type.keyword());
        stmt.push(" ");

        match &self.target {
            JoinTarget::Table(table) => {
                stmt.push_column(table);
            }
            JoinTarget::Query(query) => {
                stmt.push_statement(query.build(dialect)?.wrap("(", ")"));
            }
        }
        if let Some(alias) = &self.alias {
            stmt.push(" AS ").push(alias);
        }

        if self.join_type == JoinType::Cross && self.on.is_none() {
            return Ok(stmt);
        }

        stmt.push(" ON (");
        match &self.on {
            None => {
                stmt.push("1 = 1");
            }
            Some(JoinOn::Raw(raw)) => {
                stmt.push(raw);
            }
            Some(JoinOn::Condition(condition)) => {
                stmt.push_statement(condition.to_statement());
            }
            Some(JoinOn::Columns { left, right }) => {
                stmt.push_ident(left.as_str()).push(" = ").push_ident(right.as_str());
            }
        }
        stmt.push(")");
        Ok(stmt)
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_statement(None) {
            Ok(stmt) => f.write_str(&stmt.interpolate(None)),
            Err(e) => write!(f, "<invalid join: {e}>"),
        }
    }
}

/// Split `"table alias"` / `"table AS alias"` on the last space.
pub(crate) fn split_alias(input: &str) -> (&str, Option<&str>) {
    let input = input.trim();
    let Some(space) = input.rfind(' ') else {
        return (input, None);
    };

    let alias = input[space + 1..].trim();
    let table_end = match input.to_ascii_uppercase().rfind(" AS ") {
        Some(as_pos) if as_pos + 3 == space => as_pos,
        _ => space,
    };
    (input[..table_end].trim(), Some(alias))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MySql;

    #[test]
    fn splits_table_aliases() {
        assert_eq!(split_alias("users"), ("users", None));
        assert_eq!(split_alias("users u"), ("users", Some("u")));
        assert_eq!(split_alias("users AS u"), ("users", Some("u")));
        assert_eq!(split_alias("users as u"), ("users", Some("u")));
    }

    #[test]
    fn shorthand_infers_target_table() {
        let join = Join::create("db.foo.bar_id", "foo2.bar_id", JoinType::Inner).unwrap();
        assert_eq!(join.table(), Some("foo2"));
        assert_eq!(
            join.on(),
            Some(&JoinOn::Columns {
                left: "db.foo.bar_id".into(),
                right: "foo2.bar_id".into()
            })
        );
    }

    #[test]
    fn shorthand_rejects_unparseable_columns() {
        let err = Join::create("a.b=c.d", "foo2.bar_id", JoinType::Inner).unwrap_err();
        assert!(matches!(err, QueryError::InvalidJoinShorthand(_)));

        let err = Join::create("foo.id", r#""foo2.bar_id""#, JoinType::Inner).unwrap_err();
        assert!(matches!(err, QueryError::InvalidJoinShorthand(_)));
    }

    #[test]
    fn cross_join_has_no_on_clause() {
        let join = Join::create("tags", None::<JoinOn>, JoinType::Cross).unwrap();
        assert_eq!(
            join.to_statement(Some(&MySql)).unwrap().render(&MySql),
            "CROSS JOIN `tags`"
        );
    }

    #[test]
    fn missing_on_defaults_to_true() {
        let join = Join::create("tags t", None::<JoinOn>, JoinType::Left).unwrap();
        assert_eq!(join.to_string(), "LEFT JOIN tags AS t ON (1 = 1)");
    }

    #[test]
    fn subquery_requires_alias() {
        let err = Join::subquery(Query::table("t"), " ", None::<JoinOn>, JoinType::Inner).unwrap_err();
        assert!(matches!(err, QueryError::MissingAlias(_)));
    }

    #[test]
    fn join_type_tokens() {
        assert_eq!("left join".parse::<JoinType>().unwrap(), JoinType::Left);
        assert_eq!("INNER JOIN".parse::<JoinType>().unwrap(), JoinType::Inner);
        assert!(matches!(
            "SIDEWAYS JOIN".parse::<JoinType>(),
            Err(QueryError::InvalidJoinType(t)) if t == "SIDEWAYS JOIN"
        ));
    }
}
