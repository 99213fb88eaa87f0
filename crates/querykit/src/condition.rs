//! Boolean condition trees for WHERE / HAVING / ON clauses.
//!
//! A [`Condition`] is an ordered list of nodes joined by AND / OR. Each node is either a
//! typed [`Predicate`] or a nested group. Nested groups are copied in when they are added, so
//! mutating the original afterwards does not affect the parent.
//!
//! # Example
//! ```ignore
//! use querykit::Condition;
//!
//! let mut c = Condition::new();
//! c.add_and("status", "active")
//!     .and_greater("age", 18)
//!     .or_null("deleted_at");
//!
//! assert_eq!(c.to_string(), "status = 'active' AND age > 18 OR deleted_at IS NULL");
//! ```

use crate::error::{QueryError, QueryResult};
use crate::statement::Statement;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// How a node is joined to the node before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    fn separator(self) -> &'static str {
        match self {
            Conjunction::And => " AND ",
            Conjunction::Or => " OR ",
        }
    }
}

/// The fixed operator catalog.
///
/// Operators are never interpolated from caller text; string tokens are parsed into this enum
/// and anything else is rejected with [`QueryError::InvalidOperator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `!=`
    AltNotEqual,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterEqual,
    /// `<=`
    LessEqual,
    Like,
    NotLike,
    /// Case-insensitive LIKE (PostgreSQL)
    ILike,
    NotILike,
    /// `LIKE 'value%'`
    BeginsWith,
    /// `LIKE '%value'`
    EndsWith,
    /// `LIKE '%value%'`
    Contains,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Between,
    /// `&`
    BinaryAnd,
    /// `|`
    BinaryOr,
}

impl Operator {
    pub const ALL: [Operator; 21] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::AltNotEqual,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterEqual,
        Operator::LessEqual,
        Operator::Like,
        Operator::NotLike,
        Operator::ILike,
        Operator::NotILike,
        Operator::BeginsWith,
        Operator::EndsWith,
        Operator::Contains,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::Between,
        Operator::BinaryAnd,
        Operator::BinaryOr,
    ];

    /// The catalog token for this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::AltNotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterEqual => ">=",
            Operator::LessEqual => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotILike => "NOT ILIKE",
            Operator::BeginsWith => "BEGINS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::Contains => "CONTAINS",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Between => "BETWEEN",
            Operator::BinaryAnd => "&",
            Operator::BinaryOr => "|",
        }
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let normalized = token.trim().to_ascii_uppercase();
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| QueryError::InvalidOperator(token.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert an input into an [`Operator`].
///
/// Implemented for [`Operator`] itself and for catalog tokens (`"="`, `"NOT LIKE"`, ...).
pub trait IntoOperator {
    fn into_operator(self) -> QueryResult<Operator>;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> QueryResult<Operator> {
        Ok(self)
    }
}

impl IntoOperator for &str {
    fn into_operator(self) -> QueryResult<Operator> {
        self.parse()
    }
}

impl IntoOperator for String {
    fn into_operator(self) -> QueryResult<Operator> {
        self.parse()
    }
}

/// Which sides of a comparison are identifiers.
///
/// | mode    | column side      | value side |
/// |---------|------------------|------------|
/// | `Auto`  | identifier / raw | bound      |
/// | `Both`  | identifier       | identifier |
/// | `Left`  | identifier       | raw        |
/// | `Right` | raw              | identifier |
/// | `None`  | raw              | raw        |
///
/// Only comparison and LIKE predicates honor the value side; list and range values are
/// always bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quoting {
    #[default]
    Auto,
    Both,
    Left,
    Right,
    None,
}

impl Quoting {
    fn push_column(self, stmt: &mut Statement, column: &str) {
        match self {
            Quoting::Auto => {
                stmt.push_column(column);
            }
            Quoting::Both | Quoting::Left => {
                stmt.push_ident(column);
            }
            Quoting::Right | Quoting::None => {
                stmt.push(column);
            }
        }
    }

    fn push_value(self, stmt: &mut Statement, value: &Value) {
        match self {
            Quoting::Auto => {
                stmt.push_bind(value.clone());
            }
            Quoting::Both | Quoting::Right => {
                stmt.push_ident(value.to_plain_text());
            }
            Quoting::Left | Quoting::None => {
                stmt.push(&value.to_plain_text());
            }
        }
    }
}

/// A single typed predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column <op> value` for `= <> != > < >= <= & |`
    Compare {
        column: String,
        operator: Operator,
        value: Value,
        quoting: Quoting,
    },
    /// `column [NOT] [I]LIKE pattern`
    Like {
        column: String,
        operator: Operator,
        pattern: Value,
        quoting: Quoting,
    },
    /// `column IS [NOT] NULL`
    NullCheck {
        column: String,
        negated: bool,
        quoting: Quoting,
    },
    /// `column [NOT] IN (...)`
    InList {
        column: String,
        negated: bool,
        values: Vec<Value>,
        quoting: Quoting,
    },
    /// `column BETWEEN from AND to`
    Between {
        column: String,
        from: Value,
        to: Value,
        quoting: Quoting,
    },
    /// Caller-supplied SQL, rendered as-is.
    Raw(Statement),
}

impl Predicate {
    /// Build a predicate from a column, value and catalog operator.
    ///
    /// - `=` / `<>` / `!=` with `NULL` become `IS [NOT] NULL`
    /// - `=` / `<>` / `!=` with a list become `[NOT] IN`
    /// - `BEGINS_WITH` / `ENDS_WITH` / `CONTAINS` wrap the value with `%` and use `LIKE`
    /// - `BETWEEN` expects a two-element list
    pub fn new(
        column: impl Into<String>,
        value: impl Into<Value>,
        operator: Operator,
        quoting: Quoting,
    ) -> QueryResult<Self> {
        let column = column.into();
        let value = value.into();

        Ok(match operator {
            Operator::Equal | Operator::NotEqual | Operator::AltNotEqual => {
                Self::equality(column, value, operator, quoting)
            }
            Operator::GreaterThan
            | Operator::LessThan
            | Operator::GreaterEqual
            | Operator::LessEqual
            | Operator::BinaryAnd
            | Operator::BinaryOr => Self::compare(column, value, operator, quoting),
            Operator::Like | Operator::NotLike | Operator::ILike | Operator::NotILike => {
                Self::like(column, value, operator, quoting)
            }
            Operator::BeginsWith | Operator::EndsWith | Operator::Contains => {
                Self::pattern(column, value, operator, quoting)
            }
            Operator::In | Operator::NotIn => Self::in_list(column, value, operator, quoting),
            Operator::IsNull | Operator::IsNotNull => Predicate::NullCheck {
                column,
                negated: operator == Operator::IsNotNull,
                quoting,
            },
            Operator::Between => Self::between(column, value, quoting)?,
        })
    }

    /// `=` / `<>` / `!=`, switching to `IS [NOT] NULL` for null and `[NOT] IN` for lists.
    fn equality(column: String, value: Value, operator: Operator, quoting: Quoting) -> Self {
        let negated = operator != Operator::Equal;
        match value {
            Value::Null => Predicate::NullCheck {
                column,
                negated,
                quoting,
            },
            Value::List(values) => Predicate::InList {
                column,
                negated,
                values,
                quoting,
            },
            value => Predicate::Compare {
                column,
                operator,
                value,
                quoting,
            },
        }
    }

    fn compare(column: String, value: Value, operator: Operator, quoting: Quoting) -> Self {
        Predicate::Compare {
            column,
            operator,
            value,
            quoting,
        }
    }

    fn like(column: String, value: Value, operator: Operator, quoting: Quoting) -> Self {
        Predicate::Like {
            column,
            operator,
            pattern: value,
            quoting,
        }
    }

    /// `BEGINS_WITH` / `ENDS_WITH` / `CONTAINS` as a `LIKE` with `%` wildcards.
    fn pattern(column: String, value: Value, operator: Operator, quoting: Quoting) -> Self {
        let text = value.to_plain_text();
        let pattern = match operator {
            Operator::BeginsWith => format!("{text}%"),
            Operator::EndsWith => format!("%{text}"),
            _ => format!("%{text}%"),
        };
        Predicate::Like {
            column,
            operator: Operator::Like,
            pattern: Value::Text(pattern),
            quoting,
        }
    }

    fn in_list(column: String, value: Value, operator: Operator, quoting: Quoting) -> Self {
        Predicate::InList {
            column,
            negated: operator == Operator::NotIn,
            values: match value {
                Value::List(values) => values,
                single => vec![single],
            },
            quoting,
        }
    }

    fn between(column: String, value: Value, quoting: Quoting) -> QueryResult<Self> {
        let Value::List(values) = value else {
            return Err(between_shape_error());
        };
        let [from, to]: [Value; 2] = values.try_into().map_err(|_| between_shape_error())?;
        Ok(Predicate::Between {
            column,
            from,
            to,
            quoting,
        })
    }

    /// Render the predicate.
    pub fn to_statement(&self) -> Statement {
        let mut stmt = Statement::empty();
        match self {
            Predicate::Compare {
                column,
                operator,
                value,
                quoting,
            } => {
                quoting.push_column(&mut stmt, column);
                stmt.push(" ").push(operator.as_str()).push(" ");
                quoting.push_value(&mut stmt, value);
            }
            Predicate::Like {
                column,
                operator,
                pattern,
                quoting,
            } => {
                quoting.push_column(&mut stmt, column);
                stmt.push(" ").push(operator.as_str()).push(" ");
                quoting.push_value(&mut stmt, pattern);
            }
            Predicate::NullCheck {
                column,
                negated,
                quoting,
            } => {
                quoting.push_column(&mut stmt, column);
                stmt.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::InList {
                column,
                negated,
                values,
                quoting,
            } => {
                // Empty lists collapse to a constant predicate.
                if values.is_empty() {
                    stmt.push(if *negated { "1 = 1" } else { "1 = 0" });
                    return stmt;
                }
                quoting.push_column(&mut stmt, column);
                stmt.push(if *negated { " NOT IN (" } else { " IN (" });
                stmt.push_bind_list(values.iter().cloned());
                stmt.push(")");
            }
            Predicate::Between {
                column,
                from,
                to,
                quoting,
            } => {
                quoting.push_column(&mut stmt, column);
                stmt.push(" BETWEEN ")
                    .push_bind(from.clone())
                    .push(" AND ")
                    .push_bind(to.clone());
            }
            Predicate::Raw(raw) => return raw.clone(),
        }
        stmt
    }
}

fn between_shape_error() -> QueryError {
    QueryError::InvalidOperator("BETWEEN expects a list of exactly two values".to_string())
}

/// One entry of a [`Condition`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf {
        conjunction: Conjunction,
        predicate: Predicate,
    },
    Group {
        conjunction: Conjunction,
        condition: Condition,
    },
}

impl Node {
    fn is_empty(&self) -> bool {
        match self {
            Node::Leaf {
                predicate: Predicate::Raw(raw),
                ..
            } => raw.is_empty(),
            Node::Leaf { .. } => false,
            Node::Group { condition, .. } => condition.is_empty(),
        }
    }
}

/// A recursive AND / OR expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    nodes: Vec<Node>,
}

macro_rules! op_wrappers {
    ($( $and:ident, $or:ident => $ctor:ident($op:expr), $doc:literal; )*) => {
        $(
            #[doc = concat!("AND `column ", $doc, " value`.")]
            pub fn $and(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
                let predicate = Predicate::$ctor(column.to_string(), value.into(), $op, Quoting::Auto);
                self.push_predicate(Conjunction::And, predicate)
            }

            #[doc = concat!("OR `column ", $doc, " value`.")]
            pub fn $or(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
                let predicate = Predicate::$ctor(column.to_string(), value.into(), $op, Quoting::Auto);
                self.push_predicate(Conjunction::Or, predicate)
            }
        )*
    };
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    /// A condition holding a single equality.
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        let mut c = Self::new();
        c.add_and(column, value);
        c
    }

    /// AND `column = value` (`IS NULL` for null, `IN` for lists).
    pub fn add_and(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let predicate =
            Predicate::equality(column.to_string(), value.into(), Operator::Equal, Quoting::Auto);
        self.push_predicate(Conjunction::And, predicate)
    }

    /// OR `column = value` (`IS NULL` for null, `IN` for lists).
    pub fn add_or(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let predicate =
            Predicate::equality(column.to_string(), value.into(), Operator::Equal, Quoting::Auto);
        self.push_predicate(Conjunction::Or, predicate)
    }

    /// AND with an explicit operator. Unknown operator tokens are rejected.
    pub fn add_and_op(
        &mut self,
        column: &str,
        value: impl Into<Value>,
        operator: impl IntoOperator,
    ) -> QueryResult<&mut Self> {
        self.add(Conjunction::And, column, value, operator, Quoting::Auto)
    }

    /// OR with an explicit operator. Unknown operator tokens are rejected.
    pub fn add_or_op(
        &mut self,
        column: &str,
        value: impl Into<Value>,
        operator: impl IntoOperator,
    ) -> QueryResult<&mut Self> {
        self.add(Conjunction::Or, column, value, operator, Quoting::Auto)
    }

    /// AND with an explicit operator and quoting mode.
    pub fn add_and_quoted(
        &mut self,
        column: &str,
        value: impl Into<Value>,
        operator: impl IntoOperator,
        quoting: Quoting,
    ) -> QueryResult<&mut Self> {
        self.add(Conjunction::And, column, value, operator, quoting)
    }

    /// OR with an explicit operator and quoting mode.
    pub fn add_or_quoted(
        &mut self,
        column: &str,
        value: impl Into<Value>,
        operator: impl IntoOperator,
        quoting: Quoting,
    ) -> QueryResult<&mut Self> {
        self.add(Conjunction::Or, column, value, operator, quoting)
    }

    /// Add a leaf with full control over conjunction, operator and quoting.
    pub fn add(
        &mut self,
        conjunction: Conjunction,
        column: &str,
        value: impl Into<Value>,
        operator: impl IntoOperator,
        quoting: Quoting,
    ) -> QueryResult<&mut Self> {
        let operator = operator.into_operator()?;
        let predicate = Predicate::new(column, value, operator, quoting)?;
        Ok(self.push_predicate(conjunction, predicate))
    }

    /// AND a copy of `group` as a parenthesized sub-expression. `None` is a no-op.
    pub fn and_group<'a>(&mut self, group: impl Into<Option<&'a Condition>>) -> &mut Self {
        self.push_group(Conjunction::And, group.into())
    }

    /// OR a copy of `group` as a parenthesized sub-expression. `None` is a no-op.
    pub fn or_group<'a>(&mut self, group: impl Into<Option<&'a Condition>>) -> &mut Self {
        self.push_group(Conjunction::Or, group.into())
    }

    /// AND a raw SQL predicate. The text is not escaped.
    pub fn and_raw(&mut self, sql: impl Into<Statement>) -> &mut Self {
        self.push_predicate(Conjunction::And, Predicate::Raw(sql.into()))
    }

    /// OR a raw SQL predicate. The text is not escaped.
    pub fn or_raw(&mut self, sql: impl Into<Statement>) -> &mut Self {
        self.push_predicate(Conjunction::Or, Predicate::Raw(sql.into()))
    }

    /// AND `column = value` only when `value` is `Some`.
    pub fn and_opt<V: Into<Value>>(&mut self, column: &str, value: Option<V>) -> &mut Self {
        match value {
            Some(v) => self.add_and(column, v),
            None => self,
        }
    }

    /// OR `column = value` only when `value` is `Some`.
    pub fn or_opt<V: Into<Value>>(&mut self, column: &str, value: Option<V>) -> &mut Self {
        match value {
            Some(v) => self.add_or(column, v),
            None => self,
        }
    }

    op_wrappers! {
        and_not, or_not => equality(Operator::NotEqual), "<>";
        and_like, or_like => like(Operator::Like), "LIKE";
        and_not_like, or_not_like => like(Operator::NotLike), "NOT LIKE";
        and_ilike, or_ilike => like(Operator::ILike), "ILIKE";
        and_not_ilike, or_not_ilike => like(Operator::NotILike), "NOT ILIKE";
        and_greater, or_greater => compare(Operator::GreaterThan), ">";
        and_greater_equal, or_greater_equal => compare(Operator::GreaterEqual), ">=";
        and_less, or_less => compare(Operator::LessThan), "<";
        and_less_equal, or_less_equal => compare(Operator::LessEqual), "<=";
        and_begins_with, or_begins_with => pattern(Operator::BeginsWith), "BEGINS_WITH";
        and_ends_with, or_ends_with => pattern(Operator::EndsWith), "ENDS_WITH";
        and_contains, or_contains => pattern(Operator::Contains), "CONTAINS";
    }

    /// AND `column IS NULL`.
    pub fn and_null(&mut self, column: &str) -> &mut Self {
        self.push_null_check(Conjunction::And, column, false)
    }

    /// OR `column IS NULL`.
    pub fn or_null(&mut self, column: &str) -> &mut Self {
        self.push_null_check(Conjunction::Or, column, false)
    }

    /// AND `column IS NOT NULL`.
    pub fn and_not_null(&mut self, column: &str) -> &mut Self {
        self.push_null_check(Conjunction::And, column, true)
    }

    /// OR `column IS NOT NULL`.
    pub fn or_not_null(&mut self, column: &str) -> &mut Self {
        self.push_null_check(Conjunction::Or, column, true)
    }

    /// AND `column BETWEEN from AND to`.
    pub fn and_between(
        &mut self,
        column: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> &mut Self {
        self.push_between(Conjunction::And, column, from.into(), to.into())
    }

    /// OR `column BETWEEN from AND to`.
    pub fn or_between(
        &mut self,
        column: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> &mut Self {
        self.push_between(Conjunction::Or, column, from.into(), to.into())
    }

    /// AND `column IN (...)`. An empty list renders as `1 = 0`.
    pub fn and_in<T: Into<Value>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> &mut Self {
        self.push_in(Conjunction::And, column, values, false)
    }

    /// OR `column IN (...)`. An empty list renders as `1 = 0`.
    pub fn or_in<T: Into<Value>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> &mut Self {
        self.push_in(Conjunction::Or, column, values, false)
    }

    /// AND `column NOT IN (...)`. An empty list renders as `1 = 1`.
    pub fn and_not_in<T: Into<Value>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> &mut Self {
        self.push_in(Conjunction::And, column, values, true)
    }

    /// OR `column NOT IN (...)`. An empty list renders as `1 = 1`.
    pub fn or_not_in<T: Into<Value>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> &mut Self {
        self.push_in(Conjunction::Or, column, values, true)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of top-level nodes, including empty groups.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the condition renders to nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(Node::is_empty)
    }

    /// Render the condition on one line.
    ///
    /// The first rendered node carries no conjunction; every later node is prefixed with its
    /// own ` AND ` / ` OR `. Non-empty groups are wrapped in parentheses, empty ones are
    /// skipped along with their conjunction.
    pub fn to_statement(&self) -> Statement {
        let mut out = Statement::empty();
        let mut first = true;

        for node in &self.nodes {
            if node.is_empty() {
                continue;
            }
            let (conjunction, stmt) = match node {
                Node::Leaf {
                    conjunction,
                    predicate,
                } => (*conjunction, predicate.to_statement()),
                Node::Group {
                    conjunction,
                    condition,
                } => (*conjunction, condition.to_statement().wrap("(", ")")),
            };
            if !first {
                out.push(conjunction.separator());
            }
            first = false;
            out.push_statement(stmt);
        }
        out
    }

    fn push_null_check(
        &mut self,
        conjunction: Conjunction,
        column: &str,
        negated: bool,
    ) -> &mut Self {
        self.push_predicate(
            conjunction,
            Predicate::NullCheck {
                column: column.to_string(),
                negated,
                quoting: Quoting::Auto,
            },
        )
    }

    fn push_between(
        &mut self,
        conjunction: Conjunction,
        column: &str,
        from: Value,
        to: Value,
    ) -> &mut Self {
        self.push_predicate(
            conjunction,
            Predicate::Between {
                column: column.to_string(),
                from,
                to,
                quoting: Quoting::Auto,
            },
        )
    }

    fn push_in<T: Into<Value>>(
        &mut self,
        conjunction: Conjunction,
        column: &str,
        values: impl IntoIterator<Item = T>,
        negated: bool,
    ) -> &mut Self {
        self.push_predicate(
            conjunction,
            Predicate::InList {
                column: column.to_string(),
                negated,
                values: values.into_iter().map(Into::into).collect(),
                quoting: Quoting::Auto,
            },
        )
    }

    fn push_predicate(&mut self, conjunction: Conjunction, predicate: Predicate) -> &mut Self {
        self.nodes.push(Node::Leaf {
            conjunction,
            predicate,
        });
        self
    }

    fn push_group(&mut self, conjunction: Conjunction, group: Option<&Condition>) -> &mut Self {
        if let Some(group) = group {
            self.nodes.push(Node::Group {
                conjunction,
                condition: group.clone(),
            });
        }
        self
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_statement().interpolate(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};

    #[test]
    fn operator_tokens_round_trip_through_catalog() {
        for op in Operator::ALL {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
        assert_eq!("not like".parse::<Operator>().unwrap(), Operator::NotLike);
    }

    #[test]
    fn rejects_unknown_operator() {
        let mut c = Condition::new();
        let err = c.add_and_op("foo", "bar", "SQL injection!").unwrap_err();
        assert!(matches!(err, QueryError::InvalidOperator(ref t) if t == "SQL injection!"));
        assert!(c.is_empty());
    }

    #[test]
    fn first_node_has_no_conjunction() {
        let mut c = Condition::new();
        c.add_or("a", 1).add_and("b", 2).add_or("c", 3);
        assert_eq!(c.to_statement().to_sql(), "a = ? AND b = ? OR c = ?");
    }

    #[test]
    fn null_values_become_null_checks() {
        let mut c = Condition::new();
        c.add_and("a", Value::Null).and_not("b", None::<i32>);
        assert_eq!(c.to_string(), "a IS NULL AND b IS NOT NULL");
        assert!(c.to_statement().params().is_empty());
    }

    #[test]
    fn list_values_become_in() {
        let mut c = Condition::new();
        c.add_and("a", vec!["x", "y"]).and_not("b", vec![1, 2]);
        assert_eq!(
            c.to_statement().render(&Postgres),
            r#""a" IN ($1, $2) AND "b" NOT IN ($3, $4)"#
        );
    }

    #[test]
    fn empty_lists_collapse() {
        let mut c = Condition::new();
        c.and_in("a", Vec::<i32>::new()).or_not_in("b", Vec::<i32>::new());
        assert_eq!(c.to_string(), "1 = 0 OR 1 = 1");
    }

    #[test]
    fn like_family_wraps_patterns() {
        let mut c = Condition::new();
        c.and_begins_with("a", "v")
            .and_ends_with("b", "v")
            .and_contains("c", "v")
            .and_not_like("d", "x%");
        assert_eq!(
            c.to_statement().interpolate(Some(&MySql)),
            "`a` LIKE 'v%' AND `b` LIKE '%v' AND `c` LIKE '%v%' AND `d` NOT LIKE 'x%'"
        );
    }

    #[test]
    fn ilike_variants_bind_patterns() {
        let mut c = Condition::new();
        c.and_ilike("name", "a%").and_not_ilike("name", "%z").or_not_ilike("nick", "b%");
        let stmt = c.to_statement();
        assert_eq!(
            stmt.to_sql(),
            "name ILIKE ? AND name NOT ILIKE ? OR nick NOT ILIKE ?"
        );
        assert_eq!(
            stmt.params(),
            &[Value::from("a%"), Value::from("%z"), Value::from("b%")]
        );
    }

    #[test]
    fn between_binds_two_params() {
        let mut c = Condition::new();
        c.and_between("age", 18, 65);
        let stmt = c.to_statement();
        assert_eq!(stmt.to_sql(), "age BETWEEN ? AND ?");
        assert_eq!(stmt.params(), &[Value::Int(18), Value::Int(65)]);

        let mut c = Condition::new();
        assert!(c.add_and_op("age", 18, Operator::Between).is_err());
        assert!(c.add_and_op("age", vec![1, 2], "BETWEEN").is_ok());
    }

    #[test]
    fn quoting_modes() {
        let mut c = Condition::new();
        c.add_and_quoted("a.id", "b.a_id", "=", Quoting::Both)
            .unwrap()
            .add_and_quoted("total", "price * qty", ">", Quoting::Left)
            .unwrap()
            .add_and_quoted("lower(name)", "x", "=", Quoting::None)
            .unwrap();
        assert_eq!(
            c.to_statement().render(&MySql),
            "`a`.`id` = `b`.`a_id` AND `total` > price * qty AND lower(name) = x"
        );
    }

    #[test]
    fn raw_columns_pass_through() {
        let mut c = Condition::new();
        c.and_greater("count(id)", 3);
        assert_eq!(c.to_statement().render(&Postgres), "count(id) > $1");
    }

    #[test]
    fn groups_are_parenthesized_and_copied() {
        let mut inner = Condition::eq("bah", "blacksheep");
        inner.add_or("empty", Value::Null);

        let mut outer = Condition::new();
        outer.add_and("fun", "good").or_group(&inner);

        inner.add_and("late", 1);

        assert_eq!(
            outer.to_string(),
            "fun = 'good' OR (bah = 'blacksheep' OR empty IS NULL)"
        );
    }

    #[test]
    fn empty_groups_and_none_are_skipped() {
        let empty = Condition::new();
        let mut c = Condition::new();
        c.and_group(&empty).and_group(None::<&Condition>).add_and("my_column", "value");
        assert_eq!(c.to_string(), "my_column = 'value'");
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn empty_children_inside_group_leave_no_conjunction() {
        let mut inner = Condition::new();
        inner
            .and_raw("")
            .or_group(None::<&Condition>)
            .and_group(&Condition::new())
            .or_opt("y", None::<i32>)
            .add_or("x", 1)
            .and_raw(Statement::empty());

        let mut c = Condition::new();
        c.and_group(&inner);
        assert_eq!(c.to_statement().to_sql(), "(x = ?)");
        assert_eq!(c.to_statement().params(), &[Value::Int(1)]);

        c.add_and("z", 2);
        assert_eq!(c.to_string(), "(x = 1) AND z = 2");
    }

    #[test]
    fn opt_helpers_skip_none() {
        let mut c = Condition::new();
        c.and_opt("a", Some(1)).and_opt("b", None::<i32>).or_opt("c", Some("x"));
        assert_eq!(c.to_statement().to_sql(), "a = ? OR c = ?");
    }
}
