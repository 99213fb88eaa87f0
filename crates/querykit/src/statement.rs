//! Deferred-rendering SQL statements.
//!
//! A [`Statement`] keeps SQL text, identifiers and bound values apart until render time:
//!
//! - text is emitted as written
//! - identifiers are quoted by the target [`Dialect`]
//! - parameters become the dialect's positional placeholders and are bound by the driver
//!
//! Statements compose by concatenation ([`Statement::push_statement`]), which preserves the
//! relative order of identifiers and parameters on both sides.
//!
//! # Example
//!
//! ```ignore
//! use querykit::{Statement, dialect::Postgres};
//!
//! let mut stmt = Statement::new("SELECT * FROM ");
//! stmt.push_ident("users").push(" WHERE ").push_ident("id").push(" = ").push_bind(7);
//!
//! assert_eq!(stmt.render(&Postgres), r#"SELECT * FROM "users" WHERE "id" = $1"#);
//! ```

use crate::dialect::{Dialect, quote_literal};
use crate::ident::is_identifier_path;
use crate::value::Value;
use std::fmt;

/// One piece of a [`Statement`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Raw SQL text, emitted verbatim.
    Text(String),
    /// A name quoted by the dialect at render time.
    Ident(String),
    /// A positional parameter; the n-th `Param` binds the n-th value.
    Param,
}

/// SQL text with identifier and parameter placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct Statement {
    tokens: Vec<Token>,
    params: Vec<Value>,
}

impl Statement {
    /// Create a statement with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let sql = initial_sql.into();
        let tokens = if sql.is_empty() {
            Vec::new()
        } else {
            vec![Token::Text(sql)]
        };
        Self {
            tokens,
            params: Vec::new(),
        }
    }

    /// Create an empty statement.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append raw SQL text.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.tokens.last_mut() {
            Some(Token::Text(last)) => last.push_str(sql),
            _ => self.tokens.push(Token::Text(sql.to_string())),
        }
        self
    }

    /// Append an identifier placeholder.
    pub fn push_ident(&mut self, name: impl Into<String>) -> &mut Self {
        self.tokens.push(Token::Ident(name.into()));
        self
    }

    /// Append a column expression: identifier paths (`t.col`, `db.t.col`, `t.*`) are recorded
    /// as identifiers, anything else (`count(id)`, `a + b`) is appended as raw SQL.
    ///
    /// Raw expressions are not escaped. Never pass untrusted input here.
    pub fn push_column(&mut self, expr: &str) -> &mut Self {
        if is_identifier_path(expr) {
            self.push_ident(expr)
        } else {
            self.push(expr)
        }
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.tokens.push(Token::Param);
        self.params.push(value.into());
        self
    }

    /// Append a comma-separated list of placeholders and bind all values.
    ///
    /// If `values` is empty, this appends `NULL`.
    pub fn push_bind_list<T>(&mut self, values: impl IntoIterator<Item = T>) -> &mut Self
    where
        T: Into<Value>,
    {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return self.push("NULL");
        };

        self.push_bind(first);
        for v in iter {
            self.push(", ");
            self.push_bind(v);
        }
        self
    }

    /// Append another statement, consuming it.
    pub fn push_statement(&mut self, other: Statement) -> &mut Self {
        let Statement { tokens, mut params } = other;
        for token in tokens {
            match token {
                Token::Text(s) => {
                    self.push(&s);
                }
                other => self.tokens.push(other),
            }
        }
        self.params.append(&mut params);
        self
    }

    /// Wrap the statement as `prefix <stmt> suffix`.
    pub fn wrap(self, prefix: &str, suffix: &str) -> Statement {
        let mut out = Statement::new(prefix);
        out.push_statement(self);
        out.push(suffix);
        out
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Bound values, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// Recorded identifiers, in placeholder order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Ident(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Whether the statement renders to nothing.
    pub fn is_empty(&self) -> bool {
        self.tokens.iter().all(|t| matches!(t, Token::Text(s) if s.is_empty()))
    }

    /// Whether the text portion starts with `prefix`, ignoring ASCII case.
    pub fn starts_with(&self, prefix: &str) -> bool {
        match self.tokens.first() {
            Some(Token::Text(s)) => s
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
            _ => false,
        }
    }

    /// Render without a dialect: identifiers verbatim, `?` placeholders.
    pub fn to_sql(&self) -> String {
        self.write(
            |name, out| out.push_str(name),
            |_, out| out.push('?'),
        )
    }

    /// Render for `dialect`: identifiers quoted, dialect placeholders.
    pub fn render(&self, dialect: &dyn Dialect) -> String {
        self.write(
            |name, out| out.push_str(&dialect.quote_identifier(name)),
            |idx, out| dialect.placeholder(idx, out),
        )
    }

    /// Render with every parameter embedded as a literal.
    ///
    /// Intended for logs and debugging output; execution always binds parameters.
    pub fn interpolate(&self, dialect: Option<&dyn Dialect>) -> String {
        self.write(
            |name, out| match dialect {
                Some(d) => out.push_str(&d.quote_identifier(name)),
                None => out.push_str(name),
            },
            |idx, out| {
                let value = &self.params[idx - 1];
                match dialect {
                    Some(d) => out.push_str(&d.quote_literal(value)),
                    None => out.push_str(&quote_literal(value)),
                }
            },
        )
    }

    /// Replace every identifier placeholder with its quoted text.
    ///
    /// The result carries no identifiers, only text and parameters, so it can be rewritten
    /// textually (e.g. by a dialect's LIMIT emulation).
    pub fn resolve_identifiers(&self, dialect: &dyn Dialect) -> Statement {
        let mut out = Statement::empty();
        for token in &self.tokens {
            match token {
                Token::Text(s) => {
                    out.push(s);
                }
                Token::Ident(name) => {
                    out.push(&dialect.quote_identifier(name));
                }
                Token::Param => out.tokens.push(Token::Param),
            }
        }
        out.params = self.params.clone();
        out
    }

    /// Split at the last occurrence of `keyword` outside parentheses, ignoring ASCII case.
    ///
    /// Returns the statement before the keyword and the statement after it (keyword removed).
    /// Parameters are partitioned with their placeholders.
    pub fn split_last_keyword(&self, keyword: &str) -> Option<(Statement, Statement)> {
        let mut depth: i32 = 0;
        let mut found: Option<(usize, usize)> = None;

        for (idx, token) in self.tokens.iter().enumerate() {
            let Token::Text(text) = token else {
                continue;
            };
            for (pos, ch) in text.char_indices() {
                match ch {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
                if depth == 0
                    && text
                        .get(pos..pos + keyword.len())
                        .is_some_and(|s| s.eq_ignore_ascii_case(keyword))
                {
                    found = Some((idx, pos));
                }
            }
        }

        let (idx, pos) = found?;
        let params_before = self.tokens[..idx]
            .iter()
            .filter(|t| matches!(t, Token::Param))
            .count();

        let mut before = Statement::empty();
        before.tokens.extend_from_slice(&self.tokens[..idx]);
        let mut after = Statement::empty();

        if let Token::Text(text) = &self.tokens[idx] {
            before.push(&text[..pos]);
            after.push(&text[pos + keyword.len()..]);
        }
        for token in &self.tokens[idx + 1..] {
            match token {
                Token::Text(s) => {
                    after.push(s);
                }
                other => after.tokens.push(other.clone()),
            }
        }

        before.params = self.params[..params_before].to_vec();
        after.params = self.params[params_before..].to_vec();
        Some((before, after))
    }

    /// Remove a leading text prefix, ignoring ASCII case.
    pub fn strip_prefix(&self, prefix: &str) -> Option<Statement> {
        if !self.starts_with(prefix) {
            return None;
        }
        let mut out = self.clone();
        if let Some(Token::Text(first)) = out.tokens.first_mut() {
            first.replace_range(..prefix.len(), "");
            if first.is_empty() {
                out.tokens.remove(0);
            }
        }
        Some(out)
    }

    fn write(
        &self,
        mut ident: impl FnMut(&str, &mut String),
        mut param: impl FnMut(usize, &mut String),
    ) -> String {
        let text_len: usize = self
            .tokens
            .iter()
            .map(|t| match t {
                Token::Text(s) | Token::Ident(s) => s.len() + 2,
                Token::Param => 4,
            })
            .sum();
        let mut out = String::with_capacity(text_len);
        let mut idx = 0;
        for token in &self.tokens {
            match token {
                Token::Text(s) => out.push_str(s),
                Token::Ident(name) => ident(name, &mut out),
                Token::Param => {
                    idx += 1;
                    param(idx, &mut out);
                }
            }
        }
        out
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.interpolate(None))
    }
}
