//! SQL identifier parsing.
//!
//! [`Ident`] represents a dotted identifier path (`schema.table.column`) as written by the
//! caller. It is used to decide whether a piece of caller text is an identifier (and therefore
//! gets quoted by the dialect at render time) or a raw SQL expression that is passed through.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts (`"..."`) allow any characters except NUL and escape `"` as `""`
//! - The last part may be `*` (`users.*`)

use crate::error::{QueryError, QueryResult};

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier: allows any characters except NUL.
    Quoted(String),
    /// Trailing `*`.
    Wildcard,
}

/// A dotted SQL identifier path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string.
    ///
    /// - Dotted: `schema.table.column`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Wildcard: `users.*`
    pub fn parse(s: &str) -> QueryResult<Self> {
        if s.is_empty() {
            return Err(QueryError::invalid_identifier("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(QueryError::invalid_identifier(
                "identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                if matches!(parts.last(), Some(IdentPart::Wildcard)) {
                    return Err(QueryError::invalid_identifier(format!(
                        "'*' must be the last part of '{s}'"
                    )));
                }
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(QueryError::invalid_identifier(format!(
                                "trailing '.' in '{s}'"
                            )));
                        }
                    }
                    Some(c) => {
                        return Err(QueryError::invalid_identifier(format!(
                            "expected '.' between parts of '{s}', got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            match chars.peek() {
                Some('"') => {
                    chars.next();
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('"') => {
                                if chars.peek() == Some(&'"') {
                                    chars.next();
                                    name.push('"');
                                } else {
                                    break;
                                }
                            }
                            Some(c) => name.push(c),
                            None => {
                                return Err(QueryError::invalid_identifier(format!(
                                    "unclosed quoted identifier in '{s}'"
                                )));
                            }
                        }
                    }
                    if name.is_empty() {
                        return Err(QueryError::invalid_identifier("empty quoted identifier"));
                    }
                    parts.push(IdentPart::Quoted(name));
                    continue;
                }
                Some('*') => {
                    chars.next();
                    parts.push(IdentPart::Wildcard);
                    continue;
                }
                _ => {}
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !valid {
                    return Err(QueryError::invalid_identifier(format!(
                        "invalid character '{c}' in '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(QueryError::invalid_identifier(format!(
                    "empty segment in '{s}'"
                )));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        if parts.is_empty() {
            return Err(QueryError::invalid_identifier("empty identifier"));
        }

        Ok(Self { parts })
    }

    /// The identifier without its last part (`db.foo.bar_id` -> `db.foo`).
    pub fn parent(&self) -> Option<Ident> {
        if self.parts.len() < 2 {
            return None;
        }
        Some(Ident {
            parts: self.parts[..self.parts.len() - 1].to_vec(),
        })
    }

    /// Render the identifier back in its portable form (quoted parts use `"`).
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_quoted_parts(&mut out, |part, out| match part {
            IdentPart::Unquoted(s) => out.push_str(s),
            IdentPart::Quoted(s) => write_delimited(s, '"', '"', out),
            IdentPart::Wildcard => out.push('*'),
        });
        out
    }

    /// Write every part delimited with `open`/`close`, doubling embedded `close` characters.
    /// `*` is never delimited.
    pub fn write_quoted(&self, open: char, close: char, out: &mut String) {
        self.write_quoted_parts(out, |part, out| match part {
            IdentPart::Unquoted(s) | IdentPart::Quoted(s) => write_delimited(s, open, close, out),
            IdentPart::Wildcard => out.push('*'),
        });
    }

    fn write_quoted_parts(&self, out: &mut String, mut f: impl FnMut(&IdentPart, &mut String)) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            f(part, out);
        }
    }
}

fn write_delimited(s: &str, open: char, close: char, out: &mut String) {
    out.push(open);
    for ch in s.chars() {
        if ch == close {
            out.push(close);
        }
        out.push(ch);
    }
    out.push(close);
}

/// Whether `s` parses as an identifier path.
pub fn is_identifier_path(s: &str) -> bool {
    Ident::parse(s).is_ok()
}

/// Whether `s` is written as a qualified column (`table.column`, `db.table.column`):
/// at least one dot and no spaces.
pub fn is_qualified_column(s: &str) -> bool {
    s.contains('.') && !s.contains(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_and_dotted() {
        assert_eq!(Ident::parse("users").unwrap().parts.len(), 1);
        assert_eq!(Ident::parse("db.users.id").unwrap().parts.len(), 3);
        assert_eq!(
            Ident::parse("users.*").unwrap().parts[1],
            IdentPart::Wildcard
        );
    }

    #[test]
    fn parses_quoted_parts() {
        let ident = Ident::parse(r#"public."User ""Table""".id"#).unwrap();
        assert_eq!(
            ident.parts[1],
            IdentPart::Quoted(r#"User "Table""#.to_string())
        );
    }

    #[test]
    fn rejects_expressions() {
        assert!(!is_identifier_path("count(id)"));
        assert!(!is_identifier_path("a = b"));
        assert!(!is_identifier_path("1=1"));
        assert!(!is_identifier_path("users."));
        assert!(!is_identifier_path("*.users"));
        assert!(!is_identifier_path(""));
    }

    #[test]
    fn writes_with_dialect_delimiters() {
        let mut out = String::new();
        Ident::parse("db.foo.*").unwrap().write_quoted('`', '`', &mut out);
        assert_eq!(out, "`db`.`foo`.*");

        let mut out = String::new();
        Ident::parse(r#""we]ird""#).unwrap().write_quoted('[', ']', &mut out);
        assert_eq!(out, "[we]]ird]");
    }

    #[test]
    fn parent_drops_last_part() {
        let parent = Ident::parse("db.foo.bar_id").unwrap().parent().unwrap();
        assert_eq!(parent.to_sql(), "db.foo");
        assert!(Ident::parse("foo").unwrap().parent().is_none());
    }

    #[test]
    fn qualified_column_detection() {
        assert!(is_qualified_column("foo.bar"));
        assert!(is_qualified_column("db.foo.bar"));
        assert!(!is_qualified_column("foo = bar"));
        assert!(!is_qualified_column("1=1"));
        assert!(!is_qualified_column("table AS alias"));
    }
}
