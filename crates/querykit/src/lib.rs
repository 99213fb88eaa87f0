//! # querykit
//!
//! A dialect-agnostic SQL statement builder.
//!
//! ## Features
//!
//! - **Deferred rendering**: statements keep SQL text, identifiers and bound values apart
//!   until a [`Dialect`] renders them
//! - **Injection-safe conditions**: values are always bound; operators come from a fixed catalog
//! - **Join shorthand**: `join("orders.user_id", "users.id")` infers the joined table
//! - **Complex counts**: grouped, distinct and aggregate queries are counted through a wrapping
//!   subquery
//! - **Per-dialect LIMIT**: `LIMIT/OFFSET`, or `TOP` / `ROW_NUMBER()` emulation on SQL Server
//! - **Execution**: PostgreSQL via `tokio-postgres`, pooled through a named
//!   [`ConnectionRegistry`] (feature `pool`)
//!
//! ```ignore
//! use querykit::prelude::*;
//! use querykit::dialect::MySql;
//!
//! let q = Query::table("users u")
//!     .add_and("u.status", "active")
//!     .and_in("u.role", ["admin", "owner"])
//!     .left_join("u.team_id", "teams.id")?
//!     .order_by("u.created_at", Some("DESC"))?
//!     .limit(10);
//!
//! let stmt = q.select_statement(Some(&MySql))?;
//! println!("{}", stmt.render(&MySql));
//! ```

pub mod condition;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod join;
pub mod logging;
pub mod prelude;
pub mod query;
pub mod statement;
pub mod value;

pub use condition::{Condition, Conjunction, IntoOperator, Operator, Predicate, Quoting};
pub use connection::{
    Connection, ConnectionEntry, ConnectionParams, ConnectionProvider, RegistryConfig, RowStream,
};
pub use dialect::{Dialect, MsSql, MySql, Postgres, Sqlite, dialect_for_driver};
pub use error::{QueryError, QueryResult};
pub use join::{IntoJoinOn, Join, JoinOn, JoinTarget, JoinType};
pub use logging::{LoggedConnection, SqlLogger};
pub use query::{Action, Query, SortDirection, TableSource};
pub use statement::{Statement, Token};
pub use value::Value;

#[cfg(feature = "pool")]
pub use connection::ConnectionRegistry;
