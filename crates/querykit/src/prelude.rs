//! Convenient imports for typical `querykit` usage.
//!
//! ```ignore
//! use querykit::prelude::*;
//! ```

pub use crate::{
    Condition, Connection, ConnectionProvider, Dialect, Join, JoinType, Operator, Query,
    QueryError, QueryResult, Statement, Value,
};

#[cfg(feature = "pool")]
pub use crate::{ConnectionRegistry, RegistryConfig};
