//! Error types for querykit

use thiserror::Error;

/// Result type alias for querykit operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while building, rendering or executing statements.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Comparison token outside the fixed operator catalog
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// Render attempted before a table was set
    #[error("No table specified")]
    MissingTable,

    /// Nested query used as a table or join source without an alias
    #[error("Nested query must have an alias: {0}")]
    MissingAlias(String),

    /// UPDATE rendered without any column values
    #[error("Unable to build UPDATE query without update column values")]
    MissingUpdatePayload,

    /// Action token that is not SELECT/COUNT/DELETE/UPDATE
    #[error("Unknown action \"{0}\"")]
    UnknownAction(String),

    /// ORDER BY direction other than ASC/DESC
    #[error("{0} is not a valid sorting direction")]
    InvalidSortDirection(String),

    /// Qualified-column join shorthand that cannot be resolved to a table and ON clause
    #[error("Invalid join shorthand: {0}")]
    InvalidJoinShorthand(String),

    /// Join type token outside INNER/LEFT/RIGHT/OUTER/CROSS
    #[error("Invalid join type: {0}")]
    InvalidJoinType(String),

    /// LIMIT/OFFSET the dialect cannot express for this statement
    #[error("Unsupported limit: {0}")]
    UnsupportedLimit(String),

    /// Malformed identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Configuration loading/validation error
    #[error("Config error: {0}")]
    Config(String),

    /// Missing row or registry entry
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QueryError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier(message.into())
    }

    /// Whether this error was raised by the builder itself (as opposed to
    /// configuration or the database).
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperator(_)
                | Self::MissingTable
                | Self::MissingAlias(_)
                | Self::MissingUpdatePayload
                | Self::UnknownAction(_)
                | Self::InvalidSortDirection(_)
                | Self::InvalidJoinShorthand(_)
                | Self::InvalidJoinType(_)
                | Self::UnsupportedLimit(_)
                | Self::InvalidIdentifier(_)
        )
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for QueryError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<toml::de::Error> for QueryError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_direction_message_names_the_token() {
        let err = QueryError::InvalidSortDirection("SIDEWAYS".into());
        assert_eq!(err.to_string(), "SIDEWAYS is not a valid sorting direction");
    }

    #[test]
    fn build_errors_are_classified() {
        assert!(QueryError::MissingTable.is_build_error());
        assert!(QueryError::InvalidOperator("x".into()).is_build_error());
        assert!(QueryError::InvalidJoinType("SIDEWAYS".into()).is_build_error());
        assert!(QueryError::UnsupportedLimit("DISTINCT".into()).is_build_error());
        assert!(!QueryError::config("bad").is_build_error());
        assert!(!QueryError::not_found("default").is_build_error());
    }
}
