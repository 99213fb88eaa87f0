//! Statement logging through `tracing`.

use crate::connection::{Connection, RowStream};
use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::query::Action;
use crate::statement::Statement;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::Level;

/// Logger used by connections that do not carry their own.
pub(crate) static DEFAULT_SQL_LOGGER: SqlLogger = SqlLogger::new();

/// Emits every executed statement on the `querykit.sql` target.
///
/// The event is emitted just before execution with the fields `action`, `dialect`,
/// `param_count` and `sql`.
///
/// ```ignore
/// let conn = SqlLogger::new().level(Level::INFO).no_truncate().wrap(client);
/// Query::table("users").select(&conn).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqlLogger {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Log the statement with parameters embedded as literals.
    pub interpolate: bool,
}

impl Default for SqlLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlLogger {
    pub const fn new() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            interpolate: false,
        }
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Embed parameter values in the logged SQL.
    ///
    /// Values may contain sensitive data; only enable this where logs are private.
    pub fn interpolate(mut self, enabled: bool) -> Self {
        self.interpolate = enabled;
        self
    }

    /// Attach this logger to a connection.
    pub fn wrap<C: Connection>(self, conn: C) -> LoggedConnection<C> {
        LoggedConnection {
            inner: conn,
            logger: self,
        }
    }

    fn truncate_sql(&self, sql: String) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(&sql, max)),
            _ => sql,
        }
    }

    /// Emit `stmt`, already rendered as `sql` for `dialect`.
    pub fn log(&self, action: Action, dialect: &dyn Dialect, stmt: &Statement, sql: &str) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = if self.interpolate {
            stmt.interpolate(Some(dialect))
        } else {
            sql.to_string()
        };
        let sql = self.truncate_sql(sql);

        emit_at_level!(
            self.level,
            target: "querykit.sql",
            action = %action,
            dialect = dialect.name(),
            param_count = stmt.params().len(),
            sql = %sql,
        );
    }
}

/// A connection whose statements are logged with a custom [`SqlLogger`].
#[derive(Debug)]
pub struct LoggedConnection<C> {
    inner: C,
    logger: SqlLogger,
}

impl<C> LoggedConnection<C> {
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Connection> Connection for LoggedConnection<C> {
    fn dialect(&self) -> &dyn Dialect {
        self.inner.dialect()
    }

    fn sql_logger(&self) -> &SqlLogger {
        &self.logger
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<Vec<Row>> {
        self.inner.query(sql, params).await
    }

    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> QueryResult<RowStream> {
        self.inner.query_stream(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<u64> {
        self.inner.execute(sql, params).await
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
