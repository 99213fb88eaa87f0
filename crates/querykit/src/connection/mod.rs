//! Execution seam between rendered statements and a live database.
//!
//! [`Connection`] is what [`Query`](crate::Query) executes against: it names the dialect
//! to render for and runs the rendered SQL. It is implemented for `tokio_postgres` clients
//! and transactions, and for pooled `deadpool_postgres` clients with the `pool` feature.
//!
//! [`ConnectionProvider`] hands out connections by name; [`ConnectionRegistry`] is the
//! pooled implementation configured from [`RegistryConfig`].

mod config;
#[cfg(feature = "pool")]
mod registry;

pub use config::{ConnectionEntry, ConnectionParams, RegistryConfig};
#[cfg(feature = "pool")]
pub use registry::ConnectionRegistry;

use crate::dialect::{Dialect, Postgres};
use crate::error::QueryResult;
use crate::logging::{DEFAULT_SQL_LOGGER, SqlLogger};
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A database handle that statements can be executed on.
pub trait Connection: Send + Sync {
    /// Dialect used to render statements for this connection.
    fn dialect(&self) -> &dyn Dialect;

    /// Logger applied to statements executed here.
    fn sql_logger(&self) -> &SqlLogger {
        &DEFAULT_SQL_LOGGER
    }

    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<Vec<Row>>> + Send;

    /// Execute a query and return a stream of rows.
    fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<RowStream>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<u64>> + Send;
}

/// Source of named connections.
pub trait ConnectionProvider: Send + Sync {
    type Conn: Connection;

    /// The connection used when none is named.
    fn default_connection(&self)
    -> impl std::future::Future<Output = QueryResult<Self::Conn>> + Send;

    fn connection(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = QueryResult<Self::Conn>> + Send;
}

/// A stream of rows returned by [`Connection::query_stream`].
#[must_use]
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = QueryResult<Row>> + Send>>,
}

impl RowStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = QueryResult<Row>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for RowStream {
    type Item = QueryResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream").finish_non_exhaustive()
    }
}

struct MapDbRowStream<S> {
    inner: Pin<Box<S>>,
}

impl<S> MapDbRowStream<S> {
    fn new(stream: S) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl<S> Stream for MapDbRowStream<S>
where
    S: Stream<Item = Result<Row, tokio_postgres::Error>> + Send + 'static,
{
    type Item = QueryResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(Ok(row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e.into()))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Connection for tokio_postgres::Client {
    fn dialect(&self) -> &dyn Dialect {
        &Postgres
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<Vec<Row>> {
        Ok(tokio_postgres::Client::query(self, sql, params).await?)
    }

    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> QueryResult<RowStream> {
        let stream = tokio_postgres::Client::query_raw(self, sql, params.iter().copied()).await?;
        Ok(RowStream::new(MapDbRowStream::new(stream)))
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<u64> {
        Ok(tokio_postgres::Client::execute(self, sql, params).await?)
    }
}

impl Connection for tokio_postgres::Transaction<'_> {
    fn dialect(&self) -> &dyn Dialect {
        &Postgres
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<Vec<Row>> {
        Ok(tokio_postgres::Transaction::query(self, sql, params).await?)
    }

    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> QueryResult<RowStream> {
        let stream =
            tokio_postgres::Transaction::query_raw(self, sql, params.iter().copied()).await?;
        Ok(RowStream::new(MapDbRowStream::new(stream)))
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<u64> {
        Ok(tokio_postgres::Transaction::execute(self, sql, params).await?)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Client {
    fn dialect(&self) -> &dyn Dialect {
        &Postgres
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper -> tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        Connection::query(client, sql, params).await
    }

    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> QueryResult<RowStream> {
        let client: &tokio_postgres::Client = self;
        Connection::query_stream(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<u64> {
        let client: &tokio_postgres::Client = self;
        Connection::execute(client, sql, params).await
    }
}

impl<C: Connection> Connection for &C {
    fn dialect(&self) -> &dyn Dialect {
        (**self).dialect()
    }

    fn sql_logger(&self) -> &SqlLogger {
        (**self).sql_logger()
    }

    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<RowStream>> + Send {
        (**self).query_stream(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<u64>> + Send {
        (**self).execute(sql, params)
    }
}
