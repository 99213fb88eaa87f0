//! Executing rendered queries on a [`Connection`].

use super::{Action, Query};
use crate::connection::{Connection, ConnectionProvider, RowStream};
use crate::error::QueryResult;
use crate::statement::Statement;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Render `stmt` for `conn` and log it.
fn prepare(conn: &impl Connection, action: Action, stmt: &Statement) -> String {
    let dialect = conn.dialect();
    let sql = stmt.render(dialect);
    conn.sql_logger().log(action, dialect, stmt, &sql);
    sql
}

fn bind_params(stmt: &Statement) -> Vec<&(dyn ToSql + Sync)> {
    stmt.params()
        .iter()
        .map(|v| v as &(dyn ToSql + Sync))
        .collect()
}

impl Query {
    /// Execute as SELECT and return all rows.
    pub async fn select(&self, conn: &impl Connection) -> QueryResult<Vec<Row>> {
        let stmt = self.select_statement(Some(conn.dialect()))?;
        let sql = prepare(conn, Action::Select, &stmt);
        conn.query(&sql, &bind_params(&stmt)).await
    }

    /// Execute as SELECT and stream the rows.
    pub async fn select_stream(&self, conn: &impl Connection) -> QueryResult<RowStream> {
        let stmt = self.select_statement(Some(conn.dialect()))?;
        let sql = prepare(conn, Action::Select, &stmt);
        conn.query_stream(&sql, &bind_params(&stmt)).await
    }

    /// Execute as COUNT and return the count. No result row counts as zero.
    pub async fn count(&self, conn: &impl Connection) -> QueryResult<i64> {
        let stmt = self.count_statement(Some(conn.dialect()))?;
        let sql = prepare(conn, Action::Count, &stmt);
        let rows = conn.query(&sql, &bind_params(&stmt)).await?;
        match rows.first() {
            Some(row) => Ok(row.try_get::<_, i64>(0)?),
            None => Ok(0),
        }
    }

    /// Execute as DELETE and return the number of deleted rows.
    pub async fn delete(&self, conn: &impl Connection) -> QueryResult<u64> {
        let stmt = self.delete_statement(Some(conn.dialect()))?;
        let sql = prepare(conn, Action::Delete, &stmt);
        conn.execute(&sql, &bind_params(&stmt)).await
    }

    /// Execute as UPDATE setting `values` and return the number of updated rows.
    pub async fn update<K, V>(
        &self,
        values: impl IntoIterator<Item = (K, V)>,
        conn: &impl Connection,
    ) -> QueryResult<u64>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let stmt = self.update_statement(values, Some(conn.dialect()))?;
        let sql = prepare(conn, Action::Update, &stmt);
        conn.execute(&sql, &bind_params(&stmt)).await
    }

    // ==================== Provider-backed ====================

    /// [`Query::select`] on the provider's default connection.
    pub async fn select_using<P: ConnectionProvider>(&self, provider: &P) -> QueryResult<Vec<Row>> {
        let conn = provider.default_connection().await?;
        self.select(&conn).await
    }

    /// [`Query::count`] on the provider's default connection.
    pub async fn count_using<P: ConnectionProvider>(&self, provider: &P) -> QueryResult<i64> {
        let conn = provider.default_connection().await?;
        self.count(&conn).await
    }

    /// [`Query::delete`] on the provider's default connection.
    pub async fn delete_using<P: ConnectionProvider>(&self, provider: &P) -> QueryResult<u64> {
        let conn = provider.default_connection().await?;
        self.delete(&conn).await
    }

    /// [`Query::update`] on the provider's default connection.
    pub async fn update_using<P, K, V>(
        &self,
        values: impl IntoIterator<Item = (K, V)>,
        provider: &P,
    ) -> QueryResult<u64>
    where
        P: ConnectionProvider,
        K: Into<String>,
        V: Into<Value>,
    {
        let conn = provider.default_connection().await?;
        self.update(values, &conn).await
    }
}
