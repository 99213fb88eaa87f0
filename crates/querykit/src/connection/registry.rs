//! Named connection registry backed by deadpool-postgres pools.

use super::config::{ConnectionParams, RegistryConfig};
use super::ConnectionProvider;
use crate::error::{QueryError, QueryResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio_postgres::NoTls;

#[derive(Default)]
struct RegistryState {
    /// In registration order; the first entry is the default connection.
    params: Vec<(String, ConnectionParams)>,
    pools: HashMap<String, Pool>,
}

impl RegistryState {
    fn params(&self, name: &str) -> Option<&ConnectionParams> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }
}

/// Named connections with lazily created pools.
///
/// Parameters are registered up front; a pool is only created the first time a connection
/// is requested. Share the registry behind an `Arc`.
///
/// ```ignore
/// let registry = ConnectionRegistry::from_config(RegistryConfig::load("querykit.toml")?)?;
/// let total = Query::table("orders").count_using(&registry).await?;
/// ```
#[derive(Default)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ConnectionRegistry")
            .field("connections", &state.params)
            .field("open_pools", &state.pools.len())
            .finish()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every connection of `config`, the configured default first.
    pub fn from_config(config: RegistryConfig) -> QueryResult<Self> {
        let registry = Self::new();
        for entry in config.ordered_connections() {
            registry.add_connection(&entry.name, entry.resolve()?);
        }
        Ok(registry)
    }

    /// Register (or replace) a connection. Nothing is connected until it is requested.
    pub fn add_connection(&self, name: &str, params: ConnectionParams) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.params.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = params,
            None => state.params.push((name.to_string(), params)),
        }
        state.pools.remove(name);
    }

    /// Registered names, in registration order.
    pub fn connection_names(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.params.iter().map(|(n, _)| n.clone()).collect()
    }

    /// The first registered connection.
    pub fn default_name(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.params.first().map(|(n, _)| n.clone())
    }

    pub fn parameters(&self, name: &str) -> QueryResult<ConnectionParams> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.params(name).cloned().ok_or_else(|| not_loaded(name))
    }

    /// Set one parameter. An unknown name registers a new connection.
    ///
    /// An open pool for the connection is dropped so the next request uses the new value.
    pub fn set_parameter(&self, name: &str, key: &str, value: &str) -> QueryResult<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.params.iter_mut().find(|(n, _)| n == name) {
            Some((_, params)) => params.set(key, value)?,
            None => {
                let mut params = ConnectionParams::default();
                params.set(key, value)?;
                state.params.push((name.to_string(), params));
            }
        }
        state.pools.remove(name);
        Ok(())
    }

    /// Read one parameter. The password is refused.
    pub fn parameter(&self, name: &str, key: &str) -> QueryResult<Option<String>> {
        if key == "password" {
            return Err(QueryError::config("password is private"));
        }
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.params(name).ok_or_else(|| not_loaded(name))?.get(key)
    }

    /// The pool for `name`, created on first use.
    pub fn pool(&self, name: &str) -> QueryResult<Pool> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(pool) = state.pools.get(name) {
                return Ok(pool.clone());
            }
        }

        let params = self.parameters(name)?;
        let pool = create_pool(&params)?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let pool = state
            .pools
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::info!(
                    target: "querykit.registry",
                    connection = name,
                    max_size = params.max_pool_size,
                    "pool created"
                );
                pool
            })
            .clone();
        Ok(pool)
    }

    /// Drop the pool for `name`. Its parameters stay registered.
    pub fn disconnect(&self, name: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(pool) = state.pools.remove(name) {
            pool.close();
            tracing::info!(target: "querykit.registry", connection = name, "disconnected");
        }
    }

    /// Drop every pool and every registered connection.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        for pool in state.pools.values() {
            pool.close();
        }
        state.pools.clear();
        state.params.clear();
        tracing::info!(target: "querykit.registry", "registry cleared");
    }
}

impl ConnectionProvider for ConnectionRegistry {
    type Conn = deadpool_postgres::Client;

    async fn default_connection(&self) -> QueryResult<Self::Conn> {
        let name = self
            .default_name()
            .ok_or_else(|| QueryError::not_found("no connections registered"))?;
        self.connection(&name).await
    }

    async fn connection(&self, name: &str) -> QueryResult<Self::Conn> {
        let pool = self.pool(name)?;
        Ok(pool.get().await?)
    }
}

fn not_loaded(name: &str) -> QueryError {
    QueryError::not_found(format!("configuration for connection '{name}' not loaded"))
}

fn create_pool(params: &ConnectionParams) -> QueryResult<Pool> {
    let pg_config = params.to_pg_config()?;
    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    Pool::builder(mgr)
        .max_size(params.max_pool_size)
        .build()
        .map_err(|e| QueryError::Pool(e.to_string()))
}
