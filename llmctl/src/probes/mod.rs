//! Connection and API key tests.
//!
//! A [`Prober`] checks a single target and always produces a [`ProbeOutcome`]; it never
//! fails outright, since an unreachable host is itself the answer. Two implementations exist:
//!
//! - [`LiveProber`]: opens a TCP connection to a database (or checks a SQLite file) and calls
//!   the provider's model listing endpoint with an API key
//! - [`SimulatedProber`]: succeeds immediately without any network traffic
//!
//! The functions in this module tie a prober to the store. The target is read under the
//! table lock, the lock is released for the probe itself, and the outcome is recorded under
//! a fresh lock. A record deleted while its probe was in flight yields `NotFound`; one whose
//! target was edited meanwhile yields `Superseded` and the outcome is discarded.

pub mod executor;
pub mod simulated;

use crate::config::{ProbeMode, ProbesConfig};
use crate::db::{
    errors::{DbError, Result},
    handlers::{ApiKeys, DatabaseConnections},
    models::{
        api_keys::{ApiKeyDBResponse, Provider},
        database_connections::{DatabaseConnectionDBResponse, DatabaseType},
        probes::ProbeOutcome,
    },
    store::Store,
};
use crate::types::{ApiKeyId, DatabaseConnectionId, abbrev_uuid};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub use executor::LiveProber;
pub use simulated::SimulatedProber;

/// What a connection probe needs to know, copied out of the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    /// Database name, or the file path for SQLite
    pub database: String,
}

impl From<&DatabaseConnectionDBResponse> for ConnectionTarget {
    fn from(db: &DatabaseConnectionDBResponse) -> Self {
        Self {
            db_type: db.db_type,
            host: db.host.clone(),
            port: db.port,
            database: db.database.clone(),
        }
    }
}

/// What an API key probe needs to know, copied out of the stored record.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyTarget {
    pub provider: Provider,
    pub key: String,
}

impl fmt::Debug for ApiKeyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyTarget")
            .field("provider", &self.provider)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl From<&ApiKeyDBResponse> for ApiKeyTarget {
    fn from(db: &ApiKeyDBResponse) -> Self {
        Self {
            provider: db.provider,
            key: db.key.clone(),
        }
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe_connection(&self, target: &ConnectionTarget) -> ProbeOutcome;

    async fn probe_api_key(&self, target: &ApiKeyTarget) -> ProbeOutcome;
}

/// Build the prober selected by `probes.mode`.
pub fn build_prober(config: &ProbesConfig) -> anyhow::Result<Arc<dyn Prober>> {
    let prober: Arc<dyn Prober> = match config.mode {
        ProbeMode::Live => Arc::new(LiveProber::new(config)?),
        ProbeMode::Simulated => Arc::new(SimulatedProber),
    };
    info!(mode = ?config.mode, timeout = ?config.timeout, "Probes configured");
    Ok(prober)
}

/// Probe a stored database connection and record the outcome on it.
#[instrument(skip(store, prober), fields(connection_id = %abbrev_uuid(&id)), err)]
pub async fn test_connection(
    store: &Store,
    prober: &dyn Prober,
    id: DatabaseConnectionId,
) -> Result<(ProbeOutcome, DatabaseConnectionDBResponse)> {
    let target = {
        let table = store.connections().await;
        ConnectionTarget::from(table.get(&id).ok_or(DbError::NotFound)?)
    };

    let outcome = prober.probe_connection(&target).await;
    if let Some(error) = &outcome.error {
        warn!(host = %target.host, port = target.port, error = %error, "Connection test failed");
    }

    let mut table = store.connections().await;
    let current = table.get(&id).ok_or(DbError::NotFound)?;
    if ConnectionTarget::from(current) != target {
        info!(host = %target.host, "Connection was edited during its test, discarding the outcome");
        return Err(DbError::Superseded { table: "connections" });
    }
    let connection = DatabaseConnections::new(&mut table).record_probe(id, &outcome).await?;
    Ok((outcome, connection))
}

/// Probe a stored API key against its provider and record the outcome on it.
#[instrument(skip(store, prober), fields(api_key_id = %abbrev_uuid(&id)), err)]
pub async fn test_api_key(store: &Store, prober: &dyn Prober, id: ApiKeyId) -> Result<(ProbeOutcome, ApiKeyDBResponse)> {
    let target = {
        let table = store.api_keys().await;
        ApiKeyTarget::from(table.get(&id).ok_or(DbError::NotFound)?)
    };

    let outcome = prober.probe_api_key(&target).await;
    if let Some(error) = &outcome.error {
        warn!(provider = ?target.provider, error = %error, "API key test failed");
    }

    let mut table = store.api_keys().await;
    let current = table.get(&id).ok_or(DbError::NotFound)?;
    if ApiKeyTarget::from(current) != target {
        info!(provider = ?target.provider, "API key was edited during its test, discarding the outcome");
        return Err(DbError::Superseded { table: "api_keys" });
    }
    let api_key = ApiKeys::new(&mut table).record_probe(id, &outcome).await?;
    Ok((outcome, api_key))
}
