//! Database models for database connection settings.

use crate::api::models::database_connections::{DatabaseConnectionCreate, DatabaseConnectionUpdate};
use crate::db::models::trimmed;
use crate::db::store::Record;
use crate::types::DatabaseConnectionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Database engine a connection points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Postgresql,
    Mysql,
    Mongodb,
    Sqlite,
}

impl DatabaseType {
    /// Port the engine listens on out of the box. SQLite is file based and has none.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseType::Postgresql => Some(5432),
            DatabaseType::Mysql => Some(3306),
            DatabaseType::Mongodb => Some(27017),
            DatabaseType::Sqlite => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DatabaseType::Postgresql => "PostgreSQL",
            DatabaseType::Mysql => "MySQL",
            DatabaseType::Mongodb => "MongoDB",
            DatabaseType::Sqlite => "SQLite",
        }
    }
}

/// Connection state as last observed by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Never probed
    Untested,
    Connected,
    Disconnected,
    Error,
}

/// Database request for creating a new connection
#[derive(Debug, Clone)]
pub struct DatabaseConnectionCreateDBRequest {
    pub name: String,
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
}

impl From<DatabaseConnectionCreate> for DatabaseConnectionCreateDBRequest {
    fn from(api: DatabaseConnectionCreate) -> Self {
        let port = api.port.or_else(|| api.db_type.default_port()).unwrap_or(0);
        Self {
            name: trimmed(api.name),
            db_type: api.db_type,
            host: trimmed(api.host),
            port,
            database: trimmed(api.database),
            username: trimmed(api.username),
            password: api.password.map(trimmed),
        }
    }
}

/// Database request for updating a connection. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionUpdateDBRequest {
    pub name: Option<String>,
    pub db_type: Option<DatabaseType>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl From<DatabaseConnectionUpdate> for DatabaseConnectionUpdateDBRequest {
    fn from(api: DatabaseConnectionUpdate) -> Self {
        Self {
            name: api.name.map(trimmed),
            db_type: api.db_type,
            host: api.host.map(trimmed),
            port: api.port,
            database: api.database.map(trimmed),
            username: api.username.map(trimmed),
            password: api.password.map(trimmed),
        }
    }
}

/// Stored database connection
#[derive(Debug, Clone)]
pub struct DatabaseConnectionDBResponse {
    pub id: DatabaseConnectionId,
    pub name: String,
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
    pub status: ConnectionStatus,
    pub last_test: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for DatabaseConnectionDBResponse {
    type Id = DatabaseConnectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
