//! API request/response models for database connections.

use crate::db::models::database_connections::{ConnectionStatus, DatabaseConnectionDBResponse, DatabaseType};
use crate::types::DatabaseConnectionId;
use crate::validation::{Validate, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatabaseConnectionCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    pub host: String,
    /// Defaults to the engine's standard port when omitted
    pub port: Option<u16>,
    pub database: String,
    pub username: String,
    /// Write-only: never included in a response
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DatabaseConnectionUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub db_type: Option<DatabaseType>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatabaseConnectionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DatabaseConnectionId,
    pub name: String,
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    /// Whether a password is stored. The password itself is never returned.
    pub has_password: bool,
    pub status: ConnectionStatus,
    pub last_test: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing connections
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListDatabaseConnectionsQuery {
    /// Only return connections in this state
    pub status: Option<ConnectionStatus>,
}

impl From<DatabaseConnectionDBResponse> for DatabaseConnectionResponse {
    fn from(db: DatabaseConnectionDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            db_type: db.db_type,
            host: db.host,
            port: db.port,
            database: db.database,
            username: db.username,
            has_password: db.password.is_some_and(|p| !p.is_empty()),
            status: db.status,
            last_test: db.last_test,
            last_error: db.last_error,
            created_at: db.created_at,
        }
    }
}

fn check_port(v: &mut Validator, port: Option<u16>) {
    if let Some(port) = port {
        v.within("port", port, 1..=u16::MAX);
    }
}

impl Validate for DatabaseConnectionCreate {
    fn check(&self, v: &mut Validator) {
        v.required("name", &self.name);
        // SQLite is a local file: no server to reach
        if self.db_type != DatabaseType::Sqlite {
            v.required("host", &self.host);
            v.required("username", &self.username);
        }
        v.required("database", &self.database);
        check_port(v, self.port);
    }
}

impl Validate for DatabaseConnectionUpdate {
    fn check(&self, v: &mut Validator) {
        v.required_if_present("name", self.name.as_deref());
        v.required_if_present("database", self.database.as_deref());
        if self.db_type != Some(DatabaseType::Sqlite) {
            v.required_if_present("host", self.host.as_deref());
            v.required_if_present("username", self.username.as_deref());
        }
        check_port(v, self.port);
    }
}
