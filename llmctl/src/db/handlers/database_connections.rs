//! Repository for database connection settings.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        database_connections::{
            ConnectionStatus, DatabaseConnectionCreateDBRequest, DatabaseConnectionDBResponse, DatabaseConnectionUpdateDBRequest,
        },
        probes::ProbeOutcome,
    },
    store::Table,
};
use crate::types::{DatabaseConnectionId, abbrev_uuid};
use chrono::Utc;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing connections
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionFilter {
    pub status: Option<ConnectionStatus>,
}

pub struct DatabaseConnections<'c> {
    table: &'c mut Table<DatabaseConnectionDBResponse>,
}

impl<'c> DatabaseConnections<'c> {
    pub fn new(table: &'c mut Table<DatabaseConnectionDBResponse>) -> Self {
        Self { table }
    }

    /// Record the outcome of a connectivity probe.
    ///
    /// The timestamp is stamped whatever the outcome. A failure keeps the stored settings
    /// and only flips the status and reason.
    #[instrument(skip(self, outcome), fields(connection_id = %abbrev_uuid(&id), success = outcome.success), err)]
    pub async fn record_probe(&mut self, id: DatabaseConnectionId, outcome: &ProbeOutcome) -> Result<DatabaseConnectionDBResponse> {
        let connection = self.table.get_mut(&id).ok_or(DbError::NotFound)?;

        connection.last_test = Some(outcome.checked_at);
        if outcome.success {
            connection.status = ConnectionStatus::Connected;
            connection.last_error = None;
        } else {
            connection.status = ConnectionStatus::Error;
            connection.last_error = outcome.error.clone();
        }

        Ok(connection.clone())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for DatabaseConnections<'c> {
    type CreateRequest = DatabaseConnectionCreateDBRequest;
    type UpdateRequest = DatabaseConnectionUpdateDBRequest;
    type Response = DatabaseConnectionDBResponse;
    type Id = DatabaseConnectionId;
    type Filter = DatabaseConnectionFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let connection = DatabaseConnectionDBResponse {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            db_type: request.db_type,
            host: request.host.clone(),
            port: request.port,
            database: request.database.clone(),
            username: request.username.clone(),
            password: request.password.clone(),
            status: ConnectionStatus::Untested,
            last_test: None,
            last_error: None,
            created_at: Utc::now(),
        };

        self.table.insert(connection.clone());
        Ok(connection)
    }

    #[instrument(skip(self), fields(connection_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.table.get(&id).cloned())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| self.table.get(&id).map(|connection| (id, connection.clone())))
            .collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        Ok(self
            .table
            .iter()
            .filter(|connection| filter.status.is_none_or(|status| connection.status == status))
            .cloned()
            .collect())
    }

    #[instrument(skip(self), fields(connection_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.table.remove(&id).is_some())
    }

    #[instrument(skip(self, request), fields(connection_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let connection = self.table.get_mut(&id).ok_or(DbError::NotFound)?;

        let retarget = request.db_type.is_some()
            || request.host.is_some()
            || request.port.is_some()
            || request.database.is_some()
            || request.username.is_some()
            || request.password.is_some();

        if let Some(name) = &request.name {
            connection.name = name.clone();
        }
        if let Some(db_type) = request.db_type {
            connection.db_type = db_type;
        }
        if let Some(host) = &request.host {
            connection.host = host.clone();
        }
        if let Some(port) = request.port {
            connection.port = port;
        }
        if let Some(database) = &request.database {
            connection.database = database.clone();
        }
        if let Some(username) = &request.username {
            connection.username = username.clone();
        }
        if let Some(password) = &request.password {
            connection.password = Some(password.clone());
        }
        if retarget {
            // New settings have not been probed yet
            connection.status = ConnectionStatus::Untested;
            connection.last_error = None;
        }

        Ok(connection.clone())
    }
}
