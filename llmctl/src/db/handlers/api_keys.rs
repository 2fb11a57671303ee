//! Repository for provider API keys.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        api_keys::{ApiKeyCreateDBRequest, ApiKeyDBResponse, ApiKeyStatus, ApiKeyUpdateDBRequest, Provider},
        probes::ProbeOutcome,
    },
    store::Table,
};
use crate::types::{ApiKeyId, abbrev_uuid};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing API keys
#[derive(Debug, Clone, Default)]
pub struct ApiKeyFilter {
    pub status: Option<ApiKeyStatus>,
    pub provider: Option<Provider>,
}

pub struct ApiKeys<'c> {
    table: &'c mut Table<ApiKeyDBResponse>,
}

impl<'c> ApiKeys<'c> {
    pub fn new(table: &'c mut Table<ApiKeyDBResponse>) -> Self {
        Self { table }
    }

    /// Record the outcome of a credential probe. `last_used` is stamped whatever the outcome.
    #[instrument(skip(self, outcome), fields(api_key_id = %abbrev_uuid(&id), success = outcome.success), err)]
    pub async fn record_probe(&mut self, id: ApiKeyId, outcome: &ProbeOutcome) -> Result<ApiKeyDBResponse> {
        let api_key = self.table.get_mut(&id).ok_or(DbError::NotFound)?;

        api_key.last_used = Some(outcome.checked_at);
        if outcome.success {
            api_key.status = ApiKeyStatus::Active;
            api_key.last_error = None;
        } else {
            api_key.status = ApiKeyStatus::Error;
            api_key.last_error = outcome.error.clone();
        }

        Ok(api_key.clone())
    }

    /// Count `requests` made with a key at `at`. The limit is informational and not enforced.
    #[instrument(skip(self), fields(api_key_id = %abbrev_uuid(&id)), err)]
    pub async fn record_usage(&mut self, id: ApiKeyId, requests: u64, at: DateTime<Utc>) -> Result<ApiKeyDBResponse> {
        let api_key = self.table.get_mut(&id).ok_or(DbError::NotFound)?;

        api_key.usage_count = api_key.usage_count.saturating_add(requests);
        api_key.last_used = Some(at);

        if api_key.usage_limit.is_some_and(|limit| api_key.usage_count > limit) {
            tracing::warn!(
                usage_count = api_key.usage_count,
                usage_limit = ?api_key.usage_limit,
                "API key {} is over its usage limit",
                api_key.name
            );
        }

        Ok(api_key.clone())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for ApiKeys<'c> {
    type CreateRequest = ApiKeyCreateDBRequest;
    type UpdateRequest = ApiKeyUpdateDBRequest;
    type Response = ApiKeyDBResponse;
    type Id = ApiKeyId;
    type Filter = ApiKeyFilter;

    #[instrument(skip(self, request), fields(name = %request.name, provider = ?request.provider), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let api_key = ApiKeyDBResponse {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            provider: request.provider,
            key: request.key.clone(),
            status: ApiKeyStatus::Untested,
            usage_limit: request.usage_limit,
            usage_count: 0,
            created_at: Utc::now(),
            last_used: None,
            last_error: None,
        };

        self.table.insert(api_key.clone());
        Ok(api_key)
    }

    #[instrument(skip(self), fields(api_key_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.table.get(&id).cloned())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| self.table.get(&id).map(|api_key| (id, api_key.clone())))
            .collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        Ok(self
            .table
            .iter()
            .filter(|api_key| filter.status.is_none_or(|status| api_key.status == status))
            .filter(|api_key| filter.provider.is_none_or(|provider| api_key.provider == provider))
            .cloned()
            .collect())
    }

    #[instrument(skip(self), fields(api_key_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.table.remove(&id).is_some())
    }

    #[instrument(skip(self, request), fields(api_key_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let api_key = self.table.get_mut(&id).ok_or(DbError::NotFound)?;

        if let Some(name) = &request.name {
            api_key.name = name.clone();
        }
        if let Some(provider) = request.provider {
            api_key.provider = provider;
        }
        if let Some(key) = &request.key {
            // A new secret has not been verified yet
            api_key.key = key.clone();
            api_key.status = ApiKeyStatus::Untested;
            api_key.last_error = None;
        }
        if let Some(usage_limit) = request.usage_limit {
            api_key.usage_limit = usage_limit;
        }
        if let Some(status) = request.status {
            api_key.status = status;
        }

        Ok(api_key.clone())
    }
}
