//! Repository for LLM models and the default-model pointer.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::llm_models::{ModelCreateDBRequest, ModelDBResponse, ModelHealth, ModelRecord, ModelUpdateDBRequest},
    store::ModelTable,
};
use crate::types::ModelId;
use chrono::Utc;
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing models
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    pub enabled: Option<bool>,
}

pub struct Models<'c> {
    table: &'c mut ModelTable,
}

impl<'c> Models<'c> {
    pub fn new(table: &'c mut ModelTable) -> Self {
        Self { table }
    }

    fn response(&self, record: &ModelRecord) -> ModelDBResponse {
        ModelDBResponse::from((record, self.table.is_default(&record.id)))
    }

    fn existing(&self, id: &ModelId) -> Result<ModelDBResponse> {
        self.table.get(id).map(|record| self.response(record)).ok_or(DbError::NotFound)
    }

    /// Flip `enabled`, leaving every other field alone.
    #[instrument(skip(self), err)]
    pub async fn toggle_enabled(&mut self, id: &ModelId) -> Result<ModelDBResponse> {
        let record = self.table.get_mut(id).ok_or(DbError::NotFound)?;
        record.enabled = !record.enabled;
        tracing::debug!(enabled = record.enabled, "Toggled model {}", id);
        self.existing(id)
    }

    /// Make `id` the single default model.
    #[instrument(skip(self), err)]
    pub async fn set_default(&mut self, id: &ModelId) -> Result<ModelDBResponse> {
        let previous = self.table.default_id().cloned();
        if !self.table.set_default(id) {
            return Err(DbError::NotFound);
        }
        tracing::info!(previous = ?previous, "Default model is now {}", id);
        self.existing(id)
    }

    /// The current default model, if any model exists.
    #[instrument(skip(self), err)]
    pub async fn default_model(&mut self) -> Result<Option<ModelDBResponse>> {
        Ok(self
            .table
            .default_id()
            .and_then(|id| self.table.get(id))
            .map(|record| self.response(record)))
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Models<'c> {
    type CreateRequest = ModelCreateDBRequest;
    type UpdateRequest = ModelUpdateDBRequest;
    type Response = ModelDBResponse;
    type Id = ModelId;
    type Filter = ModelFilter;

    #[instrument(skip(self, request), fields(model_id = %request.id, make_default = request.make_default), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        if self.table.contains(&request.id) {
            return Err(DbError::UniqueViolation {
                table: "models",
                field: "id",
                conflicting_value: request.id.clone(),
            });
        }

        let record = ModelRecord {
            id: request.id.clone(),
            name: request.name.clone(),
            provider: request.provider.clone(),
            version: request.version.clone(),
            context_length: request.context_length,
            cost_per_1k: request.cost_per_1k,
            enabled: request.enabled,
            health: ModelHealth::Healthy,
            config: request.config.clone(),
            created_at: Utc::now(),
        };

        self.table.insert(record, request.make_default);
        self.existing(&request.id)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.table.get(&id).map(|record| self.response(record)))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| {
                let response = self.table.get(&id).map(|record| self.response(record))?;
                Some((id, response))
            })
            .collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        Ok(self
            .table
            .iter()
            .filter(|record| filter.enabled.is_none_or(|enabled| record.enabled == enabled))
            .map(|record| self.response(record))
            .collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let was_default = self.table.is_default(&id);
        let removed = self.table.remove(&id).is_some();
        if removed && was_default {
            tracing::info!(promoted = ?self.table.default_id(), "Deleted the default model {}", id);
        }
        Ok(removed)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let record = self.table.get_mut(&id).ok_or(DbError::NotFound)?;

        if let Some(name) = &request.name {
            record.name = name.clone();
        }
        if let Some(provider) = &request.provider {
            record.provider = provider.clone();
        }
        if let Some(version) = &request.version {
            record.version = version.clone();
        }
        if let Some(context_length) = request.context_length {
            record.context_length = context_length;
        }
        if let Some(cost_per_1k) = request.cost_per_1k {
            record.cost_per_1k = cost_per_1k;
        }
        if let Some(enabled) = request.enabled {
            record.enabled = enabled;
        }
        if let Some(health) = request.health {
            record.health = health;
        }
        if let Some(config) = &request.config {
            record.config.merge(config);
        }

        self.existing(&id)
    }
}
