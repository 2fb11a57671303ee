//! Database models for LLM models and their generation parameters.

use crate::api::models::llm_models::{ModelCreate, ModelUpdate};
use crate::db::models::trimmed;
use crate::db::store::Record;
use crate::types::ModelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generation parameters applied to requests sent to a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelConfig {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// Partial generation parameters; each `Some` field replaces the stored one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelConfigUpdate {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
}

impl ModelConfigUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ModelConfig {
    /// Merge field by field, so sub-fields absent from `update` survive.
    pub fn merge(&mut self, update: &ModelConfigUpdate) {
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = update.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(top_p) = update.top_p {
            self.top_p = top_p;
        }
        if let Some(frequency_penalty) = update.frequency_penalty {
            self.frequency_penalty = frequency_penalty;
        }
        if let Some(presence_penalty) = update.presence_penalty {
            self.presence_penalty = presence_penalty;
        }
    }
}

/// Operational health of a model, as reported by an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModelHealth {
    Healthy,
    Warning,
    Error,
}

/// Database request for registering a new model
#[derive(Debug, Clone)]
pub struct ModelCreateDBRequest {
    pub id: ModelId,
    pub name: String,
    pub provider: String,
    pub version: String,
    pub context_length: u32,
    pub cost_per_1k: f64,
    pub enabled: bool,
    pub config: ModelConfig,
    pub make_default: bool,
}

impl From<ModelCreate> for ModelCreateDBRequest {
    fn from(api: ModelCreate) -> Self {
        Self {
            id: trimmed(api.id),
            name: trimmed(api.name),
            provider: trimmed(api.provider),
            version: trimmed(api.version),
            context_length: api.context_length,
            cost_per_1k: api.cost_per_1k,
            enabled: api.enabled.unwrap_or(true),
            config: api.config.unwrap_or_default(),
            make_default: api.is_default.unwrap_or(false),
        }
    }
}

/// Database request for updating a model. The default flag is deliberately absent: it
/// only moves through `Models::set_default`.
#[derive(Debug, Clone, Default)]
pub struct ModelUpdateDBRequest {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub version: Option<String>,
    pub context_length: Option<u32>,
    pub cost_per_1k: Option<f64>,
    pub enabled: Option<bool>,
    pub health: Option<ModelHealth>,
    pub config: Option<ModelConfigUpdate>,
}

impl From<ModelUpdate> for ModelUpdateDBRequest {
    fn from(api: ModelUpdate) -> Self {
        Self {
            name: api.name.map(trimmed),
            provider: api.provider.map(trimmed),
            version: api.version.map(trimmed),
            context_length: api.context_length,
            cost_per_1k: api.cost_per_1k,
            enabled: api.enabled,
            health: api.health,
            config: api.config.filter(|config| !config.is_empty()),
        }
    }
}

/// Stored model row. Whether it is the default is a property of the table, not the row.
#[derive(Debug, Clone)]
pub struct ModelRecord {
    pub id: ModelId,
    pub name: String,
    pub provider: String,
    pub version: String,
    pub context_length: u32,
    pub cost_per_1k: f64,
    pub enabled: bool,
    pub health: ModelHealth,
    pub config: ModelConfig,
    pub created_at: DateTime<Utc>,
}

impl Record for ModelRecord {
    type Id = ModelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Database response for a model, with the default flag resolved
#[derive(Debug, Clone)]
pub struct ModelDBResponse {
    pub id: ModelId,
    pub name: String,
    pub provider: String,
    pub version: String,
    pub context_length: u32,
    pub cost_per_1k: f64,
    pub enabled: bool,
    pub health: ModelHealth,
    pub config: ModelConfig,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<(&ModelRecord, bool)> for ModelDBResponse {
    fn from((record, is_default): (&ModelRecord, bool)) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            provider: record.provider.clone(),
            version: record.version.clone(),
            context_length: record.context_length,
            cost_per_1k: record.cost_per_1k,
            enabled: record.enabled,
            health: record.health,
            config: record.config.clone(),
            is_default,
            created_at: record.created_at,
        }
    }
}
