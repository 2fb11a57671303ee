//! API request/response models for LLM models.

use crate::db::models::llm_models::{ModelConfig, ModelConfigUpdate, ModelDBResponse, ModelHealth};
use crate::types::ModelId;
use crate::validation::{Validate, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelCreate {
    /// Slug the chat session refers to the model by, e.g. `gpt-4`
    pub id: ModelId,
    pub name: String,
    pub provider: String,
    pub version: String,
    pub context_length: u32,
    /// Cost in USD per 1K tokens
    pub cost_per_1k: f64,
    /// Defaults to true
    pub enabled: Option<bool>,
    /// Defaults to temperature 0.7, max_tokens 4096, top_p 1.0 and no penalties
    pub config: Option<ModelConfig>,
    /// Make this the default model. The first model created is always the default.
    pub is_default: Option<bool>,
}

/// Partial update. The default flag is moved with `POST /models/{id}/default` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ModelUpdate {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub version: Option<String>,
    pub context_length: Option<u32>,
    pub cost_per_1k: Option<f64>,
    pub enabled: Option<bool>,
    pub health: Option<ModelHealth>,
    /// Merged field by field: omitted parameters keep their current value
    pub config: Option<ModelConfigUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelResponse {
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

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListModelsQuery {
    /// Only return enabled (true) or disabled (false) models
    pub enabled: Option<bool>,
}

impl From<ModelDBResponse> for ModelResponse {
    fn from(db: ModelDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            provider: db.provider,
            version: db.version,
            context_length: db.context_length,
            cost_per_1k: db.cost_per_1k,
            enabled: db.enabled,
            health: db.health,
            config: db.config,
            is_default: db.is_default,
            created_at: db.created_at,
        }
    }
}

/// Path segments routed to model endpoints other than `/models/{id}`.
const RESERVED_MODEL_IDS: &[&str] = &["default", "form"];

fn check_model_id(v: &mut Validator, id: &str) {
    let id = id.trim();
    if id.is_empty() {
        v.push("id", "is required");
    } else if RESERVED_MODEL_IDS.contains(&id) {
        v.push("id", format!("'{id}' is reserved"));
    } else if !id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
        v.push("id", "may only contain letters, digits, '-', '_' and '.'");
    }
}

fn check_cost(v: &mut Validator, cost_per_1k: f64) {
    if !cost_per_1k.is_finite() {
        v.push("cost_per_1k", "must be a number");
    } else {
        v.at_least("cost_per_1k", cost_per_1k, 0.0);
    }
}

/// Generation parameter rules, shared by full configs and partial ones.
fn check_config(v: &mut Validator, config: &ModelConfigUpdate) {
    if let Some(temperature) = config.temperature {
        v.within("config.temperature", temperature, 0.0..=2.0);
    }
    if let Some(max_tokens) = config.max_tokens {
        v.at_least("config.max_tokens", max_tokens, 1);
    }
    if let Some(top_p) = config.top_p {
        v.within("config.top_p", top_p, 0.0..=1.0);
    }
    if let Some(frequency_penalty) = config.frequency_penalty {
        v.within("config.frequency_penalty", frequency_penalty, -2.0..=2.0);
    }
    if let Some(presence_penalty) = config.presence_penalty {
        v.within("config.presence_penalty", presence_penalty, -2.0..=2.0);
    }
}

impl From<&ModelConfig> for ModelConfigUpdate {
    fn from(config: &ModelConfig) -> Self {
        Self {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            top_p: Some(config.top_p),
            frequency_penalty: Some(config.frequency_penalty),
            presence_penalty: Some(config.presence_penalty),
        }
    }
}

impl Validate for ModelCreate {
    fn check(&self, v: &mut Validator) {
        check_model_id(v, &self.id);
        v.required("name", &self.name);
        v.required("provider", &self.provider);
        v.required("version", &self.version);
        v.at_least("context_length", self.context_length, 1);
        check_cost(v, self.cost_per_1k);
        if let Some(config) = &self.config {
            check_config(v, &config.into());
        }
    }
}

impl Validate for ModelUpdate {
    fn check(&self, v: &mut Validator) {
        v.required_if_present("name", self.name.as_deref());
        v.required_if_present("provider", self.provider.as_deref());
        v.required_if_present("version", self.version.as_deref());
        if let Some(context_length) = self.context_length {
            v.at_least("context_length", context_length, 1);
        }
        if let Some(cost_per_1k) = self.cost_per_1k {
            check_cost(v, cost_per_1k);
        }
        if let Some(config) = &self.config {
            check_config(v, config);
        }
    }
}
