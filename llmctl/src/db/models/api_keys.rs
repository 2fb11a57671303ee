//! Database models for provider API keys.

use crate::api::models::api_keys::{ApiKeyCreate, ApiKeyUpdate};
use crate::db::models::trimmed;
use crate::db::store::Record;
use crate::types::ApiKeyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// LLM vendor a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Openai,
    Anthropic,
    Google,
    Cohere,
    Huggingface,
}

impl Provider {
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Openai => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Google => "Google AI",
            Provider::Cohere => "Cohere",
            Provider::Huggingface => "Hugging Face",
        }
    }
}

/// Key state as last observed by a probe, or as set by an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyStatus {
    /// Never probed
    Untested,
    Active,
    Inactive,
    Error,
}

/// Database request for creating a new API key
#[derive(Debug, Clone)]
pub struct ApiKeyCreateDBRequest {
    pub name: String,
    pub provider: Provider,
    pub key: String,
    pub usage_limit: Option<u64>,
}

impl From<ApiKeyCreate> for ApiKeyCreateDBRequest {
    fn from(api: ApiKeyCreate) -> Self {
        Self {
            name: trimmed(api.name),
            provider: api.provider,
            key: trimmed(api.key),
            usage_limit: api.usage_limit,
        }
    }
}

/// Database request for updating an API key
#[derive(Debug, Clone, Default)]
pub struct ApiKeyUpdateDBRequest {
    pub name: Option<String>,
    pub provider: Option<Provider>,
    pub key: Option<String>,
    /// `Some(None)` removes the limit
    pub usage_limit: Option<Option<u64>>,
    pub status: Option<ApiKeyStatus>,
}

impl From<ApiKeyUpdate> for ApiKeyUpdateDBRequest {
    fn from(api: ApiKeyUpdate) -> Self {
        Self {
            name: api.name.map(trimmed),
            provider: api.provider,
            key: api.key.map(trimmed),
            usage_limit: api.usage_limit,
            status: api.status,
        }
    }
}

/// Stored API key, including the secret
#[derive(Debug, Clone)]
pub struct ApiKeyDBResponse {
    pub id: ApiKeyId,
    pub name: String,
    pub provider: Provider,
    pub key: String,
    pub status: ApiKeyStatus,
    pub usage_limit: Option<u64>,
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Record for ApiKeyDBResponse {
    type Id = ApiKeyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
