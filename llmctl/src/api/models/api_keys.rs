//! API request/response models for provider API keys.
//!
//! Responses never carry the secret. They carry `masked_key` instead, and the full value is
//! only served by the explicit reveal endpoint as an [`ApiKeySecretResponse`].

use crate::db::models::api_keys::{ApiKeyDBResponse, ApiKeyStatus, Provider};
use crate::forms::visibility::SecretVisibility;
use crate::types::ApiKeyId;
use crate::validation::{Validate, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

// API Key request models.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyCreate {
    pub name: String,
    pub provider: Provider,
    /// The provider secret
    pub key: String,
    /// Requests per month (null = no limit)
    pub usage_limit: Option<u64>,
}

// API Key update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyUpdate {
    pub name: Option<String>,
    pub provider: Option<Provider>,
    /// Replacing the secret resets the key to `untested`
    pub key: Option<String>,
    /// Requests per month (None = no change, Some(None) = remove limit)
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub usage_limit: Option<Option<u64>>,
    /// Operators may only switch a key between `active` and `inactive`
    pub status: Option<ApiKeyStatus>,
}

// API Key response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ApiKeyId,
    pub name: String,
    pub provider: Provider,
    /// The secret with every character replaced by a bullet
    pub masked_key: String,
    pub status: ApiKeyStatus,
    pub usage_limit: Option<u64>,
    pub usage_count: u64,
    /// Informational only: requests are never refused because of it
    pub usage_exceeded: bool,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Full secret, returned only by the reveal endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeySecretResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ApiKeyId,
    pub key: String,
}

/// How one key's secret is currently displayed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyVisibilityResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ApiKeyId,
    pub revealed: bool,
    /// The full secret when revealed, otherwise the masked text
    pub display: String,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListApiKeysQuery {
    /// Only return keys in this state
    pub status: Option<ApiKeyStatus>,
    /// Only return keys for this provider
    pub provider: Option<Provider>,
}

impl From<ApiKeyDBResponse> for ApiKeyResponse {
    fn from(db: ApiKeyDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            provider: db.provider,
            masked_key: SecretVisibility::mask(&db.key),
            status: db.status,
            usage_exceeded: db.usage_limit.is_some_and(|limit| db.usage_count > limit),
            usage_limit: db.usage_limit,
            usage_count: db.usage_count,
            created_at: db.created_at,
            last_used: db.last_used,
            last_error: db.last_error,
        }
    }
}

impl From<ApiKeyDBResponse> for ApiKeySecretResponse {
    fn from(db: ApiKeyDBResponse) -> Self {
        Self { id: db.id, key: db.key }
    }
}

impl Validate for ApiKeyCreate {
    fn check(&self, v: &mut Validator) {
        v.required("name", &self.name);
        v.required("key", &self.key);
        if let Some(limit) = self.usage_limit {
            v.at_least("usage_limit", limit, 1);
        }
    }
}

impl Validate for ApiKeyUpdate {
    fn check(&self, v: &mut Validator) {
        v.required_if_present("name", self.name.as_deref());
        v.required_if_present("key", self.key.as_deref());
        if let Some(Some(limit)) = self.usage_limit {
            v.at_least("usage_limit", limit, 1);
        }
        if self
            .status
            .is_some_and(|status| !matches!(status, ApiKeyStatus::Active | ApiKeyStatus::Inactive))
        {
            v.push("status", "can only be set to active or inactive");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    fn db_key(usage_count: u64, usage_limit: Option<u64>) -> ApiKeyDBResponse {
        ApiKeyDBResponse {
            id: uuid::Uuid::new_v4(),
            name: "OpenAI Production".to_string(),
            provider: Provider::Openai,
            key: "sk-abc123".to_string(),
            status: ApiKeyStatus::Active,
            usage_limit,
            usage_count,
            created_at: Utc::now(),
            last_used: None,
            last_error: None,
        }
    }

    #[test]
    fn test_response_masks_secret() {
        let response = ApiKeyResponse::from(db_key(0, None));
        assert_eq!(response.masked_key, "•••••••••");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("sk-abc123"));
    }

    #[test]
    fn test_usage_exceeded_is_informational() {
        assert!(ApiKeyResponse::from(db_key(10_001, Some(10_000))).usage_exceeded);
        assert!(!ApiKeyResponse::from(db_key(10_000, Some(10_000))).usage_exceeded);
        assert!(!ApiKeyResponse::from(db_key(u64::MAX, None)).usage_exceeded);
    }

    #[test]
    fn test_update_distinguishes_absent_and_null_limit() {
        let absent: ApiKeyUpdate = serde_json::from_str(r#"{"name": "Renamed"}"#).unwrap();
        assert_eq!(absent.usage_limit, None);

        let cleared: ApiKeyUpdate = serde_json::from_str(r#"{"usage_limit": null}"#).unwrap();
        assert_eq!(cleared.usage_limit, Some(None));

        let set: ApiKeyUpdate = serde_json::from_str(r#"{"usage_limit": 500}"#).unwrap();
        assert_eq!(set.usage_limit, Some(Some(500)));
    }

    #[test]
    fn test_update_rejects_probe_owned_status() {
        let update = ApiKeyUpdate {
            status: Some(ApiKeyStatus::Error),
            usage_limit: Some(Some(0)),
            ..Default::default()
        };
        let Err(Error::Validation { errors }) = update.validate() else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["usage_limit", "status"]);
    }
}
