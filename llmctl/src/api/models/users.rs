//! API request/response models for users.

use crate::db::models::users::{Role, UserDBResponse, UserStatus};
use crate::types::UserId;
use crate::validation::{Validate, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    /// Defaults to `user`
    pub role: Option<Role>,
    /// Defaults to `active`
    pub status: Option<UserStatus>,
    /// Requests per month, defaults to 5000
    pub usage_limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub usage_limit: Option<u64>,
}

/// Inline status change (activate, deactivate, suspend)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserStatusUpdate {
    pub status: UserStatus,
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub usage_limit: u64,
    pub usage_count: u64,
    /// Informational only: requests are never refused because of it
    pub usage_exceeded: bool,
    pub api_calls_today: u64,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    pub status: Option<UserStatus>,
    pub role: Option<Role>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            role: db.role,
            status: db.status,
            usage_exceeded: db.usage_count > db.usage_limit,
            usage_limit: db.usage_limit,
            usage_count: db.usage_count,
            api_calls_today: db.api_calls_today,
            last_login: db.last_login,
            created_at: db.created_at,
        }
    }
}

impl Validate for UserCreate {
    fn check(&self, v: &mut Validator) {
        v.required("name", &self.name);
        v.email("email", &self.email);
        if let Some(limit) = self.usage_limit {
            v.at_least("usage_limit", limit, 1);
        }
    }
}

impl Validate for UserUpdate {
    fn check(&self, v: &mut Validator) {
        v.required_if_present("name", self.name.as_deref());
        if let Some(email) = &self.email {
            v.email("email", email);
        }
        if let Some(limit) = self.usage_limit {
            v.at_least("usage_limit", limit, 1);
        }
    }
}
