//! Database models for users.

use crate::api::models::users::{UserCreate, UserUpdate};
use crate::db::models::trimmed;
use crate::db::store::Record;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub usage_limit: u64,
}

impl From<UserCreate> for UserCreateDBRequest {
    fn from(api: UserCreate) -> Self {
        Self {
            name: trimmed(api.name),
            email: trimmed(api.email),
            role: api.role.unwrap_or(Role::User),
            status: api.status.unwrap_or(UserStatus::Active),
            usage_limit: api.usage_limit.unwrap_or(5000),
        }
    }
}

/// Database request for updating a user
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub usage_limit: Option<u64>,
}

impl From<UserUpdate> for UserUpdateDBRequest {
    fn from(api: UserUpdate) -> Self {
        Self {
            name: api.name.map(trimmed),
            email: api.email.map(trimmed),
            role: api.role,
            status: api.status,
            usage_limit: api.usage_limit,
        }
    }
}

/// Database response for a user
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub usage_limit: u64,
    pub usage_count: u64,
    pub api_calls_today: u64,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Record for UserDBResponse {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
