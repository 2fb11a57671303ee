//! Common type definitions shared across the store, the editor and the API.
//!
//! # ID Types
//!
//! Records generated by the service are identified by UUIDs wrapped in type aliases:
//!
//! - [`DatabaseConnectionId`]: Database connection identifier
//! - [`ApiKeyId`]: Provider API key identifier
//! - [`UserId`]: User account identifier
//!
//! Models are the exception: [`ModelId`] is a caller-chosen slug (e.g. `gpt-4`) because chat
//! requests refer to models by that identifier.
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

// Type aliases for IDs
pub type DatabaseConnectionId = Uuid;
pub type ApiKeyId = Uuid;
pub type UserId = Uuid;
pub type ModelId = String;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// The four kinds of configuration record managed by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    DatabaseConnection,
    ApiKey,
    Model,
    User,
}

impl EntityKind {
    /// Human readable resource name, used in error messages.
    pub fn resource_name(&self) -> &'static str {
        match self {
            EntityKind::DatabaseConnection => "Database connection",
            EntityKind::ApiKey => "API key",
            EntityKind::Model => "Model",
            EntityKind::User => "User",
        }
    }

    /// Name of the backing table in the in-memory store.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::DatabaseConnection => "database_connections",
            EntityKind::ApiKey => "api_keys",
            EntityKind::Model => "models",
            EntityKind::User => "users",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }

    #[test]
    fn test_entity_kind_names() {
        assert_eq!(EntityKind::ApiKey.to_string(), "API key");
        assert_eq!(EntityKind::Model.table(), "models");
    }
}
