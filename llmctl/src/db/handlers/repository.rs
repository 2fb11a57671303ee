//! Base repository trait for store operations.

use std::collections::HashMap;

/// Contains the Repository trait.
///
/// A repository is the data access layer for one table of the in-memory store. It provides
/// methods for creating, reading, updating, and deleting entities, as well as listing them
/// with simple filters. Handlers depend on this abstraction rather than on the tables
/// themselves, so a remote backend can replace the store without touching them.
use crate::db::errors::Result;

/// Base repository trait providing common store operations
///
/// This trait has separate associated types for create requests, update requests, and responses.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// Get lots of entities by their IDs, keyed by ID
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>>;

    /// List entities in insertion order, with filtering
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Delete an entity by ID, returning whether it existed
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Update an entity by ID, merging only the fields present in the request
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
