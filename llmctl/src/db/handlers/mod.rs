//! Repository implementations for store access.
//!
//! This module provides repository structs for each entity kind managed by the service.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a mutable borrow of one locked table from [`crate::db::store::Store`]
//! - Provides strongly-typed CRUD operations
//! - Returns domain models from [`crate::db::models`]
//! - Holds the table lock only for as long as the repository lives
//!
//! # Available Repositories
//!
//! - [`DatabaseConnections`]: Database connection settings and probe results
//! - [`ApiKeys`]: Provider API keys, usage counters and probe results
//! - [`Models`]: Models and the default-model pointer
//! - [`Users`]: User accounts and usage counters
//!
//! # Common Pattern
//!
//! ```ignore
//! use llmctl::db::handlers::{Repository, Users};
//!
//! async fn example(store: &llmctl::db::store::Store) -> llmctl::db::errors::Result<()> {
//!     let mut table = store.users().await;
//!     let mut repo = Users::new(&mut table);
//!
//!     let users = repo.list(&Default::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod api_keys;
pub mod database_connections;
pub mod llm_models;
pub mod repository;
pub mod users;

pub use api_keys::ApiKeys;
pub use database_connections::DatabaseConnections;
pub use llm_models::Models;
pub use repository::Repository;
pub use users::Users;
