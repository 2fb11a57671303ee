//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from stored models, so secrets can
//!   be stored in full but masked or omitted in every response
//! - **Validation**: request bodies implement [`crate::validation::Validate`]; handlers call
//!   it before touching the store and answer 422 with every failing field
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API docs
//!
//! # Model Categories
//!
//! - [`database_connections`]: Connection settings (the password is write-only)
//! - [`api_keys`]: Provider API keys (the secret is masked)
//! - [`llm_models`]: Models and their generation parameters
//! - [`users`]: User accounts
//! - [`probes`]: Results of the test endpoints
//! - [`chat`]: Chat session payloads
//! - [`summary`]: Dashboard aggregates

pub mod api_keys;
pub mod chat;
pub mod database_connections;
pub mod llm_models;
pub mod probes;
pub mod summary;
pub mod users;
