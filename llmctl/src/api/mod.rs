//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything is served under `/admin/api/v1`:
//!
//! - **Connections** (`/connections/*`): Database connections and their tests
//! - **API keys** (`/api-keys/*`): Provider keys, secret reveal, usage and tests
//! - **Models** (`/models/*`): Model catalogue, enablement and the default model
//! - **Users** (`/users/*`): Accounts, roles and status
//! - **Summary** (`/summary`): Dashboard aggregates
//! - **Chat** (`/chat/*`): The shared chat session
//!
//! Each record kind also has a `/form` variant of create and edit that accepts raw field texts.
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa`; the rendered docs are at `/admin/docs`.

pub mod handlers;
pub mod models;
