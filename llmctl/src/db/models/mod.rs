//! Stored record models.
//!
//! This module contains the struct definitions held in the in-memory tables, together with
//! the create/update requests the repositories accept. These models are used by
//! repositories to return query results and accept insertion/update data.
//!
//! # Design Principles
//!
//! - **Separation**: Stored models are distinct from API models to allow independent
//!   evolution of storage and API representations (secrets, for example, are stored here
//!   but masked in every API response)
//! - **Closed enumerations**: every status is an enum, so adding a status is a
//!   compile-checked change wherever statuses are matched
//! - **Partial updates**: update requests are all-`Option`; `None` leaves the stored value
//!   untouched
//!
//! # Model Categories
//!
//! - [`database_connections`]: Database connection settings and probe state
//! - [`api_keys`]: Provider API keys, usage counters and probe state
//! - [`llm_models`]: Models, generation parameters and health
//! - [`users`]: User accounts and usage counters
//! - [`probes`]: Probe outcomes shared by connections and API keys

pub mod api_keys;
pub mod database_connections;
pub mod llm_models;
pub mod probes;
pub mod users;

/// Surrounding whitespace is never stored, whether a record arrives as JSON or as form text.
pub(crate) fn trimmed(text: String) -> String {
    let trimmed = text.trim();
    if trimmed.len() == text.len() { text } else { trimmed.to_string() }
}
