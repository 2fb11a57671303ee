//! Axum route handlers, one module per resource.
//!
//! Every record kind is served twice: as typed JSON (`POST /{kind}`, `PATCH /{kind}/{id}`)
//! and through its form (`/{kind}/form`, `/{kind}/{id}/form`), which accepts the raw field
//! texts of the editor. Both paths end in the same repository call.

pub mod api_keys;
pub mod chat;
pub mod database_connections;
pub mod forms;
pub mod llm_models;
pub mod summary;
pub mod users;

use crate::db::errors::DbError;
use crate::errors::Error;
use crate::types::EntityKind;

/// Turn a repository's bare `NotFound` into one naming the record that was asked for.
pub(crate) fn or_not_found(kind: EntityKind, id: impl std::fmt::Display) -> impl FnOnce(DbError) -> Error {
    move |e| match e {
        DbError::NotFound => Error::not_found(kind, id),
        other => other.into(),
    }
}
