//! Responses of the connection and API key test endpoints.
//!
//! A failed probe is not an HTTP error: the endpoint answers 200 with `outcome.success`
//! false and the record already flipped to its `error` state.

use super::api_keys::ApiKeyResponse;
use super::database_connections::DatabaseConnectionResponse;
use crate::db::models::probes::ProbeOutcome;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionTestResponse {
    pub outcome: ProbeOutcome,
    /// The connection after the outcome was recorded
    pub connection: DatabaseConnectionResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyTestResponse {
    pub outcome: ProbeOutcome,
    /// The key after the outcome was recorded
    pub api_key: ApiKeyResponse,
}
