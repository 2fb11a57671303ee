//! Dashboard aggregates.

use crate::types::ModelId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConnectionCounts {
    pub total: usize,
    pub untested: usize,
    pub connected: usize,
    pub disconnected: usize,
    pub error: usize,
}

/// Aggregates computed at request time across every collection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    pub connections: ConnectionCounts,
    pub api_keys_total: usize,
    pub api_keys_active: usize,
    /// Sum of `usage_count` over all keys
    pub api_key_usage_total: u64,
    pub models_total: usize,
    pub models_enabled: usize,
    /// Mean `cost_per_1k` over all models; null when there are none
    pub average_cost_per_1k: Option<f64>,
    pub default_model: Option<ModelId>,
    pub users_total: usize,
    pub users_active: usize,
    pub api_calls_today: u64,
}
