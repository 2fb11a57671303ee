//! Dashboard aggregates, computed from the tables on every request.

use crate::AppState;
use crate::api::models::summary::{ConnectionCounts, SummaryResponse};
use crate::db::models::{api_keys::ApiKeyStatus, database_connections::ConnectionStatus, users::UserStatus};
use crate::errors::Result;
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/summary",
    tag = "summary",
    summary = "Dashboard summary",
    description = "Counts and totals across connections, API keys, models and users.",
    responses(
        (status = 200, description = "Current aggregates", body = SummaryResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>> {
    // One table locked at a time
    let connections = {
        let table = state.store.connections().await;
        table.iter().fold(ConnectionCounts::default(), |mut counts, connection| {
            counts.total += 1;
            match connection.status {
                ConnectionStatus::Untested => counts.untested += 1,
                ConnectionStatus::Connected => counts.connected += 1,
                ConnectionStatus::Disconnected => counts.disconnected += 1,
                ConnectionStatus::Error => counts.error += 1,
            }
            counts
        })
    };

    let (api_keys_total, api_keys_active, api_key_usage_total) = {
        let table = state.store.api_keys().await;
        (
            table.len(),
            table.iter().filter(|key| key.status == ApiKeyStatus::Active).count(),
            table.iter().map(|key| key.usage_count).fold(0, u64::saturating_add),
        )
    };

    let (models_total, models_enabled, average_cost_per_1k, default_model) = {
        let table = state.store.models().await;
        let total = table.len();
        let average = (total > 0).then(|| table.iter().map(|model| model.cost_per_1k).sum::<f64>() / total as f64);
        (
            total,
            table.iter().filter(|model| model.enabled).count(),
            average,
            table.default_id().cloned(),
        )
    };

    let (users_total, users_active, api_calls_today) = {
        let table = state.store.users().await;
        (
            table.len(),
            table.iter().filter(|user| user.status == UserStatus::Active).count(),
            table.iter().map(|user| user.api_calls_today).fold(0, u64::saturating_add),
        )
    };

    Ok(Json(SummaryResponse {
        connections,
        api_keys_total,
        api_keys_active,
        api_key_usage_total,
        models_total,
        models_enabled,
        average_cost_per_1k,
        default_model,
        users_total,
        users_active,
        api_calls_today,
    }))
}
