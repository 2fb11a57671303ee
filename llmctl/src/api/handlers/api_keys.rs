use crate::api::handlers::{forms, or_not_found};
use crate::api::models::api_keys::{
    ApiKeyCreate, ApiKeyResponse, ApiKeySecretResponse, ApiKeyUpdate, ApiKeyVisibilityResponse, ListApiKeysQuery,
};
use crate::api::models::probes::ApiKeyTestResponse;
use crate::db::handlers::{ApiKeys, Repository, api_keys::ApiKeyFilter};
use crate::db::models::api_keys::{ApiKeyCreateDBRequest, ApiKeyUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::forms::{ApiKeyForm, FormSubmission, FormView};
use crate::types::{ApiKeyId, EntityKind, abbrev_uuid};
use crate::validation::Validate;
use crate::{AppState, probes};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

async fn load(state: &AppState, id: ApiKeyId) -> Result<ApiKeyResponse> {
    let mut table = state.store.api_keys().await;
    let mut repo = ApiKeys::new(&mut table);
    repo.get_by_id(id)
        .await?
        .map(ApiKeyResponse::from)
        .ok_or_else(|| Error::not_found(EntityKind::ApiKey, id))
}

async fn insert(state: &AppState, create: ApiKeyCreate) -> Result<(StatusCode, Json<ApiKeyResponse>)> {
    let mut table = state.store.api_keys().await;
    let mut repo = ApiKeys::new(&mut table);
    let api_key = repo.create(&ApiKeyCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(ApiKeyResponse::from(api_key))))
}

async fn apply(state: &AppState, id: ApiKeyId, update: ApiKeyUpdate) -> Result<Json<ApiKeyResponse>> {
    let mut table = state.store.api_keys().await;
    let mut repo = ApiKeys::new(&mut table);
    let api_key = repo
        .update(id, &ApiKeyUpdateDBRequest::from(update))
        .await
        .map_err(or_not_found(EntityKind::ApiKey, id))?;
    Ok(Json(ApiKeyResponse::from(api_key)))
}

#[utoipa::path(
    get,
    path = "/api-keys",
    tag = "api_keys",
    summary = "List API keys",
    description = "Secrets are masked. Use the reveal endpoint to read a full key.",
    params(ListApiKeysQuery),
    responses(
        (status = 200, description = "API keys in creation order", body = Vec<ApiKeyResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_api_keys(State(state): State<AppState>, Query(query): Query<ListApiKeysQuery>) -> Result<Json<Vec<ApiKeyResponse>>> {
    let mut table = state.store.api_keys().await;
    let mut repo = ApiKeys::new(&mut table);
    let filter = ApiKeyFilter {
        status: query.status,
        provider: query.provider,
    };
    let api_keys = repo.list(&filter).await?;
    Ok(Json(api_keys.into_iter().map(ApiKeyResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api-keys",
    tag = "api_keys",
    summary = "Create API key",
    request_body = ApiKeyCreate,
    responses(
        (status = 201, description = "API key stored, status untested", body = ApiKeyResponse),
        (status = 422, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_api_key(State(state): State<AppState>, Json(create): Json<ApiKeyCreate>) -> Result<(StatusCode, Json<ApiKeyResponse>)> {
    create.validate()?;
    insert(&state, create).await
}

#[utoipa::path(
    get,
    path = "/api-keys/{id}",
    tag = "api_keys",
    summary = "Get API key",
    params(("id" = uuid::Uuid, Path, description = "API key ID")),
    responses(
        (status = 200, description = "API key with masked secret", body = ApiKeyResponse),
        (status = 404, description = "API key not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_api_key(State(state): State<AppState>, Path(id): Path<ApiKeyId>) -> Result<Json<ApiKeyResponse>> {
    load(&state, id).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/api-keys/{id}/secret",
    tag = "api_keys",
    summary = "Reveal API key",
    description = "Returns the full secret of one key.",
    params(("id" = uuid::Uuid, Path, description = "API key ID")),
    responses(
        (status = 200, description = "Full secret", body = ApiKeySecretResponse),
        (status = 404, description = "API key not found"),
    )
)]
#[tracing::instrument(skip_all, fields(api_key_id = %abbrev_uuid(&id)))]
pub async fn reveal_api_key(State(state): State<AppState>, Path(id): Path<ApiKeyId>) -> Result<Json<ApiKeySecretResponse>> {
    let mut table = state.store.api_keys().await;
    let mut repo = ApiKeys::new(&mut table);
    let api_key = repo.get_by_id(id).await?.ok_or_else(|| Error::not_found(EntityKind::ApiKey, id))?;
    tracing::info!("API key secret revealed");
    Ok(Json(ApiKeySecretResponse::from(api_key)))
}

#[utoipa::path(
    post,
    path = "/api-keys/{id}/visibility",
    tag = "api_keys",
    summary = "Toggle secret visibility",
    description = "Flips whether this key's secret is displayed in full. Keys start masked, and the \
                   stored secret is never changed.",
    params(("id" = uuid::Uuid, Path, description = "API key ID")),
    responses(
        (status = 200, description = "Display state after the toggle", body = ApiKeyVisibilityResponse),
        (status = 404, description = "API key not found"),
    )
)]
#[tracing::instrument(skip_all, fields(api_key_id = %abbrev_uuid(&id)))]
pub async fn toggle_api_key_visibility(
    State(state): State<AppState>,
    Path(id): Path<ApiKeyId>,
) -> Result<Json<ApiKeyVisibilityResponse>> {
    let key = {
        let table = state.store.api_keys().await;
        table
            .get(&id)
            .map(|api_key| api_key.key.clone())
            .ok_or_else(|| Error::not_found(EntityKind::ApiKey, id))?
    };

    let mut visibility = state.secret_visibility.lock().await;
    let revealed = visibility.toggle(id);
    Ok(Json(ApiKeyVisibilityResponse {
        id,
        revealed,
        display: visibility.display(&id, &key),
    }))
}

#[utoipa::path(
    patch,
    path = "/api-keys/{id}",
    tag = "api_keys",
    summary = "Update API key",
    description = "Only the fields present are changed. Replacing the secret resets the key to untested; \
                   `usage_limit: null` removes the limit.",
    params(("id" = uuid::Uuid, Path, description = "API key ID")),
    request_body = ApiKeyUpdate,
    responses(
        (status = 200, description = "Updated API key", body = ApiKeyResponse),
        (status = 404, description = "API key not found"),
        (status = 422, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_api_key(
    State(state): State<AppState>,
    Path(id): Path<ApiKeyId>,
    Json(update): Json<ApiKeyUpdate>,
) -> Result<Json<ApiKeyResponse>> {
    update.validate()?;
    apply(&state, id, update).await
}

#[utoipa::path(
    delete,
    path = "/api-keys/{id}",
    tag = "api_keys",
    summary = "Delete API key",
    params(("id" = uuid::Uuid, Path, description = "API key ID")),
    responses(
        (status = 204, description = "API key deleted"),
        (status = 404, description = "API key not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_api_key(State(state): State<AppState>, Path(id): Path<ApiKeyId>) -> Result<StatusCode> {
    let mut table = state.store.api_keys().await;
    let mut repo = ApiKeys::new(&mut table);
    if !repo.delete(id).await? {
        return Err(Error::not_found(EntityKind::ApiKey, id));
    }
    drop(table);

    state.secret_visibility.lock().await.forget(&id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api-keys/{id}/test",
    tag = "api_keys",
    summary = "Test API key",
    description = "Calls the provider with the key and records the outcome. A rejected key is reported in the body, not as an HTTP error.",
    params(("id" = uuid::Uuid, Path, description = "API key ID")),
    responses(
        (status = 200, description = "Probe outcome and the updated key", body = ApiKeyTestResponse),
        (status = 404, description = "API key not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn test_api_key(State(state): State<AppState>, Path(id): Path<ApiKeyId>) -> Result<Json<ApiKeyTestResponse>> {
    let (outcome, api_key) = probes::test_api_key(&state.store, state.prober.as_ref(), id)
        .await
        .map_err(or_not_found(EntityKind::ApiKey, id))?;
    Ok(Json(ApiKeyTestResponse {
        outcome,
        api_key: ApiKeyResponse::from(api_key),
    }))
}

#[utoipa::path(
    get,
    path = "/api-keys/form",
    tag = "api_keys",
    summary = "Open the add API key form",
    responses((status = 200, description = "Form filled with defaults", body = FormView))
)]
#[tracing::instrument(skip_all)]
pub async fn get_create_form() -> Json<FormView> {
    Json(forms::create_form::<ApiKeyForm>())
}

#[utoipa::path(
    post,
    path = "/api-keys/form",
    tag = "api_keys",
    summary = "Submit the add API key form",
    request_body = FormSubmission,
    responses(
        (status = 201, description = "API key stored", body = ApiKeyResponse),
        (status = 422, description = "One or more fields are invalid"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_create_form(
    State(state): State<AppState>,
    Json(submission): Json<FormSubmission>,
) -> Result<(StatusCode, Json<ApiKeyResponse>)> {
    let create = forms::submit_create::<ApiKeyForm>(&submission)?;
    insert(&state, create).await
}

#[utoipa::path(
    get,
    path = "/api-keys/{id}/form",
    tag = "api_keys",
    summary = "Open the edit API key form",
    description = "The secret field is always left blank; submitting it blank keeps the stored key.",
    params(("id" = uuid::Uuid, Path, description = "API key ID")),
    responses(
        (status = 200, description = "Form prefilled from the key", body = FormView),
        (status = 404, description = "API key not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_edit_form(State(state): State<AppState>, Path(id): Path<ApiKeyId>) -> Result<Json<FormView>> {
    let record = load(&state, id).await?;
    forms::edit_form::<ApiKeyForm>(&record).map(Json)
}

#[utoipa::path(
    patch,
    path = "/api-keys/{id}/form",
    tag = "api_keys",
    summary = "Submit the edit API key form",
    params(("id" = uuid::Uuid, Path, description = "API key ID")),
    request_body = FormSubmission,
    responses(
        (status = 200, description = "Updated API key", body = ApiKeyResponse),
        (status = 404, description = "API key not found"),
        (status = 422, description = "One or more fields are invalid"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_edit_form(
    State(state): State<AppState>,
    Path(id): Path<ApiKeyId>,
    Json(submission): Json<FormSubmission>,
) -> Result<Json<ApiKeyResponse>> {
    let record = load(&state, id).await?;
    let update = forms::submit_edit::<ApiKeyForm>(&record, &submission)?;
    apply(&state, id, update).await
}

#[cfg(test)]
mod tests {
    use crate::api::models::api_keys::{ApiKeyResponse, ApiKeySecretResponse, ApiKeyVisibilityResponse};
    use crate::api::models::probes::ApiKeyTestResponse;
    use crate::db::models::api_keys::{ApiKeyStatus, Provider};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    const BASE: &str = "/admin/api/v1/api-keys";

    #[test_log::test(tokio::test)]
    async fn test_create_masks_secret() {
        let (app, _state) = create_test_app().await;

        let response = app
            .post(BASE)
            .json(&json!({"name": "Anthropic Claude", "provider": "anthropic", "key": "sk-ant-123", "usage_limit": 5000}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ApiKeyResponse = response.json();
        assert_eq!(created.masked_key, "••••••••••");
        assert_eq!(created.status, ApiKeyStatus::Untested);
        assert_eq!(created.provider, Provider::Anthropic);

        let body: Value = app.get(&format!("{BASE}/{}", created.id)).await.json();
        assert!(body.get("key").is_none());
        assert!(!body.to_string().contains("sk-ant-123"));
    }

    #[test_log::test(tokio::test)]
    async fn test_reveal_returns_full_secret() {
        let (app, state) = create_test_app().await;
        let created = create_test_api_key(&state).await;

        let response = app.get(&format!("{BASE}/{}/secret", created.id)).await;
        response.assert_status_ok();
        let secret: ApiKeySecretResponse = response.json();
        assert_eq!(secret.key, created.key);

        app.get(&format!("{BASE}/{}/secret", uuid::Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_toggling_visibility_twice_restores_mask() {
        let (app, state) = create_test_app().await;
        let created = create_test_api_key(&state).await;
        let url = format!("{BASE}/{}/visibility", created.id);

        let shown: ApiKeyVisibilityResponse = app.post(&url).await.json();
        assert!(shown.revealed);
        assert_eq!(shown.display, created.key);

        let hidden: ApiKeyVisibilityResponse = app.post(&url).await.json();
        assert!(!hidden.revealed);
        assert_eq!(hidden.display, "•".repeat(created.key.chars().count()));

        let secret: ApiKeySecretResponse = app.get(&format!("{BASE}/{}/secret", created.id)).await.json();
        assert_eq!(secret.key, created.key);

        app.post(&format!("{BASE}/{}/visibility", uuid::Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_deleting_key_forgets_its_visibility() {
        let (app, state) = create_test_app().await;
        let created = create_test_api_key(&state).await;

        app.post(&format!("{BASE}/{}/visibility", created.id)).await.assert_status_ok();
        assert!(state.secret_visibility.lock().await.is_revealed(&created.id));

        app.delete(&format!("{BASE}/{}", created.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        assert!(!state.secret_visibility.lock().await.is_revealed(&created.id));
    }

    #[test_log::test(tokio::test)]
    async fn test_usage_limit_can_be_removed() {
        let (app, state) = create_test_app().await;
        let id = create_test_api_key(&state).await.id;

        let updated: ApiKeyResponse = app
            .patch(&format!("{BASE}/{id}"))
            .json(&json!({"usage_limit": null}))
            .await
            .json();
        assert_eq!(updated.usage_limit, None);
        assert!(!updated.usage_exceeded);
    }

    #[test_log::test(tokio::test)]
    async fn test_status_update_limited_to_active_inactive() {
        let (app, state) = create_test_app().await;
        let id = create_test_api_key(&state).await.id;

        app.patch(&format!("{BASE}/{id}"))
            .json(&json!({"status": "error"}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let updated: ApiKeyResponse = app
            .patch(&format!("{BASE}/{id}"))
            .json(&json!({"status": "inactive"}))
            .await
            .json();
        assert_eq!(updated.status, ApiKeyStatus::Inactive);
    }

    #[test_log::test(tokio::test)]
    async fn test_probe_marks_active() {
        let (app, state) = create_test_app().await;
        let created = create_test_api_key(&state).await;

        let response = app.post(&format!("{BASE}/{}/test", created.id)).await;
        response.assert_status_ok();
        let result: ApiKeyTestResponse = response.json();
        assert!(result.outcome.success);
        assert_eq!(result.api_key.status, ApiKeyStatus::Active);
        assert_eq!(result.api_key.last_used, Some(result.outcome.checked_at));
    }

    #[test_log::test(tokio::test)]
    async fn test_edit_form_blank_secret_keeps_key() {
        let (app, state) = create_test_app().await;
        let created = create_test_api_key(&state).await;

        let response = app
            .patch(&format!("{BASE}/{}/form", created.id))
            .json(&json!({"fields": {"name": "Renamed", "key": ""}}))
            .await;
        response.assert_status_ok();

        let secret: ApiKeySecretResponse = app.get(&format!("{BASE}/{}/secret", created.id)).await.json();
        assert_eq!(secret.key, created.key);
    }

    #[test_log::test(tokio::test)]
    async fn test_create_form_requires_key() {
        let (app, _state) = create_test_app().await;

        let response = app
            .post(&format!("{BASE}/form"))
            .json(&json!({"fields": {"name": "OpenAI Production"}}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "key");
    }
}
