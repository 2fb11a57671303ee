use crate::AppState;
use crate::api::handlers::{forms, or_not_found};
use crate::api::models::llm_models::{ListModelsQuery, ModelCreate, ModelResponse, ModelUpdate};
use crate::db::handlers::{Models, Repository, llm_models::ModelFilter};
use crate::db::models::llm_models::{ModelCreateDBRequest, ModelUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::forms::{FormSubmission, FormView, ModelForm};
use crate::types::{EntityKind, ModelId};
use crate::validation::Validate;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

async fn load(state: &AppState, id: &ModelId) -> Result<ModelResponse> {
    let mut table = state.store.models().await;
    let mut repo = Models::new(&mut table);
    repo.get_by_id(id.clone())
        .await?
        .map(ModelResponse::from)
        .ok_or_else(|| Error::not_found(EntityKind::Model, id))
}

async fn insert(state: &AppState, create: ModelCreate) -> Result<(StatusCode, Json<ModelResponse>)> {
    let mut table = state.store.models().await;
    let mut repo = Models::new(&mut table);
    let model = repo.create(&ModelCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(ModelResponse::from(model))))
}

async fn apply(state: &AppState, id: ModelId, update: ModelUpdate) -> Result<Json<ModelResponse>> {
    let mut table = state.store.models().await;
    let mut repo = Models::new(&mut table);
    let model = repo
        .update(id.clone(), &ModelUpdateDBRequest::from(update))
        .await
        .map_err(or_not_found(EntityKind::Model, &id))?;
    Ok(Json(ModelResponse::from(model)))
}

#[utoipa::path(
    get,
    path = "/models",
    tag = "models",
    summary = "List models",
    params(ListModelsQuery),
    responses(
        (status = 200, description = "Models in creation order", body = Vec<ModelResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_models(State(state): State<AppState>, Query(query): Query<ListModelsQuery>) -> Result<Json<Vec<ModelResponse>>> {
    let mut table = state.store.models().await;
    let mut repo = Models::new(&mut table);
    let models = repo.list(&ModelFilter { enabled: query.enabled }).await?;
    Ok(Json(models.into_iter().map(ModelResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/models",
    tag = "models",
    summary = "Create model",
    description = "The first model created becomes the default.",
    request_body = ModelCreate,
    responses(
        (status = 201, description = "Model created", body = ModelResponse),
        (status = 409, description = "A model with this ID already exists"),
        (status = 422, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_model(State(state): State<AppState>, Json(create): Json<ModelCreate>) -> Result<(StatusCode, Json<ModelResponse>)> {
    create.validate()?;
    insert(&state, create).await
}

#[utoipa::path(
    get,
    path = "/models/default",
    tag = "models",
    summary = "Get the default model",
    responses(
        (status = 200, description = "The default model", body = ModelResponse),
        (status = 404, description = "No models exist"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_default_model(State(state): State<AppState>) -> Result<Json<ModelResponse>> {
    let mut table = state.store.models().await;
    let mut repo = Models::new(&mut table);
    repo.default_model()
        .await?
        .map(|model| Json(ModelResponse::from(model)))
        .ok_or_else(|| Error::NotFound {
            resource: "Default model".to_string(),
            id: "default".to_string(),
        })
}

#[utoipa::path(
    get,
    path = "/models/{id}",
    tag = "models",
    summary = "Get model",
    params(("id" = String, Path, description = "Model ID, e.g. gpt-4")),
    responses(
        (status = 200, description = "Model", body = ModelResponse),
        (status = 404, description = "Model not found"),
    )
)]
#[tracing::instrument(skip_all, fields(model_id = %id))]
pub async fn get_model(State(state): State<AppState>, Path(id): Path<ModelId>) -> Result<Json<ModelResponse>> {
    load(&state, &id).await.map(Json)
}

#[utoipa::path(
    patch,
    path = "/models/{id}",
    tag = "models",
    summary = "Update model",
    description = "Only the fields present are changed. `config` is merged parameter by parameter.",
    params(("id" = String, Path, description = "Model ID, e.g. gpt-4")),
    request_body = ModelUpdate,
    responses(
        (status = 200, description = "Updated model", body = ModelResponse),
        (status = 404, description = "Model not found"),
        (status = 422, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all, fields(model_id = %id))]
pub async fn update_model(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
    Json(update): Json<ModelUpdate>,
) -> Result<Json<ModelResponse>> {
    update.validate()?;
    apply(&state, id, update).await
}

#[utoipa::path(
    delete,
    path = "/models/{id}",
    tag = "models",
    summary = "Delete model",
    description = "Deleting the default model promotes the oldest remaining one.",
    params(("id" = String, Path, description = "Model ID, e.g. gpt-4")),
    responses(
        (status = 204, description = "Model deleted"),
        (status = 404, description = "Model not found"),
    )
)]
#[tracing::instrument(skip_all, fields(model_id = %id))]
pub async fn delete_model(State(state): State<AppState>, Path(id): Path<ModelId>) -> Result<StatusCode> {
    let mut table = state.store.models().await;
    let mut repo = Models::new(&mut table);
    if repo.delete(id.clone()).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(EntityKind::Model, id))
    }
}

#[utoipa::path(
    post,
    path = "/models/{id}/toggle",
    tag = "models",
    summary = "Enable or disable model",
    params(("id" = String, Path, description = "Model ID, e.g. gpt-4")),
    responses(
        (status = 200, description = "Model with `enabled` flipped", body = ModelResponse),
        (status = 404, description = "Model not found"),
    )
)]
#[tracing::instrument(skip_all, fields(model_id = %id))]
pub async fn toggle_model(State(state): State<AppState>, Path(id): Path<ModelId>) -> Result<Json<ModelResponse>> {
    let mut table = state.store.models().await;
    let mut repo = Models::new(&mut table);
    let model = repo
        .toggle_enabled(&id)
        .await
        .map_err(or_not_found(EntityKind::Model, &id))?;
    Ok(Json(ModelResponse::from(model)))
}

#[utoipa::path(
    post,
    path = "/models/{id}/default",
    tag = "models",
    summary = "Make model the default",
    params(("id" = String, Path, description = "Model ID, e.g. gpt-4")),
    responses(
        (status = 200, description = "The new default model", body = ModelResponse),
        (status = 404, description = "Model not found"),
    )
)]
#[tracing::instrument(skip_all, fields(model_id = %id))]
pub async fn set_default_model(State(state): State<AppState>, Path(id): Path<ModelId>) -> Result<Json<ModelResponse>> {
    let mut table = state.store.models().await;
    let mut repo = Models::new(&mut table);
    let model = repo
        .set_default(&id)
        .await
        .map_err(or_not_found(EntityKind::Model, &id))?;
    Ok(Json(ModelResponse::from(model)))
}

#[utoipa::path(
    get,
    path = "/models/form",
    tag = "models",
    summary = "Open the add model form",
    responses((status = 200, description = "Form filled with defaults", body = FormView))
)]
#[tracing::instrument(skip_all)]
pub async fn get_create_form() -> Json<FormView> {
    Json(forms::create_form::<ModelForm>())
}

#[utoipa::path(
    post,
    path = "/models/form",
    tag = "models",
    summary = "Submit the add model form",
    request_body = FormSubmission,
    responses(
        (status = 201, description = "Model created", body = ModelResponse),
        (status = 409, description = "A model with this ID already exists"),
        (status = 422, description = "One or more fields are invalid"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_create_form(
    State(state): State<AppState>,
    Json(submission): Json<FormSubmission>,
) -> Result<(StatusCode, Json<ModelResponse>)> {
    let create = forms::submit_create::<ModelForm>(&submission)?;
    insert(&state, create).await
}

#[utoipa::path(
    get,
    path = "/models/{id}/form",
    tag = "models",
    summary = "Open the edit model form",
    params(("id" = String, Path, description = "Model ID, e.g. gpt-4")),
    responses(
        (status = 200, description = "Form prefilled from the model", body = FormView),
        (status = 404, description = "Model not found"),
    )
)]
#[tracing::instrument(skip_all, fields(model_id = %id))]
pub async fn get_edit_form(State(state): State<AppState>, Path(id): Path<ModelId>) -> Result<Json<FormView>> {
    let record = load(&state, &id).await?;
    forms::edit_form::<ModelForm>(&record).map(Json)
}

#[utoipa::path(
    patch,
    path = "/models/{id}/form",
    tag = "models",
    summary = "Submit the edit model form",
    params(("id" = String, Path, description = "Model ID, e.g. gpt-4")),
    request_body = FormSubmission,
    responses(
        (status = 200, description = "Updated model", body = ModelResponse),
        (status = 404, description = "Model not found"),
        (status = 422, description = "One or more fields are invalid"),
    )
)]
#[tracing::instrument(skip_all, fields(model_id = %id))]
pub async fn submit_edit_form(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
    Json(submission): Json<FormSubmission>,
) -> Result<Json<ModelResponse>> {
    let record = load(&state, &id).await?;
    let update = forms::submit_edit::<ModelForm>(&record, &submission)?;
    apply(&state, id, update).await
}

#[cfg(test)]
mod tests {
    use crate::api::models::llm_models::ModelResponse;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    const BASE: &str = "/admin/api/v1/models";

    fn model_body(id: &str) -> Value {
        json!({
            "id": id,
            "name": id.to_uppercase(),
            "provider": "OpenAI",
            "version": format!("{id}-0125"),
            "context_length": 16385,
            "cost_per_1k": 0.001
        })
    }

    async fn defaults(app: &axum_test::TestServer) -> Vec<String> {
        let models: Vec<ModelResponse> = app.get(BASE).await.json();
        models.into_iter().filter(|m| m.is_default).map(|m| m.id).collect()
    }

    #[test_log::test(tokio::test)]
    async fn test_create_applies_config_defaults() {
        let (app, _state) = create_test_app().await;

        let response = app.post(BASE).json(&model_body("gpt-3.5-turbo")).await;
        response.assert_status(StatusCode::CREATED);
        let created: ModelResponse = response.json();
        assert!(created.enabled);
        assert!(created.is_default);
        assert_eq!(created.config.temperature, 0.7);
        assert_eq!(created.config.max_tokens, 4096);
        assert_eq!(created.config.top_p, 1.0);
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_id_conflicts() {
        let (app, _state) = create_test_app().await;
        app.post(BASE).json(&model_body("gpt-4")).await.assert_status(StatusCode::CREATED);

        let response = app.post(BASE).json(&model_body("gpt-4")).await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["field"], "id");
    }

    #[test_log::test(tokio::test)]
    async fn test_reserved_id_rejected() {
        let (app, _state) = create_test_app().await;
        app.post(BASE)
            .json(&model_body("default"))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test_log::test(tokio::test)]
    async fn test_set_default_leaves_exactly_one() {
        let (app, state) = create_test_app().await;
        for id in ["gpt-4", "gpt-3.5-turbo", "claude-3"] {
            create_test_model(&state, id).await;
        }
        assert_eq!(defaults(&app).await, vec!["gpt-4"]);

        app.post(&format!("{BASE}/claude-3/default")).await.assert_status_ok();
        let response = app.post(&format!("{BASE}/gpt-3.5-turbo/default")).await;
        response.assert_status_ok();
        assert!(response.json::<ModelResponse>().is_default);

        assert_eq!(defaults(&app).await, vec!["gpt-3.5-turbo"]);
        let default: ModelResponse = app.get(&format!("{BASE}/default")).await.json();
        assert_eq!(default.id, "gpt-3.5-turbo");

        app.post(&format!("{BASE}/missing/default")).await.assert_status_not_found();
        assert_eq!(defaults(&app).await, vec!["gpt-3.5-turbo"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_deleting_default_promotes_another() {
        let (app, state) = create_test_app().await;
        create_test_model(&state, "gpt-4").await;
        create_test_model(&state, "claude-3").await;

        app.delete(&format!("{BASE}/gpt-4")).await.assert_status(StatusCode::NO_CONTENT);
        assert_eq!(defaults(&app).await, vec!["claude-3"]);

        app.delete(&format!("{BASE}/claude-3")).await.assert_status(StatusCode::NO_CONTENT);
        app.get(&format!("{BASE}/default")).await.assert_status_not_found();
        app.delete(&format!("{BASE}/claude-3")).await.assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_toggle_flips_enabled_only() {
        let (app, state) = create_test_app().await;
        let created = create_test_model(&state, "gpt-4").await;

        let toggled: ModelResponse = app.post(&format!("{BASE}/gpt-4/toggle")).await.json();
        assert!(!toggled.enabled);
        assert_eq!(toggled.name, created.name);
        assert!(toggled.is_default);

        let disabled: Vec<ModelResponse> = app.get(BASE).add_query_param("enabled", "false").await.json();
        assert_eq!(disabled.len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_patch_merges_config() {
        let (app, state) = create_test_app().await;
        create_test_model(&state, "gpt-4").await;

        let updated: ModelResponse = app
            .patch(&format!("{BASE}/gpt-4"))
            .json(&json!({"config": {"max_tokens": 1024}}))
            .await
            .json();
        assert_eq!(updated.config.max_tokens, 1024);
        assert_eq!(updated.config.temperature, 0.7);

        app.patch(&format!("{BASE}/gpt-4"))
            .json(&json!({"config": {"temperature": 3.0}}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test_log::test(tokio::test)]
    async fn test_create_form_with_nested_config() {
        let (app, _state) = create_test_app().await;

        let response = app
            .post(&format!("{BASE}/form"))
            .json(&json!({"fields": {
                "id": "claude-3",
                "name": "Claude 3 Opus",
                "provider": "Anthropic",
                "version": "claude-3-opus-20240229",
                "context_length": "200000",
                "cost_per_1k": "0.075",
                "config.temperature": "0.2"
            }}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ModelResponse = response.json();
        assert_eq!(created.context_length, 200_000);
        assert_eq!(created.config.temperature, 0.2);
        assert_eq!(created.config.max_tokens, 4096);
    }

    #[test_log::test(tokio::test)]
    async fn test_edit_form_has_no_id_field() {
        let (app, state) = create_test_app().await;
        create_test_model(&state, "gpt-4").await;

        let form: Value = app.get(&format!("{BASE}/gpt-4/form")).await.json();
        let names: Vec<&str> = form["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert!(!names.contains(&"id"));
        assert!(names.contains(&"config.top_p"));

        let updated: ModelResponse = app
            .patch(&format!("{BASE}/gpt-4/form"))
            .json(&json!({"fields": {"config.top_p": "0.9"}}))
            .await
            .json();
        assert_eq!(updated.config.top_p, 0.9);
        assert_eq!(updated.config.temperature, 0.7);
    }
}
