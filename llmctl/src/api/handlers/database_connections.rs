use crate::api::handlers::{forms, or_not_found};
use crate::api::models::database_connections::{
    DatabaseConnectionCreate, DatabaseConnectionResponse, DatabaseConnectionUpdate, ListDatabaseConnectionsQuery,
};
use crate::api::models::probes::ConnectionTestResponse;
use crate::db::handlers::{DatabaseConnections, Repository, database_connections::DatabaseConnectionFilter};
use crate::db::models::database_connections::{DatabaseConnectionCreateDBRequest, DatabaseConnectionUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::forms::{DatabaseConnectionForm, FormSubmission, FormView};
use crate::types::{DatabaseConnectionId, EntityKind};
use crate::validation::Validate;
use crate::{AppState, probes};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

async fn load(state: &AppState, id: DatabaseConnectionId) -> Result<DatabaseConnectionResponse> {
    let mut table = state.store.connections().await;
    let mut repo = DatabaseConnections::new(&mut table);
    repo.get_by_id(id)
        .await?
        .map(DatabaseConnectionResponse::from)
        .ok_or_else(|| Error::not_found(EntityKind::DatabaseConnection, id))
}

async fn insert(state: &AppState, create: DatabaseConnectionCreate) -> Result<(StatusCode, Json<DatabaseConnectionResponse>)> {
    let mut table = state.store.connections().await;
    let mut repo = DatabaseConnections::new(&mut table);
    let connection = repo.create(&DatabaseConnectionCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(DatabaseConnectionResponse::from(connection))))
}

async fn apply(state: &AppState, id: DatabaseConnectionId, update: DatabaseConnectionUpdate) -> Result<Json<DatabaseConnectionResponse>> {
    let mut table = state.store.connections().await;
    let mut repo = DatabaseConnections::new(&mut table);
    let connection = repo
        .update(id, &DatabaseConnectionUpdateDBRequest::from(update))
        .await
        .map_err(or_not_found(EntityKind::DatabaseConnection, id))?;
    Ok(Json(DatabaseConnectionResponse::from(connection)))
}

#[utoipa::path(
    get,
    path = "/connections",
    tag = "connections",
    summary = "List database connections",
    params(ListDatabaseConnectionsQuery),
    responses(
        (status = 200, description = "Connections in creation order", body = Vec<DatabaseConnectionResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_connections(
    State(state): State<AppState>,
    Query(query): Query<ListDatabaseConnectionsQuery>,
) -> Result<Json<Vec<DatabaseConnectionResponse>>> {
    let mut table = state.store.connections().await;
    let mut repo = DatabaseConnections::new(&mut table);
    let connections = repo.list(&DatabaseConnectionFilter { status: query.status }).await?;
    Ok(Json(connections.into_iter().map(DatabaseConnectionResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/connections",
    tag = "connections",
    summary = "Create database connection",
    request_body = DatabaseConnectionCreate,
    responses(
        (status = 201, description = "Connection created, status untested", body = DatabaseConnectionResponse),
        (status = 422, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_connection(
    State(state): State<AppState>,
    Json(create): Json<DatabaseConnectionCreate>,
) -> Result<(StatusCode, Json<DatabaseConnectionResponse>)> {
    create.validate()?;
    insert(&state, create).await
}

#[utoipa::path(
    get,
    path = "/connections/{id}",
    tag = "connections",
    summary = "Get database connection",
    params(("id" = uuid::Uuid, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Connection", body = DatabaseConnectionResponse),
        (status = 404, description = "Connection not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_connection(
    State(state): State<AppState>,
    Path(id): Path<DatabaseConnectionId>,
) -> Result<Json<DatabaseConnectionResponse>> {
    load(&state, id).await.map(Json)
}

#[utoipa::path(
    patch,
    path = "/connections/{id}",
    tag = "connections",
    summary = "Update database connection",
    description = "Only the fields present are changed. Changing where the connection points resets it to untested.",
    params(("id" = uuid::Uuid, Path, description = "Connection ID")),
    request_body = DatabaseConnectionUpdate,
    responses(
        (status = 200, description = "Updated connection", body = DatabaseConnectionResponse),
        (status = 404, description = "Connection not found"),
        (status = 422, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_connection(
    State(state): State<AppState>,
    Path(id): Path<DatabaseConnectionId>,
    Json(update): Json<DatabaseConnectionUpdate>,
) -> Result<Json<DatabaseConnectionResponse>> {
    update.validate()?;
    apply(&state, id, update).await
}

#[utoipa::path(
    delete,
    path = "/connections/{id}",
    tag = "connections",
    summary = "Delete database connection",
    params(("id" = uuid::Uuid, Path, description = "Connection ID")),
    responses(
        (status = 204, description = "Connection deleted"),
        (status = 404, description = "Connection not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_connection(State(state): State<AppState>, Path(id): Path<DatabaseConnectionId>) -> Result<StatusCode> {
    let mut table = state.store.connections().await;
    let mut repo = DatabaseConnections::new(&mut table);
    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(EntityKind::DatabaseConnection, id))
    }
}

#[utoipa::path(
    post,
    path = "/connections/{id}/test",
    tag = "connections",
    summary = "Test database connection",
    description = "Probes the connection and records the outcome. A failed probe is reported in the body, not as an HTTP error.",
    params(("id" = uuid::Uuid, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Probe outcome and the updated connection", body = ConnectionTestResponse),
        (status = 404, description = "Connection not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn test_connection(State(state): State<AppState>, Path(id): Path<DatabaseConnectionId>) -> Result<Json<ConnectionTestResponse>> {
    let (outcome, connection) = probes::test_connection(&state.store, state.prober.as_ref(), id)
        .await
        .map_err(or_not_found(EntityKind::DatabaseConnection, id))?;
    Ok(Json(ConnectionTestResponse {
        outcome,
        connection: DatabaseConnectionResponse::from(connection),
    }))
}

#[utoipa::path(
    get,
    path = "/connections/form",
    tag = "connections",
    summary = "Open the add connection form",
    responses((status = 200, description = "Form filled with defaults", body = FormView))
)]
#[tracing::instrument(skip_all)]
pub async fn get_create_form() -> Json<FormView> {
    Json(forms::create_form::<DatabaseConnectionForm>())
}

#[utoipa::path(
    post,
    path = "/connections/form",
    tag = "connections",
    summary = "Submit the add connection form",
    request_body = FormSubmission,
    responses(
        (status = 201, description = "Connection created", body = DatabaseConnectionResponse),
        (status = 422, description = "One or more fields are invalid"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_create_form(
    State(state): State<AppState>,
    Json(submission): Json<FormSubmission>,
) -> Result<(StatusCode, Json<DatabaseConnectionResponse>)> {
    let create = forms::submit_create::<DatabaseConnectionForm>(&submission)?;
    insert(&state, create).await
}

#[utoipa::path(
    get,
    path = "/connections/{id}/form",
    tag = "connections",
    summary = "Open the edit connection form",
    params(("id" = uuid::Uuid, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Form prefilled from the connection", body = FormView),
        (status = 404, description = "Connection not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_edit_form(State(state): State<AppState>, Path(id): Path<DatabaseConnectionId>) -> Result<Json<FormView>> {
    let record = load(&state, id).await?;
    forms::edit_form::<DatabaseConnectionForm>(&record).map(Json)
}

#[utoipa::path(
    patch,
    path = "/connections/{id}/form",
    tag = "connections",
    summary = "Submit the edit connection form",
    description = "Only fields whose text differs from the prefill are applied.",
    params(("id" = uuid::Uuid, Path, description = "Connection ID")),
    request_body = FormSubmission,
    responses(
        (status = 200, description = "Updated connection", body = DatabaseConnectionResponse),
        (status = 404, description = "Connection not found"),
        (status = 422, description = "One or more fields are invalid"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_edit_form(
    State(state): State<AppState>,
    Path(id): Path<DatabaseConnectionId>,
    Json(submission): Json<FormSubmission>,
) -> Result<Json<DatabaseConnectionResponse>> {
    let record = load(&state, id).await?;
    let update = forms::submit_edit::<DatabaseConnectionForm>(&record, &submission)?;
    apply(&state, id, update).await
}

#[cfg(test)]
mod tests {
    use crate::api::models::database_connections::DatabaseConnectionResponse;
    use crate::api::models::probes::ConnectionTestResponse;
    use crate::db::models::database_connections::{ConnectionStatus, DatabaseType};
    use crate::forms::FormView;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    const BASE: &str = "/admin/api/v1/connections";

    fn test_db() -> Value {
        json!({
            "name": "Test DB",
            "type": "mysql",
            "host": "db.local",
            "port": 3306,
            "database": "app",
            "username": "svc"
        })
    }

    #[test_log::test(tokio::test)]
    async fn test_create_then_list_once() {
        let (app, _state) = create_test_app().await;

        let response = app.post(BASE).json(&test_db()).await;
        response.assert_status(StatusCode::CREATED);
        let created: DatabaseConnectionResponse = response.json();
        assert_eq!(created.status, ConnectionStatus::Untested);
        assert_eq!(created.db_type, DatabaseType::Mysql);
        assert!(!created.has_password);

        let listed: Vec<DatabaseConnectionResponse> = app.get(BASE).await.json();
        assert_eq!(listed.iter().filter(|c| c.id == created.id).count(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_create_rejects_missing_fields_per_field() {
        let (app, _state) = create_test_app().await;

        let response = app
            .post(BASE)
            .json(&json!({"name": "", "type": "postgresql", "host": "", "database": "x", "username": "u", "port": 0}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        let fields: Vec<&str> = body["errors"].as_array().unwrap().iter().map(|e| e["field"].as_str().unwrap()).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"host"));
        assert!(fields.contains(&"port"));
    }

    #[test_log::test(tokio::test)]
    async fn test_patch_name_preserves_other_fields() {
        let (app, state) = create_test_app().await;
        let created = create_test_connection(&state).await;

        let response = app
            .patch(&format!("{BASE}/{}", created.id))
            .json(&json!({"name": "Primary DB"}))
            .await;
        response.assert_status_ok();
        let updated: DatabaseConnectionResponse = response.json();
        assert_eq!(updated.name, "Primary DB");
        assert_eq!(updated.host, created.host);
        assert_eq!(updated.port, created.port);
        assert_eq!(updated.database, created.database);
        assert_eq!(updated.username, created.username);
        assert_eq!(updated.has_password, created.password.is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_then_missing() {
        let (app, state) = create_test_app().await;
        let created = create_test_connection(&state).await;

        app.delete(&format!("{BASE}/{}", created.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.delete(&format!("{BASE}/{}", created.id)).await.assert_status_not_found();
        app.get(&format!("{BASE}/{}", created.id)).await.assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_probe_marks_connected_and_stamps_time() {
        let (app, state) = create_test_app().await;
        let created = create_test_connection(&state).await;

        let response = app.post(&format!("{BASE}/{}/test", created.id)).await;
        response.assert_status_ok();
        let result: ConnectionTestResponse = response.json();
        assert!(result.outcome.success);
        assert_eq!(result.connection.status, ConnectionStatus::Connected);
        assert_eq!(result.connection.last_test, Some(result.outcome.checked_at));

        app.post(&format!("{BASE}/{}/test", uuid::Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_create_form_defaults_and_submission() {
        let (app, _state) = create_test_app().await;

        let form: FormView = app.get(&format!("{BASE}/form")).await.json();
        let port = form.fields.iter().find(|f| f.name == "port").unwrap();
        assert_eq!(port.value, "5432");

        let response = app
            .post(&format!("{BASE}/form"))
            .json(&json!({"fields": {"name": "Test DB", "type": "mysql", "host": "db.local", "port": "abc", "database": "app", "username": "svc"}}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "port");

        let response = app
            .post(&format!("{BASE}/form"))
            .json(&json!({"fields": {"name": "Test DB", "type": "mysql", "host": "db.local", "port": "3306", "database": "app", "username": "svc"}}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: DatabaseConnectionResponse = response.json();
        assert_eq!(created.port, 3306);
    }

    #[test_log::test(tokio::test)]
    async fn test_edit_form_applies_only_changes() {
        let (app, state) = create_test_app().await;
        let created = create_test_connection(&state).await;

        let form: FormView = app.get(&format!("{BASE}/{}/form", created.id)).await.json();
        let host = form.fields.iter().find(|f| f.name == "host").unwrap();
        assert_eq!(host.value, created.host);
        let password = form.fields.iter().find(|f| f.name == "password").unwrap();
        assert_eq!(password.value, "");

        let response = app
            .patch(&format!("{BASE}/{}/form", created.id))
            .json(&json!({"fields": {"name": "Renamed", "password": ""}}))
            .await;
        response.assert_status_ok();
        let updated: DatabaseConnectionResponse = response.json();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.has_password, created.password.is_some());
        assert_eq!(updated.host, created.host);

        app.get(&format!("{BASE}/{}/form", uuid::Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_json_and_form_store_the_same_text() {
        let (app, _state) = create_test_app().await;

        let from_json: DatabaseConnectionResponse = app
            .post(BASE)
            .json(&json!({"name": "  Prod  ", "type": "mysql", "host": " db.local ", "port": 3306, "database": "app", "username": "svc "}))
            .await
            .json();
        let from_form: DatabaseConnectionResponse = app
            .post(&format!("{BASE}/form"))
            .json(&json!({"fields": {"name": "  Prod  ", "type": "mysql", "host": " db.local ", "port": "3306", "database": "app", "username": "svc "}}))
            .await
            .json();

        for created in [&from_json, &from_form] {
            assert_eq!(created.name, "Prod");
            assert_eq!(created.host, "db.local");
            assert_eq!(created.username, "svc");
        }

        let renamed: DatabaseConnectionResponse = app
            .patch(&format!("{BASE}/{}", from_json.id))
            .json(&json!({"name": " Primary "}))
            .await
            .json();
        assert_eq!(renamed.name, "Primary");
    }

    #[test_log::test(tokio::test)]
    async fn test_edit_form_blank_port_is_rejected_and_kept() {
        let (app, state) = create_test_app().await;
        let created = create_test_connection(&state).await;

        let response = app
            .patch(&format!("{BASE}/{}/form", created.id))
            .json(&json!({"fields": {"port": ""}}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "port");
        assert_eq!(body["errors"][0]["message"], "is required");

        let stored: DatabaseConnectionResponse = app.get(&format!("{BASE}/{}", created.id)).await.json();
        assert_eq!(stored.port, 5432);
    }
}
