use crate::AppState;
use crate::api::handlers::{forms, or_not_found};
use crate::api::models::users::{ListUsersQuery, UserCreate, UserResponse, UserStatusUpdate, UserUpdate};
use crate::db::handlers::{Repository, Users, users::UserFilter};
use crate::db::models::users::{UserCreateDBRequest, UserUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::forms::{FormSubmission, FormView, UserForm};
use crate::types::{EntityKind, UserId, abbrev_uuid};
use crate::validation::Validate;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

async fn load(state: &AppState, id: UserId) -> Result<UserResponse> {
    let mut table = state.store.users().await;
    let mut repo = Users::new(&mut table);
    repo.get_by_id(id)
        .await?
        .map(UserResponse::from)
        .ok_or_else(|| Error::not_found(EntityKind::User, id))
}

async fn insert(state: &AppState, create: UserCreate) -> Result<(StatusCode, Json<UserResponse>)> {
    let mut table = state.store.users().await;
    let mut repo = Users::new(&mut table);
    let user = repo.create(&UserCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn apply(state: &AppState, id: UserId, update: UserUpdate) -> Result<Json<UserResponse>> {
    let mut table = state.store.users().await;
    let mut repo = Users::new(&mut table);
    let user = repo
        .update(id, &UserUpdateDBRequest::from(update))
        .await
        .map_err(or_not_found(EntityKind::User, id))?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users in creation order", body = Vec<UserResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>, Query(query): Query<ListUsersQuery>) -> Result<Json<Vec<UserResponse>>> {
    let mut table = state.store.users().await;
    let mut repo = Users::new(&mut table);
    let filter = UserFilter {
        status: query.status,
        role: query.role,
    };
    let users = repo.list(&filter).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "A user with this email address already exists"),
        (status = 422, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(State(state): State<AppState>, Json(create): Json<UserCreate>) -> Result<(StatusCode, Json<UserResponse>)> {
    create.validate()?;
    insert(&state, create).await
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<UserId>) -> Result<Json<UserResponse>> {
    load(&state, id).await.map(Json)
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Another user already has this email address"),
        (status = 422, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    update.validate()?;
    apply(&state, id, update).await
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<UserId>) -> Result<StatusCode> {
    let mut table = state.store.users().await;
    let mut repo = Users::new(&mut table);
    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(EntityKind::User, id))
    }
}

#[utoipa::path(
    post,
    path = "/users/{id}/status",
    tag = "users",
    summary = "Change user status",
    description = "Activate, deactivate or suspend a user without touching any other field.",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    request_body = UserStatusUpdate,
    responses(
        (status = 200, description = "User with the new status", body = UserResponse),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %abbrev_uuid(&id), status = ?body.status))]
pub async fn set_user_status(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<UserStatusUpdate>,
) -> Result<Json<UserResponse>> {
    let mut table = state.store.users().await;
    let mut repo = Users::new(&mut table);
    let user = repo
        .set_status(id, body.status)
        .await
        .map_err(or_not_found(EntityKind::User, id))?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/users/form",
    tag = "users",
    summary = "Open the add user form",
    responses((status = 200, description = "Form filled with defaults", body = FormView))
)]
#[tracing::instrument(skip_all)]
pub async fn get_create_form() -> Json<FormView> {
    Json(forms::create_form::<UserForm>())
}

#[utoipa::path(
    post,
    path = "/users/form",
    tag = "users",
    summary = "Submit the add user form",
    request_body = FormSubmission,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "A user with this email address already exists"),
        (status = 422, description = "One or more fields are invalid"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_create_form(
    State(state): State<AppState>,
    Json(submission): Json<FormSubmission>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let create = forms::submit_create::<UserForm>(&submission)?;
    insert(&state, create).await
}

#[utoipa::path(
    get,
    path = "/users/{id}/form",
    tag = "users",
    summary = "Open the edit user form",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Form prefilled from the user", body = FormView),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_edit_form(State(state): State<AppState>, Path(id): Path<UserId>) -> Result<Json<FormView>> {
    let record = load(&state, id).await?;
    forms::edit_form::<UserForm>(&record).map(Json)
}

#[utoipa::path(
    patch,
    path = "/users/{id}/form",
    tag = "users",
    summary = "Submit the edit user form",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    request_body = FormSubmission,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Another user already has this email address"),
        (status = 422, description = "One or more fields are invalid"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_edit_form(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(submission): Json<FormSubmission>,
) -> Result<Json<UserResponse>> {
    let record = load(&state, id).await?;
    let update = forms::submit_edit::<UserForm>(&record, &submission)?;
    apply(&state, id, update).await
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::UserResponse;
    use crate::db::models::users::{Role, UserStatus};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    const BASE: &str = "/admin/api/v1/users";

    #[test_log::test(tokio::test)]
    async fn test_create_applies_defaults() {
        let (app, _state) = create_test_app().await;

        let response = app
            .post(BASE)
            .json(&json!({"name": "Mike Johnson", "email": "mike@example.com"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: UserResponse = response.json();
        assert_eq!(created.role, Role::User);
        assert_eq!(created.status, UserStatus::Active);
        assert_eq!(created.usage_limit, 5000);
        assert_eq!(created.usage_count, 0);
        assert_eq!(created.last_login, None);
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_email_conflicts() {
        let (app, state) = create_test_app().await;
        let existing = create_test_user(&state, "jane@example.com").await;

        let response = app
            .post(BASE)
            .json(&json!({"name": "Jane Again", "email": "JANE@example.com"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["field"], "email");

        let other = create_test_user(&state, "john@example.com").await;
        app.patch(&format!("{BASE}/{}", other.id))
            .json(&json!({"email": existing.email}))
            .await
            .assert_status(StatusCode::CONFLICT);

        // Keeping one's own address is not a conflict
        app.patch(&format!("{BASE}/{}", existing.id))
            .json(&json!({"email": "jane@example.com", "name": "Jane Smith"}))
            .await
            .assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_invalid_email_rejected() {
        let (app, _state) = create_test_app().await;
        let response = app
            .post(BASE)
            .json(&json!({"name": "No Domain", "email": "not-an-email"}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "email");
    }

    #[test_log::test(tokio::test)]
    async fn test_status_change_touches_only_status() {
        let (app, state) = create_test_app().await;
        let created = create_test_user(&state, "jane@example.com").await;

        let response = app
            .post(&format!("{BASE}/{}/status", created.id))
            .json(&json!({"status": "suspended"}))
            .await;
        response.assert_status_ok();
        let updated: UserResponse = response.json();
        assert_eq!(updated.status, UserStatus::Suspended);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.usage_limit, created.usage_limit);

        let suspended: Vec<UserResponse> = app.get(BASE).add_query_param("status", "suspended").await.json();
        assert_eq!(suspended.len(), 1);

        app.post(&format!("{BASE}/{}/status", uuid::Uuid::new_v4()))
            .json(&json!({"status": "active"}))
            .await
            .assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_form_round_trip() {
        let (app, state) = create_test_app().await;

        let form: Value = app.get(&format!("{BASE}/form")).await.json();
        let role = form["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "role")
            .unwrap();
        assert_eq!(role["value"], "user");

        let response = app
            .post(&format!("{BASE}/form"))
            .json(&json!({"fields": {"name": "Mike Johnson", "email": "mike@example.com", "usage_limit": "many"}}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let created = create_test_user(&state, "mike@example.com").await;
        let updated: UserResponse = app
            .patch(&format!("{BASE}/{}/form", created.id))
            .json(&json!({"fields": {"role": "viewer"}}))
            .await
            .json();
        assert_eq!(updated.role, Role::Viewer);
        assert_eq!(updated.email, "mike@example.com");
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_user() {
        let (app, state) = create_test_app().await;
        let created = create_test_user(&state, "mike@example.com").await;

        app.delete(&format!("{BASE}/{}", created.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.get(&format!("{BASE}/{}", created.id)).await.assert_status_not_found();
    }
}
