//! OpenAPI documentation for the management API at `/admin/api/v1/*`.
//!
//! The document is served as JSON at `/admin/openapi.json` and rendered with Scalar at
//! `/admin/docs`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "llmctl",
        description = "Manage the database connections, provider API keys, models and users behind an LLM deployment."
    ),
    servers(
        (url = "/admin/api/v1", description = "Management API")
    ),
    paths(
        // Database connections
        api::handlers::database_connections::list_connections,
        api::handlers::database_connections::create_connection,
        api::handlers::database_connections::get_connection,
        api::handlers::database_connections::update_connection,
        api::handlers::database_connections::delete_connection,
        api::handlers::database_connections::test_connection,
        api::handlers::database_connections::get_create_form,
        api::handlers::database_connections::submit_create_form,
        api::handlers::database_connections::get_edit_form,
        api::handlers::database_connections::submit_edit_form,
        // API keys
        api::handlers::api_keys::list_api_keys,
        api::handlers::api_keys::create_api_key,
        api::handlers::api_keys::get_api_key,
        api::handlers::api_keys::reveal_api_key,
        api::handlers::api_keys::toggle_api_key_visibility,
        api::handlers::api_keys::update_api_key,
        api::handlers::api_keys::delete_api_key,
        api::handlers::api_keys::test_api_key,
        api::handlers::api_keys::get_create_form,
        api::handlers::api_keys::submit_create_form,
        api::handlers::api_keys::get_edit_form,
        api::handlers::api_keys::submit_edit_form,
        // Models
        api::handlers::llm_models::list_models,
        api::handlers::llm_models::create_model,
        api::handlers::llm_models::get_default_model,
        api::handlers::llm_models::get_model,
        api::handlers::llm_models::update_model,
        api::handlers::llm_models::delete_model,
        api::handlers::llm_models::toggle_model,
        api::handlers::llm_models::set_default_model,
        api::handlers::llm_models::get_create_form,
        api::handlers::llm_models::submit_create_form,
        api::handlers::llm_models::get_edit_form,
        api::handlers::llm_models::submit_edit_form,
        // Users
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::users::set_user_status,
        api::handlers::users::get_create_form,
        api::handlers::users::submit_create_form,
        api::handlers::users::get_edit_form,
        api::handlers::users::submit_edit_form,
        // Dashboard
        api::handlers::summary::get_summary,
        // Chat
        api::handlers::chat::get_messages,
        api::handlers::chat::send_message,
        api::handlers::chat::clear_messages,
        api::handlers::chat::cancel_reply,
        api::handlers::chat::export_messages,
    ),
    components(
        schemas(
            api::models::database_connections::DatabaseConnectionCreate,
            api::models::database_connections::DatabaseConnectionUpdate,
            api::models::database_connections::DatabaseConnectionResponse,
            api::models::api_keys::ApiKeyCreate,
            api::models::api_keys::ApiKeyUpdate,
            api::models::api_keys::ApiKeyResponse,
            api::models::api_keys::ApiKeySecretResponse,
            api::models::api_keys::ApiKeyVisibilityResponse,
            api::models::llm_models::ModelCreate,
            api::models::llm_models::ModelUpdate,
            api::models::llm_models::ModelResponse,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::UserStatusUpdate,
            api::models::users::UserResponse,
            api::models::probes::ConnectionTestResponse,
            api::models::probes::ApiKeyTestResponse,
            api::models::summary::SummaryResponse,
            api::models::summary::ConnectionCounts,
            api::models::chat::SendMessageRequest,
            api::models::chat::SendMessageResponse,
            api::models::chat::TranscriptResponse,
            api::models::chat::CancelResponse,
            crate::chat::ChatMessage,
            crate::chat::ChatRole,
            crate::db::models::probes::ProbeOutcome,
            crate::db::models::llm_models::ModelConfig,
            crate::db::models::llm_models::ModelConfigUpdate,
            crate::forms::FormView,
            crate::forms::FormSubmission,
            crate::forms::fields::FormFieldView,
            crate::validation::FieldError,
        )
    ),
    tags(
        (name = "connections", description = "Database connections the deployment stores its configuration in.

New connections start as `untested`. `POST /connections/{id}/test` opens a TCP connection to the host (or checks the file, for SQLite) and records the result."),
        (name = "api_keys", description = "Provider API keys.

Secrets are write-only: every response carries `masked_key`, and the full key is only returned by `GET /api-keys/{id}/secret` or while revealed through `POST /api-keys/{id}/visibility`. Usage limits are informational; exceeding one sets `usage_exceeded` but never blocks requests."),
        (name = "models", description = "Models available to the chat session, with their generation parameters.

Exactly one model is the default whenever any model exists."),
        (name = "users", description = "User accounts, their roles and usage counters."),
        (name = "summary", description = "Dashboard aggregates."),
        (name = "chat", description = "A shared chat session with a simulated assistant."),
    )
)]
pub struct ApiDoc;
