//! # llmctl: configuration control plane for LLM deployments
//!
//! `llmctl` is a small admin service for the moving parts behind an LLM deployment: the
//! databases its configuration lives in, the provider API keys it calls out with, the models
//! it offers (and which one is the default), and the users allowed to use it. It also hosts a
//! chat session with a simulated assistant for trying models out.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum). Records live in an
//! in-process [`db::store::Store`], one mutex-guarded table per kind, accessed through the
//! repositories in [`db::handlers`].
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) serves the management API at `/admin/api/v1/*`. Each record kind
//! can be edited with typed JSON or through its form ([`forms`]), which accepts the raw texts
//! of an editor and reports every invalid field at once.
//!
//! **Probes** ([`probes`]) test a stored connection or key against the real target and record
//! the outcome on it. In `simulated` mode they always succeed, which is what the tests use.
//!
//! The **chat session** ([`chat`]) keeps one shared transcript. Replies are produced by a
//! background task that can be cancelled; a cancelled reply is never appended.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use llmctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = llmctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     llmctl::telemetry::init_telemetry(&config.log_level)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod errors;
pub mod forms;
mod openapi;
pub mod probes;
pub mod seed;
pub mod telemetry;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod test_utils;

use crate::chat::ChatSession;
use crate::config::CorsOrigin;
use crate::db::store::Store;
use crate::forms::visibility::SecretVisibility;
use crate::openapi::ApiDoc;
use crate::probes::Prober;
use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{ApiKeyId, DatabaseConnectionId, ModelId, UserId};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .store(Store::new())
///     .config(config)
///     .prober(probes::build_prober(&config.probes)?)
///     .chat(ChatSession::simulated(config.chat.response_latency))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Store,
    pub config: Config,
    pub prober: Arc<dyn Prober>,
    pub chat: ChatSession,
    #[builder(default)]
    pub secret_visibility: Arc<Mutex<SecretVisibility>>,
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // A listed origin may not be `*`, so a wildcard anywhere allows any origin
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::CONTENT_DISPOSITION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the router: the management API under `/admin/api/v1`, its OpenAPI document and
/// docs, and a health check, wrapped in CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{api_keys, chat, database_connections, llm_models, summary, users};

    let api_routes = Router::new()
        // Database connections
        .route(
            "/connections",
            get(database_connections::list_connections).post(database_connections::create_connection),
        )
        .route(
            "/connections/form",
            get(database_connections::get_create_form).post(database_connections::submit_create_form),
        )
        .route(
            "/connections/{id}",
            get(database_connections::get_connection)
                .patch(database_connections::update_connection)
                .delete(database_connections::delete_connection),
        )
        .route(
            "/connections/{id}/form",
            get(database_connections::get_edit_form).patch(database_connections::submit_edit_form),
        )
        .route("/connections/{id}/test", post(database_connections::test_connection))
        // API keys
        .route("/api-keys", get(api_keys::list_api_keys).post(api_keys::create_api_key))
        .route("/api-keys/form", get(api_keys::get_create_form).post(api_keys::submit_create_form))
        .route(
            "/api-keys/{id}",
            get(api_keys::get_api_key)
                .patch(api_keys::update_api_key)
                .delete(api_keys::delete_api_key),
        )
        .route("/api-keys/{id}/form", get(api_keys::get_edit_form).patch(api_keys::submit_edit_form))
        .route("/api-keys/{id}/secret", get(api_keys::reveal_api_key))
        .route("/api-keys/{id}/visibility", post(api_keys::toggle_api_key_visibility))
        .route("/api-keys/{id}/test", post(api_keys::test_api_key))
        // Models
        .route("/models", get(llm_models::list_models).post(llm_models::create_model))
        .route("/models/default", get(llm_models::get_default_model))
        .route("/models/form", get(llm_models::get_create_form).post(llm_models::submit_create_form))
        .route(
            "/models/{id}",
            get(llm_models::get_model)
                .patch(llm_models::update_model)
                .delete(llm_models::delete_model),
        )
        .route("/models/{id}/form", get(llm_models::get_edit_form).patch(llm_models::submit_edit_form))
        .route("/models/{id}/toggle", post(llm_models::toggle_model))
        .route("/models/{id}/default", post(llm_models::set_default_model))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/form", get(users::get_create_form).post(users::submit_create_form))
        .route(
            "/users/{id}",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        .route("/users/{id}/form", get(users::get_edit_form).patch(users::submit_edit_form))
        .route("/users/{id}/status", post(users::set_user_status))
        // Dashboard
        .route("/summary", get(summary::get_summary))
        // Chat
        .route(
            "/chat/messages",
            get(chat::get_messages).post(chat::send_message).delete(chat::clear_messages),
        )
        .route("/chat/cancel", post(chat::cancel_reply))
        .route("/chat/export", get(chat::export_messages))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/admin/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/admin/api/v1", api_routes)
        .merge(Scalar::with_url("/admin/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The service: state plus the router built over it.
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting llmctl with configuration: {:#?}", config);

        let store = Store::new();
        if config.seed_demo_data {
            seed::seed_demo_data(&store).await?;
        }

        let app_state = AppState::builder()
            .store(store)
            .config(config.clone())
            .prober(probes::build_prober(&config.probes)?)
            .chat(ChatSession::simulated(config.chat.response_latency))
            .build();

        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            app_state,
            config,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.app_state
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "llmctl listening on http://{}, API docs at http://localhost:{}/admin/docs",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if self.app_state.chat.cancel_pending().await {
            info!("Cancelled the pending chat reply on shutdown");
        }

        Ok(())
    }
}
