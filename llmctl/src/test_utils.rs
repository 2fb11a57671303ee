//! Test utilities shared by the handler tests.

use crate::config::{ChatConfig, Config, ProbeMode, ProbesConfig};
use crate::db::handlers::{ApiKeys, DatabaseConnections, Models, Repository, Users};
use crate::db::models::{
    api_keys::{ApiKeyCreateDBRequest, ApiKeyDBResponse, Provider},
    database_connections::{DatabaseConnectionCreateDBRequest, DatabaseConnectionDBResponse, DatabaseType},
    llm_models::{ModelConfig, ModelCreateDBRequest, ModelDBResponse},
    users::{Role, UserCreateDBRequest, UserDBResponse, UserStatus},
};
use crate::{AppState, Application};
use axum_test::TestServer;
use std::time::Duration;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        seed_demo_data: false,
        probes: ProbesConfig {
            mode: ProbeMode::Simulated,
            ..ProbesConfig::default()
        },
        chat: ChatConfig {
            response_latency: Duration::from_millis(20),
        },
        ..Config::default()
    }
}

/// A test server over the full router, plus the state behind it for direct setup.
pub async fn create_test_app() -> (TestServer, AppState) {
    let app = Application::new(create_test_config())
        .await
        .expect("Failed to create application");
    let state = app.state().clone();
    (app.into_test_server(), state)
}

pub async fn create_test_connection(state: &AppState) -> DatabaseConnectionDBResponse {
    let mut table = state.store.connections().await;
    DatabaseConnections::new(&mut table)
        .create(&DatabaseConnectionCreateDBRequest {
            name: "Test DB".to_string(),
            db_type: DatabaseType::Postgresql,
            host: "db.local".to_string(),
            port: 5432,
            database: "app".to_string(),
            username: "svc".to_string(),
            password: Some("hunter2".to_string()),
        })
        .await
        .expect("Failed to create test connection")
}

pub async fn create_test_api_key(state: &AppState) -> ApiKeyDBResponse {
    let mut table = state.store.api_keys().await;
    ApiKeys::new(&mut table)
        .create(&ApiKeyCreateDBRequest {
            name: "OpenAI Production".to_string(),
            provider: Provider::Openai,
            key: format!("sk-test-{}", uuid::Uuid::new_v4().simple()),
            usage_limit: Some(10_000),
        })
        .await
        .expect("Failed to create test API key")
}

pub async fn create_test_model(state: &AppState, id: &str) -> ModelDBResponse {
    let mut table = state.store.models().await;
    Models::new(&mut table)
        .create(&ModelCreateDBRequest {
            id: id.to_string(),
            name: id.to_uppercase(),
            provider: "OpenAI".to_string(),
            version: format!("{id}-0125"),
            context_length: 8192,
            cost_per_1k: 0.002,
            enabled: true,
            config: ModelConfig::default(),
            make_default: false,
        })
        .await
        .expect("Failed to create test model")
}

pub async fn create_test_user(state: &AppState, email: &str) -> UserDBResponse {
    let mut table = state.store.users().await;
    Users::new(&mut table)
        .create(&UserCreateDBRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            role: Role::User,
            status: UserStatus::Active,
            usage_limit: 5000,
        })
        .await
        .expect("Failed to create test user")
}
