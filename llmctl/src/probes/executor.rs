//! Live probe execution.
//!
//! [`LiveProber`] talks to the real targets: a TCP connect for network databases, a file
//! check for SQLite, and an authenticated `GET` against the provider's API for keys. Response
//! times are measured around the whole check, failures included.

use super::{ApiKeyTarget, ConnectionTarget, Prober};
use crate::config::{ProbesConfig, ProviderEndpoints};
use crate::db::models::{api_keys::Provider, database_connections::DatabaseType, probes::ProbeOutcome};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Probes targets over the network.
pub struct LiveProber {
    client: Client,
    timeout: Duration,
    providers: ProviderEndpoints,
}

impl LiveProber {
    pub fn new(config: &ProbesConfig) -> anyhow::Result<Self> {
        // Install the default rustls crypto provider; ignore the error if one is already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            timeout: config.timeout,
            providers: config.providers.clone(),
        })
    }

    async fn connect(&self, host: &str, port: u16) -> Result<(), String> {
        if port == 0 {
            return Err("No port configured".to_string());
        }
        match tokio::time::timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(format!("Could not connect to {host}:{port}: {e}")),
            Err(_) => Err(format!("Connection to {host}:{port} timed out after {:?}", self.timeout)),
        }
    }

    async fn check_file(path: &str) -> Result<(), String> {
        match tokio::fs::try_exists(path).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(format!("Database file {path} does not exist")),
            Err(e) => Err(format!("Could not access database file {path}: {e}")),
        }
    }

    /// The authenticated request that lists models (or identifies the caller) at a provider.
    fn key_request(&self, target: &ApiKeyTarget) -> RequestBuilder {
        let base = self.providers.base_url(target.provider).as_str().trim_end_matches('/');
        match target.provider {
            Provider::Openai | Provider::Cohere => self.client.get(format!("{base}/models")).bearer_auth(&target.key),
            Provider::Anthropic => self
                .client
                .get(format!("{base}/models"))
                .header("x-api-key", &target.key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            Provider::Google => self.client.get(format!("{base}/models")).header("x-goog-api-key", &target.key),
            Provider::Huggingface => self.client.get(format!("{base}/whoami-v2")).bearer_auth(&target.key),
        }
    }

    async fn check_key(&self, target: &ApiKeyTarget) -> Result<(), String> {
        let response = match self.key_request(target).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(format!("Request timed out after {:?}", self.timeout)),
            Err(e) => return Err(e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(format!("HTTP {} - {}", status.as_u16(), error_reason(&body)))
    }
}

/// Pull a readable reason out of a provider's error body.
///
/// Providers nest it differently (`{"error": {"message": ..}}`, `{"error": ".."}`,
/// `{"message": ..}`); anything unrecognised is returned as-is.
fn error_reason(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let error = json.get("error").unwrap_or(&json);
    let reason = error.get("message").unwrap_or(error);
    match reason {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

#[async_trait]
impl Prober for LiveProber {
    async fn probe_connection(&self, target: &ConnectionTarget) -> ProbeOutcome {
        let start = Instant::now();
        let result = match target.db_type {
            DatabaseType::Sqlite => Self::check_file(&target.database).await,
            _ => self.connect(&target.host, target.port).await,
        };
        match result {
            Ok(()) => ProbeOutcome::succeeded(elapsed_ms(start)),
            Err(reason) => ProbeOutcome::failed(elapsed_ms(start), reason),
        }
    }

    async fn probe_api_key(&self, target: &ApiKeyTarget) -> ProbeOutcome {
        let start = Instant::now();
        match self.check_key(target).await {
            Ok(()) => ProbeOutcome::succeeded(elapsed_ms(start)),
            Err(reason) => ProbeOutcome::failed(elapsed_ms(start), reason),
        }
    }
}
