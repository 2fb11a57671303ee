//! Offline prober for demos and tests.

use super::{ApiKeyTarget, ConnectionTarget, Prober};
use crate::db::models::probes::ProbeOutcome;
use async_trait::async_trait;

/// Reports every target as reachable, immediately and without network traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedProber;

#[async_trait]
impl Prober for SimulatedProber {
    async fn probe_connection(&self, _target: &ConnectionTarget) -> ProbeOutcome {
        ProbeOutcome::succeeded(0)
    }

    async fn probe_api_key(&self, _target: &ApiKeyTarget) -> ProbeOutcome {
        ProbeOutcome::succeeded(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{api_keys::Provider, database_connections::DatabaseType};

    #[tokio::test]
    async fn test_always_succeeds() {
        let connection = ConnectionTarget {
            db_type: DatabaseType::Mysql,
            host: "unreachable.invalid".to_string(),
            port: 3306,
            database: "cache".to_string(),
        };
        let outcome = SimulatedProber.probe_connection(&connection).await;
        assert!(outcome.success);
        assert_eq!(outcome.response_time_ms, 0);

        let key = ApiKeyTarget {
            provider: Provider::Cohere,
            key: String::new(),
        };
        assert!(SimulatedProber.probe_api_key(&key).await.success);
    }
}
