//! Demo records loaded on start-up when `seed_demo_data` is set.

use crate::db::{
    handlers::{ApiKeys, DatabaseConnections, Models, Repository, Users},
    models::{
        api_keys::{ApiKeyCreateDBRequest, Provider},
        database_connections::{DatabaseConnectionCreateDBRequest, DatabaseType},
        llm_models::{ModelConfig, ModelCreateDBRequest},
        probes::ProbeOutcome,
        users::{Role, UserCreateDBRequest, UserStatus},
    },
    store::Store,
};
use chrono::{Duration, Utc};
use tracing::{debug, info, instrument};

fn outcome_ago(ago: Duration, error: Option<&str>) -> ProbeOutcome {
    ProbeOutcome {
        success: error.is_none(),
        checked_at: Utc::now() - ago,
        response_time_ms: 42,
        error: error.map(str::to_string),
    }
}

/// Populate an empty store with sample connections, keys, models and users.
///
/// Does nothing if any table already holds records, so it never overwrites manual changes.
#[instrument(skip_all)]
pub async fn seed_demo_data(store: &Store) -> anyhow::Result<()> {
    {
        let (connections, api_keys, models, users) =
            (store.connections().await, store.api_keys().await, store.models().await, store.users().await);
        if !connections.is_empty() || !api_keys.is_empty() || !models.is_empty() || !users.is_empty() {
            info!("Store already holds records, skipping demo data");
            return Ok(());
        }
    }

    info!("Seeding store with demo data");
    seed_connections(store).await?;
    seed_api_keys(store).await?;
    seed_models(store).await?;
    seed_users(store).await?;
    debug!("Demo data seeded");
    Ok(())
}

async fn seed_connections(store: &Store) -> anyhow::Result<()> {
    let mut table = store.connections().await;
    let mut repo = DatabaseConnections::new(&mut table);

    let samples = [
        ("Production DB", DatabaseType::Postgresql, "prod-db.example.com", 5432, "llm_config", "admin", Duration::zero(), None),
        (
            "Analytics DB",
            DatabaseType::Mongodb,
            "analytics.example.com",
            27017,
            "analytics",
            "analytics_user",
            Duration::hours(1),
            None,
        ),
        (
            "Cache DB",
            DatabaseType::Mysql,
            "cache.example.com",
            3306,
            "cache",
            "cache_user",
            Duration::hours(2),
            Some("Could not connect to cache.example.com:3306: connection refused"),
        ),
    ];

    for (name, db_type, host, port, database, username, ago, error) in samples {
        let created = repo
            .create(&DatabaseConnectionCreateDBRequest {
                name: name.to_string(),
                db_type,
                host: host.to_string(),
                port,
                database: database.to_string(),
                username: username.to_string(),
                password: None,
            })
            .await?;
        repo.record_probe(created.id, &outcome_ago(ago, error)).await?;
    }
    Ok(())
}

async fn seed_api_keys(store: &Store) -> anyhow::Result<()> {
    let mut table = store.api_keys().await;

    let samples = [
        ("OpenAI Production", Provider::Openai, "sk-demo-openai-production", Some(10_000), 2847, 7, Duration::zero(), None),
        ("Anthropic Claude", Provider::Anthropic, "sk-ant-demo-claude", None, 1234, 14, Duration::hours(1), None),
        (
            "Google AI",
            Provider::Google,
            "AIza-demo-google-ai",
            None,
            456,
            30,
            Duration::days(1),
            Some("Provider rejected the key (HTTP 403)"),
        ),
    ];

    for (name, provider, key, usage_limit, usage, age_days, last_used_ago, error) in samples {
        let created = ApiKeys::new(&mut table)
            .create(&ApiKeyCreateDBRequest {
                name: name.to_string(),
                provider,
                key: key.to_string(),
                usage_limit,
            })
            .await?;

        let mut repo = ApiKeys::new(&mut table);
        repo.record_probe(created.id, &outcome_ago(last_used_ago, error)).await?;
        repo.record_usage(created.id, usage, Utc::now() - last_used_ago).await?;

        if let Some(row) = table.get_mut(&created.id) {
            row.created_at = Utc::now() - Duration::days(age_days);
        }
    }
    Ok(())
}

async fn seed_models(store: &Store) -> anyhow::Result<()> {
    let mut table = store.models().await;
    let mut repo = Models::new(&mut table);

    let samples = [
        ("gpt-4", "GPT-4", "OpenAI", "gpt-4-0125-preview", 128_000, 0.03),
        ("gpt-3.5-turbo", "GPT-3.5 Turbo", "OpenAI", "gpt-3.5-turbo-0125", 16_385, 0.001),
        ("claude-3", "Claude 3 Opus", "Anthropic", "claude-3-opus-20240229", 200_000, 0.075),
    ];

    for (index, (id, name, provider, version, context_length, cost_per_1k)) in samples.into_iter().enumerate() {
        repo.create(&ModelCreateDBRequest {
            id: id.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
            version: version.to_string(),
            context_length,
            cost_per_1k,
            enabled: true,
            config: ModelConfig::default(),
            make_default: index == 0,
        })
        .await?;
    }
    Ok(())
}

async fn seed_users(store: &Store) -> anyhow::Result<()> {
    let mut table = store.users().await;

    let samples = [
        ("John Doe", "john@example.com", Role::Admin, UserStatus::Active, 10_000, 3247, 156, Duration::zero(), 30),
        ("Jane Smith", "jane@example.com", Role::User, UserStatus::Active, 5000, 1834, 89, Duration::hours(1), 15),
        ("Mike Johnson", "mike@example.com", Role::Viewer, UserStatus::Inactive, 1000, 234, 0, Duration::days(7), 60),
    ];

    for (name, email, role, status, usage_limit, usage_count, calls_today, login_ago, age_days) in samples {
        let created = Users::new(&mut table)
            .create(&UserCreateDBRequest {
                name: name.to_string(),
                email: email.to_string(),
                role,
                status,
                usage_limit,
            })
            .await?;

        let mut repo = Users::new(&mut table);
        repo.record_usage(created.id, calls_today).await?;
        repo.record_login(created.id, Utc::now() - login_ago).await?;

        // Usage from earlier days is not covered by today's calls
        if let Some(row) = table.get_mut(&created.id) {
            row.usage_count = usage_count;
            row.created_at = Utc::now() - Duration::days(age_days);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{api_keys::ApiKeyFilter, database_connections::DatabaseConnectionFilter};
    use crate::db::models::{api_keys::ApiKeyStatus, database_connections::ConnectionStatus};

    #[test_log::test(tokio::test)]
    async fn test_seeds_every_kind() {
        let store = Store::new();
        seed_demo_data(&store).await.unwrap();

        let mut table = store.connections().await;
        let connections = DatabaseConnections::new(&mut table)
            .list(&DatabaseConnectionFilter::default())
            .await
            .unwrap();
        let statuses: Vec<_> = connections.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![ConnectionStatus::Connected, ConnectionStatus::Connected, ConnectionStatus::Error]
        );
        assert!(connections.iter().all(|c| c.last_test.is_some()));
        drop(table);

        let mut table = store.api_keys().await;
        let keys = ApiKeys::new(&mut table).list(&ApiKeyFilter::default()).await.unwrap();
        assert_eq!(keys[0].usage_count, 2847);
        assert_eq!(keys[0].usage_limit, Some(10_000));
        assert_eq!(keys[0].status, ApiKeyStatus::Active);
        assert_eq!(keys[2].status, ApiKeyStatus::Error);
        drop(table);

        let mut table = store.models().await;
        let default = Models::new(&mut table).default_model().await.unwrap().unwrap();
        assert_eq!(default.id, "gpt-4");
        drop(table);

        let mut table = store.users().await;
        let john = Users::new(&mut table)
            .get_user_by_email("john@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(john.usage_count, 3247);
        assert_eq!(john.api_calls_today, 156);
        assert!(john.last_login.is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_second_seed_is_a_no_op() {
        let store = Store::new();
        seed_demo_data(&store).await.unwrap();
        seed_demo_data(&store).await.unwrap();
        assert_eq!(store.users().await.len(), 3);
        assert_eq!(store.models().await.len(), 3);
    }
}
