//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `LLMCTL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `LLMCTL_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `LLMCTL_PROBES__MODE=simulated` sets the `probes.mode` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use llmctl::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}", config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Logging**: `log_level` - default filter when `RUST_LOG` is unset
//! - **Demo data**: `seed_demo_data` - load the sample records on start-up
//! - **CORS**: `cors.allowed_origins`, `cors.allow_credentials`
//! - **Probes**: `probes.mode`, `probes.timeout`, `probes.providers.*` - connection and key tests
//! - **Chat**: `chat.response_latency` - delay before the simulated assistant replies
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! LLMCTL_PORT=8080
//! LLMCTL_PROBES__TIMEOUT=2s
//! LLMCTL_PROBES__PROVIDERS__OPENAI=http://localhost:9000/v1
//! LLMCTL_CHAT__RESPONSE_LATENCY=250ms
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::db::models::api_keys::Provider;
use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "LLMCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have sensible defaults defined in the `Default` implementation, so an empty
/// (or missing) YAML file is a valid configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Log filter used when `RUST_LOG` is not set (e.g. "info" or "llmctl=debug,info")
    pub log_level: String,
    /// Load the sample connections, keys, models and users on start-up
    pub seed_demo_data: bool,
    pub cors: CorsConfig,
    pub probes: ProbesConfig,
    pub chat: ChatConfig,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// How connection and API key tests are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Open a TCP connection / call the provider's API
    Live,
    /// Always succeed immediately, without any network traffic
    Simulated,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbesConfig {
    pub mode: ProbeMode,
    /// Upper bound on a single probe, connection set-up included
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub providers: ProviderEndpoints,
}

/// Base URLs of the provider APIs used to verify API keys.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderEndpoints {
    pub openai: Url,
    pub anthropic: Url,
    pub google: Url,
    pub cohere: Url,
    pub huggingface: Url,
}

impl ProviderEndpoints {
    pub fn base_url(&self, provider: Provider) -> &Url {
        match provider {
            Provider::Openai => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::Google => &self.google,
            Provider::Cohere => &self.cohere,
            Provider::Huggingface => &self.huggingface,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatConfig {
    /// Fixed delay before the simulated assistant reply is appended
    #[serde(with = "humantime_serde")]
    pub response_latency: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            log_level: "info".to_string(),
            seed_demo_data: true,
            cors: CorsConfig::default(),
            probes: ProbesConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Url(static_url("http://localhost:5173"))], // Development frontend (Vite)
            allow_credentials: true,
            max_age: Some(3600), // Cache preflight for 1 hour
        }
    }
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            mode: ProbeMode::Live,
            timeout: Duration::from_secs(5),
            providers: ProviderEndpoints::default(),
        }
    }
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            openai: static_url("https://api.openai.com/v1"),
            anthropic: static_url("https://api.anthropic.com/v1"),
            google: static_url("https://generativelanguage.googleapis.com/v1beta"),
            cohere: static_url("https://api.cohere.com/v1"),
            huggingface: static_url("https://huggingface.co/api"),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            response_latency: Duration::from_millis(1500),
        }
    }
}

fn static_url(url: &'static str) -> Url {
    Url::parse(url).expect("built-in URL literal is valid")
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values
            .merge(Env::prefixed("LLMCTL_").split("__"))
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        if EnvFilter::try_new(&self.log_level).is_err() {
            return Err(Error::Internal {
                operation: format!("Config validation: log_level '{}' is not a valid filter directive", self.log_level),
            });
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                    .to_string(),
            });
        }

        if self.probes.timeout.is_zero() || self.probes.timeout > Duration::from_secs(120) {
            return Err(Error::Internal {
                operation: "Config validation: probes.timeout must be between 1ms and 2 minutes".to_string(),
            });
        }

        if self.chat.response_latency > Duration::from_secs(60) {
            return Err(Error::Internal {
                operation: "Config validation: chat.response_latency is too long (maximum 60s)".to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
