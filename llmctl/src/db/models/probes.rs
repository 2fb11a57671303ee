use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The result of probing a database connection or an API key.
///
/// A probe always produces an outcome, even when the target is unreachable, so that the
/// record's timestamp is stamped regardless of success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProbeOutcome {
    /// Whether the target accepted the connection or credential
    pub success: bool,
    /// When the probe finished
    pub checked_at: DateTime<Utc>,
    /// Time taken by the probe in milliseconds
    pub response_time_ms: u64,
    /// Failure reason (only set when `success` is false)
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn succeeded(response_time_ms: u64) -> Self {
        Self {
            success: true,
            checked_at: Utc::now(),
            response_time_ms,
            error: None,
        }
    }

    pub fn failed(response_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            checked_at: Utc::now(),
            response_time_ms,
            error: Some(error.into()),
        }
    }
}
