use chrono::{DateTime, Local, Utc};
use serde::Deserialize;

use super::{ApiError, GitHubClient, Outcome};

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    #[serde(default)]
    resources: Resources,
}

#[derive(Debug, Default, Deserialize)]
struct Resources {
    core: Option<CoreLimit>,
}

#[derive(Debug, Deserialize)]
struct CoreLimit {
    limit: u64,
    remaining: u64,
    reset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// A token was configured; it may still be invalid.
    pub authenticated: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitStatus {
    pub fn reset_local(&self) -> String {
        self.reset_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

impl GitHubClient {
    /// Quota of the "core" resource for the current identity.
    pub async fn rate_limit(&self) -> Outcome<RateLimitStatus> {
        let resp: RateLimitResponse = self.get_json("/rate_limit", &[]).await?;
        let core = resp
            .resources
            .core
            .ok_or_else(|| ApiError::Decode("missing resources.core".into()))?;
        let reset_at = DateTime::from_timestamp(core.reset, 0)
            .ok_or_else(|| ApiError::Decode(format!("invalid reset timestamp {}", core.reset)))?;
        Ok(RateLimitStatus {
            authenticated: self.has_token(),
            limit: core.limit,
            remaining: core.remaining,
            reset_at,
        })
    }
}
