use std::time::{Duration, Instant};

use console::style;
use log::debug;

use crate::github::rate_limit::RateLimitStatus;
use crate::github::{ApiError, GitHubClient, Outcome};
use crate::llm::Usage;

pub const DEFAULT_HEALTH_TTL: Duration = Duration::from_secs(300);

pub type HealthReport = Outcome<RateLimitStatus>;

struct CachedHealth {
    fetched_at: Instant,
    report: HealthReport,
}

/// Per-process session bookkeeping: model call count, token totals, and the
/// last rate-limit check.
pub struct SessionState {
    model_calls: u32,
    input_tokens: u64,
    output_tokens: u64,
    health_ttl: Duration,
    health: Option<CachedHealth>,
}

impl SessionState {
    pub fn new(health_ttl: Duration) -> Self {
        Self {
            model_calls: 0,
            input_tokens: 0,
            output_tokens: 0,
            health_ttl,
            health: None,
        }
    }

    pub fn record_model_call(&mut self, usage: &Usage) {
        self.model_calls += 1;
        self.input_tokens += u64::from(usage.input_tokens);
        self.output_tokens += u64::from(usage.output_tokens);
    }

    pub fn model_calls(&self) -> u32 {
        self.model_calls
    }

    /// `(input, output)` tokens across every model call so far.
    pub fn token_usage(&self) -> (u64, u64) {
        (self.input_tokens, self.output_tokens)
    }

    /// Rate-limit status, re-fetched once the cached one is older than the TTL.
    pub async fn health(&mut self, github: &GitHubClient) -> &HealthReport {
        let cached = match self.health.take() {
            Some(c) if c.fetched_at.elapsed() < self.health_ttl => c,
            _ => {
                debug!("checking GitHub rate limit");
                CachedHealth {
                    fetched_at: Instant::now(),
                    report: github.rate_limit().await,
                }
            }
        };
        &self.health.insert(cached).report
    }

    pub fn invalidate_health(&mut self) {
        self.health = None;
    }
}

pub fn render_dashboard(report: &HealthReport, model_calls: u32) -> String {
    let mut lines = vec![style("GitHub API Status").bold().to_string()];
    match report {
        Ok(status) => {
            let auth = if status.authenticated {
                style("Token Used").green()
            } else {
                style("Anonymous").red()
            };
            lines.push(format!("  Authentication:  {auth}"));
            lines.push(format!("  Calls Remaining: {}", status.remaining));
            lines.push(format!("  Total Limit:     {}", status.limit));
            lines.push(format!("  Reset Time:      {}", status.reset_local()));
        }
        Err(e) => {
            let detail = match e {
                ApiError::Network(_) => format!("Network error during health check: {e}"),
                ApiError::Decode(_) => format!("Unexpected response during health check: {e}"),
                _ => format!(
                    "Could not check rate limit. Status: {}",
                    e.status().unwrap_or_default()
                ),
            };
            lines.push(format!("  {}", style(detail).red()));
        }
    }
    lines.push(String::new());
    lines.push(style("Model API Usage").bold().to_string());
    lines.push(format!("  Session Calls Made: {model_calls}"));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::fake_usage;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn rate_limit_server(expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": {"core": {"limit": 60, "remaining": 42, "reset": 1712750400}}
            })))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_record_model_call() {
        let mut state = SessionState::new(DEFAULT_HEALTH_TTL);
        let usage = Usage {
            input_tokens: 100,
            output_tokens: 20,
        };
        state.record_model_call(&usage);
        state.record_model_call(&fake_usage());
        assert_eq!(state.model_calls(), 2);
        assert_eq!(state.token_usage(), (100, 20));
    }

    #[tokio::test]
    async fn test_health_is_cached_within_ttl() {
        let server = rate_limit_server(1).await;
        let github = GitHubClient::with_base_url(None, server.uri()).unwrap();
        let mut state = SessionState::new(DEFAULT_HEALTH_TTL);

        let first = state.health(&github).await.clone().unwrap();
        let second = state.health(&github).await.clone().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.remaining, 42);
    }

    #[tokio::test]
    async fn test_health_refreshes_after_ttl() {
        let server = rate_limit_server(2).await;
        let github = GitHubClient::with_base_url(None, server.uri()).unwrap();
        let mut state = SessionState::new(Duration::ZERO);

        assert!(state.health(&github).await.is_ok());
        assert!(state.health(&github).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let server = rate_limit_server(2).await;
        let github = GitHubClient::with_base_url(None, server.uri()).unwrap();
        let mut state = SessionState::new(DEFAULT_HEALTH_TTL);

        assert!(state.health(&github).await.is_ok());
        state.invalidate_health();
        assert!(state.health(&github).await.is_ok());
    }

    #[test]
    fn test_dashboard_success() {
        console::set_colors_enabled(false);
        let report: HealthReport = Ok(RateLimitStatus {
            authenticated: false,
            limit: 60,
            remaining: 42,
            reset_at: Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap(),
        });
        let out = render_dashboard(&report, 3);
        assert!(out.contains("Authentication:  Anonymous"));
        assert!(out.contains("Calls Remaining: 42"));
        assert!(out.contains("Total Limit:     60"));
        assert!(out.contains("Reset Time:"));
        assert!(out.contains("Session Calls Made: 3"));
    }

    #[test]
    fn test_dashboard_errors() {
        console::set_colors_enabled(false);
        let out = render_dashboard(&Err(ApiError::Forbidden(403)), 0);
        assert!(out.contains("Could not check rate limit. Status: 403"));

        let out = render_dashboard(&Err(ApiError::Http(502)), 0);
        assert!(out.contains("Could not check rate limit. Status: 502"));

        let out = render_dashboard(&Err(ApiError::Network("refused".into())), 0);
        assert!(out.contains("Network error during health check: refused"));
        assert!(out.contains("Session Calls Made: 0"));
    }

    #[tokio::test]
    async fn test_missing_core_reads_as_unexpected_response() {
        console::set_colors_enabled(false);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resources": {}})))
            .mount(&server)
            .await;
        let github = GitHubClient::with_base_url(None, server.uri()).unwrap();
        let mut state = SessionState::new(DEFAULT_HEALTH_TTL);

        let out = render_dashboard(state.health(&github).await, 0);
        assert!(out.contains("Unexpected response during health check"), "{out}");
        assert!(!out.contains("Network error"));
    }
}
