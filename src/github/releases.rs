use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{GitHubClient, Outcome};

const SNIPPET_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
struct ApiRelease {
    tag_name: Option<String>,
    published_at: Option<DateTime<Utc>>,
    html_url: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseInfo {
    pub tag: String,
    pub published_at: Option<DateTime<Utc>>,
    pub html_url: String,
    pub body_snippet: String,
}

impl ReleaseInfo {
    /// Publish date as `YYYY-MM-DD`, or `N/A` for unpublished releases.
    pub fn published_date(&self) -> String {
        self.published_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".into())
    }
}

impl From<ApiRelease> for ReleaseInfo {
    fn from(release: ApiRelease) -> Self {
        Self {
            tag: release.tag_name.unwrap_or_else(|| "N/A".into()),
            published_at: release.published_at,
            html_url: release.html_url.unwrap_or_else(|| "N/A".into()),
            body_snippet: body_snippet(release.body.as_deref().unwrap_or_default()),
        }
    }
}

/// First 100 characters of a release body on one line, with an ellipsis.
pub fn body_snippet(body: &str) -> String {
    let head: String = body.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", head.replace("\r\n", "\n").replace('\n', " "))
}

impl GitHubClient {
    /// `NotFound` covers both a missing repository and one without releases.
    pub async fn latest_release(&self, org: &str, repo: &str) -> Outcome<ReleaseInfo> {
        let path = Self::repo_path(org, repo, "/releases/latest");
        let release: ApiRelease = self.get_json(&path, &[]).await?;
        Ok(release.into())
    }

    pub async fn release_by_tag(&self, org: &str, repo: &str, tag: &str) -> Outcome<ReleaseInfo> {
        let path = Self::repo_path(org, repo, &format!("/releases/tags/{tag}"));
        let release: ApiRelease = self.get_json(&path, &[]).await?;
        Ok(release.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::ApiError;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, GitHubClient) {
        let server = MockServer::start().await;
        let client = GitHubClient::with_base_url(None, server.uri()).unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn test_latest_release() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/repos/hashicorp/vault/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tag_name": "v1.16.0",
                "published_at": "2024-04-10T12:00:00Z",
                "html_url": "https://github.com/hashicorp/vault/releases/tag/v1.16.0",
                "body": "Improvements"
            })))
            .mount(&server)
            .await;

        let release = client.latest_release("hashicorp", "vault").await.unwrap();
        assert_eq!(release.tag, "v1.16.0");
        assert_eq!(
            release.published_at,
            Some(Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap())
        );
        assert_eq!(release.published_date(), "2024-04-10");
        assert_eq!(release.body_snippet, "Improvements...");
    }

    #[tokio::test]
    async fn test_latest_release_not_found() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/repos/nobody/nothing/releases/latest"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client.latest_release("nobody", "nothing").await.unwrap_err();
        assert_eq!(err, ApiError::NotFound);
    }

    #[tokio::test]
    async fn test_release_by_tag_missing_fields() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/releases/tags/v0.1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tag_name": "v0.1.0",
                "published_at": null,
                "body": null
            })))
            .mount(&server)
            .await;

        let release = client.release_by_tag("o", "r", "v0.1.0").await.unwrap();
        assert_eq!(release.published_at, None);
        assert_eq!(release.published_date(), "N/A");
        assert_eq!(release.html_url, "N/A");
        assert_eq!(release.body_snippet, "...");
    }

    #[test]
    fn test_body_snippet_truncates_on_chars() {
        let body = "é".repeat(150);
        let snippet = body_snippet(&body);
        assert_eq!(snippet.chars().count(), 103);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_body_snippet_normalizes_newlines() {
        assert_eq!(body_snippet("a\nb\r\nc"), "a b c...");
    }
}
