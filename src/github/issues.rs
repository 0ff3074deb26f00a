use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use super::{GitHubClient, Outcome};

/// Closed issues requested per page of the PR window.
pub const PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
    title: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    html_url: String,
    #[serde(default)]
    pull_request: Option<ApiPullRequestMarker>,
}

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequestMarker {
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub labels: Vec<String>,
    pub html_url: String,
    pub merged_at: Option<DateTime<Utc>>,
}

/// One page of merged PRs plus the page to request next, if the API page was full.
///
/// A `None` continuation is not proof of completeness: the window is bounded by
/// update time, not by the release's commit range.
#[derive(Debug, Clone, PartialEq)]
pub struct PrWindow {
    pub prs: Vec<PullRequestSummary>,
    pub next_page: Option<u32>,
}

impl ApiIssue {
    fn into_merged_pr(self) -> Option<PullRequestSummary> {
        if self.state.as_deref().is_some_and(|s| s != "closed") {
            return None;
        }
        let merged_at = self.pull_request?.merged_at?;
        Some(PullRequestSummary {
            number: self.number,
            title: self.title,
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            html_url: self.html_url,
            merged_at: Some(merged_at),
        })
    }
}

impl GitHubClient {
    /// Merged PRs among closed issues updated since `since`, newest first.
    pub async fn merged_prs_since(
        &self,
        org: &str,
        repo: &str,
        since: DateTime<Utc>,
        page: u32,
    ) -> Outcome<PrWindow> {
        let path = Self::repo_path(org, repo, "/issues");
        let mut query = vec![
            ("state", "closed".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
            ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("per_page", PAGE_SIZE.to_string()),
        ];
        if page > 1 {
            query.push(("page", page.to_string()));
        }

        let items: Vec<ApiIssue> = self.get_json(&path, &query).await?;
        let next_page = (items.len() >= PAGE_SIZE as usize).then_some(page + 1);
        let prs = items
            .into_iter()
            .filter_map(ApiIssue::into_merged_pr)
            .collect();
        Ok(PrWindow { prs, next_page })
    }
}
