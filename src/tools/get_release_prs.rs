use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;

use super::{ORG_PARAM, ParamSpec, REPO_PARAM, Status, ToolContext, ToolKind, ToolSpec};
use crate::categorize::{CategorizedReleaseReport, categorize};
use crate::github::issues::PullRequestSummary;
use crate::github::{ApiError, GitHubClient};

#[derive(Debug, Deserialize)]
pub struct Args {
    pub org_name: String,
    pub repo_name: String,
    pub tag_name: String,
}

pub fn spec() -> ToolSpec {
    ToolSpec {
        name: ToolKind::GetReleasePrs.to_string(),
        description: "Analyzes merged Pull Requests around a specific release tag and \
                      categorizes them into Bug Fixes, Enhancements/Features, and Other \
                      Changes based on labels and Conventional Commit prefixes (fix:, feat:).",
        params: vec![
            ORG_PARAM,
            REPO_PARAM,
            ParamSpec::required_string(
                "tag_name",
                "The exact release tag to analyze (e.g., 'v1.15.0').",
            ),
        ],
    }
}

/// Merged PRs gathered across however many pages were followed.
struct Collected {
    prs: Vec<PullRequestSummary>,
    pages_read: u32,
    /// More closed items may exist past the last page read.
    truncated: bool,
}

pub async fn execute(ctx: &ToolContext<'_>, args: &Args) -> String {
    let (org, repo, tag) = (&args.org_name, &args.repo_name, &args.tag_name);

    let release = match ctx.github.release_by_tag(org, repo, tag).await {
        Ok(release) => release,
        Err(e) => match e.status() {
            Some(code) => {
                return Status::Error.message(format!(
                    "Could not find release tag `{tag}` for categorization. Status: {code}."
                ));
            }
            None => {
                return Status::ToolError
                    .message(format!("Failed to fetch release `{tag}`. Error: {e}"));
            }
        },
    };

    let since = release.published_at.unwrap_or_else(Utc::now);
    let collected = match collect_window(ctx.github, org, repo, since, ctx.max_pr_pages).await {
        Ok(collected) => collected,
        Err(e) => {
            return Status::ToolError
                .message(format!("Failed to fetch PRs for release. Error: {e}"));
        }
    };

    let mut out = if collected.prs.is_empty() {
        Status::Success.message(format!(
            "Found no recently merged Pull Requests for release `{tag}`."
        ))
    } else {
        render(org, repo, &categorize(tag, &collected.prs))
    };
    if collected.truncated {
        out.push_str(&format!(
            "\n\nNote: only the first {} page(s) of closed items were examined; more merged \
             PRs may exist.",
            collected.pages_read
        ));
    }
    out
}

/// Follow continuations up to `max_pages`.
///
/// An HTTP-status failure ends the window with whatever was gathered so far.
/// Past the first page that counts as truncation, since earlier pages were
/// full. Only transport and decode failures are surfaced.
async fn collect_window(
    github: &GitHubClient,
    org: &str,
    repo: &str,
    since: DateTime<Utc>,
    max_pages: u32,
) -> Result<Collected, ApiError> {
    let max_pages = max_pages.max(1);
    let mut prs = Vec::new();
    let mut page = 1;
    loop {
        let window = match github.merged_prs_since(org, repo, since, page).await {
            Ok(window) => window,
            Err(e @ (ApiError::Network(_) | ApiError::Decode(_))) => return Err(e),
            Err(e) => {
                warn!("PR window for {org}/{repo} page {page} failed: {e}");
                return Ok(Collected {
                    prs,
                    pages_read: page - 1,
                    truncated: page > 1,
                });
            }
        };
        debug!("page {page}: {} merged PRs", window.prs.len());
        for pr in &window.prs {
            debug!("  #{} merged {:?} {}", pr.number, pr.merged_at, pr.html_url);
        }
        prs.extend(window.prs);
        match window.next_page {
            Some(next) if page < max_pages => page = next,
            Some(_) => {
                return Ok(Collected {
                    prs,
                    pages_read: page,
                    truncated: true,
                });
            }
            None => {
                return Ok(Collected {
                    prs,
                    pages_read: page,
                    truncated: false,
                });
            }
        }
    }
}

fn render(org: &str, repo: &str, report: &CategorizedReleaseReport) -> String {
    let mut parts = vec![
        Status::Success.message(format!(
            "Analysis for {org}/{repo} release `{}`:",
            report.tag
        )),
        format!("Total Relevant PRs Found: {}", report.total_found),
    ];
    for bucket in report.non_empty() {
        parts.push(format!(
            "\n--- {} ({}) ---",
            bucket.category,
            bucket.entries.len()
        ));
        parts.extend(bucket.entries.iter().cloned());
    }
    parts.join("\n")
}
