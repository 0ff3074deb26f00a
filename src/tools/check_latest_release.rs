use serde::Deserialize;

use super::{ORG_PARAM, REPO_PARAM, Status, ToolContext, ToolKind, ToolSpec};
use crate::github::ApiError;

#[derive(Debug, Deserialize)]
pub struct Args {
    pub org_name: String,
    pub repo_name: String,
}

pub fn spec() -> ToolSpec {
    ToolSpec {
        name: ToolKind::CheckLatestRelease.to_string(),
        description: "Checks the latest stable release version, publish date, and the direct \
                      GitHub release URL for a public repository (e.g., hashicorp/vault).",
        params: vec![ORG_PARAM, REPO_PARAM],
    }
}

pub async fn execute(ctx: &ToolContext<'_>, args: &Args) -> String {
    let (org, repo) = (&args.org_name, &args.repo_name);
    match ctx.github.latest_release(org, repo).await {
        Ok(release) => Status::Success.message(format!(
            "**{org}/{repo}** Latest Release: **{}** | Published: {}. Release URL: {}. \
             Notes Snippet: \"{}\"",
            release.tag,
            release.published_date(),
            release.html_url,
            release.body_snippet
        )),
        Err(ApiError::NotFound) => Status::Error.message(format!(
            "Repository {org}/{repo} not found or has no releases."
        )),
        Err(e @ (ApiError::Network(_) | ApiError::Decode(_))) => {
            Status::ToolError.message(format!("Network or connection issue: {e}"))
        }
        Err(e) => Status::Error.message(e),
    }
}
