use serde::Deserialize;

use super::{ORG_PARAM, ParamSpec, REPO_PARAM, Status, ToolContext, ToolKind, ToolSpec};
use crate::github::ApiError;

#[derive(Debug, Deserialize)]
pub struct Args {
    pub org_name: String,
    pub repo_name: String,
    pub file_path: String,
}

pub fn spec() -> ToolSpec {
    ToolSpec {
        name: ToolKind::GetDependencyFile.to_string(),
        description: "Retrieves the first 10 lines of a specific dependency file (like go.mod, \
                      package.json, or requirements.txt) from the main branch of a repository \
                      to check dependency versions.",
        params: vec![
            ORG_PARAM,
            REPO_PARAM,
            ParamSpec::required_string(
                "file_path",
                "The path to the file (e.g., 'go.mod' or 'package.json').",
            ),
        ],
    }
}

pub async fn execute(ctx: &ToolContext<'_>, args: &Args) -> String {
    let (org, repo, file_path) = (&args.org_name, &args.repo_name, &args.file_path);
    match ctx.github.file_snippet(org, repo, file_path).await {
        Ok(snippet) => {
            Status::Success.message(format!("Content of `{file_path}`:\n```\n{snippet}\n```"))
        }
        Err(ApiError::NotFound) => {
            Status::Error.message(format!("File '{file_path}' not found in {org}/{repo}."))
        }
        Err(e @ (ApiError::Network(_) | ApiError::Decode(_))) => {
            Status::ToolError.message(format!("Could not process file content. Error: {e}"))
        }
        Err(e) => Status::Error.message(e),
    }
}
