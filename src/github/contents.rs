use super::{GitHubClient, Outcome};

pub const SNIPPET_LINES: usize = 10;

impl GitHubClient {
    /// Raw file content cut down to its first ten lines.
    ///
    /// Only the line count is capped; a single enormous line comes back whole.
    pub async fn file_snippet(&self, org: &str, repo: &str, file_path: &str) -> Outcome<String> {
        let rest = format!("/contents/{}", file_path.trim_start_matches('/'));
        let path = Self::repo_path(org, repo, &rest);
        let content = self.call(&path, &[], true).await?.into_text();
        Ok(first_lines(&content, SNIPPET_LINES))
    }
}

pub fn first_lines(text: &str, count: usize) -> String {
    text.split('\n').take(count).collect::<Vec<_>>().join("\n")
}
