pub mod check_latest_release;
pub mod get_dependency_file;
pub mod get_release_prs;

use std::collections::HashSet;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::{Error, Result};
use crate::github::GitHubClient;
use crate::llm::{ToolCall, ToolDefinition, ToolResult};

/// Status prefix every tool string starts with. The model relies on it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Status {
    #[strum(serialize = "SUCCESS")]
    Success,
    #[strum(serialize = "ERROR")]
    Error,
    #[strum(serialize = "TOOL_ERROR")]
    ToolError,
}

impl Status {
    pub fn message(self, detail: impl std::fmt::Display) -> String {
        format!("{self}: {detail}")
    }

    pub fn of(content: &str) -> Option<Status> {
        let (prefix, _) = content.split_once(':')?;
        Status::iter().find(|s| s.to_string() == prefix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ToolKind {
    CheckLatestRelease,
    GetDependencyFile,
    GetReleasePrs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: &'static str,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required_string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: "string",
            required: true,
            description,
        }
    }
}

pub const ORG_PARAM: ParamSpec = ParamSpec::required_string(
    "org_name",
    "The GitHub organization or user name (e.g., 'hashicorp').",
);
pub const REPO_PARAM: ParamSpec =
    ParamSpec::required_string("repo_name", "The GitHub repository name (e.g., 'vault').");

#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({"type": p.kind, "description": p.description}),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.into(),
            input_schema: self.input_schema(),
        }
    }

    fn validate(&self, kind: ToolKind) -> Result<()> {
        if self.name != kind.to_string() {
            return Err(Error::Tool(format!(
                "spec name `{}` does not match tool `{kind}`",
                self.name
            )));
        }
        if self.description.trim().is_empty() {
            return Err(Error::Tool(format!("tool `{kind}` has no description")));
        }
        let mut seen = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name) {
                return Err(Error::Tool(format!(
                    "tool `{kind}` declares parameter `{}` twice",
                    param.name
                )));
            }
        }
        Ok(())
    }
}

/// What a tool handler may touch while it runs.
pub struct ToolContext<'a> {
    pub github: &'a GitHubClient,
    /// Upper bound on issue pages the PR-summary tool follows.
    pub max_pr_pages: u32,
}

impl ToolKind {
    fn spec(self) -> ToolSpec {
        match self {
            ToolKind::CheckLatestRelease => check_latest_release::spec(),
            ToolKind::GetDependencyFile => get_dependency_file::spec(),
            ToolKind::GetReleasePrs => get_release_prs::spec(),
        }
    }

    async fn execute(self, ctx: &ToolContext<'_>, input: &Value) -> String {
        match self {
            ToolKind::CheckLatestRelease => match parse_args(self, input) {
                Ok(args) => check_latest_release::execute(ctx, &args).await,
                Err(msg) => msg,
            },
            ToolKind::GetDependencyFile => match parse_args(self, input) {
                Ok(args) => get_dependency_file::execute(ctx, &args).await,
                Err(msg) => msg,
            },
            ToolKind::GetReleasePrs => match parse_args(self, input) {
                Ok(args) => get_release_prs::execute(ctx, &args).await,
                Err(msg) => msg,
            },
        }
    }
}

fn parse_args<T: DeserializeOwned>(kind: ToolKind, input: &Value) -> std::result::Result<T, String> {
    serde_json::from_value(input.clone())
        .map_err(|e| Status::ToolError.message(format!("Invalid arguments for `{kind}`: {e}")))
}

/// Name → handler mapping, fixed at startup.
pub struct ToolRegistry {
    entries: Vec<(ToolKind, ToolSpec)>,
}

impl ToolRegistry {
    pub fn new() -> Result<Self> {
        let mut entries: Vec<(ToolKind, ToolSpec)> = Vec::new();
        for kind in ToolKind::iter() {
            let spec = kind.spec();
            spec.validate(kind)?;
            if entries.iter().any(|(_, s)| s.name == spec.name) {
                return Err(Error::Tool(format!("duplicate tool name: {}", spec.name)));
            }
            entries.push((kind, spec));
        }
        Ok(Self { entries })
    }

    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.entries.iter().map(|(_, spec)| spec)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.specs().map(ToolSpec::definition).collect()
    }

    pub fn resolve(&self, name: &str) -> Result<ToolKind> {
        self.entries
            .iter()
            .find(|(_, spec)| spec.name == name)
            .map(|(kind, _)| *kind)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))
    }

    /// Run one requested call. Every failure ends up inside the returned result.
    pub async fn invoke(&self, ctx: &ToolContext<'_>, call: &ToolCall) -> ToolResult {
        let content = match self.resolve(&call.name) {
            Ok(kind) => {
                info!("calling tool: {} {}", call.name, call.input);
                kind.execute(ctx, &call.input).await
            }
            Err(e) => {
                warn!("model requested unknown tool `{}`", call.name);
                Status::ToolError.message(e)
            }
        };
        ToolResult {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            is_error: Status::of(&content) != Some(Status::Success),
            content,
        }
    }
}
