use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clx::progress::ProgressJob;
use log::{info, warn};
use serde_json::{Map, Value};

use crate::agent::{self, AgentContext, DEFAULT_MAX_ROUNDS};
use crate::cli::ModelArgs;
use crate::config::{Config, Defaults};
use crate::error::{Error, Result};
use crate::github::GitHubClient;
use crate::llm::{Conversation, LlmClient, ToolCall, ToolResult};
use crate::prompt;
use crate::providers::{self, DEFAULT_MODEL};
use crate::session::{self, DEFAULT_HEALTH_TTL, SessionState};
use crate::tools::{ToolContext, ToolRegistry};

const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_PR_PAGES: u32 = 1;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub github_url: Option<String>,
}

/// Everything a command needs besides the model: GitHub access, the tool
/// registry, resolved defaults and the session bookkeeping.
pub struct App {
    github: GitHubClient,
    registry: ToolRegistry,
    defaults: Defaults,
    system_extra: Option<String>,
    max_pr_pages: u32,
    pub state: SessionState,
}

/// A configured model client plus the per-turn limits that go with it.
pub struct ModelSession {
    pub client: Box<dyn LlmClient>,
    pub system: String,
    pub max_rounds: usize,
}

impl App {
    pub fn load(global: &GlobalOptions) -> Result<Self> {
        let dir = std::env::current_dir()?;
        let config = match &global.config {
            Some(path) => Some(Config::load_from(path)?),
            None => Config::load(&dir)?,
        }
        .unwrap_or_default();
        let defaults = config.defaults.unwrap_or_default();

        let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        if token.is_none() {
            warn!(
                "GitHub API is using low anonymous rate limit (60 reqs/hr). \
                 Set GITHUB_TOKEN for high reliability."
            );
        }
        let github = match global
            .github_url
            .clone()
            .or(defaults.github_api_url.clone())
            .filter(|u| !u.is_empty())
        {
            Some(base_url) => {
                info!("github api: {base_url}");
                GitHubClient::with_base_url(token, base_url)?
            }
            None => GitHubClient::new(token)?,
        };

        let ttl = defaults
            .health_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HEALTH_TTL);
        let max_pr_pages = defaults.pr_pages.unwrap_or(DEFAULT_PR_PAGES).max(1);

        Ok(Self {
            github,
            registry: ToolRegistry::new()?,
            defaults,
            system_extra: config.system_extra,
            max_pr_pages,
            state: SessionState::new(ttl),
        })
    }

    /// Resolve model settings (CLI flag > config file > built-in default) and
    /// build the client. A missing API key fails here, before any question is asked.
    pub fn model_session(&self, args: &ModelArgs) -> Result<ModelSession> {
        let defaults = &self.defaults;
        let model = args
            .model
            .clone()
            .or(defaults.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.into());
        let max_tokens = args
            .max_tokens
            .or(defaults.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let max_rounds = match args.max_rounds {
            Some(n) => usize::try_from(n)
                .map_err(|_| Error::Config(format!("max_rounds {n} is too large")))?,
            None => defaults.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS),
        };
        let provider = args
            .provider
            .clone()
            .or(defaults.provider.clone())
            .unwrap_or_else(|| providers::detect_provider(&model));
        info!("provider: {provider:?}, model: {model}");

        let base_url = args
            .base_url
            .clone()
            .or(defaults.base_url.clone())
            .filter(|u| !u.is_empty());
        let api_key = providers::api_key(&provider, base_url.as_deref(), |name| {
            std::env::var(name).ok()
        })?;
        let client = providers::build_client(&provider, api_key, model, max_tokens, base_url)?;

        Ok(ModelSession {
            client,
            system: prompt::system_prompt(&self.registry, self.system_extra.as_deref()),
            max_rounds,
        })
    }

    fn tool_context(&self) -> ToolContext<'_> {
        ToolContext {
            github: &self.github,
            max_pr_pages: self.max_pr_pages,
        }
    }

    /// Run one user turn; `conversation` must already end with the user's message.
    pub async fn run_turn(
        &mut self,
        model: &ModelSession,
        conversation: &mut Conversation,
        job: &Arc<ProgressJob>,
    ) -> Result<String> {
        let ctx = AgentContext {
            client: model.client.as_ref(),
            system: &model.system,
            registry: &self.registry,
            tools: ToolContext {
                github: &self.github,
                max_pr_pages: self.max_pr_pages,
            },
            max_rounds: model.max_rounds,
            job,
        };
        agent::run_turn(&ctx, conversation, &mut self.state).await
    }

    pub async fn health_dashboard(&mut self) -> String {
        let calls = self.state.model_calls();
        let report = self.state.health(&self.github).await;
        session::render_dashboard(report, calls)
    }

    /// Invoke a tool by name with `key=value` arguments, bypassing the model.
    pub async fn run_tool(&self, name: &str, raw_args: &[String]) -> Result<ToolResult> {
        self.registry.resolve(name)?;
        let call = ToolCall {
            id: "cli".into(),
            name: name.to_string(),
            input: parse_key_values(raw_args)?,
        };
        Ok(self.registry.invoke(&self.tool_context(), &call).await)
    }
}

fn parse_key_values(raw_args: &[String]) -> Result<Value> {
    let mut map = Map::new();
    for arg in raw_args {
        let (key, value) = arg
            .split_once('=')
            .filter(|(k, _)| !k.is_empty())
            .ok_or_else(|| Error::Tool(format!("invalid argument `{arg}`: expected key=value")))?;
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(Value::Object(map))
}
