use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::providers::Provider;
use crate::usage;

#[derive(Parser, Debug)]
#[command(
    name = "upcheck",
    version,
    about = "Ask an AI agent about releases, dependencies and changes in public GitHub repositories"
)]
pub struct Cli {
    /// Path to a config file (defaults to ./upcheck.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, global = true, env = "GITHUB_API_URL")]
    pub github_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask a single question and print the answer
    Ask {
        /// The question, e.g. "what is the latest release of hashicorp/vault?"
        question: String,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Start an interactive session
    Chat {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Show GitHub API rate-limit status
    Health,

    /// Run one tool directly, without the model
    Tool {
        /// Tool name, e.g. check_latest_release
        name: String,

        /// Arguments as key=value pairs
        args: Vec<String>,
    },

    /// Generate an upcheck.toml config file in the current directory
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    Usage(usage::Usage),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Model to use (provider is detected from the name)
    #[arg(long)]
    pub model: Option<String>,

    /// LLM provider
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Custom API base URL for OpenAI-compatible endpoints
    #[arg(long)]
    pub base_url: Option<String>,

    /// Max response tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Max model rounds per question
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_rounds: Option<u64>,
}
