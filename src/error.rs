#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("LLM API error: {0}")]
    Llm(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("Function {0} not found.")]
    ToolNotFound(String),

    #[error("agent loop exceeded {0} model rounds without a final answer")]
    #[diagnostic(help("raise `max_rounds` in upcheck.toml or pass --max-rounds"))]
    RoundLimit(usize),

    #[error("config error: {0}")]
    Config(String),

    #[error("{message}")]
    #[diagnostic()]
    Toml {
        message: String,
        #[source_code]
        src: miette::NamedSource<String>,
        #[label("{message}")]
        span: miette::SourceSpan,
    },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Xx(#[from] xx::XXError),
}

pub type Result<T> = std::result::Result<T, Error>;
