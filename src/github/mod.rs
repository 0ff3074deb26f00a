pub mod contents;
pub mod issues;
pub mod rate_limit;
pub mod releases;

use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::error::Result;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

/// Failure outcomes of a single host API call.
///
/// `Clone` so a failed check can sit in the session's health cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("GitHub API failed with status code 404.")]
    NotFound,

    /// 403 or 429; carries whichever the server sent.
    #[error("GitHub API failed with status code {0}. Check GITHUB_TOKEN and rate limit.")]
    Forbidden(u16),

    #[error("GitHub API failed with status code {0}.")]
    Http(u16),

    #[error("{0}")]
    Network(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status behind this outcome, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::Forbidden(code) | ApiError::Http(code) => Some(*code),
            ApiError::Network(_) | ApiError::Decode(_) => None,
        }
    }
}

pub type Outcome<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn into_json<T: DeserializeOwned>(self) -> Outcome<T> {
        let parsed = match self {
            Payload::Json(value) => serde_json::from_value(value),
            Payload::Text(text) => serde_json::from_str(&text),
        };
        parsed.map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn into_text(self) -> String {
        match self {
            Payload::Json(value) => value.to_string(),
            Payload::Text(text) => text,
        }
    }
}

pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_API_URL.into())
    }

    pub fn with_base_url(token: Option<String>, base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("upcheck/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token: token.filter(|t| !t.is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Whether requests carry a token. Says nothing about the token being valid.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn repo_path(org: &str, repo: &str, rest: &str) -> String {
        format!("/repos/{org}/{repo}{rest}")
    }

    /// Issue a single GET against the API. Never retries.
    pub async fn call(
        &self,
        path: &str,
        query: &[(&str, String)],
        accept_raw: bool,
    ) -> Outcome<Payload> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| ApiError::Network(format!("invalid URL for {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let accept = if accept_raw {
            RAW_MEDIA_TYPE
        } else {
            JSON_MEDIA_TYPE
        };
        let mut req = self.client.get(url).header(ACCEPT, accept);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        debug!("GET {path}");
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        match resp.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound),
            status @ (StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) => {
                return Err(ApiError::Forbidden(status.as_u16()));
            }
            status => return Err(ApiError::Http(status.as_u16())),
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if accept_raw {
            Ok(Payload::Text(body))
        } else {
            serde_json::from_str(&body)
                .map(Payload::Json)
                .map_err(|e| ApiError::Decode(e.to_string()))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Outcome<T> {
        self.call(path, query, false).await?.into_json()
    }
}
