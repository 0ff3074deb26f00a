pub mod anthropic;
pub mod openai;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::llm::LlmClient;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, PartialEq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    Anthropic,
    #[value(name = "openai")]
    OpenAI,
}

/// Auto-detect provider from model name: `claude*` → Anthropic, `gemini*` → Gemini,
/// everything else → OpenAI.
pub fn detect_provider(model: &str) -> Provider {
    if model.starts_with("claude") {
        Provider::Anthropic
    } else if model.starts_with("gemini") {
        Provider::Gemini
    } else {
        Provider::OpenAI
    }
}

/// Resolve the model API key from the environment via `lookup`.
///
/// A missing key is fatal except for OpenAI-compatible servers behind a custom base URL.
pub fn api_key(
    provider: &Provider,
    base_url: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    let found = |name: &str| lookup(name).filter(|v| !v.is_empty());
    match provider {
        Provider::Gemini => {
            found("GEMINI_API_KEY").ok_or_else(|| Error::Llm("GEMINI_API_KEY not set".into()))
        }
        Provider::Anthropic => found("ANTHROPIC_API_KEY")
            .ok_or_else(|| Error::Llm("ANTHROPIC_API_KEY not set".into())),
        Provider::OpenAI => match found("OPENAI_API_KEY").or_else(|| found("LLM_API_KEY")) {
            Some(key) => Ok(key),
            None if base_url.is_some() => Ok(String::new()),
            None => Err(Error::Llm("OPENAI_API_KEY not set".into())),
        },
    }
}

pub fn build_client(
    provider: &Provider,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: Option<String>,
) -> Result<Box<dyn LlmClient>> {
    Ok(match provider {
        Provider::Gemini => {
            let base = base_url.unwrap_or_else(|| GEMINI_BASE_URL.into());
            Box::new(openai::OpenAIProvider::new(
                api_key, model, max_tokens, base,
            )?)
        }
        Provider::Anthropic => {
            let base = base_url.unwrap_or_else(|| ANTHROPIC_BASE_URL.into());
            Box::new(anthropic::AnthropicProvider::new(
                api_key, model, max_tokens, base,
            )?)
        }
        Provider::OpenAI => {
            let base = base_url.unwrap_or_else(|| OPENAI_BASE_URL.into());
            Box::new(openai::OpenAIProvider::new(
                api_key, model, max_tokens, base,
            )?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_provider_claude() {
        assert_eq!(detect_provider("claude-opus-4-6"), Provider::Anthropic);
        assert_eq!(
            detect_provider("claude-sonnet-4-5-20250929"),
            Provider::Anthropic
        );
    }

    #[test]
    fn test_detect_provider_gemini() {
        assert_eq!(detect_provider(DEFAULT_MODEL), Provider::Gemini);
        assert_eq!(detect_provider("gemini-2.5-pro"), Provider::Gemini);
    }

    #[test]
    fn test_detect_provider_other() {
        assert_eq!(detect_provider("gpt-4"), Provider::OpenAI);
        assert_eq!(detect_provider("llama-3"), Provider::OpenAI);
    }

    #[test]
    fn test_api_key_missing_is_fatal() {
        let err = api_key(&Provider::Gemini, None, |_| None).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY not set"));

        let err = api_key(&Provider::Anthropic, None, |_| Some(String::new())).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY not set"));
    }

    #[test]
    fn test_api_key_openai_fallbacks() {
        let key = api_key(&Provider::OpenAI, None, |name| {
            (name == "LLM_API_KEY").then(|| "fallback".to_string())
        })
        .unwrap();
        assert_eq!(key, "fallback");

        let key = api_key(&Provider::OpenAI, Some("http://localhost:8080"), |_| None).unwrap();
        assert_eq!(key, "");

        assert!(api_key(&Provider::OpenAI, None, |_| None).is_err());
    }

    #[test]
    fn test_provider_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            provider: Provider,
        }
        let w: Wrapper = toml::from_str("provider = \"openai\"").unwrap();
        assert_eq!(w.provider, Provider::OpenAI);
    }
}
