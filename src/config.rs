use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::providers::Provider;

pub const FILE_NAME: &str = "upcheck.toml";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub system_extra: Option<String>,
    pub defaults: Option<Defaults>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub model: Option<String>,
    pub provider: Option<Provider>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub max_rounds: Option<usize>,
    pub github_api_url: Option<String>,
    pub health_ttl_secs: Option<u64>,
    pub pr_pages: Option<u32>,
}

const TEMPLATE: &str = r#"# Extra instructions appended to the system prompt.
#system_extra = ""

[defaults]
#model = "gemini-2.5-flash"
#provider = "gemini"        # gemini | anthropic | openai
#base_url = ""              # OpenAI-compatible endpoint override
#max_tokens = 4096
#max_rounds = 10            # model rounds allowed per question
#github_api_url = "https://api.github.com"
#health_ttl_secs = 300      # how long a rate-limit check stays fresh
#pr_pages = 1               # issue pages examined by get_release_prs
"#;

impl Config {
    /// Load `upcheck.toml` from `dir`, if present.
    pub fn load(dir: &Path) -> Result<Option<Config>> {
        let path = dir.join(FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        let contents = xx::file::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| {
            let span = e.span().map(|s| s.into()).unwrap_or((0, 0).into());
            Error::Toml {
                message: e.message().to_string(),
                src: miette::NamedSource::new(path.display().to_string(), contents.clone()),
                span,
            }
        })?;
        if let Some(0) = config.defaults.as_ref().and_then(|d| d.max_rounds) {
            return Err(Error::Config(format!(
                "{}: max_rounds must be at least 1",
                path.display()
            )));
        }
        Ok(config)
    }

    pub fn template() -> &'static str {
        TEMPLATE
    }
}

/// Write the commented template into `dir`. Refuses to clobber an existing file
/// unless `force` is set.
pub fn init(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(FILE_NAME);
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    xx::file::write(&path, Config::template())?;
    Ok(path)
}
