//! Runtime configuration, read once from the environment and passed around
//! explicitly.

use crate::v1beta::{API_BASE, media::MediaDir, request::{Prompt, RequestBuilder}, rest::Client};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_MEDIA_DIR: &str = "media";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    Missing(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub media_dir: PathBuf,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("media_dir", &self.media_dir)
            .finish()
    }
}

impl Config {
    /// Reads `GEMINI_API_KEY` (required), `GEMINI_API_BASE`, `GEMINI_MODEL`
    /// and `GEMINI_MEDIA_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Config::from_env`], with variables resolved by `lookup`. Empty
    /// values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Ok(Self {
            api_key: get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?,
            api_base: get("GEMINI_API_BASE").unwrap_or_else(|| API_BASE.to_string()),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            media_dir: get("GEMINI_MEDIA_DIR")
                .unwrap_or_else(|| DEFAULT_MEDIA_DIR.to_string())
                .into(),
        })
    }

    pub fn client(&self) -> Client {
        Client::new(self.api_key.clone()).with_api_base(self.api_base.clone())
    }

    pub fn media(&self) -> MediaDir {
        MediaDir::new(self.media_dir.clone())
    }

    /// A request builder for the configured model.
    pub fn request(&self, prompt: impl Into<Prompt>) -> RequestBuilder {
        RequestBuilder::new(self.model.clone(), prompt)
    }
}
