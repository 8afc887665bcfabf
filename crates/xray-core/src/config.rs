//! Model client configuration.
//!
//! Resolution order: defaults, then an optional TOML file, then environment
//! variables. Command-line flags are applied by the caller on top.

use std::path::Path;

use serde::Deserialize;

use crate::error::{XrayError, XrayResult};

/// Default Anthropic Messages API URL.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Configuration for the model client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

impl ModelConfig {
    /// Load from an optional TOML file and apply environment overrides.
    pub fn load(path: Option<&Path>) -> XrayResult<Self> {
        let config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> XrayResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| XrayError::config(format!("{}: {}", path.display(), e)))
    }

    /// Apply `ANTHROPIC_API_KEY`, `XRAY_MODEL` and `XRAY_API_URL`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("ANTHROPIC_API_KEY").filter(|v| !v.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("XRAY_MODEL").filter(|v| !v.is_empty()) {
            self.model = model;
        }
        if let Some(url) = lookup("XRAY_API_URL").filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        self
    }

    /// The API key, or a configuration error explaining how to set it.
    pub fn require_api_key(&self) -> XrayResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                XrayError::config(
                    "ANTHROPIC_API_KEY environment variable not set.\n\
                     Set it with: export ANTHROPIC_API_KEY=your-key",
                )
            })
    }
}
