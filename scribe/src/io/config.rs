//! scribe configuration, read from `<root>/.scribe.toml` or `--config`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::exclude::DEFAULT_EXCLUDES;
use crate::io::git::GitLimits;

/// File name looked up in the target root when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = ".scribe.toml";

/// scribe configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults
/// below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScribeConfig {
    /// Model identifier sent to the provider.
    pub model: String,

    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,

    /// Environment variable holding the provider API key.
    pub api_key_env: String,

    /// Wall-clock limit for a single streamed generation turn.
    pub request_timeout_secs: u64,

    /// Ceiling on generation turns per session.
    pub max_steps: u32,

    /// Path names (whole path or any component) left out of diffs.
    pub exclude: Vec<String>,

    pub git: GitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        let limits = GitLimits::default();
        Self {
            timeout_secs: limits.timeout.as_secs(),
            output_limit_bytes: limits.output_limit_bytes,
        }
    }
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
                .to_string(),
            api_key_env: "GOOGLE_GENERATIVE_AI_API_KEY".to_string(),
            request_timeout_secs: 300,
            max_steps: 10,
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            git: GitConfig::default(),
        }
    }
}

impl ScribeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("endpoint must be non-empty"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(anyhow!("api_key_env must be non-empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.max_steps == 0 {
            return Err(anyhow!("max_steps must be > 0"));
        }
        if self.git.timeout_secs == 0 {
            return Err(anyhow!("git.timeout_secs must be > 0"));
        }
        if self.git.output_limit_bytes == 0 {
            return Err(anyhow!("git.output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn git_limits(&self) -> GitLimits {
        GitLimits {
            timeout: Duration::from_secs(self.git.timeout_secs),
            output_limit_bytes: self.git.output_limit_bytes,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Default config location for a target root.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ScribeConfig::default()`.
pub fn load_config(path: &Path) -> Result<ScribeConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        let cfg = ScribeConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ScribeConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
