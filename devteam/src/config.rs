//! Layered runtime configuration
//!
//! Built-in defaults, then a YAML file, then environment variables. The CLI
//! applies its flags on top of the loaded value.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::build::DEFAULT_USER_ID;
use crate::utils::default_config_path;

/// Completion provider backing the team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Canned role output, no completion calls
    Scripted,
    /// Offline completion backend with scripted responses
    Mock,
    /// Anthropic Messages API
    Claude,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Scripted => "scripted",
            Provider::Mock => "mock",
            Provider::Claude => "claude",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "scripted" => Ok(Provider::Scripted),
            "mock" => Ok(Provider::Mock),
            "claude" | "anthropic" => Ok(Provider::Claude),
            other => bail!("Unknown provider: {}", other),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Unset means `claude` when an API key is available, otherwise `mock`
    pub provider: Option<Provider>,
    pub model: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Soft budget ceiling in dollars
    pub max_cost: Option<f64>,
    pub streaming: bool,
    pub verbose: bool,
    pub output_dir: PathBuf,
    pub user_id: String,
    pub use_marketplace: bool,
    /// HTTP request timeout for the Claude backend
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            api_key: None,
            max_cost: None,
            streaming: false,
            verbose: false,
            output_dir: default_output_dir(),
            user_id: default_user_id(),
            use_marketplace: default_true(),
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Defaults, then the YAML file, then the process environment.
    ///
    /// An explicit `path` must exist; the platform default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay variables looked up through `var`
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(provider) = var("DEVTEAM_PROVIDER") {
            self.provider = Some(provider.parse()?);
        }
        if let Some(model) = var("DEVTEAM_MODEL") {
            self.model = Some(model);
        }
        if let Some(max_cost) = var("DEVTEAM_MAX_COST") {
            let max_cost = max_cost
                .parse::<f64>()
                .with_context(|| format!("DEVTEAM_MAX_COST is not a number: {}", max_cost))?;
            self.max_cost = Some(max_cost);
        }
        Ok(())
    }

    pub fn resolved_provider(&self) -> Provider {
        match self.provider {
            Some(provider) => provider,
            None if self.api_key.is_some() => Provider::Claude,
            None => Provider::Mock,
        }
    }
}
