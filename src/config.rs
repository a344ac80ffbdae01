use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub const CONFIG_FILE: &str = ".pr-collector.toml";

/// Top-level configuration loaded from .pr-collector.toml.
/// All fields are optional — the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
}

/// Which implementation answers the GitHub queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Shell out to the `gh` CLI and reuse its stored login
    #[default]
    Gh,
    /// Call the REST API directly with a token
    Api,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub backend: Backend,
    /// Path or name of the GitHub CLI binary
    pub gh_path: String,
    /// REST API root, only used by the api backend
    pub api_url: String,
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// Upper bound on repositories listed for an account
    pub repo_limit: usize,
    /// Upper bound on pull requests listed per repository
    pub pr_limit: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Gh,
            gh_path: "gh".to_string(),
            api_url: "https://api.github.com".to_string(),
            token: None,
            repo_limit: 1000,
            pr_limit: 1000,
        }
    }
}

impl Config {
    /// Load configuration from .pr-collector.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }
}
