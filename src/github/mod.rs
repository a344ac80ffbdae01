pub mod api;
pub mod gh;
pub mod types;

pub use types::{PrState, PullRequestSummary, RepositoryRef, ScopeTarget};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Backend, Config};

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Unexpected response from GitHub: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub token not found in config or environment")]
    MissingToken,
}

/// Queries a run needs from GitHub.
/// Implementations must be Send + Sync so a boxed one can cross awaits.
#[async_trait]
pub trait GitHub: Send + Sync {
    /// Login of the authenticated user.
    async fn current_user(&self) -> Result<String, GitHubError>;

    /// Repositories owned by `account`, capped by the implementation's limit.
    async fn list_repositories(&self, account: &str) -> Result<Vec<RepositoryRef>, GitHubError>;

    /// Every pull request in `repo` authored by `author`, in any state,
    /// in the order GitHub returns them.
    async fn list_pull_requests(
        &self,
        repo: &RepositoryRef,
        author: &str,
    ) -> Result<Vec<PullRequestSummary>, GitHubError>;

    /// Description text; None when the PR has no body.
    async fn pull_request_body(&self, repo: &RepositoryRef, number: u64) -> Result<Option<String>, GitHubError>;

    /// Unified diff text.
    async fn pull_request_diff(&self, repo: &RepositoryRef, number: u64) -> Result<String, GitHubError>;
}

/// Build the backend selected in the configuration.
pub fn from_config(config: &Config) -> Box<dyn GitHub> {
    match config.github.backend {
        Backend::Gh => Box::new(gh::GhCli::new(&config.github)),
        Backend::Api => Box::new(api::RestApi::new(&config.github, config.github_token())),
    }
}
