use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{GitHub, GitHubError, PullRequestSummary, RepositoryRef};
use crate::config::GitHubConfig;

const PR_LIST_FIELDS: &str = "number,title,state,url,createdAt";

/// Answers queries by running the GitHub CLI, which supplies its own
/// stored credentials, transport and pagination.
pub struct GhCli {
    program: String,
    repo_limit: usize,
    pr_limit: usize,
}

impl GhCli {
    pub fn new(config: &GitHubConfig) -> Self {
        Self {
            program: config.gh_path.clone(),
            repo_limit: config.repo_limit,
            pr_limit: config.pr_limit,
        }
    }

    /// Run `gh` with `args` and return its stdout.
    async fn run(&self, args: &[String]) -> Result<String, GitHubError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!(command = %command, "running gh");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|source| GitHubError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitHubError::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(bytes = stdout.len(), "gh finished");
        Ok(stdout)
    }

    fn user_args() -> Vec<String> {
        strings(&["api", "user"])
    }

    fn repo_list_args(&self, account: &str) -> Vec<String> {
        let limit = self.repo_limit.to_string();
        strings(&["repo", "list", account, "--limit", &limit, "--json", "nameWithOwner"])
    }

    fn pr_list_args(&self, repo: &RepositoryRef, author: &str) -> Vec<String> {
        let limit = self.pr_limit.to_string();
        strings(&[
            "pr", "list", "--repo", repo.as_str(), "--author", author, "--state", "all", "--limit", &limit,
            "--json", PR_LIST_FIELDS,
        ])
    }

    fn pr_view_args(repo: &RepositoryRef, number: u64) -> Vec<String> {
        let number = number.to_string();
        strings(&["pr", "view", &number, "--repo", repo.as_str(), "--json", "body"])
    }

    fn pr_diff_args(repo: &RepositoryRef, number: u64) -> Vec<String> {
        let number = number.to_string();
        strings(&["pr", "diff", &number, "--repo", repo.as_str()])
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

fn parse_login(json: &str) -> Result<String, GitHubError> {
    #[derive(Deserialize)]
    struct User {
        login: String,
    }
    Ok(serde_json::from_str::<User>(json)?.login)
}

fn parse_repositories(json: &str) -> Result<Vec<RepositoryRef>, GitHubError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Repo {
        name_with_owner: RepositoryRef,
    }
    let repos: Vec<Repo> = serde_json::from_str(json)?;
    Ok(repos.into_iter().map(|r| r.name_with_owner).collect())
}

fn parse_pull_requests(json: &str) -> Result<Vec<PullRequestSummary>, GitHubError> {
    Ok(serde_json::from_str(json)?)
}

fn parse_body(json: &str) -> Result<Option<String>, GitHubError> {
    #[derive(Deserialize)]
    struct View {
        body: Option<String>,
    }
    let view: View = serde_json::from_str(json)?;
    Ok(view.body.filter(|b| !b.is_empty()))
}

#[async_trait]
impl GitHub for GhCli {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<String, GitHubError> {
        parse_login(&self.run(&Self::user_args()).await?)
    }

    #[instrument(skip(self))]
    async fn list_repositories(&self, account: &str) -> Result<Vec<RepositoryRef>, GitHubError> {
        parse_repositories(&self.run(&self.repo_list_args(account)).await?)
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_pull_requests(
        &self,
        repo: &RepositoryRef,
        author: &str,
    ) -> Result<Vec<PullRequestSummary>, GitHubError> {
        parse_pull_requests(&self.run(&self.pr_list_args(repo, author)).await?)
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn pull_request_body(&self, repo: &RepositoryRef, number: u64) -> Result<Option<String>, GitHubError> {
        parse_body(&self.run(&Self::pr_view_args(repo, number)).await?)
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn pull_request_diff(&self, repo: &RepositoryRef, number: u64) -> Result<String, GitHubError> {
        self.run(&Self::pr_diff_args(repo, number)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::PrState;

    fn cli() -> GhCli {
        GhCli::new(&GitHubConfig::default())
    }

    #[test]
    fn test_repo_list_args_carry_limit() {
        let args = cli().repo_list_args("acme");
        assert_eq!(args, strings(&["repo", "list", "acme", "--limit", "1000", "--json", "nameWithOwner"]));
    }

    #[test]
    fn test_pr_list_args() {
        let repo = RepositoryRef("acme/widget".to_string());
        let args = cli().pr_list_args(&repo, "alice");
        assert!(args.windows(2).any(|w| w == ["--repo", "acme/widget"]));
        assert!(args.windows(2).any(|w| w == ["--author", "alice"]));
        assert!(args.windows(2).any(|w| w == ["--state", "all"]));
        assert!(args.windows(2).any(|w| w == ["--json", PR_LIST_FIELDS]));
    }

    #[test]
    fn test_view_and_diff_args() {
        let repo = RepositoryRef("acme/widget".to_string());
        assert_eq!(
            GhCli::pr_view_args(&repo, 12),
            strings(&["pr", "view", "12", "--repo", "acme/widget", "--json", "body"])
        );
        assert_eq!(GhCli::pr_diff_args(&repo, 12), strings(&["pr", "diff", "12", "--repo", "acme/widget"]));
    }

    #[test]
    fn test_parse_login() {
        let json = r#"{"login":"alice","id":1,"type":"User"}"#;
        assert_eq!(parse_login(json).unwrap(), "alice");
        assert!(parse_login("gh: not logged in").is_err());
    }

    #[test]
    fn test_parse_repositories_keeps_order() {
        let json = r#"[{"nameWithOwner":"acme/zeta"},{"nameWithOwner":"acme/alpha"}]"#;
        let repos = parse_repositories(json).unwrap();
        assert_eq!(repos, vec![RepositoryRef("acme/zeta".to_string()), RepositoryRef("acme/alpha".to_string())]);
        assert!(parse_repositories("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_pull_requests() {
        let json = r#"[
            {"createdAt":"2024-10-01T08:00:00Z","number":3,"state":"OPEN","title":"Add cache","url":"https://github.com/acme/widget/pull/3"},
            {"createdAt":"2024-03-01T08:00:00Z","number":1,"state":"CLOSED","title":"Old","url":"https://github.com/acme/widget/pull/1"}
        ]"#;
        let prs = parse_pull_requests(json).unwrap();
        assert_eq!(prs.len(), 2);
        assert_eq!(prs[0].number, 3);
        assert_eq!(prs[0].state, PrState::Open);
        assert_eq!(prs[1].state, PrState::Closed);
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(r#"{"body":"Adds a cache"}"#).unwrap().as_deref(), Some("Adds a cache"));
        assert_eq!(parse_body(r#"{"body":""}"#).unwrap(), None);
        assert_eq!(parse_body(r#"{"body":null}"#).unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let mut config = GitHubConfig::default();
        config.gh_path = "/nonexistent/pr-collector-test/gh".to_string();
        let err = GhCli::new(&config).current_user().await.unwrap_err();
        assert!(matches!(err, GitHubError::Spawn { .. }));
    }
}
