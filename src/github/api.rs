use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{GitHub, GitHubError, PrState, PullRequestSummary, RepositoryRef};
use crate::config::GitHubConfig;

const PER_PAGE: usize = 100;

/// Answers queries against the GitHub REST API with a bearer token.
pub struct RestApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    repo_limit: usize,
    pr_limit: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    number: u64,
    title: String,
    state: String,
    html_url: String,
    created_at: String,
    pull_request: Option<PullRequestLinks>,
}

#[derive(Deserialize)]
struct PullRequestLinks {
    merged_at: Option<String>,
}

impl From<SearchItem> for PullRequestSummary {
    fn from(item: SearchItem) -> Self {
        let merged = item
            .pull_request
            .as_ref()
            .is_some_and(|pr| pr.merged_at.is_some());
        let state = if merged {
            PrState::Merged
        } else if item.state.eq_ignore_ascii_case("open") {
            PrState::Open
        } else {
            PrState::Closed
        };
        PullRequestSummary {
            number: item.number,
            title: item.title,
            state,
            url: item.html_url,
            created_at: item.created_at,
        }
    }
}

impl RestApi {
    pub fn new(config: &GitHubConfig, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            repo_limit: config.repo_limit,
            pr_limit: config.pr_limit,
        }
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, GitHubError> {
        let token = self.token.as_deref().ok_or(GitHubError::MissingToken)?;
        Ok(self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header(USER_AGENT, "pr-collector")
            .bearer_auth(token))
    }

    fn search_query(repo: &RepositoryRef, author: &str) -> String {
        format!("is:pr repo:{} author:{}", repo, author)
    }

    /// Page through `path` until a short page or `limit` items.
    async fn paged<T, F>(&self, path: &str, limit: usize, mut extra: F) -> Result<Vec<T>, GitHubError>
    where
        F: FnMut(RequestBuilder) -> RequestBuilder,
        T: for<'de> Deserialize<'de> + PageItems,
    {
        let mut items = Vec::new();
        let mut received = 0usize;
        let mut page = 1usize;
        while received < limit {
            let request = extra(self.get(path)?).query(&[("per_page", PER_PAGE), ("page", page)]);
            let batch: T = request.send().await?.error_for_status()?.json().await?;
            let count = batch.len();
            debug!(page, count, "received page");
            items.push(batch);
            received += count;
            if count < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

/// Responses that carry one page of results.
trait PageItems {
    fn len(&self) -> usize;
}

impl PageItems for Vec<RepoItem> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl PageItems for SearchResponse {
    fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Deserialize)]
struct RepoItem {
    full_name: RepositoryRef,
}

#[async_trait]
impl GitHub for RestApi {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<String, GitHubError> {
        #[derive(Deserialize)]
        struct User {
            login: String,
        }
        let user: User = self.get("/user")?.send().await?.error_for_status()?.json().await?;
        Ok(user.login)
    }

    #[instrument(skip(self))]
    async fn list_repositories(&self, account: &str) -> Result<Vec<RepositoryRef>, GitHubError> {
        let path = format!("/users/{}/repos", account);
        let pages: Vec<Vec<RepoItem>> = self.paged(&path, self.repo_limit, |r| r).await?;
        Ok(pages
            .into_iter()
            .flatten()
            .map(|r| r.full_name)
            .take(self.repo_limit)
            .collect())
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_pull_requests(
        &self,
        repo: &RepositoryRef,
        author: &str,
    ) -> Result<Vec<PullRequestSummary>, GitHubError> {
        let query = Self::search_query(repo, author);
        let pages: Vec<SearchResponse> = self
            .paged("/search/issues", self.pr_limit, |r| {
                r.query(&[("q", query.as_str()), ("sort", "created"), ("order", "desc")])
            })
            .await?;
        Ok(pages
            .into_iter()
            .flat_map(|p| p.items)
            .map(PullRequestSummary::from)
            .take(self.pr_limit)
            .collect())
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn pull_request_body(&self, repo: &RepositoryRef, number: u64) -> Result<Option<String>, GitHubError> {
        #[derive(Deserialize)]
        struct Pull {
            body: Option<String>,
        }
        let path = format!("/repos/{}/pulls/{}", repo, number);
        let pull: Pull = self.get(&path)?.send().await?.error_for_status()?.json().await?;
        Ok(pull.body.filter(|b| !b.is_empty()))
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn pull_request_diff(&self, repo: &RepositoryRef, number: u64) -> Result<String, GitHubError> {
        let path = format!("/repos/{}/pulls/{}", repo, number);
        let diff = self
            .get(&path)?
            .header(ACCEPT, "application/vnd.github.diff")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(diff_bytes = diff.len(), "received PR diff");
        Ok(diff)
    }
}
