use std::time::Instant;

use colored::Colorize;
use thiserror::Error;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::args::{RunConfig, SinceDate};
use crate::github::{GitHub, GitHubError, PullRequestSummary, RepositoryRef, ScopeTarget};
use crate::report::{
    self, PullRequestDetail, ReportError, ReportWriter, RunHeader, RunSummary, DIFF_UNAVAILABLE,
};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Not authenticated with GitHub (try `gh auth login`): {0}")]
    Auth(#[source] GitHubError),

    #[error("No repositories found for account '{0}'")]
    NoRepositories(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Expand a target into the repositories to scan.
///
/// An account that owns nothing is an error rather than an empty run.
#[instrument(skip(github))]
pub async fn expand_scope(github: &dyn GitHub, scope: &ScopeTarget) -> Result<Vec<RepositoryRef>, CollectError> {
    match scope {
        ScopeTarget::SingleRepo(repo) => Ok(vec![repo.clone()]),
        ScopeTarget::Account(account) => {
            let repos = github.list_repositories(account).await?;
            if repos.is_empty() {
                return Err(CollectError::NoRepositories(account.clone()));
            }
            debug!(count = repos.len(), "listed account repositories");
            Ok(repos)
        }
    }
}

/// Pull requests by `author` in `repo` created on or after `since`,
/// in the order GitHub listed them.
pub async fn enumerate(
    github: &dyn GitHub,
    repo: &RepositoryRef,
    author: &str,
    since: &SinceDate,
) -> Result<Vec<PullRequestSummary>, CollectError> {
    let listed = github.list_pull_requests(repo, author).await?;
    let total = listed.len();
    let matching: Vec<_> = listed
        .into_iter()
        .filter(|pr| since.admits(&pr.created_at))
        .collect();
    debug!(total, matching = matching.len(), "filtered pull requests by date");
    Ok(matching)
}

/// Fetch body and, when asked, diff for one pull request.
///
/// A failed diff becomes the unavailable sentinel; any other failure aborts.
pub async fn fetch_detail(
    github: &dyn GitHub,
    repo: &RepositoryRef,
    summary: PullRequestSummary,
    include_diffs: bool,
) -> Result<PullRequestDetail, CollectError> {
    let body = github.pull_request_body(repo, summary.number).await?;
    let diff = if include_diffs {
        let fetched = github.pull_request_diff(repo, summary.number).await;
        Some(or_sentinel(fetched, summary.number))
    } else {
        None
    };
    Ok(PullRequestDetail::new(summary, body, diff))
}

fn or_sentinel(fetched: Result<String, GitHubError>, number: u64) -> String {
    fetched.unwrap_or_else(|err| {
        warn!(pr = number, error = %err, "diff unavailable");
        DIFF_UNAVAILABLE.to_string()
    })
}

/// Run one collection pass and append its section to the output file.
///
/// The identity and scope lookups complete before the file is opened, so a
/// run that fails there leaves the file untouched.
pub async fn run(github: &dyn GitHub, config: &RunConfig, timestamp: String) -> Result<RunSummary, CollectError> {
    let started = Instant::now();
    let scope = ScopeTarget::classify(&config.target);

    let author = github
        .current_user()
        .instrument(info_span!("identity"))
        .await
        .map_err(CollectError::Auth)?;
    info!(author = %author, "resolved GitHub identity");

    let repositories = expand_scope(github, &scope).await?;
    info!(count = repositories.len(), mode = scope.mode(), "resolved scope");

    let header = RunHeader {
        timestamp,
        target: config.target.clone(),
        mode: scope.mode(),
        author: author.clone(),
        period: config.since.describe(),
        include_diffs: config.include_diffs,
        repository_count: repositories.len(),
    };
    report::print_run_start(&header, &config.output_path);

    let mut writer = ReportWriter::append_to(&config.output_path)?;
    writer.write_header(&header)?;

    let mut total_prs = 0usize;
    let mut repositories_with_prs = 0usize;
    let mut unavailable_diffs = 0usize;

    for repo in &repositories {
        let span = info_span!("repository", repo = %repo);
        println!("Processing {}...", repo.to_string().cyan());

        let prs = enumerate(github, repo, &author, &config.since)
            .instrument(span.clone())
            .await?;
        if prs.is_empty() {
            println!("  No PRs found since {}, skipping", config.since.as_str());
            continue;
        }
        println!("  Found {} PRs", prs.len());
        repositories_with_prs += 1;
        writer.write_repository(repo, prs.len())?;

        for summary in prs {
            println!("  PR #{}: {}", summary.number, summary.title);
            let detail = fetch_detail(github, repo, summary, config.include_diffs)
                .instrument(span.clone())
                .await?;
            if detail.diff.as_deref() == Some(DIFF_UNAVAILABLE) {
                unavailable_diffs += 1;
                println!("    {}", "diff not available".yellow());
            }
            writer.write_pull_request(&detail)?;
            total_prs += 1;
        }
    }

    Ok(RunSummary {
        output_path: config.output_path.clone(),
        total_prs,
        repositories_scanned: repositories.len(),
        repositories_with_prs,
        unavailable_diffs,
        elapsed: started.elapsed(),
    })
}
