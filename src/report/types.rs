use std::path::PathBuf;
use std::time::Duration;

use crate::github::PullRequestSummary;

/// Substituted when a pull request has no body.
pub const NO_DESCRIPTION: &str = "No description provided";

/// Substituted when a diff cannot be retrieved.
pub const DIFF_UNAVAILABLE: &str = "Diff not available (PR may be too old or has conflicts)";

/// Everything shown in the banner that opens a run section.
#[derive(Debug, Clone)]
pub struct RunHeader {
    /// Local start time, already formatted
    pub timestamp: String,
    pub target: String,
    /// `repository` or `account`
    pub mode: &'static str,
    pub author: String,
    /// e.g. "Since 2024-08-01"
    pub period: String,
    pub include_diffs: bool,
    pub repository_count: usize,
}

/// A pull request with its fetched text.
#[derive(Debug, Clone)]
pub struct PullRequestDetail {
    pub summary: PullRequestSummary,
    pub body: String,
    /// Present only when diffs were requested
    pub diff: Option<String>,
}

impl PullRequestDetail {
    /// Apply the sentinel for a missing or blank body.
    pub fn new(summary: PullRequestSummary, body: Option<String>, diff: Option<String>) -> Self {
        let body = body
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());
        Self { summary, body, diff }
    }
}

/// Totals printed to the console once a run finishes.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub total_prs: usize,
    pub repositories_scanned: usize,
    pub repositories_with_prs: usize,
    pub unavailable_diffs: usize,
    pub elapsed: Duration,
}
