use serde::Deserialize;
use std::fmt;

/// A repository identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RepositoryRef(pub String);

impl RepositoryRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a run targets, decided by whether the target contains a `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeTarget {
    SingleRepo(RepositoryRef),
    Account(String),
}

impl ScopeTarget {
    pub fn classify(target: &str) -> Self {
        if target.contains('/') {
            ScopeTarget::SingleRepo(RepositoryRef(target.to_string()))
        } else {
            ScopeTarget::Account(target.to_string())
        }
    }

    /// Mode label shown in the run banner.
    pub fn mode(&self) -> &'static str {
        match self {
            ScopeTarget::SingleRepo(_) => "repository",
            ScopeTarget::Account(_) => "account",
        }
    }
}

/// Pull request state as GitHub spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Open => write!(f, "OPEN"),
            PrState::Closed => write!(f, "CLOSED"),
            PrState::Merged => write!(f, "MERGED"),
        }
    }
}

/// One entry of a repository's PR listing.
/// Field names match the `gh pr list --json` output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub state: PrState,
    pub url: String,
    /// ISO 8601 timestamp, kept as text
    pub created_at: String,
}
