pub mod types;

pub use types::{PullRequestDetail, RunHeader, RunSummary, DIFF_UNAVAILABLE};

use crate::github::RepositoryRef;
use colored::Colorize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

const SEPARATOR: &str = "================================================================================";

/// Appends run sections to a markdown log.
///
/// Each section is written and flushed as soon as it is formatted, so an
/// interrupted run leaves a valid prefix of its report behind.
pub struct ReportWriter<W: Write> {
    out: W,
}

impl ReportWriter<File> {
    /// Open `path` for appending, creating it if needed.
    pub fn append_to(path: &Path) -> Result<Self, ReportError> {
        debug!(path = %path.display(), "opening report file");
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_header(&mut self, header: &RunHeader) -> Result<(), ReportError> {
        self.emit(&format_header(header))
    }

    pub fn write_repository(&mut self, repo: &RepositoryRef, pr_count: usize) -> Result<(), ReportError> {
        self.emit(&format_repository(repo, pr_count))
    }

    pub fn write_pull_request(&mut self, detail: &PullRequestDetail) -> Result<(), ReportError> {
        self.emit(&format_pull_request(detail))
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) -> Result<(), ReportError> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Banner that opens one run section.
pub fn format_header(header: &RunHeader) -> String {
    let mut md = String::new();
    md.push_str(SEPARATOR);
    md.push('\n');
    md.push_str(&format!("# Run - {}\n", header.timestamp));
    md.push_str(&format!("**Target:** {} ({} mode)\n", header.target, header.mode));
    md.push_str(&format!("**Author:** {}\n", header.author));
    md.push_str(&format!("**Period:** {}\n", header.period));
    md.push_str(&format!("**Includes Diffs:** {}\n", header.include_diffs));
    md.push_str(&format!("**Repositories:** {}\n", header.repository_count));
    md.push_str(SEPARATOR);
    md.push_str("\n\n");
    md
}

pub fn format_repository(repo: &RepositoryRef, pr_count: usize) -> String {
    format!("# Repository: {}\n**PRs Found:** {}\n\n", repo, pr_count)
}

pub fn format_pull_request(detail: &PullRequestDetail) -> String {
    let pr = &detail.summary;
    let mut md = String::new();
    md.push_str(&format!("## PR #{}: {}\n", pr.number, pr.title));
    md.push_str(&format!("**Status:** {}\n", pr.state));
    md.push_str(&format!("**URL:** {}\n\n", pr.url));
    md.push_str("### Description:\n");
    md.push_str(trim_newlines(&detail.body));
    md.push_str("\n\n");
    if let Some(diff) = &detail.diff {
        md.push_str("### Diff:\n```diff\n");
        md.push_str(trim_newlines(diff));
        md.push_str("\n```\n\n");
    }
    md.push_str("---\n\n");
    md
}

fn trim_newlines(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r'])
}

/// Console preamble, printed once the scope and author are known.
pub fn print_run_start(header: &RunHeader, output_path: &Path) {
    println!();
    println!("{} {} ({} mode)", "Collecting PRs for".bold(), header.target, header.mode);
    println!("Author: {} | Period: {}", header.author, header.period);
    println!(
        "Repositories: {} | Include diffs: {} | Output: {}",
        header.repository_count,
        header.include_diffs,
        output_path.display()
    );
    println!();
}

/// Print the end-of-run totals. Never written to the report file.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "═══ Summary ═══".bold());
    println!("Total PRs collected: {}", summary.total_prs.to_string().green().bold());
    println!(
        "Repositories scanned: {} ({} with matching PRs)",
        summary.repositories_scanned, summary.repositories_with_prs
    );
    if summary.unavailable_diffs > 0 {
        println!(
            "{}",
            format!("Diffs unavailable: {}", summary.unavailable_diffs).yellow()
        );
    }
    println!("Output appended to: {}", summary.output_path.display());
    println!("Finished in {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}
