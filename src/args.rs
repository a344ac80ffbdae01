use chrono::{Datelike, Months, NaiveDate};
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("Target is required. Usage: pr-collector <owner/repo | account> [output-file] or pr-collector --target <value>")]
    MissingTarget,

    #[error("Invalid date format '{0}'. Use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("Could not compute the default start date from {0}")]
    DateOutOfRange(NaiveDate),
}

/// PR Collector — appends the pull requests you authored in a repository
/// (or in every repository of an account) to a markdown log.
#[derive(Parser, Debug)]
#[command(name = "pr-collector", version, about)]
pub struct Cli {
    /// Repository (owner/name) or account to scan
    #[arg(short, long)]
    pub target: Option<String>,

    /// Markdown file to append to (default: pr_descriptions_<YYYYMMDD>.md)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include the full diff of every pull request
    #[arg(long)]
    pub include_diffs: bool,

    /// Only collect pull requests created on or after this date (YYYY-MM-DD)
    ///
    /// Defaults to the first day of the month six months ago.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<String>,

    /// Positional form: <TARGET> [OUTPUT_FILE]
    #[arg(value_name = "TARGET")]
    pub positional: Vec<String>,
}

/// Lower bound on PR creation dates, kept as typed.
///
/// Only the shape `YYYY-MM-DD` is checked, so `2024-02-30` is accepted and
/// compared as text against creation timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinceDate {
    value: String,
    explicit: bool,
}

impl SinceDate {
    pub fn parse(value: &str) -> Result<Self, ArgsError> {
        static SHAPE: OnceLock<Regex> = OnceLock::new();
        let shape = SHAPE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));
        if !shape.is_match(value) {
            return Err(ArgsError::InvalidDate(value.to_string()));
        }
        Ok(Self {
            value: value.to_string(),
            explicit: true,
        })
    }

    /// First day of the month six calendar months before `today`.
    pub fn default_for(today: NaiveDate) -> Result<Self, ArgsError> {
        let date = today
            .with_day(1)
            .and_then(|first| first.checked_sub_months(Months::new(6)))
            .ok_or(ArgsError::DateOutOfRange(today))?;
        Ok(Self {
            value: date.format("%Y-%m-%d").to_string(),
            explicit: false,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// `created_at` is an ISO 8601 timestamp; comparison is plain text.
    pub fn admits(&self, created_at: &str) -> bool {
        created_at >= self.value.as_str()
    }

    /// Human description used in the run banner.
    pub fn describe(&self) -> String {
        if self.explicit {
            format!("Since {}", self.value)
        } else {
            format!("Last 6 months (since {})", self.value)
        }
    }
}

/// Settings for one invocation, fixed once resolved.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: String,
    pub output_path: PathBuf,
    pub include_diffs: bool,
    pub since: SinceDate,
}

impl RunConfig {
    /// Resolve parsed arguments against `today`.
    pub fn resolve(cli: Cli, today: NaiveDate) -> Result<Self, ArgsError> {
        let mut positional = cli.positional.into_iter();

        let target = match cli.target {
            Some(target) => target,
            None => positional.next().ok_or(ArgsError::MissingTarget)?,
        };
        if target.trim().is_empty() {
            return Err(ArgsError::MissingTarget);
        }

        let output_path = match (cli.output, positional.next()) {
            (Some(path), None) => path,
            (None, Some(path)) => PathBuf::from(path),
            (None, None) => default_output_path(today, cli.include_diffs),
            (Some(_), Some(extra)) => return Err(ArgsError::UnexpectedArgument(extra)),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnexpectedArgument(extra));
        }

        let since = match cli.since.as_deref() {
            Some(value) => SinceDate::parse(value)?,
            None => SinceDate::default_for(today)?,
        };

        Ok(Self {
            target,
            output_path,
            include_diffs: cli.include_diffs,
            since,
        })
    }
}

fn default_output_path(today: NaiveDate, include_diffs: bool) -> PathBuf {
    let stamp = today.format("%Y%m%d");
    if include_diffs {
        PathBuf::from(format!("pr_descriptions_with_diffs_{}.md", stamp))
    } else {
        PathBuf::from(format!("pr_descriptions_{}.md", stamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolve(args: &[&str], today: NaiveDate) -> Result<RunConfig, ArgsError> {
        let cli = Cli::try_parse_from(std::iter::once("pr-collector").chain(args.iter().copied())).unwrap();
        RunConfig::resolve(cli, today)
    }

    #[test]
    fn test_flag_form() {
        let config = resolve(&["--target", "acme/widget", "-o", "out.md", "--since", "2024-01-15"], date(2025, 3, 1)).unwrap();
        assert_eq!(config.target, "acme/widget");
        assert_eq!(config.output_path, PathBuf::from("out.md"));
        assert!(!config.include_diffs);
        assert_eq!(config.since.as_str(), "2024-01-15");
        assert!(config.since.explicit);
    }

    #[test]
    fn test_positional_form() {
        let config = resolve(&["acme", "report.md", "--include-diffs"], date(2025, 3, 1)).unwrap();
        assert_eq!(config.target, "acme");
        assert_eq!(config.output_path, PathBuf::from("report.md"));
        assert!(config.include_diffs);
    }

    #[test]
    fn test_flag_target_with_positional_output() {
        let config = resolve(&["-t", "acme", "report.md"], date(2025, 3, 1)).unwrap();
        assert_eq!(config.target, "acme");
        assert_eq!(config.output_path, PathBuf::from("report.md"));
    }

    #[test]
    fn test_missing_target() {
        let err = resolve(&["--include-diffs"], date(2025, 3, 1)).unwrap_err();
        assert_eq!(err, ArgsError::MissingTarget);
        let err = resolve(&["--target", ""], date(2025, 3, 1)).unwrap_err();
        assert_eq!(err, ArgsError::MissingTarget);
    }

    #[test]
    fn test_too_many_outputs() {
        let err = resolve(&["acme", "a.md", "-o", "b.md"], date(2025, 3, 1)).unwrap_err();
        assert_eq!(err, ArgsError::UnexpectedArgument("a.md".to_string()));
        let err = resolve(&["-t", "acme", "a.md", "b.md"], date(2025, 3, 1)).unwrap_err();
        assert_eq!(err, ArgsError::UnexpectedArgument("b.md".to_string()));
    }

    #[test]
    fn test_unknown_flag_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["pr-collector", "acme", "--bogus"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_is_reported_as_display_help() {
        let err = Cli::try_parse_from(["pr-collector", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        let err = Cli::try_parse_from(["pr-collector", "-h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_since_accepts_calendar_invalid_dates() {
        for value in ["2024-02-30", "2024-13-40", "0000-00-00"] {
            let since = SinceDate::parse(value).unwrap();
            assert_eq!(since.as_str(), value);
        }
    }

    #[test]
    fn test_since_rejects_bad_shape() {
        for value in ["2024-2-01", "24-02-01", "2024/02/01", "2024-02-01T00:00", "yesterday", ""] {
            assert_eq!(
                SinceDate::parse(value).unwrap_err(),
                ArgsError::InvalidDate(value.to_string())
            );
        }
        let err = resolve(&["acme", "--since", "2024-1-1"], date(2025, 3, 1)).unwrap_err();
        assert_eq!(err, ArgsError::InvalidDate("2024-1-1".to_string()));
    }

    #[test]
    fn test_default_since_crosses_year_boundary() {
        let since = SinceDate::default_for(date(2025, 2, 10)).unwrap();
        assert_eq!(since.as_str(), "2024-08-01");
        assert!(!since.explicit);

        assert_eq!(SinceDate::default_for(date(2025, 6, 30)).unwrap().as_str(), "2024-12-01");
        assert_eq!(SinceDate::default_for(date(2025, 7, 1)).unwrap().as_str(), "2025-01-01");
        assert_eq!(SinceDate::default_for(date(2025, 12, 31)).unwrap().as_str(), "2025-06-01");
    }

    #[test]
    fn test_default_output_names() {
        let plain = resolve(&["acme"], date(2025, 2, 10)).unwrap();
        assert_eq!(plain.output_path, PathBuf::from("pr_descriptions_20250210.md"));
        assert!(!plain.output_path.to_string_lossy().contains("with_diffs"));

        let diffs = resolve(&["acme", "--include-diffs"], date(2025, 2, 10)).unwrap();
        assert_eq!(diffs.output_path, PathBuf::from("pr_descriptions_with_diffs_20250210.md"));
    }

    #[test]
    fn test_explicit_output_ignores_diff_naming() {
        let config = resolve(&["acme", "--include-diffs", "-o", "mine.md"], date(2025, 2, 10)).unwrap();
        assert_eq!(config.output_path, PathBuf::from("mine.md"));
    }

    #[test]
    fn test_since_admits_by_text_comparison() {
        let since = SinceDate::parse("2024-08-01").unwrap();
        assert!(since.admits("2024-08-01T00:00:00Z"));
        assert!(since.admits("2025-01-03T12:00:00Z"));
        assert!(!since.admits("2024-07-31T23:59:59Z"));
    }

    #[test]
    fn test_describe_period() {
        assert_eq!(SinceDate::parse("2024-01-01").unwrap().describe(), "Since 2024-01-01");
        assert_eq!(
            SinceDate::default_for(date(2025, 2, 10)).unwrap().describe(),
            "Last 6 months (since 2024-08-01)"
        );
    }
}
