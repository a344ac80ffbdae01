mod args;
mod collect;
mod config;
mod github;
mod report;

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use args::{Cli, RunConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // printing help or version is a success; every other parse error is a usage error
            let ok = matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
            err.print().ok();
            return if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let now = chrono::Local::now();
    let run_config = RunConfig::resolve(cli, now.date_naive())?;

    let _main_span = info_span!("pr_collect", target = %run_config.target).entered();
    debug!(
        output = %run_config.output_path.display(),
        since = run_config.since.as_str(),
        include_diffs = run_config.include_diffs,
        "resolved arguments"
    );

    info!("loading configuration");
    let config = config::Config::load()?;
    debug!(backend = ?config.github.backend, "selected GitHub backend");
    let github = github::from_config(&config);

    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let summary = collect::run(github.as_ref(), &run_config, timestamp).await?;
    report::print_summary(&summary);
    info!(total_prs = summary.total_prs, "done");

    Ok(())
}
