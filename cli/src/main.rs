//! CLI for issue triage.
//!
//! Triages a single GitHub issue, or every open issue of a repository in
//! bulk, using the pipeline described by a triage configuration file.

use clap::{Parser, Subcommand};
use issue_triage::{BatchReport, IssueId, Runner, RunnerConfig, RunnerError, TriageResult};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Issue Triage - Run triage pipelines over GitHub issues.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the triage config file.
    #[arg(long, global = true, default_value = issue_triage::runner::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// GitHub Personal Access Token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Record conclusions without writing to GitHub.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Number of batch workers, overriding the config file.
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Comma-separated step names, overriding the config file.
    #[arg(long, global = true, value_delimiter = ',')]
    steps: Option<Vec<String>>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Triage a single issue.
    Issue {
        /// Issue reference, e.g. `acme/widgets#42`.
        issue: IssueId,
    },
    /// Triage open issues of a repository in bulk. Never writes to GitHub.
    Batch {
        /// Repository, e.g. `acme/widgets`.
        repository: String,

        /// Maximum number of issues to triage.
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Logs go to stderr in compact form so stdout stays clean for results.
/// `RUST_LOG` controls the level and defaults to "info".
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Returns a token cancelled when the process receives Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding retries");
            trigger.cancel();
        }
    });
    token
}

/// Main execution logic.
async fn run(args: Args) -> Result<ExitCode, RunnerError> {
    let mut config = RunnerConfig::new(args.token, args.dry_run).with_config_path(args.config);
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(steps) = args.steps {
        config = config.with_steps(steps);
    }
    let runner = Runner::new(config)?;
    let cancel = cancel_on_ctrl_c();

    match args.command {
        Command::Issue { issue } => match runner.triage_issue(&issue, &cancel).await {
            Ok(result) => {
                print_result(&issue, &result, args.json);
                Ok(ExitCode::from(0))
            }
            Err(RunnerError::Pipeline(e)) => {
                error!(issue = %issue, error = %e, "Triage failed");
                Ok(ExitCode::from(1))
            }
            Err(e) => Err(e),
        },
        Command::Batch { repository, limit } => {
            let Some((org, repo)) = repository.split_once('/') else {
                error!(repository = %repository, "Expected a repository in org/repo form");
                return Ok(ExitCode::from(2));
            };
            let report = runner.triage_repository(org, repo, limit, &cancel).await?;
            print_report(&report, args.json);

            if report.summary.has_failures() {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::from(0))
            }
        }
    }
}

/// Prints the outcome of a single-issue run.
fn print_result(issue: &IssueId, result: &TriageResult, as_json: bool) {
    if as_json {
        match serde_json::to_string_pretty(result) {
            Ok(text) => println!("{text}"),
            Err(e) => warn!(error = %e, "Could not serialize result"),
        }
        return;
    }

    println!("\n{issue}:");
    if let Some(reason) = &result.skip_reason {
        println!("  Skipped: {reason}");
    }
    if let Some(score) = result.quality_score {
        println!("  Quality: {score:.2}");
    }
    for similar in &result.similar {
        println!("  Similar: {} ({:.2}) {}", similar.id, similar.score, similar.title);
    }
    if let Some(target) = &result.duplicate_of {
        println!("  Duplicate of: {target}");
    }
    if let Some(target) = &result.transfer_target {
        println!(
            "  Transfer to: {target} ({})",
            result.transfer_reason.as_deref().unwrap_or("no reason given")
        );
    }
    if !result.suggested_labels.is_empty() {
        println!("  Labels: {}", result.suggested_labels.join(", "));
    }
    for diagnostic in &result.errors {
        println!("  Warning: {diagnostic}");
    }
}

/// Prints the outcome of a bulk run.
fn print_report(report: &BatchReport, as_json: bool) {
    if as_json {
        let items: Vec<_> = report
            .items
            .iter()
            .map(|item| match &item.outcome {
                Ok(result) => json!({ "issue": item.issue.id, "result": result }),
                Err(e) => json!({ "issue": item.issue.id, "error": e.to_string() }),
            })
            .collect();
        let document = json!({
            "items": items,
            "chains": report.chains,
            "summary": report.summary,
        });
        match serde_json::to_string_pretty(&document) {
            Ok(text) => println!("{text}"),
            Err(e) => warn!(error = %e, "Could not serialize report"),
        }
        return;
    }

    for item in &report.items {
        match &item.outcome {
            Ok(result) => print_result(&item.issue.id, result, false),
            Err(e) => println!("\n{}:\n  Failed: {e}", item.issue.id),
        }
    }

    let summary = &report.summary;
    println!("\nSummary:");
    println!("  Mode: Dry Run");
    println!("  Issues: {}", summary.total);
    println!("  Triaged: {}", summary.triaged);
    println!("  Skipped: {}", summary.skipped);
    println!("  Duplicates: {}", summary.duplicates);
    println!("  Transfers: {}", summary.transfers);
    println!("  Failed: {}", summary.failed);
    println!("  Warnings: {}", summary.diagnostics);
    if !report.chains.redirected.is_empty() {
        println!("  Duplicate chains collapsed: {}", report.chains.redirected.len());
    }
}
