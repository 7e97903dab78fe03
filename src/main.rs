//! Pagetrawl main entry point
//!
//! This is the command-line interface for resumable paginated retrieval.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use pagetrawl::config::{load_config_with_hash, Config};
use pagetrawl::fetcher::{CountEstimator, GitHubFetcher, PageFetcher, WaybackFetcher};
use pagetrawl::session::{Outcome, SessionController, SessionError, SessionEvent};
use pagetrawl::state::{ResourceKey, ResourceKind};
use pagetrawl::storage::{open_storage, PageStore, ResumeStore, SqliteStorage};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Pagetrawl: resumable retrieval of paginated record sets
///
/// Pagetrawl pages through the Wayback Machine's capture index for a domain
/// or the commit history of a GitHub repository, storing every page as it
/// arrives. Interrupted runs pick up where they stopped.
#[derive(Parser, Debug)]
#[command(name = "pagetrawl")]
#[command(version)]
#[command(about = "Resumable retrieval of paginated record sets", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch Wayback Machine captures for a domain and its subdomains
    Wayback {
        /// Domain name or URL
        target: String,

        /// Discard stored captures and fetch from the beginning
        #[arg(long)]
        fresh: bool,
    },

    /// Fetch the commit history of a GitHub repository
    Github {
        /// Repository as owner/repo
        repo: String,

        /// Discard stored commits and fetch from the beginning
        #[arg(long)]
        fresh: bool,
    },

    /// Show stored fetch state and exit
    Status {
        /// Only show resources of this kind
        kind: Option<KindArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Wayback,
    Github,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Wayback => ResourceKind::Wayback,
            KindArg::Github => ResourceKind::GitHub,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    match cli.command {
        Command::Wayback { target, fresh } => {
            let key = ResourceKey::wayback_domain(&target)?;
            let fetcher = WaybackFetcher::new(&config.wayback, &config.user_agent)?;
            handle_fetch(&config, fetcher.clone(), fetcher, key, fresh).await
        }
        Command::Github { repo, fresh } => {
            let key = ResourceKey::github_repo(&repo)?;
            let fetcher = GitHubFetcher::new(&config.github, &config.user_agent)?;
            handle_fetch(&config, fetcher.clone(), fetcher, key, fresh).await
        }
        Command::Status { kind } => {
            handle_status(&config, kind.map(ResourceKind::from))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagetrawl=info,warn"),
            1 => EnvFilter::new("pagetrawl=debug,info"),
            2 => EnvFilter::new("pagetrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs one session for `key`, logging its progress until it ends
async fn handle_fetch<F, E>(
    config: &Config,
    fetcher: F,
    estimator: E,
    key: ResourceKey,
    fresh: bool,
) -> anyhow::Result<ExitCode>
where
    F: PageFetcher,
    E: CountEstimator,
    SqliteStorage: PageStore<F::Record>,
{
    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let controller = SessionController::new(
        fetcher,
        estimator,
        Arc::new(Mutex::new(storage)),
        config.session.request_delay(),
    )
    .with_events(tx);

    let started = if fresh {
        tracing::info!("Starting fresh fetch of {} (discarding stored data)", key);
        controller.restart(key)
    } else {
        controller.start(key)
    };

    let mut session = match started {
        Ok(session) => session,
        Err(SessionError::AlreadyComplete(key)) => {
            tracing::info!("{} is already complete; use --fresh to fetch it again", key);
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e.into()),
    };

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            cancel.cancel();
        }
    });

    let presenter = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let SessionEvent::Progress(progress) = event {
                let total = progress
                    .estimated_total
                    .map(|t| format!("~{}", t))
                    .unwrap_or_else(|| "unknown".to_string());
                tracing::info!(
                    "Page {}: {} records fetched (estimated total {}, {:.1}%)",
                    progress.page_index,
                    progress.records_fetched,
                    total,
                    progress.fraction_complete * 100.0
                );
            }
        }
    });

    let done = controller.run(&mut session).await;

    // Closing the event channel lets the presenter drain and exit
    drop(controller);
    let _ = presenter.await;

    Ok(match done.outcome {
        Outcome::Completed => ExitCode::SUCCESS,
        Outcome::Cancelled => {
            tracing::info!("Stopped by request; rerun the same command to resume");
            ExitCode::from(130)
        }
        Outcome::Failed(reason) => {
            tracing::error!("Fetch of {} failed: {}", done.resource, reason);
            tracing::info!("Stored progress is kept; rerun the same command to resume");
            ExitCode::FAILURE
        }
    })
}

/// Handles the status command: prints stored fetch state
fn handle_status(config: &Config, kind: Option<ResourceKind>) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let states = storage.list_fetch_states(kind)?;

    if states.is_empty() {
        println!("No stored fetch state");
        return Ok(());
    }

    for state in &states {
        let status = if state.is_complete {
            "complete"
        } else {
            "incomplete"
        };
        println!(
            "{:<8} {:<40} {:>10} records  {}",
            state.resource.kind().to_db_string(),
            state.resource.name(),
            state.records_fetched,
            status
        );
        if !state.is_complete {
            println!("         resume at: {}", state.continuation_token);
        }
        if let Some(error) = &state.last_error {
            println!("         last error: {}", error);
        }
        if let Some(updated_at) = state.updated_at {
            println!("         updated: {}", updated_at.to_rfc3339());
        }
    }

    Ok(())
}
