use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repomirror::git::GitCli;
use repomirror::health::CheckResult;
use repomirror::provider::{self, ProviderKind};
use repomirror::sync::select_repositories;
use repomirror::{http, Config, GitHubSource, HealthCheck, MirrorCache, SyncEngine};

#[derive(Parser)]
#[command(name = "repomirror")]
#[command(about = "Mirror GitHub repositories to GitLab, Codeberg or Bitbucket")]
#[command(version)]
struct Cli {
    /// Destination host
    #[arg(short, long, value_enum)]
    provider: ProviderKind,

    /// Mirror only this repository
    #[arg(short, long)]
    repo: Option<String>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Show what would change on the destination without mirroring or pushing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, created_config) = load_config(cli.config.as_deref())?;
    let log_file = init_logging(cli.verbose, &config)?;

    info!("Starting repomirror v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &created_config {
        info!("Created default configuration at: {}", path.display());
    }
    if let Some(path) = &log_file {
        info!("Writing log to {}", path.display());
    }

    let health = HealthCheck::run(&config, cli.provider);
    report_health(&health);
    if !health.all_passed() {
        bail!("Preflight checks failed: {} error(s)", health.errors().len());
    }

    let client = http::new_client(config.http.timeout())?;

    let source = GitHubSource::connect(&config.github, client.clone()).await?;
    let repositories = source.list_repositories().await?;
    let repositories = select_repositories(repositories, cli.repo.as_deref())?;

    let destination = provider::connect(cli.provider, &config, client).await?;
    let mirrors = MirrorCache::new(
        config.backup_path(),
        Arc::new(GitCli::new()),
        source.username(),
        source.token().clone(),
    )?;
    let engine = SyncEngine::new(destination, mirrors, config.visibility);

    if cli.dry_run {
        cmd_plan(&engine, &repositories).await;
    } else {
        cmd_sync(&engine, &repositories).await;
    }

    Ok(())
}

/// Load configuration from specified path or default location
///
/// The second value is set when a default config file was just written.
fn load_config(config_path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    match config_path {
        Some(path) => Ok((Config::load(path)?, None)),
        None => Config::load_or_default(),
    }
}

/// Stdout logging plus an optional per-run log file
fn init_logging(verbose: bool, config: &Config) -> Result<Option<PathBuf>> {
    let default_level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, log_path) = match &config.logging.directory {
        Some(dir) => {
            let (file, path) = open_log_file(Path::new(dir))?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(filter)
        .init();

    Ok(log_path)
}

fn open_log_file(dir: &Path) -> Result<(File, PathBuf)> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory: {:?}", dir))?;

    let name = format!("logs_{}.txt", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(name);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {:?}", path))?;

    Ok((file, path))
}

fn report_health(health: &HealthCheck) {
    fn report_check(name: &str, result: &CheckResult) {
        let details = result.details.as_deref().unwrap_or("");
        if !result.passed {
            error!("{}: {} {}", name, result.message, details);
        } else if result.is_warning {
            warn!("{}: {} {}", name, result.message, details);
        } else {
            info!("{}: {} {}", name, result.message, details);
        }
    }

    for (name, result) in health.all_checks() {
        report_check(name, result);
    }

    let warnings = health.warnings().len();
    if warnings > 0 {
        warn!("Preflight finished with {} warning(s)", warnings);
    }
}

async fn cmd_sync(engine: &SyncEngine, repositories: &[repomirror::SourceRepository]) {
    let summary = engine.run(repositories).await;

    info!(
        "Done: {}/{} repositories synced to {} in {:.2}s",
        summary.succeeded,
        summary.total,
        engine.provider_name(),
        summary.duration.as_secs_f64()
    );
    for failure in &summary.failures {
        error!("  {} [{}]: {}", failure.name, failure.phase, failure.error);
    }
}

async fn cmd_plan(engine: &SyncEngine, repositories: &[repomirror::SourceRepository]) {
    let planned = engine.plan(repositories).await;

    let mut changes = 0;
    let mut failed = 0;
    for entry in &planned {
        match &entry.action {
            Ok(action) if action.is_mutation() => changes += 1,
            Ok(_) => {}
            Err(_) => failed += 1,
        }
    }

    info!(
        "[dry-run] {} repositories: {} would change on {}, {} unchanged, {} lookups failed",
        planned.len(),
        changes,
        engine.provider_name(),
        planned.len() - changes - failed,
        failed
    );
}
