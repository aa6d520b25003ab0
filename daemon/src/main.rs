//! Groundtruth daemon: entry point for serving the report ledger.

mod blob;
mod config;
mod shutdown;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use groundtruth_ledger::{audit_chain, ReportLedger};
use groundtruth_query::QueryEngine;
use groundtruth_rpc::{AppState, RpcMetrics, RpcServer};
use groundtruth_store::{IntegrityStamp, MetaStore};
use groundtruth_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment, Migrator};
use groundtruth_types::{Clock, SystemClock};
use groundtruth_utils::LogFormat;
use groundtruth_verification::VerificationLedger;

use crate::blob::FsBlobStore;
use crate::config::DaemonConfig;
use crate::shutdown::{Shutdown, ShutdownReason};

#[derive(Parser)]
#[command(name = "groundtruth-daemon", about = "Tamper-evident media report ledger")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "GROUNDTRUTH_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for ledger storage.
    #[arg(long, env = "GROUNDTRUTH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address the HTTP API binds to.
    #[arg(long, env = "GROUNDTRUTH_HTTP_BIND")]
    http_bind: Option<String>,

    #[arg(long, env = "GROUNDTRUTH_HTTP_PORT")]
    http_port: Option<u16>,

    /// Directory uploaded media is written to.
    #[arg(long, env = "GROUNDTRUTH_MEDIA_DIR")]
    media_dir: Option<PathBuf>,

    /// URL prefix under which the media directory is served.
    #[arg(long, env = "GROUNDTRUTH_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GROUNDTRUTH_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GROUNDTRUTH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Votes required before consensus can move a report.
    #[arg(long, env = "GROUNDTRUTH_MIN_VOTES")]
    min_votes: Option<u32>,

    /// Share of one choice, in basis points, needed to carry a report.
    #[arg(long, env = "GROUNDTRUTH_THRESHOLD_BPS")]
    threshold_bps: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the HTTP API until SIGINT/SIGTERM.
    Run,
    /// Audit the stored chain and exit non-zero if it is broken.
    VerifyChain,
}

impl Cli {
    /// Layer CLI flags and env vars over the file (or default) config.
    fn merge_into(self, mut config: DaemonConfig) -> (DaemonConfig, Command) {
        if let Some(v) = self.data_dir {
            config.data_dir = v;
        }
        if let Some(v) = self.http_bind {
            config.http_bind = v;
        }
        if let Some(v) = self.http_port {
            config.http_port = v;
        }
        if let Some(v) = self.media_dir {
            config.media_dir = v;
        }
        if let Some(v) = self.public_base_url {
            config.public_base_url = v;
        }
        if let Some(v) = self.log_format {
            config.log_format = v;
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }
        if let Some(v) = self.min_votes {
            config.consensus.min_votes = v;
        }
        if let Some(v) = self.threshold_bps {
            config.consensus.threshold_bps = v;
        }
        (config, self.command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match cli.config {
        Some(ref path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    let (config, command) = cli.merge_into(file_config);

    groundtruth_utils::init_logging(config.log_format, &config.log_level)?;

    check_data_dir(&config.data_dir).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(&config.data_dir, config.map_size)
        .with_context(|| format!("opening ledger at {}", config.data_dir.display()))?;
    let previous_version = Migrator::run(&env)?;
    tracing::debug!(previous_version, "schema checked");
    startup_integrity_check(&env, &SystemClock)?;

    match command {
        Command::Run => run(config, env).await,
        Command::VerifyChain => {
            let audit = audit_chain(&env)?;
            println!("{}", serde_json::to_string_pretty(&audit)?);
            env.close();
            if !audit.is_intact() {
                anyhow::bail!("chain audit found {} fault(s)", audit.faults.len());
            }
            Ok(())
        }
    }
}

/// Log the previous run's integrity result, check again and record the
/// outcome for the next start.
fn startup_integrity_check(env: &LmdbEnvironment, clock: &dyn Clock) -> anyhow::Result<()> {
    if let Some(last) = env.last_integrity_check()? {
        tracing::debug!(
            checked_at = %last.checked_at,
            entries = last.total_entries,
            errors = last.errors,
            "previous integrity check"
        );
    }

    let integrity = check_integrity(env)?;
    if integrity.is_healthy() {
        tracing::info!(
            databases = integrity.databases_checked,
            entries = integrity.total_entries,
            "integrity check passed"
        );
    } else {
        for error in &integrity.errors {
            tracing::warn!(%error, "integrity check");
        }
    }

    env.record_integrity_check(&IntegrityStamp {
        checked_at: clock.now(),
        total_entries: integrity.total_entries,
        errors: integrity.errors.len() as u32,
    })?;
    Ok(())
}

async fn run(config: DaemonConfig, env: LmdbEnvironment) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .http_addr()
        .parse()
        .with_context(|| format!("invalid HTTP address {}", config.http_addr()))?;

    let store = Arc::new(env);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let blobs = FsBlobStore::new(
        config.media_dir.clone(),
        config.public_base_url.clone(),
        Arc::clone(&clock),
    )
    .with_context(|| format!("creating media dir {}", config.media_dir.display()))?;

    let roster = Arc::new(config.roster.clone());
    let ledger = ReportLedger::new(
        Arc::clone(&store),
        Arc::new(blobs),
        Arc::clone(&clock),
        config.ledger.clone(),
    )
    .with_roster(Arc::clone(&roster));
    let verification = VerificationLedger::new(Arc::clone(&store), clock, config.consensus)?
        .with_roster(roster);
    let query = QueryEngine::new(Arc::clone(&store));
    let state = AppState::new(ledger, verification, query, Arc::new(RpcMetrics::new()));

    tracing::info!(
        %addr,
        min_votes = config.consensus.min_votes,
        threshold_bps = config.consensus.threshold_bps,
        admins = config.roster.admins.len(),
        flagged = config.roster.flagged.len(),
        "starting Groundtruth daemon"
    );

    let shutdown = Arc::new(Shutdown::new());
    let stopped = shutdown.wait();
    let signals = Arc::clone(&shutdown);
    tokio::spawn(async move { signals.listen_for_signals().await });

    RpcServer::new(addr, state)
        .start(async move {
            let reason = stopped.await;
            tracing::info!(%reason, "draining HTTP API");
        })
        .await?;

    match Arc::try_unwrap(store) {
        Ok(env) => env.close(),
        Err(_) => tracing::warn!("ledger store still referenced at exit"),
    }
    let reason = shutdown.reason().unwrap_or(ShutdownReason::Requested);
    tracing::info!(%reason, "Groundtruth daemon exited cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundtruth_nullables::NullClock;

    #[test]
    fn startup_check_is_recorded_for_next_start() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        Migrator::run(&env).unwrap();
        assert!(env.last_integrity_check().unwrap().is_none());

        let clock = NullClock::new(1_700_000_000_000);
        startup_integrity_check(&env, &clock).unwrap();
        let stamp = env.last_integrity_check().unwrap().unwrap();
        assert_eq!(stamp.checked_at.as_millis(), 1_700_000_000_000);
        assert_eq!(stamp.errors, 0);
    }
}
