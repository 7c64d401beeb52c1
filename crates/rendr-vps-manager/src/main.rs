/*
[INPUT]:  CLI arguments, optional config file, environment, OS shutdown signals
[OUTPUT]: Running provisioning loop with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rendr_vps_adapter::RegistryClient;
use rendr_vps_manager::{
    ManagerConfig, Materializer, ProcessLauncher, ProvisioningLoop, TerminalSetup, secret,
};

const LOG_FILE_PREFIX: &str = "vps-manager.log";

#[derive(Parser, Debug)]
#[command(name = "rendr-vps-manager", version, about = "RendR VPS terminal provisioning agent")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "log-dir", value_name = "DIR", default_value = "logs")]
    log_dir: PathBuf,
    /// Validate configuration and exit
    #[arg(long = "dry-run")]
    dry_run: bool,
    /// Run a single polling cycle and exit
    #[arg(long = "once")]
    once: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactively write a configuration file
    Init {
        #[arg(long = "output", value_name = "PATH", default_value = "config.yaml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if let Some(Command::Init { output }) = args.command {
        return cli::run_init(output);
    }

    let _log_guard = init_tracing(&args.log_level, &args.log_dir)?;
    install_panic_hook();

    info!(
        config_path = ?args.config_path,
        dry_run = args.dry_run,
        once = args.once,
        "starting rendr-vps-manager"
    );

    let config = ManagerConfig::load(args.config_path.as_deref()).context("load config")?;
    info!(
        api_url = %config.api_url,
        polling_interval = config.polling_interval,
        terminals_base_path = %config.terminals_base_path.display(),
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    std::fs::create_dir_all(&config.terminals_base_path).with_context(|| {
        format!(
            "create terminals base directory {}",
            config.terminals_base_path.display()
        )
    })?;

    let registry = RegistryClient::new(&config.api_url, &config.vps_api_key)
        .context("build registry client")?;
    let launcher = ProcessLauncher::new(config.grace_period());
    let interval = config.polling_duration();
    let secrets = secret::from_config(&config);
    let materializer = Materializer::new(Arc::new(config), secrets);
    let provisioning = ProvisioningLoop::new(
        registry,
        TerminalSetup::new(materializer, launcher),
        interval,
    );

    if args.once {
        let summary = provisioning.run_cycle().await;
        info!(?summary, "single cycle finished");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    provisioning.run(shutdown).await;
    info!("shutdown complete");

    Ok(())
}

fn init_tracing(log_level: &str, log_dir: &Path) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("create log directory {}", log_dir.display()))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_default();
        error!(%location, panic = %panic_info, "panic");
    }));
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT; stopping after the current cycle");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM; stopping after the current cycle");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
