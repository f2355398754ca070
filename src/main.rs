use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tweetrelay::config::{Config, FileConfig};
use tweetrelay::RunOptions;

#[derive(Parser, Debug)]
#[command(name = "tweetrelay")]
#[command(about = "Relay new posts from a Twitter/X account to a Telegram chat", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML file with polling tunables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many poll cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Don't draw the countdown bar between cycles
    #[arg(long)]
    no_progress: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "TWEETRELAY_LOG_FORMAT")]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = std::env::var("TWEETRELAY_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(filter));

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Cancel `token` on ctrl-c or SIGTERM.
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                    }
                }
                Err(e) => {
                    tracing::warn!("failed to register SIGTERM handler: {e}");
                    ctrl_c.await.ok();
                    tracing::info!("received ctrl-c, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            tracing::info!("received ctrl-c, shutting down");
        }

        token.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A .env next to the binary is a convenience; real environment variables win.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let file = FileConfig::discover(cli.config.as_deref())?;
    let config = Config::from_env(file)?;
    tracing::debug!(config = ?config, "Configuration loaded");

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let options = RunOptions {
        max_cycles: cli.cycles,
        hide_progress: cli.no_progress,
    };

    // Run errors are logged where they happen; only the exit status is left.
    match tweetrelay::run(config, options, shutdown).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
