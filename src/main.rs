use std::path::Path;

use clap::Parser;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use user_management::utils::file_io::open_file_for_append;
use user_management::Error;
use user_management::NetworkError;
use user_management::NodeBuilder;
use user_management::Result;

/// gRPC user management service
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file applied on top of defaults and `CONFIG_PATH`
    #[arg(short, long, env = "USERMGMT_CONFIG")]
    config: Option<String>,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    let builder = NodeBuilder::new(args.config.as_deref(), graceful_rx)?;

    // Initializing Logs
    let _guard = init_observability(&builder.config().server.log_dir)?;
    info!(config = ?builder.config(), "Configuration loaded");

    let node = builder.build()?.start_metrics_server();

    // Listen on Shutdown Signal
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    if let Err(e) = node.run().await {
        error!("node stops: {:?}", e);
        return Err(e);
    }

    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(signal_error)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(signal_error)?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        NetworkError::SignalSendFailed(format!("Failed to send shutdown signal: {}", e))
    })?;

    info!("Shutdown signal sent");
    Ok(())
}

fn signal_error(e: std::io::Error) -> Error {
    NetworkError::SignalSendFailed(format!("Failed to install signal handler: {e}")).into()
}

fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    let log_file = open_file_for_append(&log_dir.join("user-management.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
