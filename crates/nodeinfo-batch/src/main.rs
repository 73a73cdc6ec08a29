use clap::Parser;
use core::time::Duration;
use nodeinfo::Client;
use nodeinfo_batch::{
    actions::run_action,
    batch::{Deadline, StderrDiagnostics},
    config::{BatchConfig, CliArgs},
    telemetry::init_tracing,
};
use std::sync::Arc;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = BatchConfig::try_from(args)?;

    init_tracing()?;
    log_startup_info(&config);

    let client = Client::new(config.client_timeout)?;
    let deadline = Deadline::after(config.batch_timeout);
    tokio::spawn(cancel_on_signal(deadline.clone()));

    let summary = run_action(
        config.action,
        &config.pool,
        &client,
        &deadline,
        tokio::io::stdin(),
        tokio::io::stdout(),
        Arc::new(StderrDiagnostics::default()),
    )
    .await?;

    let left = deadline
        .remaining()
        .map_or(Duration::ZERO, |d| Duration::from_secs(d.as_secs()));
    tracing::info!(
        inputs = summary.inputs,
        emitted = summary.emitted,
        abandoned = summary.abandoned,
        "batch finished with {} of budget left",
        humantime::format_duration(left)
    );
    Ok(())
}

fn log_startup_info(config: &BatchConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting batch with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting {:?} batch with {} workers",
            config.action,
            config.pool.workers
        );
    }
}

/// Cancels `deadline` on Ctrl+C or SIGTERM, exactly as if the batch budget had
/// run out. Returns once the deadline fires for any reason.
async fn cancel_on_signal(deadline: Deadline) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
        () = deadline.expired() => return,
    }

    tracing::info!("Cancelling batch, finishing in-flight lookups...");
    deadline.cancel();
}
