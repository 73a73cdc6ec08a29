//! # Logging
//!
//! Log output goes to **stderr**. Stdout carries the JSON result stream and
//! must stay machine-readable.
//!
//! The level defaults to `info` and follows `RUST_LOG` when set:
//!
//! ```bash
//! RUST_LOG=nodeinfo_batch=debug,nodeinfo=debug nodeinfo-batch batch_discovery < hosts.txt
//! ```
//!
//! At `debug` every batch state transition, abandoned identifier and HTTP
//! request URI is logged.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
