use crate::{
    Error, Result,
    actions::Action,
    batch::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, PoolConfig},
};
use clap::Parser;
use core::time::Duration;

/// Command line for the `nodeinfo-batch` binary.
///
/// Identifiers are read from stdin, one per line. Results are written to
/// stdout as JSON lines, and identifiers that never produced a result are
/// reported on stderr. Every flag can also be set through the environment or a
/// `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nodeinfo-batch",
    version,
    about = "Run NodeInfo lookups over identifiers read from stdin"
)]
pub struct CliArgs {
    /// What to do with each identifier.
    ///
    /// - `batch_discovery`: identifiers are hostnames; fetch their
    ///   `/.well-known/nodeinfo` links.
    /// - `batch_nodeinfo`: identifiers are NodeInfo document URLs; fetch and
    ///   decode each document.
    #[arg(value_enum)]
    pub action: Action,

    /// Timeout for a single HTTP request, e.g. `5s` or `1500ms`.
    ///
    /// Environment variable: `CLIENT_TIMEOUT`
    #[arg(
        long,
        env = "CLIENT_TIMEOUT",
        default_value = "5s",
        value_parser = humantime::parse_duration
    )]
    pub client_timeout: Duration,

    /// Budget for the whole batch. Once spent, no new identifier is started.
    /// Must be longer than `--client-timeout`.
    ///
    /// Environment variable: `BATCH_TIMEOUT`
    #[arg(
        long,
        env = "BATCH_TIMEOUT",
        default_value = "100s",
        value_parser = humantime::parse_duration
    )]
    pub batch_timeout: Duration,

    /// Number of lookups allowed in flight at once.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Capacity of each queue between pipeline stages. Lower values apply
    /// backpressure sooner.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub action: Action,
    pub client_timeout: Duration,
    pub batch_timeout: Duration,
    pub pool: PoolConfig,
}

impl TryFrom<CliArgs> for BatchConfig {
    type Error = Error;

    fn try_from(args: CliArgs) -> Result<Self> {
        if args.batch_timeout <= args.client_timeout {
            return Err(Error::config(format!(
                "batch timeout ({}) must be longer than client timeout ({})",
                humantime::format_duration(args.batch_timeout),
                humantime::format_duration(args.client_timeout),
            )));
        }

        let pool = PoolConfig {
            workers: args.workers,
            queue_capacity: args.queue_capacity,
        };
        pool.validate()?;

        Ok(Self {
            action: args.action,
            client_timeout: args.client_timeout,
            batch_timeout: args.batch_timeout,
            pool,
        })
    }
}
