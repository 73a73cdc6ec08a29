//! # `nodeinfo-batch`: concurrent NodeInfo lookups
//!
//! Reads identifiers (hostnames or NodeInfo URLs) one per line, runs a
//! per-item [`Operation`] over them with a fixed pool of Tokio workers, and
//! writes one JSON record per result.
//!
//! ## Pipeline
//!
//! ```text
//! input -> distributor -> shared queue -> N workers -> N queues -> collector -> emitter
//! ```
//!
//! - Every identifier handed to a worker yields exactly one result record.
//! - A shared [`Deadline`] stops dispatch once the batch budget is spent.
//!   Identifiers that never reached the [`Operation`] are reported to
//!   [`Diagnostics`], never to the result stream.
//! - Output order is arrival order, not input order.
//!
//! ## Module Overview
//!
//! - [`batch`] - the pipeline stages and [`batch::run_batch`].
//! - [`actions`] - the two NodeInfo operations the binary exposes.
//! - [`config`] - command line parsing and validation.
//! - [`telemetry`] - `tracing` subscriber setup.
//!
//! [`Operation`]: batch::Operation
//! [`Deadline`]: batch::Deadline
//! [`Diagnostics`]: batch::Diagnostics

pub mod actions;
pub mod batch;
pub mod config;
pub mod error;
pub mod telemetry;

pub use error::{Error, Result};
