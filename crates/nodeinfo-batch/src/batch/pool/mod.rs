//! Fixed-size worker pool over one shared work queue.
//!
//! ## Structure
//!
//! - [`manager`] - spawns the workers and the sweeper.
//! - [`worker`] - the per-worker pull, check, call, push loop.

pub mod manager;
pub mod worker;

pub use manager::WorkerPool;
