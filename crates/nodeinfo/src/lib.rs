//! # `nodeinfo`: NodeInfo discovery client
//!
//! Client and data model for the [NodeInfo] protocol, which servers in the
//! federated social web use to publish metadata about themselves (software,
//! supported protocols, usage statistics).
//!
//! Discovery is a two step process:
//!
//! 1. [`Client::discover_links`] fetches `/.well-known/nodeinfo` from a host
//!    and returns the [`Link`]s it advertises.
//! 2. [`Client::get_nodeinfo`] fetches one of those links and decodes the
//!    [`NodeInfo`] document.
//!
//! Every request races a [`CancellationToken`] supplied by the caller, so a
//! batch of lookups can be abandoned cooperatively.
//!
//! [NodeInfo]: https://nodeinfo.diaspora.software
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod client;
mod error;
mod link;
mod protocol;
mod schema;

pub use crate::client::*;
pub use crate::error::*;
pub use crate::link::*;
pub use crate::protocol::*;
pub use crate::schema::*;
