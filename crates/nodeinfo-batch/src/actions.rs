//! The NodeInfo lookups the binary can run over a batch.

use crate::{
    Result,
    batch::{BatchSummary, Deadline, Diagnostics, Operation, PoolConfig, RecordFields, run_batch},
};
use nodeinfo::{Client, Link, NodeInfo};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Identifiers are hostnames; each yields the links from its discovery
    /// document.
    #[value(name = "batch_discovery")]
    Discovery,
    /// Identifiers are NodeInfo document URLs; each yields the decoded
    /// document.
    #[value(name = "batch_nodeinfo")]
    NodeInfo,
}

impl Action {
    /// Key names used in this action's result records.
    pub const fn fields(self) -> RecordFields {
        match self {
            Self::Discovery => RecordFields::DISCOVERY,
            Self::NodeInfo => RecordFields::NODEINFO,
        }
    }
}

/// Hostname -> advertised NodeInfo links.
pub fn discover(client: Client) -> impl Operation<Payload = Vec<Link>, Error = nodeinfo::Error> {
    move |token: CancellationToken, hostname: String| {
        let client = client.clone();
        async move { client.discover_links(&token, &hostname).await }
    }
}

/// Document URL -> decoded NodeInfo document.
pub fn fetch_nodeinfo(
    client: Client,
) -> impl Operation<Payload = NodeInfo, Error = nodeinfo::Error> {
    move |token: CancellationToken, href: String| {
        let client = client.clone();
        async move { client.get_nodeinfo(&token, &href).await }
    }
}

/// Runs `action` over every identifier in `input`, writing records to
/// `output`.
pub async fn run_action<R, W>(
    action: Action,
    pool: &PoolConfig,
    client: &Client,
    deadline: &Deadline,
    input: R,
    output: W,
    diagnostics: Arc<dyn Diagnostics>,
) -> Result<BatchSummary>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let fields = action.fields();
    match action {
        Action::Discovery => {
            let op = discover(client.clone());
            run_batch(pool, fields, deadline, input, output, op, diagnostics).await
        }
        Action::NodeInfo => {
            let op = fetch_nodeinfo(client.clone());
            run_batch(pool, fields, deadline, input, output, op, diagnostics).await
        }
    }
}
