//! HTTP client for the two NodeInfo requests.

use crate::{Error, Link, NodeInfo, Result, link::Discovery};
use core::time::Duration;
use reqwest::{StatusCode, header::ACCEPT};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;


/// Path on a remote host that links to its NodeInfo documents. Fixed by the
/// protocol.
pub const DISCOVERY_PATH: &str = ".well-known/nodeinfo";

/// NodeInfo client backed by a shared [`reqwest::Client`].
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    scheme: String,
}

impl Client {
    /// Creates a client whose requests each time out after `timeout`. A zero
    /// timeout disables the per-request limit.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::builder().timeout(timeout).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Fetches the discovery document from `hostname` and returns the links
    /// it advertises.
    ///
    /// `hostname` may carry a port (`example.org:8443`).
    ///
    /// # Errors
    ///
    /// - [`Error::NoProtocolSupport`] on a 4xx response.
    /// - [`Error::RemoteServer`] on a 5xx response.
    /// - [`Error::Cancelled`] if `token` fires before the body is read.
    pub async fn discover_links(
        &self,
        token: &CancellationToken,
        hostname: &str,
    ) -> Result<Vec<Link>> {
        let url = Url::parse(&format!("{}://{hostname}/", self.scheme))?.join(DISCOVERY_PATH)?;
        let body: Discovery = self.fetch_json(token, url).await?;
        Ok(body.links)
    }

    /// Fetches and decodes the NodeInfo document at `href`, which must be an
    /// absolute URL.
    pub async fn get_nodeinfo(&self, token: &CancellationToken, href: &str) -> Result<NodeInfo> {
        let url = Url::parse(href)?;
        self.fetch_json(token, url).await
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        token: &CancellationToken,
        url: Url,
    ) -> Result<T> {
        token
            .run_until_cancelled(self.get(url))
            .await
            .ok_or(Error::Cancelled)?
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(req_uri = %url, "nodeinfo request");

        let resp = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        check_status(resp.status())?;

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Maps response status codes to the failures the protocol distinguishes.
fn check_status(status: StatusCode) -> Result<()> {
    if status.is_client_error() {
        return Err(Error::NoProtocolSupport {
            status: status.as_u16(),
        });
    }
    if status.is_server_error() {
        return Err(Error::RemoteServer {
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Builder for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    timeout: Duration,
    scheme: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            scheme: String::from("https"),
        }
    }
}

impl ClientBuilder {
    /// Per-request timeout covering connect, send and body read.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL scheme used for discovery requests. Defaults to `https`.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn build(self) -> Result<Client> {
        let mut http = reqwest::Client::builder();
        if !self.timeout.is_zero() {
            http = http.timeout(self.timeout);
        }

        Ok(Client {
            http: http.build()?,
            scheme: self.scheme,
        })
    }
}
