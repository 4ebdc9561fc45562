//! Snapshot sources for the node monitor
//!
//! The monitor core never talks to mesh nodes itself. It asks a [`PollSource`]
//! for the current list of connections once per poll tick. [`ManagerClient`]
//! is the production source, backed by the node manager's HTTP API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{instrument, trace};

use crate::config::ManagerConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::node::NodeRecord;

/// Header carrying the manager access token
pub const TOKEN_HEADER: &str = "X-MANAGER-TOKEN";

/// Path of the manager endpoint listing all live connections
const CONNECTIONS_PATH: &str = "/conn/getAll";

/// Produces a fresh snapshot of connected nodes on demand
///
/// Every error is treated as transient by the monitor: it is logged and the
/// fetch is retried on the next tick.
#[async_trait]
pub trait PollSource: Send + Sync {
    async fn fetch_snapshot(&self) -> MonitorResult<Vec<NodeRecord>>;
}

/// [`PollSource`] backed by the node manager's HTTP API
#[derive(Debug, Clone)]
pub struct ManagerClient {
    /// HTTP client (reused across polls)
    client: reqwest::Client,

    /// Full URL of the connection listing endpoint
    url: String,

    token: Option<String>,
}

impl ManagerClient {
    pub fn new(config: &ManagerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url: format!("{}{}", config.url.trim_end_matches('/'), CONNECTIONS_PATH),
            token: config.token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PollSource for ManagerClient {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_snapshot(&self) -> MonitorResult<Vec<NodeRecord>> {
        trace!("requesting connected nodes");

        let mut request = self.client.get(&self.url);

        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(MonitorError::SnapshotFetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response.text().await?;

        // the manager answers `null` when no node is connected
        let nodes: Option<Vec<NodeRecord>> = serde_json::from_str(&body)?;
        let nodes = nodes.unwrap_or_default();

        trace!("received {} connected nodes", nodes.len());

        Ok(nodes)
    }
}
