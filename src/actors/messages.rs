//! Texts exchanged between the monitor actors and the chat side
//!
//! Status texts travel from the poll loop to the event loop over a bounded
//! `mpsc` channel of plain `String`s. An empty string is a no-op for the
//! consumer.

use std::fmt;

use crate::registry::NodeRegistry;

pub const MSG_MONITOR_START: &str = "Node monitoring started.";
pub const MSG_MONITOR_STOP: &str = "Node monitoring stopped.";
pub const MSG_MONITOR_ALREADY_STARTED: &str = "Node monitoring is already running.";
pub const MSG_MONITOR_NOT_RUNNING: &str = "Node monitoring is not running.";

pub const MSG_UPTIME_PROMPT: &str = "Check Node uptime here:";

pub const HEADER_HEARTBEAT: &str = "**Heartbeat**";
pub const HEADER_STATUS: &str = "**Status**";

/// Public uptime tracker, filtered by `key_list` when keys are known
pub const UPTIME_BASE_URL: &str = "https://skywirenc.com/";

/// Connection summary used for heartbeats and status requests
pub fn connection_status(header: &str, registry: &NodeRegistry) -> String {
    format!("{header}\nConnected nodes: {}", registry.key_count())
}

/// Labelled link to the uptime tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UptimeLink {
    pub label: String,
    pub url: String,
}

impl fmt::Display for UptimeLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]({})", self.label, self.url)
    }
}

/// Build the uptime link; without keys it points at the tracker's front page
pub fn uptime_link(keys: Option<&[String]>, node_count: usize) -> UptimeLink {
    let url = match keys {
        Some(keys) => format!("{UPTIME_BASE_URL}?key_list={}", keys.join("%2C")),
        None => UPTIME_BASE_URL.to_string(),
    };

    UptimeLink {
        label: format!("Skywirenc.com ({node_count} Nodes)"),
        url,
    }
}
