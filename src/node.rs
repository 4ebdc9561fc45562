//! Connected node records as reported by the mesh manager

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width of the label column used by [`NodeRecord::format_detail`]
const DETAIL_LABEL_WIDTH: usize = 11;

/// One connected peer, as observed at snapshot time
///
/// Only `key` identifies the node. Every other field is a point-in-time
/// observation that gets replaced wholesale on the next refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Public key of the node (identity)
    pub key: String,

    /// Connection type label, e.g. "TCP"
    #[serde(rename = "type")]
    pub conn_type: String,

    pub send_bytes: u64,
    pub recv_bytes: u64,

    /// Seconds since the manager's epoch
    pub last_ack_time: u64,

    /// Seconds since the manager's epoch
    pub start_time: u64,
}

impl NodeRecord {
    /// Whether `other` describes the same node, ignoring all telemetry fields
    pub fn same_node(&self, other: &NodeRecord) -> bool {
        self.key == other.key
    }

    /// Single-line rendering used for compact logging
    pub fn format_summary(&self) -> String {
        format!(
            "Key: {}, Type: {}, SendBytes: {}, RecvBytes: {}, LastAckTime: {}s, StartTime: {}s",
            self.key,
            self.conn_type,
            self.send_bytes,
            self.recv_bytes,
            self.last_ack_time,
            self.start_time
        )
    }

    /// Multi-line rendering with an aligned label column, used for user-facing display
    pub fn format_detail(&self) -> String {
        let rows = [
            ("Key", self.key.clone()),
            ("Type", self.conn_type.clone()),
            ("SendBytes", self.send_bytes.to_string()),
            ("RecvBytes", self.recv_bytes.to_string()),
            ("LastAckTime", format!("{}s", self.last_ack_time)),
            ("StartTime", format!("{}s", self.start_time)),
        ];

        let mut out = String::from("Node Information:");
        for (label, value) in rows {
            out.push('\n');
            out.push_str(&format!("{label:<DETAIL_LABEL_WIDTH$}: {value}"));
        }
        out
    }
}

impl fmt::Display for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_summary())
    }
}

/// Identity comparison: two records are the same node iff their keys match
pub fn nodes_are_equal(a: &NodeRecord, b: &NodeRecord) -> bool {
    a.same_node(b)
}
