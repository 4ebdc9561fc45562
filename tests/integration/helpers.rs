//! Helper functions for integration tests

use std::time::Duration;

use serde_json::{Value, json};
use wing_commander::{NodeRecord, config::MonitorSettings};

/// Poll interval short enough for real-clock tests
pub const FAST_POLL: Duration = Duration::from_millis(50);

pub fn create_test_node(key: &str) -> NodeRecord {
    NodeRecord {
        key: key.to_string(),
        conn_type: "TCP".to_string(),
        send_bytes: 1,
        recv_bytes: 2,
        last_ack_time: 3,
        start_time: 4,
    }
}

/// Manager `/conn/getAll` body for the given keys
pub fn create_manager_json(keys: &[&str]) -> Value {
    Value::Array(
        keys.iter()
            .map(|key| {
                json!({
                    "key": key,
                    "type": "TCP",
                    "send_bytes": 100,
                    "recv_bytes": 200,
                    "last_ack_time": 5,
                    "start_time": 3600
                })
            })
            .collect(),
    )
}

/// Fast polling, no heartbeat within a test's lifetime
pub fn create_fast_settings() -> MonitorSettings {
    MonitorSettings::new(FAST_POLL, Duration::from_secs(3600))
        .unwrap()
        .with_publish_timeout(Duration::from_millis(200))
}

/// Wait until `condition` holds, panicking after `timeout`
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {timeout:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
