//! Failure tests for the monitor session
//!
//! These tests verify that the session handles failures gracefully:
//! - Manager unreachable or erroring
//! - Malformed snapshots
//! - Chat side rejecting messages

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assert_matches::assert_matches;
use wing_commander::{
    MonitorError, MonitorSupervisor,
    config::{ManagerConfig, Webhook},
    notify::{MemoryMessenger, WebhookMessenger},
    source::ManagerClient,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

fn manager_client(uri: String) -> Arc<ManagerClient> {
    Arc::new(
        ManagerClient::new(&ManagerConfig {
            url: uri,
            token: None,
            timeout: 1,
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn test_unreachable_manager_keeps_running() {
    let messenger = MemoryMessenger::new();
    let supervisor = MonitorSupervisor::new(
        create_fast_settings(),
        manager_client("http://127.0.0.1:9".to_string()),
        Arc::new(messenger.clone()),
    );

    supervisor.start().unwrap();
    tokio::time::sleep(FAST_POLL * 5).await;

    assert!(supervisor.is_running());
    assert!(messenger.is_empty(), "no status without a snapshot");

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn test_recovers_after_manager_errors() {
    let manager = MockServer::start().await;

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    Mock::given(method("GET"))
        .and(path("/conn/getAll"))
        .respond_with(move |_req: &wiremock::Request| {
            if calls_clone.fetch_add(1, Ordering::SeqCst) < 3 {
                ResponseTemplate::new(500)
            } else {
                ResponseTemplate::new(200).set_body_json(create_manager_json(&["a"]))
            }
        })
        .mount(&manager)
        .await;

    let messenger = MemoryMessenger::new();
    let supervisor = MonitorSupervisor::new(
        create_fast_settings(),
        manager_client(manager.uri()),
        Arc::new(messenger.clone()),
    );

    supervisor.start().unwrap();
    wait_until(Duration::from_secs(5), || !messenger.is_empty()).await;
    supervisor.stop().await.unwrap();

    assert!(calls.load(Ordering::SeqCst) >= 4);
    assert_eq!(
        messenger.messages(),
        vec!["**Node connected:** `a`\nConnected nodes: 1"]
    );
}

#[tokio::test]
async fn test_malformed_snapshot_keeps_previous() {
    let manager = MockServer::start().await;

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    Mock::given(method("GET"))
        .and(path("/conn/getAll"))
        .respond_with(move |_req: &wiremock::Request| {
            if calls_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(200).set_body_json(create_manager_json(&["a"]))
            } else {
                ResponseTemplate::new(200).set_body_string("{invalid json")
            }
        })
        .mount(&manager)
        .await;

    let messenger = MemoryMessenger::new();
    let supervisor = MonitorSupervisor::new(
        create_fast_settings(),
        manager_client(manager.uri()),
        Arc::new(messenger.clone()),
    );

    supervisor.start().unwrap();
    wait_until(Duration::from_secs(5), || calls.load(Ordering::SeqCst) >= 4).await;

    // failed fetches neither report a disconnect nor clear the snapshot
    assert_eq!(messenger.len(), 1);
    assert_eq!(supervisor.controller().connected_node_count(), 1);

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn test_rejecting_chat_side_does_not_stop_monitor() {
    let manager = MockServer::start().await;
    let hook = MockServer::start().await;

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    Mock::given(method("GET"))
        .and(path("/conn/getAll"))
        .respond_with(move |_req: &wiremock::Request| {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            let key = format!("node-{n}");
            ResponseTemplate::new(200).set_body_json(create_manager_json(&[key.as_str()]))
        })
        .mount(&manager)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&hook)
        .await;

    let supervisor = MonitorSupervisor::new(
        create_fast_settings(),
        manager_client(manager.uri()),
        Arc::new(WebhookMessenger::new(Webhook { url: hook.uri() })),
    );

    supervisor.start().unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while hook.received_requests().await.unwrap_or_default().len() < 3 {
        assert!(tokio::time::Instant::now() < deadline, "webhook never retried");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(supervisor.is_running());
    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_twice_reports_not_running() {
    let supervisor = MonitorSupervisor::new(
        create_fast_settings(),
        manager_client("http://127.0.0.1:9".to_string()),
        Arc::new(MemoryMessenger::new()),
    );

    assert_matches!(supervisor.stop().await, Err(MonitorError::NotRunning));

    supervisor.start().unwrap();
    assert_matches!(supervisor.start(), Err(MonitorError::AlreadyRunning));

    supervisor.stop().await.unwrap();
    assert_matches!(supervisor.stop().await, Err(MonitorError::NotRunning));
}
