//! Concurrency tests
//!
//! These tests verify behaviour under concurrent use:
//! - Status queries from many tasks while polling
//! - Repeated start/stop cycles
//! - A stalled consumer

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use wing_commander::{
    CancelSignal, MonitorController, MonitorResult, MonitorSupervisor, NodeRecord,
    notify::MemoryMessenger, source::PollSource,
};

use crate::helpers::*;

/// Reports a different single node on every fetch
struct ChurningSource {
    calls: AtomicUsize,
}

#[async_trait]
impl PollSource for ChurningSource {
    async fn fetch_snapshot(&self) -> MonitorResult<Vec<NodeRecord>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![create_test_node(&format!("node-{n}"))])
    }
}

#[tokio::test]
async fn test_concurrent_status_queries() {
    let messenger = MemoryMessenger::new();
    let supervisor = Arc::new(MonitorSupervisor::new(
        create_fast_settings(),
        Arc::new(ChurningSource {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(messenger.clone()),
    ));

    supervisor.start().unwrap();

    let mut tasks = vec![];
    for _ in 0..10 {
        let s = supervisor.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..20 {
                let status = s.status_message();
                assert!(status.starts_with("**Status**"), "unexpected status: {status}");
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    supervisor.stop().await.unwrap();
    assert!(!messenger.is_empty());
}

#[tokio::test]
async fn test_repeated_start_stop_cycles() {
    let source = Arc::new(ChurningSource {
        calls: AtomicUsize::new(0),
    });
    let messenger = MemoryMessenger::new();
    let supervisor = MonitorSupervisor::new(
        create_fast_settings(),
        source.clone(),
        Arc::new(messenger.clone()),
    );

    for _ in 0..10 {
        supervisor.start().unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        supervisor.stop().await.unwrap();
        assert!(!supervisor.is_running());
    }

    // no task outlives its session
    let delivered = messenger.len();
    tokio::time::sleep(FAST_POLL * 4).await;
    assert_eq!(messenger.len(), delivered);
}

#[tokio::test]
async fn test_stalled_consumer_does_not_stall_polling() {
    let source = Arc::new(ChurningSource {
        calls: AtomicUsize::new(0),
    });
    let controller = MonitorController::new().with_publish_timeout(Duration::from_millis(20));
    let (status_tx, _status_rx) = mpsc::channel(1);

    controller
        .start(FAST_POLL, source.clone(), status_tx, CancelSignal::new())
        .unwrap();

    tokio::time::sleep(FAST_POLL * 8).await;
    assert!(source.calls.load(Ordering::SeqCst) >= 4);

    tokio::time::timeout(Duration::from_secs(2), controller.stop())
        .await
        .expect("stop hung behind a full status channel")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_start_and_stop_never_hang() {
    let supervisor = Arc::new(MonitorSupervisor::new(
        create_fast_settings(),
        Arc::new(ChurningSource {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(MemoryMessenger::new()),
    ));

    let mut tasks = vec![];
    for _ in 0..4 {
        let s = supervisor.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..50 {
                let _ = s.start();
                tokio::task::yield_now().await;
                let _ = s.stop().await;
            }
        }));
    }

    tokio::time::timeout(Duration::from_secs(10), async {
        for task in tasks {
            task.await.unwrap();
        }
    })
    .await
    .expect("start/stop deadlocked");

    // the supervisor is left in a consistent, stoppable state
    if supervisor.is_running() {
        supervisor.stop().await.unwrap();
    }
    assert!(!supervisor.is_running());
    supervisor.start().unwrap();
    supervisor.stop().await.unwrap();
}
