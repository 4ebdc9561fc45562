//! MonitorController - Polls the node manager and publishes membership changes
//!
//! ## State Machine
//!
//! ```text
//! Idle ──start()──▶ Running ──stop()──▶ Stopping ──loop exited──▶ Idle
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → fetch snapshot → build NodeRegistry → diff with previous → status text → [EventLoop]
//!                                      │
//!                                      └─── latest snapshot (watch) → heartbeats, status requests
//! ```
//!
//! ## Status Channel Policy
//!
//! The status channel is bounded. A publish waits at most `publish_timeout`
//! for capacity and then drops the message being published (drop-newest).
//! The poll loop never blocks longer than that, so a stalled consumer only
//! costs status texts, never polling.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, instrument, trace, warn};

use crate::actors::messages::connection_status;
use crate::cancel::CancelSignal;
use crate::error::{MonitorError, MonitorResult};
use crate::registry::NodeRegistry;
use crate::source::PollSource;

/// Default time a publish may wait for status channel capacity
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Running,
    Stopping,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
        }
    }
}

#[derive(Debug)]
struct ControllerInner {
    state: MonitorState,
    cancel: Option<CancelSignal>,
    task: Option<JoinHandle<()>>,
}

/// Owns the polling loop and the most recent node snapshot
///
/// The controller is an explicit instance; share it with `Arc` where several
/// command handlers need it.
pub struct MonitorController {
    publish_timeout: Duration,

    /// Latest snapshot, readable without touching the poll loop
    snapshot_tx: Arc<watch::Sender<Arc<NodeRegistry>>>,

    inner: Mutex<ControllerInner>,
}

impl MonitorController {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(NodeRegistry::default()));

        Self {
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            snapshot_tx: Arc::new(snapshot_tx),
            inner: Mutex::new(ControllerInner {
                state: MonitorState::Idle,
                cancel: None,
                task: None,
            }),
        }
    }

    pub fn with_publish_timeout(mut self, publish_timeout: Duration) -> Self {
        self.publish_timeout = publish_timeout;
        self
    }

    fn inner(&self) -> MutexGuard<'_, ControllerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> MonitorState {
        self.inner().state
    }

    /// True only while the poll loop is live and has not been cancelled
    pub fn is_running(&self) -> bool {
        let inner = self.inner();
        inner.state == MonitorState::Running
            && !inner.cancel.as_ref().is_some_and(CancelSignal::is_cancelled)
    }

    /// Spawn the poll loop
    ///
    /// Fails with [`MonitorError::AlreadyRunning`] unless the controller is idle.
    #[instrument(skip(self, source, status_tx, cancel))]
    pub fn start(
        &self,
        poll_interval: Duration,
        source: Arc<dyn PollSource>,
        status_tx: mpsc::Sender<String>,
        cancel: CancelSignal,
    ) -> MonitorResult<()> {
        if poll_interval.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "poll interval must be positive".into(),
            ));
        }

        let mut inner = self.inner();

        // a session cancelled from outside whose loop already exited can be replaced
        if inner.state == MonitorState::Running
            && inner.cancel.as_ref().is_some_and(CancelSignal::is_cancelled)
            && inner.task.as_ref().is_none_or(JoinHandle::is_finished)
        {
            debug!("reaping externally cancelled poll loop");
            inner.state = MonitorState::Idle;
        }

        if inner.state != MonitorState::Idle {
            return Err(MonitorError::AlreadyRunning);
        }

        let previous = Arc::new(NodeRegistry::default());
        self.snapshot_tx.send_replace(previous.clone());

        let poll_loop = PollLoop {
            source,
            status_tx,
            cancel: cancel.clone(),
            snapshot_tx: self.snapshot_tx.clone(),
            poll_interval,
            publish_timeout: self.publish_timeout,
            previous,
        };

        inner.task = Some(tokio::spawn(poll_loop.run()));
        inner.cancel = Some(cancel);
        inner.state = MonitorState::Running;

        debug!("monitor started");
        Ok(())
    }

    /// Cancel the poll loop and wait for it to exit
    ///
    /// Fails with [`MonitorError::NotRunning`] unless the controller is running.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> MonitorResult<()> {
        let pending = self.begin_stop()?;
        self.finish_stop(pending).await;
        Ok(())
    }

    /// Enter `Stopping` and fire the cancel signal without waiting
    ///
    /// Any `start` between this call and [`finish_stop`](Self::finish_stop)
    /// fails with [`MonitorError::AlreadyRunning`].
    pub(crate) fn begin_stop(&self) -> MonitorResult<PendingStop> {
        let mut inner = self.inner();
        if inner.state != MonitorState::Running {
            return Err(MonitorError::NotRunning);
        }
        inner.state = MonitorState::Stopping;

        let cancel = inner.cancel.take();
        if let Some(cancel) = &cancel {
            cancel.cancel();
        }

        Ok(PendingStop {
            task: inner.task.take(),
        })
    }

    /// Wait for the cancelled poll loop and return to `Idle`
    pub(crate) async fn finish_stop(&self, pending: PendingStop) {
        if let Some(task) = pending.task {
            if let Err(e) = task.await {
                error!("poll loop ended abnormally: {e}");
            }
        }

        self.inner().state = MonitorState::Idle;
        debug!("monitor stopped");
    }

    /// The most recent snapshot (empty before the first successful poll)
    pub fn snapshot(&self) -> Arc<NodeRegistry> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that always holds the most recent snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<NodeRegistry>> {
        self.snapshot_tx.subscribe()
    }

    pub fn connected_node_count(&self) -> usize {
        self.snapshot().key_count()
    }

    /// Keys of all connected nodes, sorted
    pub fn node_keys(&self) -> Vec<String> {
        self.snapshot().keys()
    }

    pub fn connection_status(&self, header: &str) -> String {
        connection_status(header, &self.snapshot())
    }
}

impl Default for MonitorController {
    fn default() -> Self {
        Self::new()
    }
}

/// A poll loop that has been cancelled but not yet awaited
#[derive(Debug)]
pub(crate) struct PendingStop {
    task: Option<JoinHandle<()>>,
}

/// State moved into the spawned poll task
struct PollLoop {
    source: Arc<dyn PollSource>,
    status_tx: mpsc::Sender<String>,
    cancel: CancelSignal,
    snapshot_tx: Arc<watch::Sender<Arc<NodeRegistry>>>,
    poll_interval: Duration,
    publish_timeout: Duration,
    previous: Arc<NodeRegistry>,
}

impl PollLoop {
    /// Runs until the cancel signal fires
    #[instrument(skip_all, fields(interval_ms = self.poll_interval.as_millis() as u64))]
    async fn run(mut self) {
        debug!("starting poll loop");

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("cancellation received");
                    break;
                }

                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(()) => {}
                        Err(MonitorError::StatusChannelClosed) => {
                            debug!("status consumer gone, change not delivered");
                        }
                        Err(e) if e.is_transient() => warn!("{e}, retrying next tick"),
                        Err(e) => error!("poll cycle failed: {e}"),
                    }
                }
            }
        }

        debug!("poll loop stopped");
    }

    /// One poll cycle: fetch, diff, publish
    ///
    /// A failed fetch leaves the previous snapshot untouched.
    async fn poll_once(&mut self) -> MonitorResult<()> {
        let records = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(()),
            result = self.source.fetch_snapshot() => result?,
        };

        for record in &records {
            trace!("{}", record.format_summary());
        }

        let current = Arc::new(NodeRegistry::build(records));
        let diff = NodeRegistry::diff(&self.previous, &current);

        self.snapshot_tx.send_replace(current.clone());
        self.previous = current.clone();

        if diff.is_empty() {
            trace!("no membership change ({} nodes)", current.key_count());
            return Ok(());
        }

        debug!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            total = current.key_count(),
            "node membership changed"
        );

        self.publish(diff.report(current.key_count())).await
    }

    async fn publish(&self, text: String) -> MonitorResult<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Ok(()),
            result = self.status_tx.send_timeout(text, self.publish_timeout) => match result {
                Ok(()) => {
                    trace!("published status message");
                    Ok(())
                }
                Err(SendTimeoutError::Timeout(_)) => {
                    Err(MonitorError::PublishBackpressure(self.publish_timeout))
                }
                Err(SendTimeoutError::Closed(_)) => Err(MonitorError::StatusChannelClosed),
            },
        }
    }
}
