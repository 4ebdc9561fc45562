//! EventLoop - Merges status messages, heartbeats and cancellation
//!
//! ## Message Flow
//!
//! ```text
//! status channel ──┐
//! heartbeat timer ─┼─▶ select! ─▶ Messenger
//! cancel signal ───┘
//! ```
//!
//! Exactly one handler runs at a time. When several sources are ready at the
//! same instant, cancellation is handled first, so no message goes out once
//! the signal has been observed. The loop only reacts to cancellation; it
//! never triggers it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, instrument, trace};

use crate::actors::messages::{HEADER_HEARTBEAT, connection_status};
use crate::cancel::CancelSignal;
use crate::error::{MonitorError, MonitorResult};
use crate::notify::Messenger;
use crate::registry::NodeRegistry;

/// Consumer side of a monitor session
pub struct EventLoop {
    /// Status texts from the poll loop
    status_rx: mpsc::Receiver<String>,

    heartbeat_interval: Duration,

    /// Latest snapshot, read on every heartbeat
    snapshots: watch::Receiver<Arc<NodeRegistry>>,

    messenger: Arc<dyn Messenger>,

    cancel: CancelSignal,
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl EventLoop {
    /// Fails with [`MonitorError::InvalidConfig`] for a zero heartbeat interval
    pub fn new(
        status_rx: mpsc::Receiver<String>,
        heartbeat_interval: Duration,
        snapshots: watch::Receiver<Arc<NodeRegistry>>,
        messenger: Arc<dyn Messenger>,
        cancel: CancelSignal,
    ) -> MonitorResult<Self> {
        if heartbeat_interval.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "heartbeat interval must be positive".into(),
            ));
        }

        Ok(Self {
            status_rx,
            heartbeat_interval,
            snapshots,
            messenger,
            cancel,
        })
    }

    /// Run until the cancel signal fires
    ///
    /// The first heartbeat goes out one full interval after the loop starts.
    #[instrument(skip_all)]
    pub async fn run(mut self) {
        debug!("starting event loop");

        let mut heartbeat = interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut status_open = true;

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("cancellation received");
                    break;
                }

                message = self.status_rx.recv(), if status_open => {
                    match message {
                        Some(text) => self.forward_status(text).await,
                        None => {
                            debug!("status channel closed, heartbeats only");
                            status_open = false;
                        }
                    }
                }

                _ = heartbeat.tick() => {
                    self.send_heartbeat().await;
                }
            }
        }

        debug!("event loop stopped");
    }

    async fn forward_status(&self, text: String) {
        if text.is_empty() {
            trace!("dropping empty status message");
            return;
        }

        debug!("status event: {text}");
        if let Err(e) = self.messenger.send(&text).await {
            error!("failed to deliver status message: {e:#}");
        }
    }

    async fn send_heartbeat(&self) {
        let registry = self.snapshots.borrow().clone();
        let text = connection_status(HEADER_HEARTBEAT, &registry);

        debug!("heartbeat event");
        if let Err(e) = self.messenger.send(&text).await {
            error!("failed to deliver heartbeat: {e:#}");
        }
    }
}
