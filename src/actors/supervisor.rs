//! MonitorSupervisor - Start/stop surface for one monitor session at a time
//!
//! `start` creates a fresh cancel signal and status channel, then spawns the
//! poll loop (via [`MonitorController`]) and the [`EventLoop`] as two
//! independent tasks. `stop` cancels both and waits for them to finish.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::actors::event_loop::EventLoop;
use crate::actors::messages::{
    HEADER_STATUS, MSG_MONITOR_ALREADY_STARTED, MSG_MONITOR_NOT_RUNNING, MSG_MONITOR_START,
    MSG_MONITOR_STOP, MSG_UPTIME_PROMPT, UptimeLink, uptime_link,
};
use crate::actors::monitor::MonitorController;
use crate::cancel::CancelSignal;
use crate::config::MonitorSettings;
use crate::error::{MonitorError, MonitorResult};
use crate::node::NodeRecord;
use crate::notify::Messenger;
use crate::source::PollSource;

pub struct MonitorSupervisor {
    settings: MonitorSettings,
    source: Arc<dyn PollSource>,
    messenger: Arc<dyn Messenger>,
    controller: MonitorController,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MonitorSupervisor {
    pub fn new(
        settings: MonitorSettings,
        source: Arc<dyn PollSource>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            controller: MonitorController::new().with_publish_timeout(settings.publish_timeout()),
            settings,
            source,
            messenger,
            event_loop: Mutex::new(None),
        }
    }

    pub fn controller(&self) -> &MonitorController {
        &self.controller
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Launch the poll loop and the event loop
    #[instrument(skip(self))]
    pub fn start(&self) -> MonitorResult<()> {
        // held until the new handle is stored so `stop` never sees a half-started session
        let mut slot = self
            .event_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let cancel = CancelSignal::new();
        let (status_tx, status_rx) = mpsc::channel(self.settings.status_buffer());

        let event_loop = EventLoop::new(
            status_rx,
            self.settings.heartbeat_interval(),
            self.controller.subscribe(),
            self.messenger.clone(),
            cancel.clone(),
        )?;

        self.controller.start(
            self.settings.poll_interval(),
            self.source.clone(),
            status_tx,
            cancel,
        )?;

        // left over from a session that was cancelled but never stopped
        if let Some(stale) = slot.replace(tokio::spawn(event_loop.run())) {
            stale.abort();
        }

        info!("node monitoring started");
        Ok(())
    }

    /// Cancel both tasks and wait for them to exit
    #[instrument(skip(self))]
    pub async fn stop(&self) -> MonitorResult<()> {
        let (pending, handle) = {
            let mut slot = self
                .event_loop
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let pending = self.controller.begin_stop()?;
            (pending, slot.take())
        };

        self.controller.finish_stop(pending).await;

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("event loop ended abnormally: {e}");
            }
        }

        info!("node monitoring stopped");
        Ok(())
    }

    /// Uptime tracker link; filtered by node keys only while running
    pub fn uptime_link(&self) -> UptimeLink {
        let keys = self.is_running().then(|| self.controller.node_keys());
        uptime_link(keys.as_deref(), self.controller.connected_node_count())
    }

    /// Multi-line details of one connected node
    pub fn node_detail(&self, key: &str) -> Option<String> {
        self.controller
            .snapshot()
            .get(key)
            .map(NodeRecord::format_detail)
    }

    /// Reply text for a start request
    pub fn handle_start(&self) -> String {
        match self.start() {
            Ok(()) => MSG_MONITOR_START.to_string(),
            Err(MonitorError::AlreadyRunning) => MSG_MONITOR_ALREADY_STARTED.to_string(),
            Err(e) => format!("Failed to start node monitoring: {e}"),
        }
    }

    /// Reply text for a stop request
    pub async fn handle_stop(&self) -> String {
        match self.stop().await {
            Ok(()) => MSG_MONITOR_STOP.to_string(),
            Err(MonitorError::NotRunning) => MSG_MONITOR_NOT_RUNNING.to_string(),
            Err(e) => format!("Failed to stop node monitoring: {e}"),
        }
    }

    /// Reply text for an uptime request
    pub fn handle_uptime(&self) -> String {
        format!("{MSG_UPTIME_PROMPT} {}", self.uptime_link())
    }

    /// Reply text for a status request
    pub fn status_message(&self) -> String {
        if !self.is_running() {
            return MSG_MONITOR_NOT_RUNNING.to_string();
        }
        self.controller.connection_status(HEADER_STATUS)
    }
}
