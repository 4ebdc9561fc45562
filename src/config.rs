use std::time::Duration;

use anyhow::Context;
use tracing::trace;

use crate::error::{MonitorError, MonitorResult};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub manager: ManagerConfig,

    /// Monitor cadence (optional - defaults apply)
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Where status messages go (optional - log only)
    pub notify: Option<Notify>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ManagerConfig {
    /// Base URL of the node manager API
    pub url: String,
    pub token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MonitorConfig {
    /// Seconds between two snapshots
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Seconds between two heartbeat messages
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,
    /// Capacity of the status channel
    #[serde(default = "default_status_buffer")]
    pub status_buffer: usize,
    /// Seconds to wait for status channel capacity before dropping
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            heartbeat_interval: default_heartbeat_interval(),
            status_buffer: default_status_buffer(),
            publish_timeout: default_publish_timeout(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notify {
    Discord(Discord),
    Webhook(Webhook),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Discord {
    pub url: String,
    pub user_id: Option<String>,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_interval() -> u64 {
    10
}

fn default_heartbeat_interval() -> u64 {
    3600
}

fn default_status_buffer() -> usize {
    16
}

fn default_publish_timeout() -> u64 {
    5
}

/// Validated runtime settings for a monitor session
///
/// Only obtainable through [`MonitorSettings::new`] or
/// [`Config::monitor_settings`], so every instance has positive cadences and
/// a non-empty status buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    poll_interval: Duration,
    heartbeat_interval: Duration,
    status_buffer: usize,
    publish_timeout: Duration,
}

impl MonitorSettings {
    /// Settings with the given cadences and default channel policy
    pub fn new(poll_interval: Duration, heartbeat_interval: Duration) -> MonitorResult<Self> {
        Self {
            poll_interval,
            heartbeat_interval,
            status_buffer: default_status_buffer(),
            publish_timeout: Duration::from_secs(default_publish_timeout()),
        }
        .validated()
    }

    pub fn with_status_buffer(mut self, status_buffer: usize) -> MonitorResult<Self> {
        self.status_buffer = status_buffer;
        self.validated()
    }

    pub fn with_publish_timeout(mut self, publish_timeout: Duration) -> Self {
        self.publish_timeout = publish_timeout;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub fn status_buffer(&self) -> usize {
        self.status_buffer
    }

    pub fn publish_timeout(&self) -> Duration {
        self.publish_timeout
    }

    fn validated(self) -> MonitorResult<Self> {
        if self.poll_interval.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "poll interval must be positive".into(),
            ));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "heartbeat interval must be positive".into(),
            ));
        }
        if self.status_buffer == 0 {
            return Err(MonitorError::InvalidConfig(
                "status buffer must hold at least one message".into(),
            ));
        }
        Ok(self)
    }
}

impl Config {
    /// Validate the monitor section into runtime settings
    pub fn monitor_settings(&self) -> MonitorResult<MonitorSettings> {
        let MonitorConfig {
            interval,
            heartbeat_interval,
            status_buffer,
            publish_timeout,
        } = self.monitor;

        Ok(MonitorSettings::new(
            Duration::from_secs(interval),
            Duration::from_secs(heartbeat_interval),
        )?
        .with_status_buffer(status_buffer)?
        .with_publish_timeout(Duration::from_secs(publish_timeout)))
    }

    /// Apply `WING_MANAGER_URL` / `WING_MANAGER_TOKEN` overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = crate::util::get_manager_url() {
            self.manager.url = url;
        }
        if let Some(token) = crate::util::get_manager_token() {
            self.manager.token = Some(token);
        }
        self
    }
}

/// Read, parse and validate a JSON configuration file
pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let config: Config = serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?;

    config.monitor_settings()?;
    trace!("loaded config: {config:?}");

    Ok(config)
}
