//! Actor-based node monitoring
//!
//! A monitor session is two independent async tasks that share one bounded
//! status channel and one cancel signal.
//!
//! ```text
//!                 ┌───────────────────┐
//!                 │ MonitorSupervisor │  start / stop / status
//!                 └─────────┬─────────┘
//!                           │ spawns
//!            ┌──────────────┴──────────────┐
//!            │                             │
//!    ┌───────▼────────┐  status (mpsc) ┌───▼────────┐
//!    │   Poll loop    │───────────────▶│ EventLoop  │──▶ Messenger
//!    │ (Controller)   │                │ +heartbeat │
//!    └───────┬────────┘                └───▲────────┘
//!            │      latest snapshot (watch)│
//!            └─────────────────────────────┘
//!                    CancelSignal ──▶ both
//! ```
//!
//! ## Actor Types
//!
//! - **MonitorController**: polls a [`PollSource`](crate::source::PollSource),
//!   diffs snapshots and publishes status texts
//! - **EventLoop**: forwards status texts and heartbeats to a
//!   [`Messenger`](crate::notify::Messenger)
//! - **MonitorSupervisor**: wires a session together and tears it down

pub mod event_loop;
pub mod messages;
pub mod monitor;
pub mod supervisor;
