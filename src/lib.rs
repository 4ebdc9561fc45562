pub mod actors;
pub mod cancel;
pub mod config;
pub mod error;
pub mod node;
pub mod notify;
pub mod registry;
pub mod source;
pub mod util;

pub use actors::event_loop::EventLoop;
pub use actors::monitor::{MonitorController, MonitorState};
pub use actors::supervisor::MonitorSupervisor;
pub use cancel::CancelSignal;
pub use error::{MonitorError, MonitorResult};
pub use node::{NodeRecord, nodes_are_equal};
pub use registry::{NodeRegistry, RegistryDiff};
