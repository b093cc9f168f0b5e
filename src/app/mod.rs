//! Running application: shared context and the shutdown signal.

pub mod context;
pub mod shutdown;

pub use context::{AppContext, EVENT_CAPACITY};
pub use shutdown::{join_task, shutdown_channel, Shutdown, ShutdownTrigger};
