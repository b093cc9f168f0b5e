//! Game telemetry accumulators.

pub mod apex;

pub use apex::{ApexStats, ApexTracker};
