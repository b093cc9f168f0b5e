//! Shared, persisted bot state.
//!
//! - [`AccessControlList`]: `(transport, identity)` pairs with privileges
//! - [`CounterStore`]: named counters
//!
//! Each store serializes its own writes behind a single mutex.

pub mod access;
pub mod counters;

pub use access::AccessControlList;
pub use counters::CounterStore;
