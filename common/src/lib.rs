//! Shared low-level building blocks for the matching engine workspace.
//!
//! Everything in this crate is meant to run on the hot path of a single
//! trading thread: fixed-capacity memory pools, a lock-free SPSC queue for
//! handing work to a background thread, a nanosecond clock, and a logger that
//! never blocks the caller.

pub mod lf_queue;
pub mod logging;
pub mod mem_pool;
pub mod time;
pub mod types;

pub use types::{OrderId, Price, Qty, Side};
