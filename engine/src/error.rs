//! Domain error taxonomy for the order book.
//!
//! `DuplicateOrderId` on add and `UnknownOrderId` on cancel are not
//! represented here: both are defined idempotent no-ops, not errors (see
//! `OrderBook::add_order` / `OrderBook::cancel_order`).

use thiserror::Error;

/// Errors that abort a command before any state is mutated or any trade is
/// emitted.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// `add_order` was called with `qty == 0`.
    #[error("order quantity must be non-zero")]
    InvalidQuantity,
    /// The order pool or level pool has no free slots and is capped.
    #[error("pool exhausted")]
    PoolExhausted,
}
