// Trade emission.
//
// Matching never blocks on I/O: a trade is handed to a `TradeSink` exactly
// once, synchronously, in execution order, and the sink must return without
// suspending the caller. `RingBufferSink` is the sink used by the demo
// harness — it wraps `common::lf_queue::LFQueue`, the same lock-free SPSC
// queue `common::logging::Logger` uses to keep formatting off the hot path.

use common::lf_queue::LFQueue;
use common::{OrderId, Price, Qty, Side};

/// One completed execution.
///
/// `price` is always the resting (maker) side's price, never the
/// aggressor's. `aggressor_side` is the side of the taker order that caused
/// the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    pub price: Price,
    pub qty: Qty,
    pub aggressor_side: Side,
    pub maker_id: OrderId,
    pub taker_id: OrderId,
}

/// Receives trades as they execute. Must not call back into the book that
/// produced them, and must not suspend the caller.
pub trait TradeSink {
    fn on_trade(&mut self, trade: Trade);
}

/// A sink that discards every trade. Used where only book state matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TradeSink for NoopSink {
    #[inline]
    fn on_trade(&mut self, _trade: Trade) {}
}

/// A sink that appends every trade to a `Vec`, for tests and scenario
/// assertions where execution order and contents both matter.
#[derive(Debug, Default, Clone)]
pub struct VecSink(pub Vec<Trade>);

impl TradeSink for VecSink {
    #[inline]
    fn on_trade(&mut self, trade: Trade) {
        self.0.push(trade);
    }
}

/// A sink that enqueues trades into a lock-free SPSC ring buffer instead of
/// doing any formatting or I/O on the matching thread. A consumer thread
/// drains the queue off the hot path. Overflowing the buffer drops the
/// oldest-pending trade notification rather than blocking the matcher.
pub struct RingBufferSink<const N: usize> {
    queue: LFQueue<Trade, N>,
}

impl<const N: usize> RingBufferSink<N> {
    pub fn new() -> Self {
        Self {
            queue: LFQueue::new(),
        }
    }

    /// Drains one pending trade, if any. Intended for the consumer thread.
    pub fn try_recv(&self) -> Option<Trade> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<const N: usize> Default for RingBufferSink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TradeSink for RingBufferSink<N> {
    #[inline]
    fn on_trade(&mut self, trade: Trade) {
        // Best-effort: a full ring means a slow consumer, not a reason to
        // stall the matcher.
        let _ = self.queue.push(trade);
    }
}
