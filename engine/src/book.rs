// The order book facade: ties the order pool, level pool, per-side price
// indexes and the order-id lookup map together behind `add_order` /
// `cancel_order`. Mirrors the public surface of
// original_source/include/core/OrderBook.hpp.

use crate::error::EngineError;
use crate::limit_level::{LimitLevel, OrderPool};
use crate::order::Order;
use crate::pool::SlabPool;
use crate::side_index::SideIndex;
use crate::trade::TradeSink;
use common::{OrderId, Price, Qty, Side};
use std::cmp::Reverse;
use std::collections::HashMap;

pub type LevelPool = SlabPool<LimitLevel>;

/// Pool sizing for a book. Capacities are pre-grown at construction and may
/// still grow further at runtime unless `*_pool_max` is set.
pub struct EngineConfig {
    pub order_pool_capacity: usize,
    pub order_pool_max: Option<usize>,
    pub level_pool_capacity: usize,
    pub level_pool_max: Option<usize>,
}

impl EngineConfig {
    fn validate(&self) {
        assert!(
            self.order_pool_capacity > 0,
            "order_pool_capacity must be non-zero"
        );
        assert!(
            self.level_pool_capacity > 0,
            "level_pool_capacity must be non-zero"
        );
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order_pool_capacity: 65_536,
            order_pool_max: None,
            level_pool_capacity: 1024,
            level_pool_max: None,
        }
    }
}

pub struct OrderBook<S: TradeSink> {
    pub(crate) orders: OrderPool,
    pub(crate) levels: LevelPool,
    pub(crate) bids: SideIndex<Reverse<Price>>,
    pub(crate) asks: SideIndex<Price>,
    pub(crate) lookup: HashMap<OrderId, usize>,
    pub(crate) sink: S,
}

impl<S: TradeSink> OrderBook<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(EngineConfig::default(), sink)
    }

    pub fn with_config(config: EngineConfig, sink: S) -> Self {
        config.validate();
        Self {
            orders: SlabPool::with_max_capacity(config.order_pool_capacity, config.order_pool_max),
            levels: SlabPool::with_max_capacity(config.level_pool_capacity, config.level_pool_max),
            bids: SideIndex::new(),
            asks: SideIndex::new(),
            lookup: HashMap::new(),
            sink,
        }
    }

    /// Adds a new order, matching it against the opposite side first and
    /// resting whatever quantity survives. A duplicate `id` is a silent
    /// no-op. `qty == 0` is rejected before any state is touched.
    pub fn add_order(
        &mut self,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Qty,
    ) -> Result<(), EngineError> {
        if qty == 0 {
            return Err(EngineError::InvalidQuantity);
        }
        if self.lookup.contains_key(&id) {
            return Ok(());
        }

        let order_idx = self
            .orders
            .allocate()
            .map_err(|_| EngineError::PoolExhausted)?;
        *self.orders.get_mut(order_idx) = Order::new(id, side, price, qty);

        self.match_incoming(side, price, order_idx);

        if self.orders.get(order_idx).is_filled() {
            self.orders.deallocate(order_idx);
            return Ok(());
        }

        let level_idx = match self.get_or_create_level(side, price) {
            Ok(idx) => idx,
            Err(e) => {
                // The order already executed against some liquidity; it just
                // can't rest. Undo the allocation and surface the error.
                self.orders.deallocate(order_idx);
                return Err(e);
            }
        };
        self.levels.get_mut(level_idx).append(&self.orders, order_idx, level_idx);
        self.lookup.insert(id, order_idx);
        Ok(())
    }

    /// Removes a resting order. An unknown `id` is a silent no-op.
    pub fn cancel_order(&mut self, id: OrderId) {
        let Some(order_idx) = self.lookup.remove(&id) else {
            return;
        };
        let (side, price, level_idx) = {
            let order = self.orders.get(order_idx);
            (
                order.side,
                order.limit_price,
                order
                    .level
                    .expect("a looked-up order must be resting on a level"),
            )
        };

        self.levels.get_mut(level_idx).remove(&self.orders, order_idx);
        if self.levels.get(level_idx).is_empty() {
            match side {
                Side::Buy => self.bids.remove(Reverse(price)),
                Side::Sell => self.asks.remove(price),
            };
            self.levels.deallocate(level_idx);
        }
        self.orders.deallocate(order_idx);
    }

    pub fn has_order(&self, id: OrderId) -> bool {
        self.lookup.contains_key(&id)
    }

    /// Total resting quantity at `price` on `side`, or `0` if the level
    /// doesn't exist.
    pub fn volume_at(&self, side: Side, price: Price) -> Qty {
        let level_idx = match side {
            Side::Buy => self.bids.find(Reverse(price)),
            Side::Sell => self.asks.find(price),
        };
        level_idx.map(|idx| self.levels.get(idx).volume()).unwrap_or(0)
    }

    /// The best (highest bid / lowest ask) resting price on `side`.
    pub fn best(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.bids.best().map(|(Reverse(p), _)| p),
            Side::Sell => self.asks.best().map(|(p, _)| p),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn get_or_create_level(&mut self, side: Side, price: Price) -> Result<usize, EngineError> {
        let existing = match side {
            Side::Buy => self.bids.find(Reverse(price)),
            Side::Sell => self.asks.find(price),
        };
        if let Some(idx) = existing {
            return Ok(idx);
        }

        let level_idx = self
            .levels
            .allocate()
            .map_err(|_| EngineError::PoolExhausted)?;
        *self.levels.get_mut(level_idx) = LimitLevel::new(price);
        match side {
            Side::Buy => self.bids.insert(Reverse(price), level_idx),
            Side::Sell => self.asks.insert(price, level_idx),
        }
        Ok(level_idx)
    }
}

/// Internal introspection used to check structural invariants from outside
/// the crate (integration tests, property-based fuzzing). Not part of the
/// supported public API — gated behind the `test-util` feature.
#[cfg(any(test, feature = "test-util"))]
impl<S: TradeSink> OrderBook<S> {
    /// Every price currently carrying a resting level on `side`.
    pub fn resting_prices(&self, side: Side) -> Vec<Price> {
        match side {
            Side::Buy => self.bids.keys().map(|Reverse(p)| p).collect(),
            Side::Sell => self.asks.keys().collect(),
        }
    }

    /// Order ids resting at `price` on `side`, head to tail. Empty if no
    /// level exists there.
    pub fn level_order_ids(&self, side: Side, price: Price) -> Vec<OrderId> {
        let level_idx = match side {
            Side::Buy => self.bids.find(Reverse(price)),
            Side::Sell => self.asks.find(price),
        };
        level_idx
            .map(|idx| self.levels.get(idx).order_ids(&self.orders))
            .unwrap_or_default()
    }

    /// The `order_count` a level at `price` on `side` reports for itself, or
    /// `None` if no level exists there.
    pub fn level_order_count(&self, side: Side, price: Price) -> Option<usize> {
        let level_idx = match side {
            Side::Buy => self.bids.find(Reverse(price)),
            Side::Sell => self.asks.find(price),
        };
        level_idx.map(|idx| self.levels.get(idx).order_count())
    }

    /// `remaining_qty` of a known order, or `None` if `id` isn't resting.
    pub fn order_remaining_qty(&self, id: OrderId) -> Option<Qty> {
        self.lookup.get(&id).map(|&idx| self.orders.get(idx).remaining_qty)
    }

    /// Resolves a resting order's own `level` back-pointer to that level's
    /// price, or `None` if `id` isn't resting.
    pub fn order_resting_level_price(&self, id: OrderId) -> Option<Price> {
        self.lookup.get(&id).and_then(|&idx| {
            self.orders
                .get(idx)
                .level
                .map(|level_idx| self.levels.get(level_idx).price())
        })
    }

    /// `(capacity, free slots)` of the order pool.
    pub fn order_pool_stats(&self) -> (usize, usize) {
        (self.orders.capacity(), self.orders.free_count())
    }

    /// `(capacity, free slots)` of the level pool.
    pub fn level_pool_stats(&self) -> (usize, usize) {
        (self.levels.capacity(), self.levels.free_count())
    }
}
