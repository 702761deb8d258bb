// Price-time-priority matching. Grounded on
// original_source/src/core/OrderBook.cpp's `match`: walk the opposite side's
// best level while it still crosses the incoming order's limit, consuming
// resting orders FIFO within a level. Execution price is always the resting
// (maker) order's price. A head order that is only partially filled stays at
// the head with its reduced quantity rather than being re-queued.

use crate::book::OrderBook;
use crate::trade::{Trade, TradeSink};
use common::{Price, Side};
use std::cmp::Reverse;

impl<S: TradeSink> OrderBook<S> {
    pub(crate) fn match_incoming(&mut self, side: Side, limit_price: Price, order_idx: usize) {
        while self.orders.get(order_idx).remaining_qty > 0 {
            let Some((level_price, level_idx)) = self.best_opposite_level(side) else {
                break;
            };
            if !crosses(side, limit_price, level_price) {
                break;
            }

            self.drain_level_head(side, level_idx, order_idx);

            if self.levels.get(level_idx).is_empty() {
                match side {
                    Side::Buy => self.asks.remove(level_price),
                    Side::Sell => self.bids.remove(Reverse(level_price)),
                };
                self.levels.deallocate(level_idx);
            }
        }
    }

    fn best_opposite_level(&self, side: Side) -> Option<(Price, usize)> {
        match side {
            Side::Buy => self.asks.best(),
            Side::Sell => self.bids.best().map(|(Reverse(p), idx)| (p, idx)),
        }
    }

    /// Consumes resting orders at the head of `level_idx` until the
    /// incoming order is fully filled or the level is drained.
    fn drain_level_head(&mut self, side: Side, level_idx: usize, order_idx: usize) {
        loop {
            if self.orders.get(order_idx).is_filled() {
                break;
            }
            let Some(maker_idx) = self.levels.get(level_idx).head() else {
                break;
            };

            let maker_id = self.orders.get(maker_idx).id;
            let maker_qty = self.orders.get(maker_idx).remaining_qty;
            let taker_qty = self.orders.get(order_idx).remaining_qty;
            let trade_qty = taker_qty.min(maker_qty);
            let level_price = self.levels.get(level_idx).price();
            let taker_id = self.orders.get(order_idx).id;

            self.sink.on_trade(Trade {
                price: level_price,
                qty: trade_qty,
                aggressor_side: side,
                maker_id,
                taker_id,
            });

            self.orders.get_mut(order_idx).fill(trade_qty);

            if trade_qty == maker_qty {
                // `LimitLevel::remove` charges `total_volume` with the
                // order's *current* remaining quantity, so splice it out
                // while that's still the full maker_qty rather than filling
                // it to zero first.
                self.levels.get_mut(level_idx).remove(&self.orders, maker_idx);
                self.lookup.remove(&maker_id);
                self.orders.deallocate(maker_idx);
            } else {
                self.orders.get_mut(maker_idx).fill(trade_qty);
                self.levels.get_mut(level_idx).decrease_volume(trade_qty);
                break;
            }
        }
    }
}

#[inline]
fn crosses(side: Side, limit_price: Price, level_price: Price) -> bool {
    match side {
        Side::Buy => limit_price >= level_price,
        Side::Sell => limit_price <= level_price,
    }
}
