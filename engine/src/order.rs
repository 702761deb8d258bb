// A resting or in-flight order.
//
// Links are indices into the order pool rather than pointers: the pool's
// slots are address-stable, but indices avoid a lifetime on `Order` and keep
// the type `Copy`-free-but-plain, matching the intrusive-list-as-arena-plus-
// index design used throughout this engine (see pool.rs).

use common::{OrderId, Price, Qty, Side};

#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub limit_price: Price,
    pub remaining_qty: Qty,
    pub initial_qty: Qty,

    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
    /// Slot index, in the level pool, of the level this order currently
    /// rests on. `None` while the order is only an in-flight aggressor.
    pub(crate) level: Option<usize>,
}

impl Order {
    pub fn new(id: OrderId, side: Side, limit_price: Price, qty: Qty) -> Self {
        Self {
            id,
            side,
            limit_price,
            remaining_qty: qty,
            initial_qty: qty,
            prev: None,
            next: None,
            level: None,
        }
    }

    /// Saturating fill: reduces `remaining_qty` by `qty`, floored at zero.
    #[inline]
    pub fn fill(&mut self, qty: Qty) {
        self.remaining_qty = self.remaining_qty.saturating_sub(qty);
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining_qty == 0
    }
}
