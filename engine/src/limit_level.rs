// A FIFO queue of orders resting at one price, plus aggregate volume.
//
// Invariants: `head == None` iff `tail == None` iff `total_volume == 0`;
// `total_volume == sum(remaining_qty)` of every order linked here; every
// linked order's `level` points back at this level's pool slot.

use crate::order::Order;
use crate::pool::SlabPool;
use common::{Price, Qty};

pub struct LimitLevel {
    price: Price,
    total_volume: Qty,
    head: Option<usize>,
    tail: Option<usize>,
    order_count: usize,
}

pub type OrderPool = SlabPool<Order>;

impl LimitLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_volume: 0,
            head: None,
            tail: None,
            order_count: 0,
        }
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    #[inline]
    pub fn volume(&self) -> Qty {
        self.total_volume
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_count
    }

    #[inline]
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    /// Order ids resting here, head to tail. Diagnostic use only.
    pub fn order_ids(&self, orders: &OrderPool) -> Vec<common::OrderId> {
        let mut ids = Vec::with_capacity(self.order_count);
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let order = orders.get(idx);
            ids.push(order.id);
            cursor = order.next;
        }
        ids
    }

    /// Appends `order_idx` at the tail (time priority). `self_idx` is this
    /// level's own pool slot index, written into the order's back-pointer.
    pub fn append(&mut self, orders: &OrderPool, order_idx: usize, self_idx: usize) {
        let qty = orders.get(order_idx).remaining_qty;
        {
            let order = orders.get_mut(order_idx);
            order.level = Some(self_idx);
            order.next = None;
            order.prev = self.tail;
        }
        match self.tail {
            Some(tail_idx) => {
                orders.get_mut(tail_idx).next = Some(order_idx);
            }
            None => {
                self.head = Some(order_idx);
            }
        }
        self.tail = Some(order_idx);
        self.total_volume += qty;
        self.order_count += 1;
    }

    /// Splices `order_idx` out of the list and subtracts its *current*
    /// remaining quantity from `total_volume`.
    pub fn remove(&mut self, orders: &OrderPool, order_idx: usize) {
        let (prev, next, qty) = {
            let order = orders.get(order_idx);
            (order.prev, order.next, order.remaining_qty)
        };

        match prev {
            Some(prev_idx) => orders.get_mut(prev_idx).next = next,
            None => self.head = next,
        }
        match next {
            Some(next_idx) => orders.get_mut(next_idx).prev = prev,
            None => self.tail = prev,
        }

        let order = orders.get_mut(order_idx);
        order.prev = None;
        order.next = None;
        order.level = None;

        self.total_volume = self.total_volume.saturating_sub(qty);
        self.order_count -= 1;
    }

    /// Subtracts `qty` from `total_volume` without removing anything —
    /// used when the head order is partially filled but stays resting.
    #[inline]
    pub fn decrease_volume(&mut self, qty: Qty) {
        self.total_volume = self.total_volume.saturating_sub(qty);
    }
}
