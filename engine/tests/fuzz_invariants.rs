//! Property-based check: invariants 1-5 (no crossed book, volume
//! consistency, lookup consistency, index purity, pool accounting) hold
//! after every command in an arbitrary bounded sequence of adds/cancels.
//!
//! This walks the book's public API to drive commands, then checks the
//! structural invariants through the `test-util`-gated introspection
//! accessors on `OrderBook` (see book.rs), which walk level contents and
//! pool free lists directly rather than approximating them.

use common::{OrderId, Price, Qty, Side};
use engine::{NoopSink, OrderBook};
use proptest::prelude::*;
use std::collections::HashSet;

const ID_SPACE: OrderId = 64;
const PRICE_MIN: Price = 95;
const PRICE_MAX: Price = 105;
const QTY_MAX: Qty = 20;

#[derive(Debug, Clone)]
enum Command {
    Add {
        id: OrderId,
        side: Side,
        price: Price,
        qty: Qty,
    },
    Cancel {
        id: OrderId,
    },
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => (
            0..ID_SPACE,
            prop_oneof![Just(Side::Buy), Just(Side::Sell)],
            PRICE_MIN..=PRICE_MAX,
            1..=QTY_MAX,
        )
            .prop_map(|(id, side, price, qty)| Command::Add { id, side, price, qty }),
        1 => (0..ID_SPACE).prop_map(|id| Command::Cancel { id }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariants_hold_after_every_command(commands in prop::collection::vec(command_strategy(), 0..300)) {
        let mut book = OrderBook::new(NoopSink);

        for command in commands {
            match command {
                Command::Add { id, side, price, qty } => {
                    let _ = book.add_order(id, side, price, qty);
                }
                Command::Cancel { id } => {
                    book.cancel_order(id);
                }
            }
            assert_invariants(&book);
        }
    }
}

fn assert_invariants(book: &OrderBook<NoopSink>) {
    // 1. No crossed book.
    if let (Some(bid), Some(ask)) = (book.best(Side::Buy), book.best(Side::Sell)) {
        assert!(bid < ask, "crossed book: bid {bid} >= ask {ask}");
    }

    let mut resting: HashSet<OrderId> = HashSet::new();
    let mut allocated_levels = 0usize;

    for side in [Side::Buy, Side::Sell] {
        for price in book.resting_prices(side) {
            allocated_levels += 1;
            let ids = book.level_order_ids(side, price);

            // 4. Index purity: a price present in the side index always
            // carries a non-empty level.
            assert!(!ids.is_empty(), "index purity: {side:?} level at {price} is present but empty");

            // 3 (order_count arm): the level's own bookkeeping count agrees
            // with the number of orders actually reachable in its list.
            assert_eq!(
                book.level_order_count(side, price),
                Some(ids.len()),
                "{side:?} level at {price}: order_count disagrees with list length",
            );

            // 2. Volume consistency: total_volume equals the sum of the
            // resting remaining_qty of every order linked into the level.
            let summed_qty: Qty = ids
                .iter()
                .map(|&id| book.order_remaining_qty(id).expect("listed order must be resting"))
                .sum();
            assert_eq!(
                summed_qty,
                book.volume_at(side, price),
                "invariant 2: {side:?} level at {price}: total_volume != sum(remaining_qty)",
            );

            // 3 (back-pointer arm): every order reachable from this level
            // points back at a level that resolves to the same price.
            for &id in &ids {
                assert_eq!(
                    book.order_resting_level_price(id),
                    Some(price),
                    "invariant 3: order {id}'s level back-pointer does not resolve to {price}",
                );
                assert!(
                    resting.insert(id),
                    "invariant 3: order {id} is linked into more than one level",
                );
            }
        }
    }

    // 3. Lookup consistency: an id is known to the book (has_order) iff it
    // was actually reachable by walking some level above.
    for id in 0..ID_SPACE {
        assert_eq!(
            book.has_order(id),
            resting.contains(&id),
            "invariant 3: has_order({id}) disagrees with level reachability",
        );
    }

    // 5. Pool accounting: every resting order/level is a live allocation,
    // and live + free always equals capacity.
    let (order_capacity, order_free) = book.order_pool_stats();
    assert_eq!(
        order_free + resting.len(),
        order_capacity,
        "invariant 5: order pool free_count + live allocations != capacity",
    );
    let (level_capacity, level_free) = book.level_pool_stats();
    assert_eq!(
        level_free + allocated_levels,
        level_capacity,
        "invariant 5: level pool free_count + live allocations != capacity",
    );
}
