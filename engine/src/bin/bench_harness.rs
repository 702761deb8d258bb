//! Demo / latency harness.
//!
//! Replays a synthetic order flow through `OrderBook` with a seeded PRNG so
//! runs are reproducible, then reports throughput and per-order latency.
//! Modeled on the seeded-generator/nanosecond-timing approach of the
//! original benchmark this engine is descended from, adapted to clap-based
//! argument parsing in the style this crate's sibling binary used to use.

use clap::Parser;
use common::{Price, Qty, Side};
use engine::{EngineError, NoopSink, OrderBook};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "bench_harness")]
#[command(about = "Replays synthetic order flow through the matching engine and reports latency")]
struct Args {
    /// Number of orders to submit.
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    num_orders: u64,

    /// PRNG seed; the same seed always produces the same order flow.
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Lowest price in the uniform price band.
    #[arg(long, default_value_t = 90)]
    price_min: i64,

    /// Highest price in the uniform price band.
    #[arg(long, default_value_t = 110)]
    price_max: i64,

    /// Highest quantity in the uniform quantity band (lowest is always 1).
    #[arg(long, default_value_t = 100)]
    qty_max: u32,

    /// Emit a `Latency_NS` CSV line per order instead of a summary.
    #[arg(long, default_value_t = false)]
    csv: bool,
}

fn main() {
    let args = Args::parse();

    let mut book = OrderBook::new(NoopSink);
    let mut rng = StdRng::seed_from_u64(args.seed);

    if args.csv {
        println!("Latency_NS");
    } else {
        println!("Replaying {} orders (seed {})...", args.num_orders, args.seed);
    }

    let start = Instant::now();
    for order_id in 0..args.num_orders {
        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let price: Price = rng.gen_range(args.price_min..=args.price_max);
        let qty: Qty = rng.gen_range(1..=args.qty_max);

        let order_start = Instant::now();
        let result = book.add_order(order_id, side, price, qty);
        let latency_ns = order_start.elapsed().as_nanos();

        if args.csv {
            println!("{latency_ns}");
        }

        if let Err(EngineError::PoolExhausted) = result {
            eprintln!("pool exhausted after {order_id} orders");
            std::process::exit(1);
        }
    }
    let elapsed = start.elapsed();

    if !args.csv {
        let seconds = elapsed.as_secs_f64();
        let throughput = args.num_orders as f64 / seconds;
        let avg_latency_ns = elapsed.as_nanos() as f64 / args.num_orders as f64;
        println!("Total time: {seconds:.3} seconds");
        println!("Throughput: {throughput:.0} orders/sec");
        println!("Avg latency: {avg_latency_ns:.1} ns/order");
    }
}
