//! Coordinator: starts the restaurant and driver threads, drives the clock,
//! and reports until the run limit is reached.

use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::config::RunConfig;
use crate::dispatch::Dispatch;
use crate::driver::Driver;
use crate::input::Setup;
use crate::report::{self, cpu_times_seconds};
use crate::restaurant::{self, ProducerReport};
use crate::types::{DriverSnapshot, OrderId, OrderRecord};

/// Aggregated results from a single run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub ticks: u64,
    pub drivers: Vec<DriverSnapshot>,
    pub total_completed: u64,
    pub producer: ProducerReport,
    pub duplicate_claim: bool,
    /// Every claimed order id; only tracked in validate mode.
    pub claimed_orders: Option<Vec<OrderId>>,
    pub elapsed: Duration,
    pub cpu_user_s: Option<f64>,
    pub cpu_sys_s: Option<f64>,
}

/// Run the simulation to completion, writing status blocks to `out`.
///
/// Returns once the clock reached the run limit and every thread has been joined.
pub fn run<I, W>(setup: Setup, records: I, config: &RunConfig, out: &mut W) -> RunSummary
where
    I: IntoIterator<Item = OrderRecord>,
    I::IntoIter: Send + 'static,
    W: Write,
{
    let Setup {
        driver_count,
        tables,
    } = setup;
    let timing = config.timing;
    let tables = Arc::new(tables);
    let dispatch = Arc::new(Dispatch::new(
        config.run_limit,
        driver_count,
        config.validate,
    ));
    info!(
        "starting run: drivers={driver_count} run_limit={} tick_ms={}",
        config.run_limit,
        timing.tick.as_millis()
    );

    let cpu_start = cpu_times_seconds();
    let start = Instant::now();

    let restaurant_thread = {
        let dispatch = Arc::clone(&dispatch);
        let records = records.into_iter();
        thread::Builder::new()
            .name("restaurant".to_string())
            .spawn(move || restaurant::run(&dispatch, records, timing.idle_delay))
            .expect("failed to spawn restaurant thread")
    };

    let mut driver_threads = Vec::with_capacity(driver_count);
    for id in 0..driver_count {
        let dispatch = Arc::clone(&dispatch);
        let tables = Arc::clone(&tables);
        let handle = thread::Builder::new()
            .name(format!("driver-{id}"))
            .spawn(move || {
                let mut driver = Driver::new(id);
                driver.run(&dispatch, &tables, timing.travel_unit);
                driver.position()
            })
            .expect("failed to spawn driver thread");
        driver_threads.push(handle);
    }

    while !dispatch.is_expired() {
        if let Err(err) = report::write_status(out, &dispatch.snapshot()) {
            warn!("failed to write status: {err}");
        }
        dispatch.pause(timing.tick);
        dispatch.advance_clock();
    }
    info!("run limit reached at clock {}, waiting for threads", dispatch.clock());

    let producer = restaurant_thread
        .join()
        .expect("restaurant thread panicked");
    let positions: Vec<_> = driver_threads
        .into_iter()
        .map(|handle| handle.join().expect("driver thread panicked"))
        .collect();

    let board = dispatch.snapshot();
    debug_assert!(dispatch.run_ended(), "restaurant exited without marking run end");
    debug_assert!(
        board
            .drivers
            .iter()
            .zip(&positions)
            .all(|(entry, position)| entry.position == *position),
        "driver board out of sync with driver threads"
    );
    if let Err(err) = report::write_final_status(out, &board) {
        warn!("failed to write final status: {err}");
    }

    let elapsed = start.elapsed();
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    RunSummary {
        ticks: board.clock,
        total_completed: board.total_completed(),
        drivers: board.drivers,
        producer,
        duplicate_claim: dispatch.duplicate_claim(),
        claimed_orders: dispatch.claimed_orders(),
        elapsed,
        cpu_user_s,
        cpu_sys_s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timing;
    use crate::tables::Tables;
    use crate::types::{Coordinate, DriverStatus};
    use std::path::PathBuf;
    use std::sync::mpsc;

    fn fast_config(run_limit: u64, validate: bool) -> RunConfig {
        RunConfig {
            input: PathBuf::from("unused"),
            run_limit,
            timing: Timing {
                tick: Duration::from_millis(10),
                travel_unit: Duration::from_millis(1),
                idle_delay: Duration::from_millis(1),
            },
            validate,
        }
    }

    fn grid_setup(driver_count: usize) -> Setup {
        let restaurants = (0..10).map(|i| Coordinate::new(i, 0)).collect();
        let customers = (0..10).map(|i| Coordinate::new(0, i)).collect();
        Setup {
            driver_count,
            tables: Tables::new(restaurants, customers),
        }
    }

    fn order(restaurant: usize, customer: usize) -> OrderRecord {
        OrderRecord::Order {
            restaurant,
            customer,
        }
    }

    #[test]
    fn single_driver_single_order() {
        let setup = Setup {
            driver_count: 1,
            tables: Tables::new(vec![Coordinate::new(0, 0)], vec![Coordinate::new(5, 0)]),
        };
        let summary = run(
            setup,
            vec![order(0, 0)],
            &fast_config(100, false),
            &mut std::io::sink(),
        );

        assert_eq!(summary.ticks, 100);
        assert_eq!(summary.total_completed, 1);
        assert_eq!(summary.drivers[0].completed, 1);
        assert_eq!(summary.drivers[0].position, Coordinate::new(5, 0));
        assert_eq!(summary.producer.published, 1);
    }

    #[test]
    fn zero_run_limit_processes_nothing() {
        let mut out = Vec::new();
        let summary = run(
            grid_setup(3),
            vec![order(1, 1), order(2, 2)],
            &fast_config(0, true),
            &mut out,
        );

        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.total_completed, 0);
        assert_eq!(summary.producer.published, 0);
        assert_eq!(summary.claimed_orders, Some(Vec::new()));
        for driver in &summary.drivers {
            assert_eq!(driver.status, DriverStatus::Idle);
            assert_eq!(driver.completed, 0);
            assert_eq!(driver.position, Coordinate::ORIGIN);
        }
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("*** FINAL STATUS After 0 seconds:"));
    }

    #[test]
    fn every_order_delivered_exactly_once() {
        let total = 25;
        let records: Vec<OrderRecord> = (0..total).map(|i| order(i % 10, (i * 3) % 10)).collect();
        let summary = run(
            grid_setup(3),
            records,
            &fast_config(150, true),
            &mut std::io::sink(),
        );

        assert_eq!(summary.producer.published, total as u64);
        assert_eq!(summary.total_completed, total as u64);
        assert!(!summary.duplicate_claim);
        let expected: Vec<OrderId> = (0..total as u64).collect();
        assert_eq!(summary.claimed_orders, Some(expected));
    }

    #[test]
    fn idle_records_are_not_orders() {
        let records = vec![
            OrderRecord::Idle,
            order(3, 4),
            OrderRecord::Idle,
            order(1, 1),
        ];
        let summary = run(
            grid_setup(2),
            records,
            &fast_config(50, true),
            &mut std::io::sink(),
        );

        assert_eq!(summary.producer.published, 2);
        assert_eq!(summary.producer.idle_records, 2);
        assert_eq!(summary.total_completed, 2);
        assert_eq!(summary.claimed_orders, Some(vec![0, 1]));
    }

    #[test]
    fn status_printed_once_per_tick() {
        let mut out = Vec::new();
        let summary = run(grid_setup(2), Vec::new(), &fast_config(3, false), &mut out);
        assert_eq!(summary.ticks, 3);

        let text = String::from_utf8(out).expect("utf8");
        let headers: Vec<&str> = text.lines().filter(|l| l.starts_with("After ")).collect();
        assert_eq!(
            headers,
            vec!["After 0 seconds:", "After 1 seconds:", "After 2 seconds:"]
        );
        assert!(text.contains("*** FINAL STATUS After 3 seconds:"));
        assert_eq!(text.matches("  Driver 1: idle, completed 0 orders").count(), 4);
    }

    #[test]
    fn shutdown_never_hangs() {
        for drivers in [0usize, 1, 4, 8] {
            for limit in [1u64, 3] {
                let (done_tx, done_rx) = mpsc::channel();
                let handle = thread::spawn(move || {
                    // Endless input: only the clock can end the run.
                    let records = std::iter::repeat(order(2, 5));
                    let summary = run(
                        grid_setup(drivers),
                        records,
                        &fast_config(limit, true),
                        &mut std::io::sink(),
                    );
                    done_tx.send(summary).expect("send summary");
                });

                let summary = done_rx
                    .recv_timeout(Duration::from_secs(5))
                    .unwrap_or_else(|_| panic!("run hung: drivers={drivers} limit={limit}"));
                assert_eq!(summary.ticks, limit);
                assert!(summary.producer.expired);
                assert!(!summary.duplicate_claim);
                handle.join().expect("coordinator thread panicked");
            }
        }
    }
}
