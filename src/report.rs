//! Human-readable status lines and the end-of-run summary.

use std::io::{self, Write};

use crate::coordinator::RunSummary;
use crate::dispatch::BoardSnapshot;
use crate::tables::Tables;

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
pub fn cpu_times_seconds() -> Option<(f64, f64)> {
    use libc::{RUSAGE_SELF, getrusage, rusage, timeval};
    let zero = timeval {
        tv_sec: 0,
        tv_usec: 0,
    };
    let mut usage = rusage {
        ru_utime: zero,
        ru_stime: zero,
        ru_maxrss: 0,
        ru_ixrss: 0,
        ru_idrss: 0,
        ru_isrss: 0,
        ru_minflt: 0,
        ru_majflt: 0,
        ru_nswap: 0,
        ru_inblock: 0,
        ru_oublock: 0,
        ru_msgsnd: 0,
        ru_msgrcv: 0,
        ru_nsignals: 0,
        ru_nvcsw: 0,
        ru_nivcsw: 0,
    };
    let rc = unsafe { getrusage(RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
pub fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Echo the loaded tables the way the run announces them.
pub fn write_tables(out: &mut impl Write, tables: &Tables) -> io::Result<()> {
    for (id, location) in tables.restaurants().iter().enumerate() {
        writeln!(out, "Restaurant {id} is at {location}")?;
    }
    for (id, location) in tables.customers().iter().enumerate() {
        writeln!(out, "Customer {id} is at {location}")?;
    }
    Ok(())
}

fn write_drivers(out: &mut impl Write, board: &BoardSnapshot) -> io::Result<()> {
    for driver in &board.drivers {
        writeln!(
            out,
            "  Driver {}: {}, completed {} orders",
            driver.id, driver.status, driver.completed
        )?;
    }
    writeln!(out, "Total completed deliveries: {}", board.total_completed())
}

/// Per-tick status block.
pub fn write_status(out: &mut impl Write, board: &BoardSnapshot) -> io::Result<()> {
    writeln!(out, "After {} seconds:", board.clock)?;
    write_drivers(out, board)?;
    out.flush()
}

/// Status block printed once every thread has been joined.
pub fn write_final_status(out: &mut impl Write, board: &BoardSnapshot) -> io::Result<()> {
    writeln!(out, "*** FINAL STATUS After {} seconds:", board.clock)?;
    write_drivers(out, board)?;
    out.flush()
}

fn format_cpu(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string())
}

/// Key/value lines describing the whole run.
pub fn write_run_summary(out: &mut impl Write, summary: &RunSummary) -> io::Result<()> {
    writeln!(out, "RUN SUMMARY")?;
    writeln!(
        out,
        "ticks={} deliveries={}",
        summary.ticks, summary.total_completed
    )?;
    writeln!(
        out,
        "orders_published={} idle_records={} restaurant_stopped_by={}",
        summary.producer.published,
        summary.producer.idle_records,
        if summary.producer.expired { "clock" } else { "input" }
    )?;
    for driver in &summary.drivers {
        writeln!(out, "driver_{}_position=({})", driver.id, driver.position)?;
    }
    writeln!(out, "duplicate_orders={}", summary.duplicate_claim)?;
    if let Some(claimed) = &summary.claimed_orders {
        writeln!(out, "claimed_orders={}", claimed.len())?;
    }
    writeln!(
        out,
        "elapsed_ms={:.2} cpu_user_s={} cpu_sys_s={}",
        summary.elapsed.as_secs_f64() * 1000.0,
        format_cpu(summary.cpu_user_s),
        format_cpu(summary.cpu_sys_s)
    )?;
    out.flush()
}
