//! Command line parsing into a run configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{SetupError, SetupResult};

// Real-time defaults: one tick per second, 250 ms per grid unit and idle record.
const DEFAULT_TICK_MS: u64 = 1000;
const DEFAULT_TRAVEL_UNIT_MS: u64 = 250;
const DEFAULT_IDLE_MS: u64 = 250;

/// Wall-clock lengths of the simulated delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Pause between clock advances.
    pub tick: Duration,
    /// Travel time per unit of Manhattan distance.
    pub travel_unit: Duration,
    /// Kitchen delay for an idle record.
    pub idle_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            travel_unit: Duration::from_millis(DEFAULT_TRAVEL_UNIT_MS),
            idle_delay: Duration::from_millis(DEFAULT_IDLE_MS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub input: PathBuf,
    /// Number of ticks before the run stops.
    pub run_limit: u64,
    pub timing: Timing,
    pub validate: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(RunConfig),
    Help,
}

fn parse_number(what: &'static str, value: Option<String>) -> SetupResult<u64> {
    let value = value.ok_or_else(|| SetupError::Usage(format!("missing value for {what}")))?;
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| SetupError::InvalidNumber { what, value })
}

/// Parse arguments (without the program name).
pub fn parse_args<I>(args: I) -> SetupResult<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut positional = Vec::new();
    let mut timing = Timing::default();
    let mut validate = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" | "help" => return Ok(Command::Help),
            "validate" => validate = true,
            "--tick-ms" => {
                timing.tick = Duration::from_millis(parse_number("--tick-ms", args.next())?);
            }
            "--travel-unit-ms" => {
                timing.travel_unit =
                    Duration::from_millis(parse_number("--travel-unit-ms", args.next())?);
            }
            "--idle-ms" => {
                timing.idle_delay = Duration::from_millis(parse_number("--idle-ms", args.next())?);
            }
            flag if flag.starts_with("--") => {
                return Err(SetupError::Usage(format!("unknown flag: {flag}")));
            }
            _ => positional.push(arg),
        }
    }

    if positional.len() != 2 {
        return Err(SetupError::Usage(format!(
            "expected 2 arguments (input file, run limit), got {}",
            positional.len()
        )));
    }
    let run_limit = parse_number("run limit", positional.pop())?;
    let input = PathBuf::from(positional.pop().unwrap_or_default());

    Ok(Command::Run(RunConfig {
        input,
        run_limit,
        timing,
        validate,
    }))
}

pub fn print_usage(program: &str) {
    eprintln!("Delivery dispatch simulation");
    eprintln!("Usage:");
    eprintln!("  {program} <input-file> <run-limit-seconds> [--tick-ms N] [--travel-unit-ms N] [--idle-ms N] [validate]");
    eprintln!("  {program} --help");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!(
        "  tick_ms={DEFAULT_TICK_MS} travel_unit_ms={DEFAULT_TRAVEL_UNIT_MS} idle_ms={DEFAULT_IDLE_MS}"
    );
    eprintln!("Flags:");
    eprintln!("  validate  detect orders claimed by more than one driver");
}
