mod config;
mod coordinator;
mod dispatch;
mod driver;
mod error;
mod input;
mod logging;
mod report;
mod restaurant;
mod tables;
mod types;

use std::io;

use log::error;

use crate::config::Command;
use crate::error::SetupError;

fn exit_with_error(program: &str, err: &SetupError) -> ! {
    error!("setup failed: {err}");
    eprintln!("ERROR: {err}");
    if err.exit_code() == 2 {
        config::print_usage(program);
    }
    std::process::exit(err.exit_code());
}

fn main() {
    logging::init();

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "dispatch_sim".to_string());
    let config = match config::parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            config::print_usage(&program);
            return;
        }
        Err(err) => exit_with_error(&program, &err),
    };

    let (setup, records) = match input::open(&config.input) {
        Ok(parsed) => parsed,
        Err(err) => exit_with_error(&program, &err),
    };
    if setup.driver_count == 0 {
        log::warn!("no drivers configured; orders will wait until the run limit");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = report::write_tables(&mut out, &setup.tables) {
        log::warn!("failed to write tables: {err}");
    }

    let summary = coordinator::run(setup, records, &config, &mut out);

    if let Err(err) = report::write_run_summary(&mut out, &summary) {
        log::warn!("failed to write run summary: {err}");
    }
}
