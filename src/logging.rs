use std::io::Write;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use env_logger::{Builder, Env};

/// Install the process logger. `RUST_LOG` overrides the default filter,
/// which is chattier in debug builds.
pub fn init() {
    let default_filter = if cfg!(debug_assertions) { "info" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            let current = thread::current();
            let thread_name = current.name().unwrap_or("unnamed");
            writeln!(
                buf,
                "[{ts}ms][{thread_name}] {} {}",
                record.level(),
                record.args()
            )
        })
        .init();
}
