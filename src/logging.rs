//! Logger bootstrap for the command-line entry point
//!
//! The engine logs through the `log` facade (mutations at `debug`, lossy
//! recoveries at `warn`); this wires those records to stderr. `RUST_LOG`
//! overrides the verbosity flags when set.

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Start logging once; keep the handle alive for the process lifetime
pub fn init(verbosity: u64) -> Result<LoggerHandle, FlexiLoggerError> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    Logger::try_with_env_or_str(level)?.log_to_stderr().start()
}
