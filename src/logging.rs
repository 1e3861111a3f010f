use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Start the stderr logger. `RUST_LOG` wins over `default_spec`.
///
/// Keep the returned handle alive for as long as logging is wanted.
pub fn init(default_spec: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(default_spec)?
        .log_to_stderr()
        .format(flexi_logger::colored_default_format)
        .start()
}

/// Default log level spec for the binaries' `--quiet` switch.
pub fn default_spec(quiet: bool) -> &'static str {
    if quiet {
        "warn"
    } else {
        "info"
    }
}
