//! Logger bootstrap.
//!
//! Logs go to stderr so stdout stays free for replay output. Messages follow the
//! `event=<name> module=<module> status=<status> key=value` layout. Passwords and session
//! tokens are never logged.

use anyhow::Context;
use flexi_logger::{Logger, LoggerHandle};
use log::info;

/// Start logging at `level` (a flexi_logger spec). `RUST_LOG` takes precedence when set.
///
/// The returned handle must be kept alive for the lifetime of the process.
pub fn init_logging(level: &str) -> anyhow::Result<LoggerHandle> {
    let handle = Logger::try_with_env_or_str(level)
        .with_context(|| format!("invalid log level `{level}`"))?
        .log_to_stderr()
        .format(flexi_logger::detailed_format)
        .start()
        .context("failed to start logger")?;

    info!(
        "event=app_start module=core status=ok platform={} version={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );
    Ok(handle)
}
