//! Terminal logging for the command-line adapter.

use anyhow::{Context, Result};
use log::LevelFilter;

/// Routes `log` records to standard error at the requested verbosity.
///
/// Standard output stays reserved for the run summary.
pub(crate) fn setup_logging(level: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("logger already installed")
}
