//! Logger setup over `simplelog`.

use std::io::Write;

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::config::EvalConfig;
use crate::error::Result;

/// Install a terminal logger at the configured level, plus a plain writer
/// (e.g. a log file opened by the caller) when one is given. Fails with
/// `EvalError::Logger` if a global logger is already set.
pub fn init_logging<W>(config: &EvalConfig, sink: Option<W>) -> Result<()>
where
    W: Write + Send + 'static,
{
    let level = config.level_filter()?;
    let log_config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_time_format_rfc3339()
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        log_config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(sink) = sink {
        loggers.push(WriteLogger::new(level, log_config, sink));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}
