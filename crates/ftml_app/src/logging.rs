//! Logger setup for the `ftml` binary.
//!
//! Log lines go to stderr so stdout carries only the portal answers; a copy
//! goes to `--log-file` when given.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub fn initialize(level: LevelFilter, log_file: Option<&Path>) -> anyhow::Result<()> {
    let config = ftml_only_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        let file =
            File::create(path).with_context(|| format!("cannot create log file {path:?}"))?;
        loggers.push(WriteLogger::new(level, config, file));
    }

    // Already initialized is fine.
    let _ = CombinedLogger::init(loggers);
    Ok(())
}

/// Drops records from the HTTP and parser stacks.
fn ftml_only_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str("ftml")
        .build()
}
