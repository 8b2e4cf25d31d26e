#![deny(missing_docs)]
//! Logging front door for the ftml crates.
//!
//! Library code logs through the `ftml_*` macros, which go to the `log`
//! facade re-exported here, so callers do not need their own `log`
//! dependency. The binary owns the backend; tests share
//! [`initialize_for_tests`].

use log::LevelFilter;

#[doc(hidden)]
pub use log as __log;

/// Trace-level message, e.g. skipped TOC anchors.
#[macro_export]
macro_rules! ftml_trace {
    ($($arg:tt)*) => {
        $crate::__log::trace!($($arg)*)
    };
}

/// Debug-level message.
#[macro_export]
macro_rules! ftml_debug {
    ($($arg:tt)*) => {
        $crate::__log::debug!($($arg)*)
    };
}

/// Info-level message, one per pipeline stage at most.
#[macro_export]
macro_rules! ftml_info {
    ($($arg:tt)*) => {
        $crate::__log::info!($($arg)*)
    };
}

/// Warn-level message.
#[macro_export]
macro_rules! ftml_warn {
    ($($arg:tt)*) => {
        $crate::__log::warn!($($arg)*)
    };
}

/// Error-level message.
#[macro_export]
macro_rules! ftml_error {
    ($($arg:tt)*) => {
        $crate::__log::error!($($arg)*)
    };
}

/// Level reached by raising `base` one step per `-v`, capped at `Trace`.
pub fn level_for_verbosity(base: LevelFilter, verbosity: u8) -> LevelFilter {
    LevelFilter::iter()
        .skip_while(|level| *level != base)
        .nth(usize::from(verbosity))
        .unwrap_or(LevelFilter::Trace)
}

/// Installs a terminal logger once per test binary; later calls are no-ops.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
}
