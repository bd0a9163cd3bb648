#![deny(missing_docs)]
//! Shared logging utilities for the relay workspace.
//!
//! This crate provides the `relay_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every message is
//! prefixed with the page-load counter of the current thread so that a log
//! of a long run can be read one page load at a time.

use std::cell::Cell;

thread_local! {
    /// Thread-local page-load counter of the running session.
    static PAGE_LOAD: Cell<u64> = const { Cell::new(0) };
}

/// Sets the page-load counter for the current thread.
/// The runner calls this once for every page it handles.
pub fn set_page_load(count: u64) {
    PAGE_LOAD.with(|v| v.set(count));
}

/// Retrieves the page-load counter for the current thread.
/// Returns 0 outside of a run.
pub fn page_load() -> u64 {
    PAGE_LOAD.with(|v| v.get())
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! relay_trace {
    ($($arg:tt)*) => {{
        log::trace!("[load {}] {}", $crate::page_load(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! relay_debug {
    ($($arg:tt)*) => {{
        log::debug!("[load {}] {}", $crate::page_load(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! relay_info {
    ($($arg:tt)*) => {{
        log::info!("[load {}] {}", $crate::page_load(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! relay_warn {
    ($($arg:tt)*) => {{
        log::warn!("[load {}] {}", $crate::page_load(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! relay_error {
    ($($arg:tt)*) => {{
        log::error!("[load {}] {}", $crate::page_load(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already own the global logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
