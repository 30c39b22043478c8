//! Logging utilities for the Meetsync application.
//!
//! Provides a standardized approach to logging across all crates: one
//! function initializes the tracing subscriber, and everything else uses the
//! `tracing` macros directly.

use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// This function should be called at the start of the application to set up
/// logging. Log messages carry timestamps, levels, targets, and file/line
/// information.
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("meetsync={}", level).parse().unwrap());

    // try_init so a second call (tests) is a no-op rather than a panic
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}
