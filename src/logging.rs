//! Tracing initialization.
//!
//! Diagnostics go to stderr so they never mix with the report on stdout.
//! The level comes from the number of `-v` flags; `RUST_LOG`, when set,
//! takes precedence.

use chrono::Local;
use std::fmt as stdfmt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;

impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

/// Maps the `-v` count to a level: none is warn, then info, debug, trace.
#[inline]
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init_tracing(verbosity: u8) {
    let layer = tsfmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalHumanTime)
        .with_level(true)
        .with_target(verbosity >= 2)
        .compact();

    let _ = registry()
        .with(env_filter(level_for_verbosity(verbosity)))
        .with(layer)
        .try_init();
}
