//! Logging setup
//!
//! Compact `LEVEL message key=value` lines, no timestamps, no module paths.
//!
//! ```rust,no_run
//! use logiclens::logging::{self, LogLevel, LogTarget};
//!
//! logging::init(LogLevel::Info, LogTarget::Stderr).unwrap();
//! tracing::info!("ready");
//! ```

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Level for a `-v` count: warn, info, debug, trace
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Append to a file (the TUI owns the terminal)
    File(PathBuf),
    Off,
}

/// Install the global subscriber
///
/// Only fails when the log file cannot be opened. A second call keeps the
/// subscriber installed by the first.
pub fn init(level: LogLevel, target: LogTarget) -> io::Result<()> {
    let filter = LevelFilter::from_level(level.into());

    let layer = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => tracing_subscriber::fmt::layer()
            .without_time()
            .with_target(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogTarget::File(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false)
                .with_ansi(false)
                .compact()
                .with_writer(Mutex::new(file))
                .with_filter(filter)
                .boxed()
        }
    };

    // Already installed (tests, repeated init) is fine
    let _ = Registry::default().with(layer).try_init();
    Ok(())
}
