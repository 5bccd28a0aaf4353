use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

use crate::cmd::Command;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Subscriber settings resolved for one invocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Connection threads are named `trpc-conn-N`; only `serve` has them.
    pub thread_names: bool,
}

impl LogSettings {
    /// `serve` runs until interrupted, so it logs lifecycle events at
    /// `info` by default. One-shot commands stay quiet unless something
    /// goes wrong. An explicit `level` wins either way.
    pub fn for_command(command: &Command, format: LogFormat, level: Option<LogLevel>) -> Self {
        let (default_level, thread_names) = match command {
            Command::Serve(_) => (LogLevel::Info, true),
            Command::Call(_) | Command::Version(_) => (LogLevel::Warn, false),
        };
        Self {
            format,
            level: level.unwrap_or(default_level),
            thread_names,
        }
    }
}

/// Install the stderr subscriber. Stdout is reserved for command output.
pub fn init_logging(settings: LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(settings.level))
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(settings.thread_names);

    let _ = match settings.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
