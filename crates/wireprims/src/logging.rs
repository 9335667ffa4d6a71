//! Stderr diagnostics for the CLI. Decoded frames go to stdout, so logs never
//! mix with `--format json` output.

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

/// `json` emits one object per event, matching the frame lines on stdout.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    /// Rejected frames and dropped connections.
    Warn,
    /// Listener address, peer connects and disconnects.
    Info,
    /// Preface acceptance and where a peer closed relative to frame boundaries.
    Debug,
    /// Every decoded header and frame.
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Install the stderr subscriber. Frame-level `trace!` events from the
/// decoder only show up with `--log-level trace`.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_trace_needs_trace_level() {
        assert!(LogLevel::Trace.as_filter() >= LevelFilter::TRACE);
        assert!(LogLevel::Debug.as_filter() < LevelFilter::TRACE);
    }

    #[test]
    fn levels_parse_from_cli_names() {
        let level = LogLevel::from_str("warn", true).unwrap();
        assert_eq!(level.as_filter(), LevelFilter::WARN);
        assert!(LogFormat::from_str("json", true).is_ok());
        assert!(LogLevel::from_str("verbose", true).is_err());
    }
}
