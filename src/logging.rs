use crate::error::{ExplorerError, Result};
use chrono::Local;
use env_logger::{Builder, Env};
use log::{self, LevelFilter};
use std::io::Write;
use yansi::Paint;

/// Initializes logging with `log_level` as the default filter
///
/// `RUST_LOG` overrides the level. Unknown levels fall back to info.
/// Calling this twice returns an error.
pub fn init(log_level: &str) -> Result<()> {
    let default_level = parse_log_level(log_level).to_string();
    let env = Env::default()
        .filter_or("RUST_LOG", default_level)
        .write_style_or("RUST_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}", format_log(record)))
        .try_init()
        .map_err(|e| ExplorerError::Config(format!("Logger already initialized: {}", e)))
}

/// Formats a log record as `[timestamp] LEVEL [target] message`
pub fn format_log(record: &log::Record) -> String {
    let level = match record.level() {
        log::Level::Error => Paint::red("ERROR").bold(),
        log::Level::Warn => Paint::yellow("WARN ").bold(),
        log::Level::Info => Paint::cyan("INFO ").bold(),
        log::Level::Debug => Paint::blue("DEBUG").bold(),
        log::Level::Trace => Paint::new("TRACE"),
    };

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let target = if !record.target().is_empty() {
        record.target()
    } else {
        record.module_path().unwrap_or("unknown")
    };

    format!("[{}] {} [{}] {}", timestamp, level, target, record.args())
}

/// Parses a log level string, defaulting to `Info` for unknown values
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
