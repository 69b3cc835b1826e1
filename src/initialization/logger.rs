//! Logger initialization.

use std::io::Write;

use colored::*;
use log::{Level, LevelFilter};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Initializes the global logger.
///
/// `RUST_LOG` is read first and `level` then overrides it for this crate and
/// as the default, so `RUST_LOG=reqwest=debug` still works for dependencies
/// while `--log-level` controls our own output. HTTP stack modules are capped
/// at Info.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already set.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=hyper=debug geoip_csv watch --log-level debug
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("reqwest", level.min(LevelFilter::Info));
    builder.filter_module("hyper", level.min(LevelFilter::Info));
    builder.filter_module("hyper_util", level.min(LevelFilter::Info));
    builder.filter_module("geoip_csv", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(
                        chrono::Utc::now().timestamp_millis(),
                        record.level(),
                        record.target(),
                        &record.args().to_string()
                    )
                )
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(|buf, record| {
                let level = record.level();
                writeln!(
                    buf,
                    "{} {} {} [{}] {}",
                    chrono::Local::now().format("%H:%M:%S"),
                    level_marker(level),
                    record.target().cyan(),
                    colored_level(level),
                    record.args()
                )
            });
        }
    }

    builder.try_init().map_err(InitializationError::from)?;
    Ok(())
}

fn json_line(ts_millis: i64, level: Level, target: &str, message: &str) -> String {
    let escape = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| "\"\"".into());
    format!(
        "{{\"ts\":{},\"level\":\"{}\",\"target\":{},\"msg\":{}}}",
        ts_millis,
        level,
        escape(target),
        escape(message)
    )
}

fn level_marker(level: Level) -> &'static str {
    match level {
        Level::Error => "❌",
        Level::Warn => "⚠️",
        Level::Info => "📍",
        Level::Debug => "🔍",
        Level::Trace => "🔬",
    }
}

fn colored_level(level: Level) -> ColoredString {
    let text = level.to_string();
    match level {
        Level::Error => text.red(),
        Level::Warn => text.yellow(),
        Level::Info => text.green(),
        Level::Debug => text.blue(),
        Level::Trace => text.purple(),
    }
}
