//! Logging for the remote-pad controller.
//!
//! Colored stdout plus a plain log file, installed once per process.

use crate::error::RemotePadError;

use std::fs::create_dir_all;
use std::io::stdout;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "remote-pad.log";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Install the stdout and file loggers, creating `log_dir` if needed.
///
/// Safe to call more than once: later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be created, or if
/// another logger was already installed by someone else.
pub fn initialize(log_dir: &Path) -> Result<(), RemotePadError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir);
        if result.is_ok() {
            info!("Logger initialized with level {LOG_LEVEL:?}");
        }
    });

    result
}

fn initialize_internal(log_dir: &Path) -> Result<(), RemotePadError> {
    build_dispatch(log_dir)?
        .apply()
        .map_err(|e| RemotePadError::remote_pad(format!("Failed to initialize logger: {e}")))
}

/// Build the dual dispatch without installing it.
pub fn build_dispatch(log_dir: &Path) -> Result<Dispatch, RemotePadError> {
    create_dir_all(log_dir).map_err(|e| {
        RemotePadError::remote_pad(format!(
            "Failed to create log directory {}: {e}",
            log_dir.display()
        ))
    })?;

    let log_file = fern::log_file(log_dir.join(LOG_FILE_NAME))
        .map_err(|e| RemotePadError::remote_pad(format!("Failed to create log file: {e}")))?;

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{source}]",
                date = format_rfc3339(SystemTime::now()),
                level = colors.color(record.level()),
                source = source_of(record),
            ))
        })
        .chain(stdout());

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{source}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                source = source_of(record),
            ))
        })
        .chain(log_file);

    Ok(Dispatch::new()
        .level(LOG_LEVEL)
        // tungstenite logs every frame at trace/debug
        .level_for("tungstenite", LevelFilter::Info)
        .level_for("tokio_tungstenite", LevelFilter::Info)
        .chain(stdout_dispatch)
        .chain(file_dispatch))
}

fn source_of(record: &Record) -> String {
    format!(
        "{}:{}",
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0)
    )
}
