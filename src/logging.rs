//! Logging configuration for dual output (console + file) with rotation
//!
//! Console output is for the developer watching threshold warnings live; the
//! rotating JSON files keep collector diagnostics for later inspection.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::common::constants::LOG_FILE_PREFIX;

const CONSOLE_TIME_FORMAT: &str = "%H:%M:%S%.3f";
const FILE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory to store log files
    pub log_dir: String,
    /// Log level filter (e.g., "info", "perf_telemetry=debug"); RUST_LOG wins when set
    pub level_filter: String,
    pub rotation: LogRotation,
    /// Whether to include timestamps in console output
    pub console_timestamps: bool,
    /// Whether to use JSON format for file logs
    pub file_json_format: bool,
}

/// Log rotation configuration
#[derive(Debug, Clone)]
pub enum LogRotation {
    Daily,
    Hourly,
    /// Requested size limit in MB. Rolls daily, the appender has no size trigger.
    SizeBased(u64),
}

impl LogRotation {
    fn as_rotation(&self) -> Rotation {
        match self {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily | LogRotation::SizeBased(_) => Rotation::DAILY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            level_filter: "info,perf_telemetry=info".to_string(),
            rotation: LogRotation::Daily,
            console_timestamps: true,
            file_json_format: true,
        }
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize console + rotating file logging.
///
/// The console goes to stderr so stdout stays free for reports. Files are
/// `<log_dir>/perf_telemetry.log.<date>`. Keep the returned guard alive for
/// the life of the process or buffered file lines are lost.
pub fn init_dual_logging(config: &LoggingConfig) -> Result<WorkerGuard, Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(&config.log_dir)?;

    let appender = RollingFileAppender::new(
        config.rotation.as_rotation(),
        &config.log_dir,
        format!("{}.log", LOG_FILE_PREFIX),
    );
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(ChronoUtc::new(if config.console_timestamps {
            CONSOLE_TIME_FORMAT.to_string()
        } else {
            String::new()
        }))
        .with_filter(env_filter(&config.level_filter));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_thread_names(true)
        .with_timer(ChronoUtc::new(FILE_TIME_FORMAT.to_string()));
    let file_layer = if config.file_json_format {
        file_layer.json().with_filter(env_filter(&config.level_filter)).boxed()
    } else {
        file_layer.with_filter(env_filter(&config.level_filter)).boxed()
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        log_dir = %config.log_dir,
        rotation = ?config.rotation,
        json_format = config.file_json_format,
        "📁 Dual logging initialized - console + rotating files"
    );

    Ok(guard)
}

/// Console-only logging for tests and one-shot tools
pub fn init_console_logging(level_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(level_filter))
        .try_init()?;
    Ok(())
}

/// Collector log files in `log_dir`, sorted by name (oldest rotation first)
pub fn get_current_log_files(log_dir: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(log_dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_collector_log(path))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

/// Matches `perf_telemetry.log` and its rotated `perf_telemetry.log.<date>` siblings
fn is_collector_log(path: &Path) -> bool {
    let prefix = format!("{}.log", LOG_FILE_PREFIX);
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name == prefix || name.starts_with(&format!("{}.", prefix)))
        .unwrap_or(false)
}

/// Clean up old log files (keep only recent ones)
pub fn cleanup_old_logs(log_dir: &str, keep_days: u32) -> Result<usize, std::io::Error> {
    let retention = std::time::Duration::from_secs(keep_days as u64 * 24 * 3600);
    let Some(cutoff_time) = std::time::SystemTime::now().checked_sub(retention) else {
        tracing::debug!("Log retention of {} days reaches before the epoch, nothing to clean", keep_days);
        return Ok(0);
    };

    let mut removed_count = 0;
    for path in get_current_log_files(log_dir) {
        let expired = path
            .metadata()
            .and_then(|metadata| metadata.modified())
            .map(|modified| modified < cutoff_time)
            .unwrap_or(false);
        if expired && std::fs::remove_file(&path).is_ok() {
            removed_count += 1;
            tracing::debug!("🗑️ Removed old log file: {:?}", path);
        }
    }

    if removed_count > 0 {
        tracing::info!("🧹 Cleaned up {} old log files (older than {} days)", removed_count, keep_days);
    }

    Ok(removed_count)
}

/// Log basic environment information for debugging
pub fn log_system_info() {
    tracing::info!(
        package_version = env!("CARGO_PKG_VERSION"),
        target_arch = std::env::consts::ARCH,
        target_os = std::env::consts::OS,
        "📊 Environment information logged"
    );
}
