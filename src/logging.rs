//! Tracing initialization
//!
//! One subscriber for the whole process. The integration error
//! channels (`integration::deposit`, `integration::provider`) are
//! plain tracing targets, so operators can split or silence them via
//! the env-filter, e.g. `RUST_LOG=info,integration::deposit=debug`.

use crate::config::{Config, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

fn make_writer(logging: &LoggingConfig) -> Box<dyn std::io::Write + Send + Sync> {
    let Some(log_file) = logging.file.as_deref().filter(|f| !f.is_empty()) else {
        return Box::new(std::io::stdout());
    };

    let path = std::path::Path::new(log_file);

    if logging.enable_rotation {
        let dir = path.parent().unwrap_or(std::path::Path::new("."));
        let prefix = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("afftrack.log")
            .trim_end_matches(".log");

        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(prefix)
            .filename_suffix("log")
            .max_log_files(logging.max_backups as usize)
            .build(dir)
            .expect("Failed to create rolling log appender");
        return Box::new(appender);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .expect("Failed to open log file");
    Box::new(file)
}

/// Initialize the global tracing subscriber.
///
/// The returned guard must stay alive for the whole program, or the
/// non-blocking writer drops buffered lines on shutdown.
pub fn init_logging(config: &Config) -> WorkerGuard {
    let to_console = config.logging.file.as_deref().is_none_or(|f| f.is_empty());

    let (writer, guard) = tracing_appender::non_blocking(make_writer(&config.logging));
    let filter = tracing_subscriber::EnvFilter::new(config.logging.level.clone());

    let builder = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(to_console);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    guard
}
