use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "gestura.log";

/// Keeps the non-blocking file writer flushing until dropped.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Console output goes to stderr; stdout is left alone. With `log_dir` set,
/// a daily-rolling plain-text copy is written there as well.
pub fn init_tracing(level: &str, log_dir: Option<&Path>) -> Option<FileLogGuard> {
    let console = fmt::layer().with_target(true).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry()
        .with(filter_for(level))
        .with(console);

    let Some(dir) = log_dir else {
        registry.init();
        return None;
    };

    if let Err(err) = std::fs::create_dir_all(dir) {
        registry.init();
        tracing::warn!(dir = %dir.display(), error = %err, "file logging disabled");
        return None;
    }

    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Some(FileLogGuard { _guard: guard })
}
