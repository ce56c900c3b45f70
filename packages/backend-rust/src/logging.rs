use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "snapvoca.log";
const DEFAULT_LOG_DIR: &str = "./logs";

/// Keeps the non-blocking file writer alive; dropping it flushes pending lines.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    /// Directory for the daily rolling file, when file logging is on.
    pub file_dir: Option<PathBuf>,
}

impl LogSettings {
    /// `ENABLE_FILE_LOGS` switches the file layer on; `LOG_DIR` moves it.
    pub fn from_env(filter: &str) -> Self {
        let enabled = crate::config::env_bool("ENABLE_FILE_LOGS").unwrap_or(false);
        let dir = std::env::var("LOG_DIR").ok();
        Self::new(filter, enabled, dir)
    }

    fn new(filter: &str, file_logs: bool, dir: Option<String>) -> Self {
        let file_dir = file_logs.then(|| {
            dir.filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
        });
        Self {
            filter: filter.to_string(),
            file_dir,
        }
    }
}

/// Opens the daily rolling log file under `dir`, creating the directory.
fn file_writer(dir: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .map_err(std::io::Error::other)?;
    Ok(tracing_appender::non_blocking(appender))
}

pub fn init_tracing(settings: &LogSettings) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    let file = settings.file_dir.as_deref().and_then(|dir| match file_writer(dir) {
        Ok(writer) => Some((dir, writer)),
        Err(err) => {
            eprintln!("failed to open log directory {}: {err}", dir.display());
            None
        }
    });

    let Some((dir, (writer, guard))) = file else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .init();
        return None;
    };

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    tracing::info!(log_dir = %dir.display(), "file logging enabled");
    Some(FileLogGuard { _guard: guard })
}
