use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_DIR: &str = "./logs";

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Where console output goes. The report binary writes its report to
/// stdout, so its logs go to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub console: Console,
    pub file_prefix: String,
    /// Directory for the daily rolling file; `None` keeps logs on the console only.
    pub file_dir: Option<PathBuf>,
}

impl LogSettings {
    /// Reads `ENABLE_FILE_LOGS` and `LOG_DIR` from the environment.
    pub fn from_env(level: &str, file_prefix: &str, console: Console) -> Self {
        let enabled = std::env::var("ENABLE_FILE_LOGS").ok();
        let dir = std::env::var("LOG_DIR").ok();
        Self::resolve(level, file_prefix, console, enabled.as_deref(), dir.as_deref())
    }

    fn resolve(
        level: &str,
        file_prefix: &str,
        console: Console,
        enabled: Option<&str>,
        dir: Option<&str>,
    ) -> Self {
        let file_dir = matches!(enabled, Some("true" | "1"))
            .then(|| PathBuf::from(dir.filter(|d| !d.is_empty()).unwrap_or(DEFAULT_LOG_DIR)));
        Self {
            level: level.to_string(),
            console,
            file_prefix: file_prefix.to_string(),
            file_dir,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Console logging filtered by the configured level, plus a daily rolling
/// file when a directory is set. Keep the returned guard alive for the life
/// of the process or buffered file output is lost.
pub fn init_tracing(settings: &LogSettings) -> Option<FileLogGuard> {
    let console_writer = match settings.console {
        Console::Stdout => BoxMakeWriter::new(std::io::stdout),
        Console::Stderr => BoxMakeWriter::new(std::io::stderr),
    };
    let console_layer = fmt::layer().with_writer(console_writer).with_target(true);

    if let Some(dir) = &settings.file_dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let file_appender =
                    RollingFileAppender::new(Rotation::DAILY, dir, &settings.file_prefix);
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_target(true);

                tracing_subscriber::registry()
                    .with(settings.filter())
                    .with(console_layer)
                    .with(file_layer)
                    .init();

                return Some(FileLogGuard { _guard: guard });
            }
            Err(err) => {
                tracing_subscriber::registry()
                    .with(settings.filter())
                    .with(console_layer)
                    .init();
                tracing::warn!(dir = %dir.display(), error = %err, "log directory unavailable, file logging disabled");
                return None;
            }
        }
    }

    tracing_subscriber::registry()
        .with(settings.filter())
        .with(console_layer)
        .init();

    None
}
