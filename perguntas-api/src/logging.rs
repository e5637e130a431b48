use std::fs::OpenOptions;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Flushes the background log writers when dropped; hold it until shutdown
#[must_use]
pub struct LogGuards {
    guards: Vec<WorkerGuard>,
}

impl LogGuards {
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

/// Stdout and the optional file both sit behind lossy non-blocking writers:
/// a stalled sink drops lines instead of stalling the request that logs them.
fn writers(config: &LoggingConfig) -> (NonBlocking, Option<NonBlocking>, LogGuards) {
    let (stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut guards = vec![stdout_guard];

    let file = config.file.as_ref().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                guards.push(guard);
                Some(writer)
            }
            Err(e) => {
                eprintln!(
                    "Failed to open log file {}: {}; logging to stdout only",
                    path.display(),
                    e
                );
                None
            }
        }
    });

    (stdout, file, LogGuards { guards })
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig) -> LogGuards {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (stdout, file, guards) = writers(config);

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(stdout))
        .with(file.map(|writer| fmt::layer().with_writer(writer).with_ansi(false)))
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging already initialised: {}", e);
    }

    guards
}
