use std::io;
use std::io::IsTerminal;

use tracing::Level;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use crate::config_loader::LoggingSettings;

fn env_filter(default_level: Level) -> EnvFilter {
    // Respects RUST_LOG, falls back to default_level
    EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy()
}

/// Human readable console layer writing to `writer`
///
/// Stdout is reserved for the JSON report, so the binary points this at stderr.
pub fn console_layer<S, W>(writer: W, ansi: bool) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer().with_writer(writer).with_target(false).with_ansi(ansi).compact()
}

fn stderr_layer<S>() -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    // Colour only when a person is watching
    console_layer(io::stderr, io::stderr().is_terminal())
}

/// Initialise tracing to stderr only
pub fn init_console(default_level: Level) {
    tracing_subscriber::registry().with(env_filter(default_level)).with(stderr_layer()).init();
}

/// Initialise tracing to stderr and an hourly rolling file in `log_dir`
///
/// The returned guard flushes the file writer on drop and must be kept alive for
/// the life of the program.
pub fn init_with_file(app_name: &str, log_dir: &str, default_level: Level) -> WorkerGuard {
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::hourly(log_dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(non_blocking).with_target(true).with_line_number(true).with_ansi(false).compact();

    tracing_subscriber::registry().with(env_filter(default_level)).with(file_layer).with(stderr_layer()).init();

    guard
}

/// Initialise tracing from logging settings
pub fn init(app_name: &str, settings: &LoggingSettings) -> Option<WorkerGuard> {
    match settings.log_dir.as_deref() {
        Some(dir) => Some(init_with_file(app_name, dir, settings.level())),
        None => {
            init_console(settings.level());
            None
        }
    }
}
