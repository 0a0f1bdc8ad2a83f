//! provides logging helpers

use {
    crate::{config::Config, error::Error},
    tracing_appender::{
        non_blocking::WorkerGuard,
        rolling::{RollingFileAppender, Rotation},
    },
    tracing_subscriber::{
        filter::{self, EnvFilter},
        fmt::layer,
        prelude::*,
        registry,
    },
};

const LOG_FILE: &str = "ticks.log";

/// initiate the global tracing subscriber.
///
/// events are written to a file in [`Config::log_dir`], filtered by `RUST_LOG`. without a log
/// directory no subscriber is installed, and events are dropped.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>, Error> {
    let Some(dir) = &config.log_dir else {
        return Ok(None);
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    let fmt_layer = layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(env_filter);

    registry().with(fmt_layer).init();
    Ok(Some(guard))
}
