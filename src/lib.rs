//! a compact per-core cpu utilization dashboard.

use {
    self::source::{CoreEnumerator, HostCores},
    std::io,
    tracing::info,
};

pub use self::{
    config::Config,
    error::{Error, HostQueryError, SampleError},
    monitor::{CancellationToken, Monitor},
    sentinel::{Measurement, Sentinel, Utilization},
    stat::{CoreCount, Percent, TickSnapshot, Ticks},
};

pub mod config;
pub mod error;
pub mod logging;
pub mod meter;
pub mod monitor;
pub mod sentinel;
/// host capabilities.
pub mod source;
/// tick counters, and the `/proc/stat` kernel statistics table.
pub mod stat;
pub mod window;

pub struct App {
    monitor: Monitor,
}

/// === impl App ===

impl App {
    /// initializes a new application.
    ///
    /// fails if the host cannot report its core count.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let cores = HostCores::default().count().map_err(Error::CoreCount)?;
        info!(%cores, "counted cpu cores");

        Ok(Self {
            monitor: Monitor::host(cores, config),
        })
    }

    /// runs the application until the process is interrupted.
    pub fn run(self) {
        let Self { mut monitor } = self;
        monitor.run(&mut io::stdout().lock(), &CancellationToken::default());
    }
}
