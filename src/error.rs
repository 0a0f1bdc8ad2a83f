//! error types.
//!
//! failing to count the host's cores is fatal, and is reported through [`Error`]. once the
//! sampling loop has started, failures are reported as a [`SampleError`] and only cost a frame.

use {
    crate::stat::{CoreCount, EntryParseError},
    std::io,
    thiserror::Error,
    tracing_appender::rolling::InitError,
};

/// a fatal error, raised before the sampling loop starts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not determine the number of cpu cores: {0}")]
    CoreCount(#[source] HostQueryError),
    #[error("could not open the log file: {0}")]
    Logging(#[from] InitError),
}

/// the host could not answer a core-count or tick-counter query.
#[derive(Debug, Error)]
pub enum HostQueryError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed kernel statistics: {0}")]
    Entry(#[from] EntryParseError),
    #[error("{call} failed with kernel return code {code}")]
    Kernel { call: &'static str, code: i32 },
    #[error("the host reported zero cpu cores")]
    NoCores,
}

/// a tick sample could not be used for this frame.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("tick sample unavailable: {0}")]
    Unavailable(#[from] HostQueryError),
    #[error("expected {expected} cpu cores, host reported {found}")]
    InconsistentCoreCount { expected: CoreCount, found: usize },
}

// === impl SampleError ===

impl SampleError {
    /// checks that a snapshot of `found` cores matches the count fixed at startup.
    pub(crate) fn check_cores(expected: CoreCount, found: usize) -> Result<(), Self> {
        if expected.get() == found {
            Ok(())
        } else {
            Err(Self::InconsistentCoreCount { expected, found })
        }
    }
}
