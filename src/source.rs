//! host capabilities: counting cores, reading tick counters, probing for an accelerator, and
//! pacing the sampling loop.
//!
//! each capability is a trait with one adapter per platform, and a mock for tests.

use {
    crate::{
        error::{HostQueryError, SampleError},
        stat::{CoreCount, Percent, TickSnapshot},
    },
    std::{fmt, time::Duration},
};

pub use self::{cores::*, counters::*, gpu::*, pace::*, proc_stat::ProcStat};

#[cfg(target_os = "macos")]
pub use self::{iokit::IoKitProbe, mach::MachHost};

mod proc_stat;

#[cfg(target_os = "macos")]
mod iokit;
#[cfg(target_os = "macos")]
mod mach;

/// the tick source for this platform.
#[cfg(target_os = "macos")]
pub type HostTicks = MachHost;
#[cfg(not(target_os = "macos"))]
pub type HostTicks = ProcStat;

/// the core enumerator for this platform.
///
/// on linux, cores are counted from the same table the ticks are read from, so the two always
/// agree.
#[cfg(target_os = "linux")]
pub type HostCores = ProcStat;
#[cfg(not(target_os = "linux"))]
pub type HostCores = LogicalCores;

/// the accelerator probe for this platform.
#[cfg(target_os = "macos")]
pub type HostGpu = IoKitProbe;
#[cfg(not(target_os = "macos"))]
pub type HostGpu = NoAccelerator;

mod cores {
    use super::*;

    /// discovers the number of logical cpu cores.
    pub trait CoreEnumerator {
        fn count(&self) -> Result<CoreCount, HostQueryError>;
    }

    /// cores as reported by the scheduler.
    #[derive(Default)]
    pub struct LogicalCores;

    impl CoreEnumerator for LogicalCores {
        fn count(&self) -> Result<CoreCount, HostQueryError> {
            CoreCount::new(num_cpus::get())
        }
    }

    /// a fixed core count.
    #[cfg(test)]
    pub struct MockCores(pub usize);

    #[cfg(test)]
    impl CoreEnumerator for MockCores {
        fn count(&self) -> Result<CoreCount, HostQueryError> {
            let Self(count) = *self;
            CoreCount::new(count)
        }
    }
}

/// abstracts over providers of tick counters.
mod counters {
    use super::*;
    #[cfg(test)]
    use std::{cell::RefCell, collections::VecDeque};

    /// a source of per-core cumulative tick counters.
    pub trait TickSource {
        /// returns a fresh snapshot of every core's counters.
        ///
        /// fails with [`SampleError::InconsistentCoreCount`] if the host no longer reports
        /// `cores` cores.
        fn sample(&self, cores: CoreCount) -> Result<TickSnapshot, SampleError>;
    }

    /// a mock tick source.
    #[derive(Default)]
    #[cfg(test)]
    pub struct MockTicks {
        samples: RefCell<VecDeque<Result<TickSnapshot, HostQueryError>>>,
    }

    // === impl MockTicks ===

    #[cfg(test)]
    impl MockTicks {
        pub fn new(samples: impl IntoIterator<Item = TickSnapshot>) -> Self {
            let samples = samples.into_iter().map(Ok).collect();
            Self {
                samples: RefCell::new(samples),
            }
        }

        pub fn push(&self, sample: Result<TickSnapshot, HostQueryError>) {
            self.samples.borrow_mut().push_back(sample);
        }
    }

    #[cfg(test)]
    impl TickSource for MockTicks {
        fn sample(&self, cores: CoreCount) -> Result<TickSnapshot, SampleError> {
            let Self { samples } = self;

            let snapshot = samples
                .borrow_mut()
                .pop_front()
                .expect("mock samples should not be empty")?;
            SampleError::check_cores(cores, snapshot.len())?;

            Ok(snapshot)
        }
    }
}

mod gpu {
    use super::*;

    /// the result of probing for an accelerator.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub enum GpuReading {
        /// the accelerator's utilization.
        Busy(Percent),
        /// no accelerator was found, or it reported no usable utilization metric.
        Unavailable,
    }

    /// looks for an accelerator and reads its utilization.
    pub trait GpuProbe {
        fn probe(&self) -> GpuReading;
    }

    /// a host with no accelerator registry.
    #[derive(Default)]
    pub struct NoAccelerator;

    impl GpuProbe for NoAccelerator {
        fn probe(&self) -> GpuReading {
            GpuReading::Unavailable
        }
    }

    /// a probe that always returns the same reading.
    #[cfg(test)]
    pub struct MockGpu(pub GpuReading);

    #[cfg(test)]
    impl GpuProbe for MockGpu {
        fn probe(&self) -> GpuReading {
            self.0
        }
    }

    // === impl GpuReading ===

    impl fmt::Display for GpuReading {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Busy(percent) => write!(f, "{percent}"),
                Self::Unavailable => f.write_str("unavailable"),
            }
        }
    }
}

/// the blocking point between frames.
mod pace {
    use super::*;
    #[cfg(test)]
    use crate::monitor::CancellationToken;

    pub trait Pacer {
        /// blocks until the next frame is due.
        fn wait(&mut self);
    }

    /// sleeps the thread for a fixed interval.
    pub struct Sleep {
        interval: Duration,
    }

    impl Sleep {
        pub fn new(interval: Duration) -> Self {
            Self { interval }
        }
    }

    impl Pacer for Sleep {
        fn wait(&mut self) {
            std::thread::sleep(self.interval);
        }
    }

    /// a pacer that never blocks, and cancels the loop after a number of waits.
    #[cfg(test)]
    pub struct MockPacer {
        pub waits: usize,
        budget: usize,
        token: CancellationToken,
    }

    #[cfg(test)]
    impl MockPacer {
        pub fn new(budget: usize, token: CancellationToken) -> Self {
            Self {
                waits: 0,
                budget,
                token,
            }
        }
    }

    #[cfg(test)]
    impl Pacer for MockPacer {
        fn wait(&mut self) {
            self.waits += 1;
            if self.waits >= self.budget {
                self.token.cancel();
            }
        }
    }
}
