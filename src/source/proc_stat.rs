use {
    super::{CoreEnumerator, TickSource},
    crate::{
        error::{HostQueryError, SampleError},
        stat::{CoreCount, TickSnapshot},
    },
    std::{fs::File, io::BufReader},
};

/// ticks backed by `/proc/stat`.
#[derive(Default)]
pub struct ProcStat;

// === impl ProcStat ===

impl ProcStat {
    const STAT: &str = "/proc/stat";

    fn read(&self) -> Result<TickSnapshot, HostQueryError> {
        let stats = File::open(Self::STAT).map(BufReader::new)?;
        TickSnapshot::from_proc_stat(stats)
    }
}

impl CoreEnumerator for ProcStat {
    fn count(&self) -> Result<CoreCount, HostQueryError> {
        self.read().map(|snapshot| snapshot.len()).and_then(CoreCount::new)
    }
}

impl TickSource for ProcStat {
    fn sample(&self, cores: CoreCount) -> Result<TickSnapshot, SampleError> {
        let snapshot = self.read()?;
        SampleError::check_cores(cores, snapshot.len())?;
        Ok(snapshot)
    }
}
