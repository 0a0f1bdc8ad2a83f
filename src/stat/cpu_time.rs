use super::*;

/// one row of cpu times, as printed by `/proc/stat`.
///
/// kernels older than 2.6.33 print fewer columns; missing trailing columns read as zero.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CpuTime {
    /// time spent in user mode.
    user: u64,
    /// time spent in user mode with low priority (nice).
    nice: u64,
    /// time spent in system mode.
    system: u64,
    /// time spent in the idle task.
    ///
    /// this value should be USER_HZ times the second entry in the /proc/uptime pseudo-file.
    idle: u64,
    /// time waiting for i/o to complete.
    ///
    /// this value is not reliable, and may decrease in certain conditions.
    iowait: u64,
    /// time servicing interrupts.
    irq: u64,
    /// time servicing softirqs.
    softirq: u64,
    /// stolen time, which is the time spent in other operating systems when running in a
    /// virtualized environment.
    steal: u64,
    /// time spent running a virtual cpu for guest operating systems under the control of the linux
    /// kernel. this is already included in `user`.
    guest: u64,
    /// time spent running a niced guest. this is already included in `nice`.
    guest_nice: u64,
}

// === impl CpuTime ===

impl CpuTime {
    /// user, nice, system, and idle are present on every kernel.
    pub const MIN_COLUMNS: usize = 4;
    pub const MAX_COLUMNS: usize = 10;
}

impl TryFrom<Vec<u64>> for CpuTime {
    type Error = EntryParseError;
    fn try_from(mut times: Vec<u64>) -> Result<Self, Self::Error> {
        let columns = times.len();
        if !(Self::MIN_COLUMNS..=Self::MAX_COLUMNS).contains(&columns) {
            return Err(EntryParseError::CpuTime { columns });
        }

        times.resize(Self::MAX_COLUMNS, 0);
        <_ as TryInto<[_; 10]>>::try_into(times)
            .map(Self::from)
            .map_err(|_| EntryParseError::CpuTime { columns })
    }
}

impl From<[u64; 10]> for CpuTime {
    fn from(
        [
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        ]: [u64; 10],
    ) -> Self {
        Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        }
    }
}

/// folds the kernel's ten columns into the four tick buckets.
///
/// interrupt servicing counts as system time, and i/o wait counts as idle time. steal time is
/// spent outside this machine, so it is left out of both.
impl From<CpuTime> for Ticks {
    fn from(
        CpuTime {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal: _,
            guest: _,
            guest_nice: _,
        }: CpuTime,
    ) -> Self {
        Ticks {
            user,
            system: system.saturating_add(irq).saturating_add(softirq),
            idle: idle.saturating_add(iowait),
            nice,
        }
    }
}
