use {
    crate::error::HostQueryError,
    std::{
        collections::BTreeMap,
        fmt::{self, Display},
        io::BufRead,
        num::{NonZeroUsize, ParseIntError},
        ops::Not,
        str::FromStr,
    },
    thiserror::Error,
    tracing::debug,
};

pub use self::cpu_time::CpuTime;

mod cpu_time;


/// the number of logical cpu cores on this host.
///
/// this is determined once at startup, and is fixed for the lifetime of the process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CoreCount(NonZeroUsize);

/// cumulative ticks that one core has spent in each activity class since boot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Ticks {
    /// time spent in user mode.
    pub user: u64,
    /// time spent in system mode.
    pub system: u64,
    /// time spent in the idle task.
    pub idle: u64,
    /// time spent in user mode with low priority (nice).
    pub nice: u64,
}

/// one instantaneous read of every core's tick counters, ordered by core index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TickSnapshot {
    cores: Vec<Ticks>,
}

/// a utilization percentage, always within `[0.0, 100.0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Percent(f64);

/// an entry in the `/proc/stat` kernel statistics table.
///
/// see `proc_stat(5)` for more information.
#[derive(Debug, Eq, PartialEq)]
pub enum Entry {
    /// the amount of time that the system ("cpu" line) spent in various states.
    AllCpu { time: CpuTime },
    /// the amount of time that a specific cpu ("cpuN" line) spent in various states.
    Cpu { id: CpuId, time: CpuTime },
    /// the number of pages the system paged in and the number that were paged out (from disk).
    Page,
    /// the number of swap pages that have been brought in and out.
    Swap,
    /// this line shows counts of interrupts serviced since boot time.
    Intr,
    DiskIo,
    /// the number of context switches that the system underwent.
    Ctxt,
    Btime,
    /// the number of forks since boot.
    Processes,
    /// the number of processes in runnable state.  (linux 2.5.45 onward.)
    ProcsRunning,
    /// the number of processes blocked waiting for i/o to complete.
    ProcsBlocked,
    /// this line shows the number of softirq for all cpus.
    SoftIrq,
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct CpuId(pub(crate) u16);

#[derive(Debug, Eq, Error, PartialEq)]
pub enum EntryParseError {
    #[error("empty entry")]
    Empty,
    #[error("unrecognized entry kind: {kind}")]
    UnrecognizedEntry { kind: String },
    #[error("invalid cpu id: {0}")]
    CpuIdParse(#[source] ParseIntError),
    #[error("invalid time value: {0}")]
    TickParse(#[source] ParseIntError),
    #[error(
        "expected between {min} and {max} cpu time columns, found {columns}",
        min = CpuTime::MIN_COLUMNS,
        max = CpuTime::MAX_COLUMNS
    )]
    CpuTime { columns: usize },
}

enum Either<'a> {
    Cpu(&'a str),
    Entry(Entry),
}

// === impl CoreCount ===

impl CoreCount {
    pub fn new(count: usize) -> Result<Self, HostQueryError> {
        NonZeroUsize::new(count)
            .map(Self)
            .ok_or(HostQueryError::NoCores)
    }

    pub fn get(self) -> usize {
        let Self(count) = self;
        count.get()
    }
}

impl Display for CoreCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(count) = self;
        Display::fmt(count, f)
    }
}

// === impl Ticks ===

impl Ticks {
    pub const fn new(user: u64, system: u64, idle: u64, nice: u64) -> Self {
        Self {
            user,
            system,
            idle,
            nice,
        }
    }
}

impl From<(u64, u64, u64, u64)> for Ticks {
    fn from((user, system, idle, nice): (u64, u64, u64, u64)) -> Self {
        Self::new(user, system, idle, nice)
    }
}

// === impl Percent ===

impl Percent {
    pub const ZERO: Self = Self(0.0);
    pub const FULL: Self = Self(100.0);

    /// clamps `value` into range. nan reads as zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Self(value.clamp(0.0, 100.0))
        }
    }

    /// the ratio `part / whole` as a percentage. an empty whole is zero percent.
    pub fn of(part: u64, whole: u64) -> Self {
        if whole == 0 {
            return Self::ZERO;
        }

        Self::new(part as f64 / whole as f64 * 100.0)
    }

    pub fn get(self) -> f64 {
        let Self(value) = self;
        value
    }
}

impl Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(value) = self;
        write!(f, "{value:.1}%")
    }
}

// === impl TickSnapshot ===

impl TickSnapshot {
    /// the number of cores in this snapshot.
    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticks> {
        self.cores.iter()
    }

    /// reads the per-cpu rows of a `/proc/stat` table.
    ///
    /// the aggregate "cpu" row and every non-cpu entry are skipped. rows are ordered by cpu id,
    /// regardless of the order in which the kernel printed them.
    pub fn from_proc_stat(stats: impl BufRead) -> Result<Self, HostQueryError> {
        let mut cpus = BTreeMap::<CpuId, CpuTime>::new();

        for line in stats.lines() {
            let line = line?;
            match line.parse::<Entry>() {
                Ok(Entry::Cpu { id, time }) => {
                    cpus.insert(id, time);
                }
                Ok(_) => {}
                Err(EntryParseError::UnrecognizedEntry { kind }) => {
                    debug!(%kind, "skipping unrecognized kernel statistic");
                }
                Err(error) => return Err(error.into()),
            }
        }

        Ok(cpus.into_values().map(Ticks::from).collect())
    }
}

impl From<Vec<Ticks>> for TickSnapshot {
    fn from(cores: Vec<Ticks>) -> Self {
        Self { cores }
    }
}

impl FromIterator<Ticks> for TickSnapshot {
    fn from_iter<I: IntoIterator<Item = Ticks>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl<'a> IntoIterator for &'a TickSnapshot {
    type Item = &'a Ticks;
    type IntoIter = std::slice::Iter<'a, Ticks>;
    fn into_iter(self) -> Self::IntoIter {
        self.cores.iter()
    }
}

// === impl Entry ===

impl FromStr for Entry {
    type Err = EntryParseError;
    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let tokens = entry
            .split(' ')
            .filter(|t| t.is_empty().not())
            .collect::<Vec<_>>();
        let [kind, tokens @ ..] = tokens.as_slice() else {
            return Err(EntryParseError::Empty);
        };

        let id = match Self::parse_entry_kind(kind) {
            Either::Cpu(cpu) => Self::parse_cpu_id(cpu)?,
            Either::Entry(entry) => return Ok(entry),
        };

        let time = tokens
            .iter()
            .map(|t| t.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(EntryParseError::TickParse)
            .and_then(CpuTime::try_from)?;

        Ok(if let Some(id) = id {
            Self::Cpu { id, time }
        } else {
            Self::AllCpu { time }
        })
    }
}

impl Entry {
    fn parse_entry_kind(kind: &str) -> Either<'_> {
        use Entry::*;

        match kind {
            "page" => Either::Entry(Page),
            "swap" => Either::Entry(Swap),
            "intr" => Either::Entry(Intr),
            "disk_io" => Either::Entry(DiskIo),
            "ctxt" => Either::Entry(Ctxt),
            "btime" => Either::Entry(Btime),
            "processes" => Either::Entry(Processes),
            "procs_running" => Either::Entry(ProcsRunning),
            "procs_blocked" => Either::Entry(ProcsBlocked),
            "softirq" => Either::Entry(SoftIrq),
            cpu => Either::Cpu(cpu),
        }
    }

    fn parse_cpu_id(token: &str) -> Result<Option<CpuId>, EntryParseError> {
        use EntryParseError::{CpuIdParse, UnrecognizedEntry};

        // strip the token of its "cpu" prefix.
        let suffix = token.strip_prefix("cpu").ok_or_else(|| UnrecognizedEntry {
            kind: token.to_owned(),
        })?;

        // if there is no suffix, return `None`.
        if suffix.is_empty() {
            return Ok(None);
        }

        // parse the id into an integer.
        suffix
            .parse::<u16>()
            .map(CpuId)
            .map(Some)
            .map_err(CpuIdParse)
    }
}
