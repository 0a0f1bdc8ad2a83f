use {
    crate::{
        error::SampleError,
        stat::{CoreCount, Percent, TickSnapshot, Ticks},
    },
    tracing::warn,
};

#[cfg(test)]
mod tests;

/// turns successive tick snapshots into per-core utilization.
pub struct Sentinel {
    /// the number of cores every snapshot must describe.
    cores: CoreCount,
    inner: Inner,
}

enum Inner {
    /// no snapshot has been observed yet.
    Bootstrap,
    Running {
        /// the last observed snapshot.
        last: TickSnapshot,
    },
}

/// the ticks each bucket gained between two snapshots of one core.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Measurement {
    pub user: u64,
    pub system: u64,
    pub idle: u64,
    pub nice: u64,
}

/// per-core utilization over one sampling interval, ordered by core index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Utilization {
    cores: Vec<Percent>,
}

// === impl Sentinel ===

impl Sentinel {
    /// creates a new [`Sentinel`] in its bootstrap state.
    pub fn new(cores: CoreCount) -> Self {
        Self {
            cores,
            inner: Inner::Bootstrap,
        }
    }

    /// returns the [`Utilization`] since the previous snapshot, and retains `current` in its
    /// place.
    ///
    /// NB: by virtue of this being a comparison to the previous snapshot, this will return
    /// `Ok(None)` the first time it is called, and the first time after a [`Sentinel::reset()`].
    /// a snapshot of the wrong size is rejected and leaves the retained snapshot untouched.
    pub fn update(&mut self, current: TickSnapshot) -> Result<Option<Utilization>, SampleError> {
        let Self { cores, inner } = self;

        SampleError::check_cores(*cores, current.len())?;

        match inner {
            Inner::Bootstrap => {
                *inner = Inner::Running { last: current };
                Ok(None)
            }
            Inner::Running { last } => {
                let utilization = Utilization::between(last, &current);
                *last = current;
                Ok(Some(utilization))
            }
        }
    }

    /// discards the retained snapshot.
    pub fn reset(&mut self) {
        self.inner = Inner::Bootstrap;
    }

    /// returns true once a snapshot is retained.
    pub fn is_bootstrapped(&self) -> bool {
        matches!(self.inner, Inner::Running { .. })
    }

    pub fn cores(&self) -> CoreCount {
        self.cores
    }
}

// === impl Measurement ===

impl Measurement {
    /// the ticks gained from `a` to `b`.
    ///
    /// a counter that went backwards gained nothing.
    pub fn new(a: &Ticks, b: &Ticks) -> Self {
        let delta = |bucket: &'static str, a: u64, b: u64| {
            b.checked_sub(a).unwrap_or_else(|| {
                warn!(%bucket, previous = a, current = b, "tick counter regressed");
                0
            })
        };

        Self {
            user: delta("user", a.user, b.user),
            system: delta("system", a.system, b.system),
            idle: delta("idle", a.idle, b.idle),
            nice: delta("nice", a.nice, b.nice),
        }
    }

    /// ticks spent doing anything but idling.
    pub fn active(&self) -> u64 {
        let Self {
            user,
            system,
            nice,
            idle: _, // do not count idle time...
        } = *self;

        user.saturating_add(system).saturating_add(nice)
    }

    pub fn total(&self) -> u64 {
        self.active().saturating_add(self.idle)
    }

    /// returns the percentage of active cpu time.
    pub fn percentage(&self) -> Percent {
        Percent::of(self.active(), self.total())
    }
}

// === impl Utilization ===

impl Utilization {
    fn between(a: &TickSnapshot, b: &TickSnapshot) -> Self {
        debug_assert_eq!(a.len(), b.len());

        a.iter()
            .zip(b)
            .map(|(a, b)| Measurement::new(a, b).percentage())
            .collect::<Vec<_>>()
            .into()
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    pub fn get(&self, core: usize) -> Option<Percent> {
        self.cores.get(core).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Percent> + '_ {
        self.cores.iter().copied()
    }

    /// the mean utilization across all cores.
    pub fn average(&self) -> Percent {
        if self.cores.is_empty() {
            return Percent::ZERO;
        }

        let sum = self.iter().map(Percent::get).sum::<f64>();
        Percent::new(sum / self.cores.len() as f64)
    }
}

impl From<Vec<Percent>> for Utilization {
    fn from(cores: Vec<Percent>) -> Self {
        Self { cores }
    }
}
