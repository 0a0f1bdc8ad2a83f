use {
    crate::{
        config::Config,
        sentinel::{Sentinel, Utilization},
        source::{GpuProbe, HostGpu, HostTicks, Pacer, Sleep, TickSource},
        stat::CoreCount,
        window::{Frame, render_frame},
    },
    std::{
        io::Write,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
    },
    tracing::{debug, info, warn},
};

/// stops a [`Monitor`] at the next cycle boundary.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

/// drives one sample, update, render cycle per interval.
pub struct Monitor<S = HostTicks, G = HostGpu, P = Sleep> {
    /// the underlying source of tick counters.
    source: S,
    /// the accelerator probe.
    gpu: G,
    /// blocks between frames.
    pacer: P,
    sentinel: Sentinel,
    /// the most recent utilization, redrawn when a sample is skipped.
    last: Option<Utilization>,
    width: usize,
}

// === impl CancellationToken ===

impl CancellationToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// === impl Monitor ===

impl Monitor {
    /// a monitor of this host, using the platform's adapters.
    pub fn host(cores: CoreCount, config: &Config) -> Self {
        Self::new(
            cores,
            HostTicks::default(),
            HostGpu::default(),
            Sleep::new(config.interval),
            config,
        )
    }
}

impl<S, G, P> Monitor<S, G, P>
where
    S: TickSource,
    G: GpuProbe,
    P: Pacer,
{
    pub fn new(cores: CoreCount, source: S, gpu: G, pacer: P, config: &Config) -> Self {
        Self {
            source,
            gpu,
            pacer,
            sentinel: Sentinel::new(cores),
            last: None,
            width: config.bar_width,
        }
    }

    /// runs cycles until `token` is cancelled.
    ///
    /// the token is checked once per cycle, after the frame is drawn and before waiting.
    pub fn run(&mut self, out: &mut impl Write, token: &CancellationToken) {
        info!(cores = %self.sentinel.cores(), "starting sampling loop");

        loop {
            self.cycle(out);
            if token.is_cancelled() {
                info!("sampling loop cancelled");
                return;
            }
            self.pacer.wait();
        }
    }

    /// samples the host, updates the utilization, and draws one frame.
    ///
    /// a failed sample is skipped; the previous utilization is drawn again.
    pub fn cycle(&mut self, out: &mut impl Write) {
        let Self {
            source,
            gpu,
            pacer: _,
            sentinel,
            last,
            width,
        } = self;

        let cores = sentinel.cores();
        match source
            .sample(cores)
            .and_then(|snapshot| sentinel.update(snapshot))
        {
            Ok(Some(utilization)) => {
                debug!(average = %utilization.average(), "computed utilization");
                *last = Some(utilization);
            }
            Ok(None) => debug!("retained first snapshot"),
            Err(error) => warn!(%error, "skipping sample"),
        }

        let frame = Frame {
            cores,
            cpus: last.as_ref(),
            gpu: gpu.probe(),
            width: *width,
        };
        render_frame(out, &frame);
    }

    /// the utilization drawn in the latest frame.
    pub fn last(&self) -> Option<&Utilization> {
        self.last.as_ref()
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }
}
