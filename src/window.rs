use {
    crate::{
        meter::Meter,
        sentinel::Utilization,
        source::GpuReading,
        stat::CoreCount,
    },
    crossterm::{
        QueueableCommand, cursor,
        style::{Print, PrintStyledContent, Stylize},
        terminal,
    },
    std::io::{self, Write},
    tracing::debug,
};

/// everything drawn in one frame.
pub struct Frame<'a> {
    pub cores: CoreCount,
    /// the latest utilization, or `None` before the first one is computed.
    pub cpus: Option<&'a Utilization>,
    pub gpu: GpuReading,
    /// the width of each meter, in cells.
    pub width: usize,
}

const HEADER: &str = "=== System Resource Monitor ===";
const GPU_UNAVAILABLE: &str = "Not available on this system";
const NO_DATA: &str = "no data";
const FOOTER: &str = "Press Ctrl+C to exit";

/// clears the terminal and draws `frame`.
///
/// drawing is best-effort: a failed write is logged and the frame is abandoned.
pub fn render_frame(out: &mut impl Write, frame: &Frame<'_>) {
    if let Err(error) = draw(out, frame) {
        debug!(%error, "failed to draw frame");
    }
}

fn draw(out: &mut impl Write, frame: &Frame<'_>) -> io::Result<()> {
    let Frame {
        cores,
        cpus,
        gpu,
        width,
    } = *frame;

    clear(out)?;
    out.queue(PrintStyledContent(HEADER.bold()))?
        .queue(Print("\n\n"))?;

    if let Some(cpus) = cpus {
        let meter = Meter {
            name: "Average    ",
            value: cpus.average(),
            width,
        };
        meter.draw(out)?;
        out.queue(Print("\n\n"))?;
    }

    for core in 0..cores.get() {
        let name = format!("CPU Core {core:2}");
        match cpus.and_then(|cpus| cpus.get(core)) {
            Some(value) => Meter {
                name: &name,
                value,
                width,
            }
            .draw(out)?,
            None => write!(out, "{name}: {NO_DATA}")?,
        }
        out.queue(Print("\n"))?;
    }

    out.queue(Print("\n"))?;
    let name = "GPU        ";
    match gpu {
        GpuReading::Busy(value) => Meter { name, value, width }.draw(out)?,
        GpuReading::Unavailable => write!(out, "{name}: {GPU_UNAVAILABLE}")?,
    }

    out.queue(Print(format!("\n\n{FOOTER}\n")))?;
    out.flush()
}

/// clears the screen and moves the cursor home.
fn clear(out: &mut impl Write) -> io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?
        .queue(cursor::MoveTo(0, 0))
        .map(drop)
}

#[cfg(test)]
mod tests {
    use {super::*, crate::stat::Percent};

    fn render(frame: &Frame<'_>) -> String {
        let mut out = Vec::new();
        render_frame(&mut out, frame);
        String::from_utf8(out).unwrap()
    }

    fn two_cores() -> Utilization {
        vec![Percent::new(200.0 / 3.0), Percent::new(60.0)].into()
    }

    #[test]
    fn clears_and_homes_first() {
        let drawn = render(&Frame {
            cores: CoreCount::new(1).unwrap(),
            cpus: None,
            gpu: GpuReading::Unavailable,
            width: 30,
        });
        assert!(drawn.starts_with("\u{1b}[2J\u{1b}[1;1H"));
        assert!(drawn.contains(HEADER));
        assert!(drawn.ends_with("Press Ctrl+C to exit\n"));
    }

    #[test]
    fn one_bar_per_core() {
        let cpus = two_cores();
        let drawn = render(&Frame {
            cores: CoreCount::new(2).unwrap(),
            cpus: Some(&cpus),
            gpu: GpuReading::Unavailable,
            width: 30,
        });
        assert!(drawn.contains("CPU Core  0: ["));
        assert!(drawn.contains("] 66.7%"));
        assert!(drawn.contains("CPU Core  1: ["));
        assert!(drawn.contains("] 60.0%"));
        assert!(drawn.contains("Average    : ["));
        assert!(!drawn.contains(NO_DATA));
    }

    #[test]
    fn placeholder_before_first_sample() {
        let drawn = render(&Frame {
            cores: CoreCount::new(2).unwrap(),
            cpus: None,
            gpu: GpuReading::Unavailable,
            width: 30,
        });
        assert!(drawn.contains("CPU Core  0: no data"));
        assert!(drawn.contains("CPU Core  1: no data"));
        assert!(!drawn.contains("Average"));
    }

    #[test]
    fn gpu_unavailable_is_text() {
        let drawn = render(&Frame {
            cores: CoreCount::new(1).unwrap(),
            cpus: None,
            gpu: GpuReading::Unavailable,
            width: 30,
        });
        assert!(drawn.contains("GPU        : Not available on this system"));
        assert!(!drawn.contains("GPU        : ["));
    }

    #[test]
    fn gpu_reading_is_a_bar() {
        let drawn = render(&Frame {
            cores: CoreCount::new(1).unwrap(),
            cpus: None,
            gpu: GpuReading::Busy(Percent::new(25.0)),
            width: 30,
        });
        assert!(drawn.contains("GPU        : ["));
        assert!(drawn.contains("] 25.0%"));
        assert!(!drawn.contains(GPU_UNAVAILABLE));
    }

    /// a writer that refuses every write.
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("terminal went away"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("terminal went away"))
        }
    }

    #[test]
    fn write_errors_are_swallowed() {
        render_frame(
            &mut Broken,
            &Frame {
                cores: CoreCount::new(1).unwrap(),
                cpus: None,
                gpu: GpuReading::Unavailable,
                width: 30,
            },
        );
    }
}
