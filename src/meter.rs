use {
    crate::stat::Percent,
    std::{
        io::{self, Write},
        iter::{once, repeat, repeat_n},
    },
};

/// a labelled, fixed-width bar.
pub struct Meter<'a> {
    pub name: &'a str,
    pub value: Percent,
    pub width: usize,
}

/// === impl Meter ===

impl Meter<'_> {
    const ACTIVE: char = '■';
    const IDLE: char = ' ';
    const BORDER_L: char = '[';
    const BORDER_R: char = ']';

    /// the number of filled cells, rounded down.
    pub fn filled(&self) -> usize {
        let Self { value, width, .. } = *self;
        let filled = (value.get() * width as f64 / 100.0).floor() as usize;
        filled.min(width)
    }

    pub fn draw(&self, writer: &mut impl Write) -> io::Result<()> {
        let Self { name, value, width } = *self;

        // print the label.
        write!(writer, "{name}: ")?;

        // print the meter.
        let meter = {
            let active = repeat_n(Self::ACTIVE, self.filled());
            let idle = repeat(Self::IDLE);
            active.chain(idle).take(width)
        };
        let meter = once(Self::BORDER_L)
            .chain(meter)
            .chain(once(Self::BORDER_R))
            .collect::<String>();
        write!(writer, "{meter} {value}")
    }
}
