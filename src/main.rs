//! a compact per-core cpu utilization dashboard.

use ticks::{App, Config, Error, logging};

fn main() -> Result<(), Error> {
    let config = Config::from_env();
    let _guard = logging::init(&config)?;

    App::new(&config)?.run();

    Ok(())
}
