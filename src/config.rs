use std::{env, ffi::OsString, path::PathBuf, time::Duration};

/// settings fixed at startup.
///
/// the dashboard takes no flags. the only setting read from the environment is where to write
/// logs, since the terminal itself is taken by the dashboard.
#[derive(Clone, Debug)]
pub struct Config {
    /// the time between frames.
    pub interval: Duration,
    /// the width of each meter, in cells.
    pub bar_width: usize,
    /// the directory to write `ticks.log` into. logging is disabled when this is `None`.
    pub log_dir: Option<PathBuf>,
}

// === impl Config ===

impl Config {
    pub const INTERVAL: Duration = Duration::from_secs(1);
    pub const BAR_WIDTH: usize = 30;
    pub const LOG_DIR_VAR: &str = "TICKS_LOG_DIR";

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let log_dir = lookup(Self::LOG_DIR_VAR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Self {
            log_dir,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: Self::INTERVAL,
            bar_width: Self::BAR_WIDTH,
            log_dir: None,
        }
    }
}
