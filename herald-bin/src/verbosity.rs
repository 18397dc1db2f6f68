//! `-v` / `-q` flags controlling how much `herald` logs.
//!
//! Without flags, errors and warnings are shown, so throttling and budget
//! waits are visible while posting.
//! - `-q` only shows errors
//! - `-v` adds info
//! - `-vv` adds debug output, e.g. every request sent
//! - `-vvv` adds trace output, e.g. rate limit updates

use log::LevelFilter;

/// Numeric value of the default level (`warn`)
const DEFAULT_LEVEL: i8 = 1;

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Verbosity {
    /// Log more, pass several times for even more
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    verbose: u8,

    /// Log less
    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "verbose"
    )]
    quiet: u8,
}

impl Verbosity {
    /// Level filter for the herald crates
    pub(crate) fn log_level_filter(&self) -> LevelFilter {
        match self.level() {
            i8::MIN..=-1 => LevelFilter::Off,
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    const fn level(&self) -> i8 {
        DEFAULT_LEVEL
            .saturating_add(self.verbose as i8)
            .saturating_sub(self.quiet as i8)
    }
}
