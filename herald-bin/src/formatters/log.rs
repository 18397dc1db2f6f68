use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

use crate::verbosity::Verbosity;

/// Initialize the logging system with the given verbosity level.
///
/// `RUST_LOG` takes precedence over the command line flags when it is set.
pub(crate) fn init_logging(verbose: &Verbosity) {
    let env = Env::default().filter_or("RUST_LOG", "warn");

    let mut builder = Builder::from_env(env);
    builder
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));

    if std::env::var("RUST_LOG").is_err() {
        // Other crates (reqwest, hyper) stay quiet unless asked for via RUST_LOG
        builder.filter_level(LevelFilter::Warn);

        let level_filter = verbose.log_level_filter();
        builder
            .filter_module("herald", level_filter)
            .filter_module("herald_lib", level_filter);
    }

    builder.init();
}
