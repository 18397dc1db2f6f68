//! `herald` posts messages to a rate-limited chat API such as Discord's.
//! Messages are delivered in the order they are given, even when the API
//! throttles the bot; throttled messages are retried instead of dropped.
//!
//! The herald binary is a wrapper around herald-lib, which does the
//! ordering and rate limiting.
//!
//! Find the channel to post to:
//! ```sh
//! HERALD_TOKEN=... herald channels --name announcements
//! ```
//!
//! Post messages, in order:
//! ```sh
//! herald send --channel 41771983423143937 "Version 10 is out" "Changelog: ..."
//! ```
//!
//! Post one message per line of stdin, with an embed on the first one:
//! ```sh
//! git log --oneline -5 | herald send -C 41771983423143937 --title "Recent commits"
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]

use std::io::{self, ErrorKind};
use std::path::PathBuf;

use anyhow::{Context, Error, Result, bail};
use clap::{Parser, crate_version};
use formatters::log::init_logging;
use formatters::route_stats::RouteStatsTable;
use herald_lib::Dispatcher;
use log::error;

mod commands;
mod discord;
mod formatters;
mod options;
mod verbosity;

use crate::commands::CommandParams;
use crate::options::{Command, Config, HERALD_CONFIG_FILE, HeraldOptions};

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to `main()`
    // using the `?` operator, e.g. a missing token or an unknown channel name.
    #[allow(unused)]
    UnexpectedFailure = 1,
    DeliveryFailure = 2,
    ConfigFile = 3,
}

fn main() -> Result<()> {
    // std::process::exit doesn't run destructors, so all work happens in
    // `run_main` and only the exit code is passed back up.
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Merge all provided config options into one.
/// This includes a potential config file, command-line- and environment variables
fn load_config() -> Result<HeraldOptions> {
    let mut opts = HeraldOptions::parse();

    init_logging(&opts.config.verbose);

    let config_file = match &opts.config_file {
        Some(path) => Some(path.clone()),
        // The default config file is optional, but must be valid if present
        None => Some(PathBuf::from(HERALD_CONFIG_FILE)).filter(|path| path.is_file()),
    };

    if let Some(path) = config_file {
        match Config::load_from_file(&path) {
            Ok(c) => opts.config.merge(c),
            Err(e) => {
                bail!(
                    "Cannot load configuration file `{}`: {e:?}",
                    path.display()
                );
            }
        }
    }

    Ok(opts)
}

/// Set up runtime and call herald entrypoint
fn run_main() -> Result<i32> {
    use std::process::exit;

    let opts = match load_config() {
        Ok(opts) => opts,
        Err(e) => {
            error!(
                "Error while loading config: {e}\n\
                See the `herald.example.toml` of herald {} for all options",
                crate_version!()
            );
            exit(ExitCode::ConfigFile as i32);
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;

    match runtime.block_on(run(opts)) {
        Err(e) if Some(ErrorKind::BrokenPipe) == underlying_io_error_kind(&e) => {
            exit(ExitCode::Success as i32);
        }
        res => res,
    }
}

/// Check if the given error can be traced back to an `io::ErrorKind`
fn underlying_io_error_kind(error: &Error) -> Option<io::ErrorKind> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<io::Error>())
        .map(io::Error::kind)
}

/// Run the selected command
async fn run(opts: HeraldOptions) -> Result<i32> {
    let dispatcher = Dispatcher::from_config(opts.config.dispatcher_config())
        .context("Cannot create API client")?;
    let mut stdout = io::stdout();

    let exit_code = match opts.command {
        Command::Channels(args) => {
            let params = CommandParams {
                dispatcher: dispatcher.clone(),
                args,
            };
            commands::channels(params, &mut stdout).await
        }
        Command::Send(args) => {
            let params = CommandParams {
                dispatcher: dispatcher.clone(),
                args,
            };
            commands::send(params, &mut stdout).await
        }
    };

    if opts.config.route_stats {
        eprint!("{}", RouteStatsTable(&dispatcher.all_route_stats()));
    }

    Ok(exit_code? as i32)
}
