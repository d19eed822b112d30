//! jwt-probe CLI library
//!
//! Argument parsing, configuration layering (YAML file, environment, flags),
//! log setup and terminal output around the `jwt-probe` runner.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod logging;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ListArgs, RunArgs, ScreenshotArg, TraceArg,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::ProgressReporter;
pub use runner::{execute, list, resolve_run_config, run, select_suites, show_config};
