//! jwt-probe: end-to-end UI suites for the jwt.io encoder/decoder
//!
//! ## Usage
//!
//! ```bash
//! jwt-probe run                          # Run every suite in headless Chromium
//! jwt-probe run --suite decoder --headed # One suite, visible browser
//! jwt-probe run --filter scenario-6      # Scenarios whose id or title match
//! jwt-probe list --steps                 # Show the scenario catalog
//! jwt-probe config -c jwt-probe.yaml     # Print the effective configuration
//! ```
//!
//! Exit status: 0 when every scenario passed, 1 when any failed, 2 when the
//! run could not start.

use clap::Parser;
use jwt_probe_cli::{
    init_logging, list, run, show_config, Cli, CliConfig, CliResult, ColorChoice, Commands,
    Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(&config);

    match dispatch(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}

fn dispatch(config: &CliConfig, command: Commands) -> CliResult<()> {
    match command {
        Commands::Run(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run(config, &args))
        }
        Commands::List(args) => list(config, &args),
        Commands::Config(args) => show_config(&args),
    }
}
