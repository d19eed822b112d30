//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use jwt_probe::{ScreenshotPolicy, TracePolicy};
use std::path::PathBuf;

/// jwt-probe: end-to-end UI suites for the jwt.io encoder/decoder
#[derive(Parser, Debug)]
#[command(name = "jwt-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures and the summary)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run suites in Chromium and write reports
    Run(RunArgs),

    /// List suites, scenarios and steps
    List(ListArgs),

    /// Print the effective run configuration as YAML
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Suites to run (default: all)
    #[arg(short, long = "suite", value_name = "NAME")]
    pub suites: Vec<String>,

    /// Run only scenarios whose id or title contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// YAML run configuration
    #[arg(short, long, env = "JWT_PROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fixture data JSON (default: built-in data)
    #[arg(long, env = "JWT_PROBE_DATA")]
    pub data: Option<PathBuf>,

    /// Address of the site under test
    #[arg(long, env = "JWT_PROBE_BASE_URL")]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the Chromium sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Path to the Chromium binary
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium: Option<String>,

    /// Maximum suites in flight (0 = available parallelism)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Per-step timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Directory for HTML/JUnit reports and artifacts
    #[arg(short = 'o', long)]
    pub report_dir: Option<PathBuf>,

    /// Screenshot policy
    #[arg(long)]
    pub screenshot: Option<ScreenshotArg>,

    /// Trace policy
    #[arg(long)]
    pub trace: Option<TraceArg>,
}

/// Arguments for the list command
#[derive(Parser, Debug, Default)]
pub struct ListArgs {
    /// Suites to list (default: all)
    #[arg(short, long = "suite", value_name = "NAME")]
    pub suites: Vec<String>,

    /// Only scenarios whose id or title contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Also print each scenario's steps
    #[arg(long)]
    pub steps: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug, Default)]
pub struct ConfigArgs {
    /// YAML run configuration
    #[arg(short, long, env = "JWT_PROBE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Screenshot policy argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenshotArg {
    /// After every scenario
    On,
    /// Never
    Off,
    /// Only after failed scenarios
    OnlyOnFailure,
}

impl From<ScreenshotArg> for ScreenshotPolicy {
    fn from(arg: ScreenshotArg) -> Self {
        match arg {
            ScreenshotArg::On => Self::On,
            ScreenshotArg::Off => Self::Off,
            ScreenshotArg::OnlyOnFailure => Self::OnlyOnFailure,
        }
    }
}

/// Trace policy argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceArg {
    /// Keep every trace
    On,
    /// Keep none
    Off,
    /// Keep traces of failed scenarios
    RetainOnFailure,
}

impl From<TraceArg> for TracePolicy {
    fn from(arg: TraceArg) -> Self {
        match arg {
            TraceArg::On => Self::On,
            TraceArg::Off => Self::Off,
            TraceArg::RetainOnFailure => Self::RetainOnFailure,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
