//! Command implementations

use crate::commands::{ConfigArgs, ListArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use jwt_probe::suites::{self, SUITE_NAMES};
use jwt_probe::{
    run_suites, Reporter, RunConfig, RunReport, SessionFactory, SessionFixture, Suite,
    SuiteRunner, TestData,
};
use std::path::Path;
use std::sync::Arc;

/// Load the YAML configuration (if any) and apply flag overrides
pub fn resolve_run_config(args: &RunArgs) -> CliResult<RunConfig> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(url) = &args.base_url {
        config.base_url.clone_from(url);
    }
    if args.headed {
        config.headless = false;
    }
    if args.no_sandbox {
        config.sandbox = false;
    }
    if let Some(path) = &args.chromium {
        config.chromium_path = Some(path.clone());
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.fail_fast |= args.fail_fast;
    if let Some(ms) = args.timeout {
        config.timeout_ms = ms;
    }
    if let Some(dir) = &args.report_dir {
        config.report_dir.clone_from(dir);
    }
    if let Some(data) = &args.data {
        config.data_path = Some(data.clone());
    }
    if let Some(policy) = args.screenshot {
        config.screenshot = policy.into();
    }
    if let Some(policy) = args.trace {
        config.trace = policy.into();
    }

    config.validate()?;
    Ok(config)
}

fn load_config(path: Option<&Path>) -> CliResult<RunConfig> {
    match path {
        Some(path) => Ok(RunConfig::load(path)?),
        None => Ok(RunConfig::default()),
    }
}

/// Built-in suites by name; every suite when `names` is empty
pub fn select_suites(names: &[String]) -> CliResult<Vec<Suite>> {
    if names.is_empty() {
        return Ok(suites::catalog());
    }
    names
        .iter()
        .map(|name| {
            suites::suite(name).ok_or_else(|| {
                CliError::invalid_argument(format!(
                    "unknown suite '{name}' (available: {})",
                    SUITE_NAMES.join(", ")
                ))
            })
        })
        .collect()
}

fn count_matching(suites: &[Suite], filter: Option<&str>) -> usize {
    suites
        .iter()
        .flat_map(Suite::scenarios)
        .filter(|s| filter.map_or(true, |p| s.matches(p)))
        .count()
}

/// `list`: print suites, scenarios and optionally steps
pub fn list(cli: &CliConfig, args: &ListArgs) -> CliResult<()> {
    let suites = select_suites(&args.suites)?;
    let reporter = ProgressReporter::new(cli.color.should_color(), false);
    let filter = args.filter.as_deref();

    for suite in &suites {
        let scenarios: Vec<_> = suite
            .scenarios()
            .iter()
            .filter(|s| filter.map_or(true, |p| s.matches(p)))
            .collect();
        if scenarios.is_empty() {
            continue;
        }
        reporter.header(&format!("{} ({} scenarios)", suite.name(), scenarios.len()));
        for scenario in scenarios {
            reporter.info(&format!("  {:<34} {}", scenario.id(), scenario.title()));
            if args.steps {
                for (n, step) in scenario.steps().iter().enumerate() {
                    reporter.info(&format!(
                        "      {:>2}. [{:?}] {}",
                        n + 1,
                        step.kind(),
                        step.name()
                    ));
                }
            }
        }
    }
    reporter.info(&format!(
        "\n{} scenarios in {} suites",
        count_matching(&suites, filter),
        suites.len()
    ));
    Ok(())
}

/// `config`: print the effective configuration
pub fn show_config(args: &ConfigArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    config.validate()?;
    print!("{}", config.to_yaml()?);
    Ok(())
}

/// `run`: launch Chromium, run the selected suites, write reports
pub async fn run(cli: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let config = resolve_run_config(args)?;
    let suites = select_suites(&args.suites)?;
    if count_matching(&suites, args.filter.as_deref()) == 0 {
        return Err(CliError::invalid_argument("no scenario matches the filter"));
    }
    // Fixture data errors stop the run before any scenario starts
    let data = Arc::new(TestData::load_or_builtin(config.data_path.as_deref())?);

    let report = run_in_browser(cli, config, data, suites, args.filter.clone()).await?;
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed: report.failed_count(),
            total: report.total(),
        })
    }
}

#[cfg(feature = "browser")]
async fn run_in_browser(
    cli: &CliConfig,
    config: RunConfig,
    data: Arc<TestData>,
    suites: Vec<Suite>,
    filter: Option<String>,
) -> CliResult<RunReport> {
    use jwt_probe::{BrowserConfig, ChromiumSessionFactory};

    let browser = Arc::new(
        ChromiumSessionFactory::launch(BrowserConfig::from_run_config(&config)).await?,
    );
    let report = execute(cli, config, data, suites, filter, browser.clone()).await;

    match Arc::try_unwrap(browser) {
        Ok(browser) => {
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "closing chromium failed");
            }
        }
        Err(_) => tracing::warn!("chromium still referenced, leaving it to exit with the process"),
    }
    report
}

#[cfg(not(feature = "browser"))]
async fn run_in_browser(
    _cli: &CliConfig,
    _config: RunConfig,
    _data: Arc<TestData>,
    _suites: Vec<Suite>,
    _filter: Option<String>,
) -> CliResult<RunReport> {
    Err(CliError::BrowserUnavailable)
}

/// Run suites on sessions from `factory`, print results and write reports
pub async fn execute(
    cli: &CliConfig,
    config: RunConfig,
    data: Arc<TestData>,
    suites: Vec<Suite>,
    filter: Option<String>,
    factory: Arc<dyn SessionFactory>,
) -> CliResult<RunReport> {
    let mut output = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet())
        .with_steps(cli.verbosity.is_verbose());
    let report_dir = config.report_dir.clone();
    let scenarios = count_matching(&suites, filter.as_deref());

    let mut runner = SuiteRunner::new(Arc::new(config), data, SessionFixture::new(factory));
    if let Some(pattern) = filter {
        runner = runner.with_filter(pattern);
    }

    tracing::info!(
        suites = suites.len(),
        scenarios,
        base_url = %runner.config().base_url,
        "starting run"
    );
    output.start_spinner(scenarios);
    let report = run_suites(&runner, suites).await;
    output.finish_spinner();

    for scenario in report.scenarios() {
        output.scenario(scenario);
    }
    for suite in &report.suites {
        for id in &suite.skipped {
            output.warning(&format!("{}: {id} skipped after an earlier failure", suite.name));
        }
    }

    let artifacts = Reporter::new(&report_dir)
        .write(&report)
        .map_err(|e| CliError::report_generation(e.to_string()))?;
    output.artifacts(&artifacts);
    output.summary(&report);
    Ok(report)
}
