//! Terminal output: list reporter lines, spinner and summary

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use jwt_probe::{ReportArtifacts, RunReport, ScenarioReport, StepStatus};
use std::time::Duration;

/// Prints run progress and results
#[derive(Debug)]
pub struct ProgressReporter {
    out: Term,
    err: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Print steps under each scenario
    pub show_steps: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
            show_steps: false,
        }
    }

    /// Print each scenario's steps as well
    #[must_use]
    pub const fn with_steps(mut self, show: bool) -> Self {
        self.show_steps = show;
        self
    }

    /// Show a spinner on stderr while scenarios run
    pub fn start_spinner(&mut self, scenarios: usize) {
        if self.quiet || !self.err.is_term() {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Running {scenarios} scenarios"));
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(spinner);
    }

    /// Stop and clear the spinner
    pub fn finish_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// One list line per scenario, failures with their error
    pub fn scenario(&self, scenario: &ScenarioReport) {
        let passed = scenario.passed();
        if self.quiet && passed {
            return;
        }

        let line = scenario.list_line();
        let line = match (self.use_color, passed) {
            (false, _) => line,
            (true, true) => style(line).green().to_string(),
            (true, false) => style(line).red().bold().to_string(),
        };
        let _ = self.out.write_line(&line);

        if self.show_steps || !passed {
            for step in &scenario.steps {
                let mark = match (self.use_color, step.status) {
                    (true, StepStatus::Passed) => style(step.status.symbol()).green().to_string(),
                    (true, StepStatus::Failed) => style(step.status.symbol()).red().to_string(),
                    (true, StepStatus::Skipped) => style(step.status.symbol()).dim().to_string(),
                    (false, status) => status.symbol().to_string(),
                };
                let _ = self
                    .out
                    .write_line(&format!("    {mark} {} ({}ms)", step.name, step.duration_ms));
            }
        }

        if let Some(error) = &scenario.error {
            let body = error.diff.as_deref().unwrap_or(&error.message);
            for line in body.lines() {
                let _ = self.out.write_line(&format!("      {line}"));
            }
        }
        if let Some(teardown) = &scenario.teardown_error {
            self.warning(&format!("{}: teardown failed: {teardown}", scenario.id));
        }
    }

    /// Print a warning
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info line
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self.out.write_line(message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.out.write_line("");
        let _ = self.out.write_line(&styled);
    }

    /// Where the reports landed
    pub fn artifacts(&self, artifacts: &ReportArtifacts) {
        if self.quiet {
            return;
        }
        let _ = self.out.write_line("");
        let _ = self
            .out
            .write_line(&format!("HTML report: {}", artifacts.html.display()));
        let _ = self
            .out
            .write_line(&format!("JUnit report: {}", artifacts.junit.display()));
        if !artifacts.screenshots.is_empty() || !artifacts.traces.is_empty() {
            let _ = self.out.write_line(&format!(
                "{} screenshots, {} traces",
                artifacts.screenshots.len(),
                artifacts.traces.len()
            ));
        }
    }

    /// Final summary line. Always printed.
    pub fn summary(&self, report: &RunReport) {
        for error in &report.errors {
            let _ = self.err.write_line(&format!("error: {error}"));
        }

        let _ = self.out.write_line("");
        let status = if report.all_passed() { "PASSED" } else { "FAILED" };
        let summary = report.summary();
        if self.use_color {
            let status_style = if report.all_passed() {
                Style::new().green().bold()
            } else {
                Style::new().red().bold()
            };
            let _ = self.out.write_line(&format!(
                "{} {summary}",
                status_style.apply_to(status)
            ));
        } else {
            let _ = self.out.write_line(&format!("{status} {summary}"));
        }
    }
}
