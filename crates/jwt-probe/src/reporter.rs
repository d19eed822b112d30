//! Run reports
//!
//! The runner produces one [`ScenarioReport`] per scenario. [`Reporter`]
//! turns a finished [`RunReport`] into `index.html`, `junit.xml`, per-scenario
//! trace JSON and PNG screenshots under the report directory.

use crate::driver::Screenshot;
use crate::harness::{ScenarioState, StepKind};
use crate::result::{ProbeError, ProbeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Whole milliseconds, saturating
#[must_use]
pub fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Step result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step passed
    Passed,
    /// Step failed
    Failed,
    /// Step did not run because an earlier step failed
    Skipped,
}

impl StepStatus {
    /// Symbol used by the list output
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Passed => "✓",
            Self::Failed => "✘",
            Self::Skipped => "-",
        }
    }
}

/// Error details attached to a failed step or scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error class (navigation, locator, assertion, data, browser, environment)
    pub class: String,
    /// Rendered message
    pub message: String,
    /// Expected/actual diff for assertion failures
    pub diff: Option<String>,
}

impl From<&ProbeError> for ErrorReport {
    fn from(error: &ProbeError) -> Self {
        Self {
            class: error.class().to_string(),
            message: error.to_string(),
            diff: match error {
                ProbeError::Assertion(failure) => Some(failure.diff()),
                _ => None,
            },
        }
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Step name
    pub name: String,
    /// Step kind
    pub kind: StepKind,
    /// Outcome
    pub status: StepStatus,
    /// Offset from scenario start in milliseconds
    pub started_ms: u64,
    /// Step duration in milliseconds
    pub duration_ms: u64,
    /// Failure details
    pub error: Option<ErrorReport>,
}

impl StepReport {
    /// A step that never ran
    #[must_use]
    pub fn skipped(name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            kind,
            status: StepStatus::Skipped,
            started_ms: 0,
            duration_ms: 0,
            error: None,
        }
    }
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Owning suite
    pub suite: String,
    /// Scenario id
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Final state
    pub state: ScenarioState,
    /// Step results, in order
    pub steps: Vec<StepReport>,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// Error that failed the scenario
    pub error: Option<ErrorReport>,
    /// Error raised while releasing the session
    pub teardown_error: Option<String>,
    /// Whether the step trace is kept on disk
    pub retain_trace: bool,
    /// Final screenshot
    #[serde(skip)]
    pub screenshot: Option<Screenshot>,
}

impl ScenarioReport {
    /// Whether the scenario passed
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.state, ScenarioState::Passed)
    }

    /// File-name-safe identifier
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.suite, self.id)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    }

    /// One line for the list output
    #[must_use]
    pub fn list_line(&self) -> String {
        let status = if self.passed() {
            StepStatus::Passed
        } else {
            StepStatus::Failed
        };
        format!(
            "{} [{}] › {} ({}ms)",
            status.symbol(),
            self.suite,
            self.title,
            self.duration_ms
        )
    }
}

/// Results of one suite
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub name: String,
    /// Scenarios that ran
    pub scenarios: Vec<ScenarioReport>,
    /// Scenario ids not run because the run stopped early
    pub skipped: Vec<String>,
    /// Suite duration in milliseconds
    pub duration_ms: u64,
}

impl SuiteReport {
    /// Whether every scenario that ran passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::passed)
    }
}

/// Results of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Suite results in declaration order
    pub suites: Vec<SuiteReport>,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// Suites that aborted without a report
    pub errors: Vec<String>,
}

impl RunReport {
    /// Empty report starting now
    #[must_use]
    pub fn new() -> Self {
        Self {
            suites: Vec::new(),
            started_at: Utc::now(),
            duration_ms: 0,
            errors: Vec::new(),
        }
    }

    /// All scenario reports
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.suites.iter().flat_map(|s| s.scenarios.iter())
    }

    /// Number of scenarios that ran
    #[must_use]
    pub fn total(&self) -> usize {
        self.scenarios().count()
    }

    /// Number of passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.scenarios().filter(|s| s.passed()).count()
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.total() - self.passed_count()
    }

    /// Number of scenarios skipped by fail-fast
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.suites.iter().map(|s| s.skipped.len()).sum()
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.scenarios().filter(|s| !s.passed()).collect()
    }

    /// Exit-code verdict: every scenario passed and no suite aborted
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.errors.is_empty() && self.skipped_count() == 0 && self.failed_count() == 0
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} passed, {} failed",
            self.passed_count(),
            self.failed_count()
        );
        if self.skipped_count() > 0 {
            line.push_str(&format!(", {} skipped", self.skipped_count()));
        }
        line.push_str(&format!(
            " ({:.2}s)",
            Duration::from_millis(self.duration_ms).as_secs_f64()
        ));
        line
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Files written for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportArtifacts {
    /// HTML report
    pub html: PathBuf,
    /// JUnit XML report
    pub junit: PathBuf,
    /// Trace files
    pub traces: Vec<PathBuf>,
    /// Screenshot files
    pub screenshots: Vec<PathBuf>,
}

/// Writes reports into a directory
#[derive(Debug, Clone)]
pub struct Reporter {
    report_dir: PathBuf,
}

impl Reporter {
    /// Create a reporter writing under `report_dir`
    #[must_use]
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    /// Report directory
    #[must_use]
    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Write every report and artifact
    ///
    /// # Errors
    ///
    /// Returns error if a directory or file cannot be written
    pub fn write(&self, report: &RunReport) -> ProbeResult<ReportArtifacts> {
        std::fs::create_dir_all(&self.report_dir)?;
        let mut artifacts = ReportArtifacts {
            html: self.report_dir.join("index.html"),
            junit: self.report_dir.join("junit.xml"),
            ..ReportArtifacts::default()
        };

        for scenario in report.scenarios() {
            if let Some(shot) = scenario.screenshot.as_ref().filter(|s| s.is_valid()) {
                let dir = self.report_dir.join("screenshots");
                std::fs::create_dir_all(&dir)?;
                let path = dir.join(format!("{}.png", scenario.file_stem()));
                std::fs::write(&path, &shot.data)?;
                artifacts.screenshots.push(path);
            }
            if scenario.retain_trace {
                let dir = self.report_dir.join("traces");
                std::fs::create_dir_all(&dir)?;
                let path = dir.join(format!("{}.json", scenario.file_stem()));
                std::fs::write(&path, render_trace(scenario)?)?;
                artifacts.traces.push(path);
            }
        }

        std::fs::write(&artifacts.html, render_html(report))?;
        std::fs::write(&artifacts.junit, render_junit(report))?;
        tracing::info!(dir = %self.report_dir.display(), "reports written");
        Ok(artifacts)
    }
}

/// Step timeline of one scenario as JSON
///
/// # Errors
///
/// Returns error if serialization fails
pub fn render_trace(scenario: &ScenarioReport) -> ProbeResult<String> {
    Ok(serde_json::to_string_pretty(scenario)?)
}

/// Render HTML report content
#[must_use]
pub fn render_html(report: &RunReport) -> String {
    let mut html = String::new();

    html.push_str(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>jwt-probe report</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .scenario { padding: 10px; margin: 8px 0; border-radius: 4px; }
        .scenario.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .scenario.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .step { font-family: monospace; margin-left: 16px; }
        .step.failed { color: #d32f2f; }
        .step.skipped { color: #9e9e9e; }
        .error { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
        .shot img { max-width: 480px; border: 1px solid #ddd; margin-top: 8px; }
    </style>
</head>
<body>
"#,
    );

    html.push_str(&format!(
        r#"<div class="summary">
    <h1>jwt-probe</h1>
    <h2>{}</h2>
    <p>Started {}</p>
</div>
"#,
        escape_xml(&report.summary()),
        report.started_at.to_rfc3339()
    ));

    for error in &report.errors {
        html.push_str(&format!(r#"<div class="error">{}</div>"#, escape_xml(error)));
        html.push('\n');
    }

    for suite in &report.suites {
        html.push_str(&format!("<h2>{}</h2>\n", escape_xml(&suite.name)));
        for scenario in &suite.scenarios {
            let class = if scenario.passed() { "pass" } else { "fail" };
            html.push_str(&format!(
                r#"<div class="scenario {class}">
    <strong>{}</strong> ({}ms)
"#,
                escape_xml(&scenario.title),
                scenario.duration_ms
            ));
            for step in &scenario.steps {
                let status = match step.status {
                    StepStatus::Passed => "passed",
                    StepStatus::Failed => "failed",
                    StepStatus::Skipped => "skipped",
                };
                html.push_str(&format!(
                    r#"    <div class="step {status}">{} {} ({}ms)</div>
"#,
                    step.status.symbol(),
                    escape_xml(&step.name),
                    step.duration_ms
                ));
            }
            if let Some(error) = &scenario.error {
                let body = error.diff.as_deref().map_or_else(
                    || error.message.clone(),
                    |diff| format!("{}\n{diff}", error.message),
                );
                html.push_str(&format!(
                    r#"    <div class="error">[{}] {}</div>
"#,
                    escape_xml(&error.class),
                    escape_xml(&body)
                ));
            }
            if scenario.screenshot.as_ref().is_some_and(Screenshot::is_valid) {
                html.push_str(&format!(
                    r#"    <div class="shot"><img alt="screenshot" src="screenshots/{}.png"></div>
"#,
                    scenario.file_stem()
                ));
            }
            html.push_str("</div>\n");
        }
        for id in &suite.skipped {
            html.push_str(&format!(
                r#"<div class="step skipped">- {} (not run)</div>
"#,
                escape_xml(id)
            ));
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Render JUnit XML content
#[must_use]
pub fn render_junit(report: &RunReport) -> String {
    let mut xml = String::new();

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<testsuites tests="{}" failures="{}" skipped="{}" time="{:.3}">"#,
        report.total() + report.skipped_count(),
        report.failed_count(),
        report.skipped_count(),
        seconds(report.duration_ms)
    ));
    xml.push('\n');

    for suite in &report.suites {
        let failures = suite.scenarios.iter().filter(|s| !s.passed()).count();
        xml.push_str(&format!(
            r#"  <testsuite name="{}" tests="{}" failures="{failures}" skipped="{}" time="{:.3}">"#,
            escape_xml(&suite.name),
            suite.scenarios.len() + suite.skipped.len(),
            suite.skipped.len(),
            seconds(suite.duration_ms)
        ));
        xml.push('\n');

        for scenario in &suite.scenarios {
            xml.push_str(&format!(
                r#"    <testcase classname="{}" name="{}" time="{:.3}">"#,
                escape_xml(&suite.name),
                escape_xml(&scenario.title),
                seconds(scenario.duration_ms)
            ));
            xml.push('\n');
            if let Some(error) = &scenario.error {
                xml.push_str(&format!(
                    r#"      <failure type="{}" message="{}">{}</failure>"#,
                    escape_xml(&error.class),
                    escape_xml(&error.message),
                    escape_xml(error.diff.as_deref().unwrap_or(&error.message))
                ));
                xml.push('\n');
            }
            xml.push_str("    </testcase>\n");
        }
        for id in &suite.skipped {
            xml.push_str(&format!(
                r#"    <testcase classname="{}" name="{}"><skipped/></testcase>"#,
                escape_xml(&suite.name),
                escape_xml(id)
            ));
            xml.push('\n');
        }

        xml.push_str("  </testsuite>\n");
    }

    xml.push_str("</testsuites>\n");
    xml
}

#[allow(clippy::cast_precision_loss)]
fn seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
