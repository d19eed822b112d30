//! Scenario runner
//!
//! A [`Suite`] is an ordered list of [`Scenario`]s; a scenario is an ordered
//! list of named [`Step`]s. Scenarios within a suite run one after another,
//! each on a fresh page session from the [`SessionFixture`]. Independent
//! suites run in parallel via [`run_suites`].

use crate::assertion::Expect;
use crate::config::RunConfig;
use crate::fixture::SessionFixture;
use crate::page_object::JwtIoPage;
use crate::reporter::{
    millis, ErrorReport, RunReport, ScenarioReport, StepReport, StepStatus, SuiteReport,
};
use crate::result::{ProbeError, ProbeResult};
use crate::surface::JwtSurfaces;
use crate::test_data::TestData;
use crate::wait::WaitOptions;
use chrono::Utc;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

/// What a step does to the page, driving [`ScenarioState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    /// Loads the page (and may check the initial tab)
    Navigate,
    /// Writes form fields or switches tabs
    Populate,
    /// Only observes
    Assert,
    /// Writes then observes
    Mixed,
}

/// Lifecycle of one scenario.
///
/// There is no retry transition; `Passed` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScenarioState {
    /// No step has run
    #[default]
    NotStarted,
    /// Page loaded
    Navigated,
    /// Form fields written since the last assertion
    FormPopulated,
    /// Number of assertion steps passed so far
    Asserted(u32),
    /// Every step passed
    Passed,
    /// A step failed
    Failed,
}

impl ScenarioState {
    /// Whether the state is final
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }

    /// State after a step of `kind` succeeds
    #[must_use]
    pub const fn advance(self, kind: StepKind) -> Self {
        let asserted = match self {
            Self::Asserted(n) => n,
            _ => 0,
        };
        match (self, kind) {
            (Self::Passed | Self::Failed, _) => self,
            (_, StepKind::Navigate) => Self::Navigated,
            (_, StepKind::Populate) => Self::FormPopulated,
            (_, StepKind::Assert | StepKind::Mixed) => Self::Asserted(asserted + 1),
        }
    }

    /// Terminal state once all steps ran or one failed
    #[must_use]
    pub const fn finish(self, passed: bool) -> Self {
        match self {
            Self::Passed | Self::Failed => self,
            _ if passed => Self::Passed,
            _ => Self::Failed,
        }
    }
}

/// Future returned by a step body
pub type StepFuture<'a> = BoxFuture<'a, ProbeResult<()>>;

type StepFn = dyn for<'a> Fn(&'a mut ScenarioContext) -> StepFuture<'a> + Send + Sync;

/// One atomic, named unit of a scenario
#[derive(Clone)]
pub struct Step {
    name: String,
    kind: StepKind,
    action: Arc<StepFn>,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Step {
    /// Create a step
    pub fn new<F>(name: impl Into<String>, kind: StepKind, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut ScenarioContext) -> StepFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            action: Arc::new(action),
        }
    }

    /// Step name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step kind
    #[must_use]
    pub const fn kind(&self) -> StepKind {
        self.kind
    }
}

/// A named, ordered list of steps
#[derive(Debug, Clone)]
pub struct Scenario {
    id: String,
    title: String,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create an empty scenario
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    #[must_use]
    pub fn step<F>(mut self, name: impl Into<String>, kind: StepKind, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut ScenarioContext) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.steps.push(Step::new(name, kind, action));
        self
    }

    /// Scenario id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Scenario title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Steps in order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Whether `pattern` occurs in the id or title (case-insensitive)
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        self.id.to_lowercase().contains(&pattern) || self.title.to_lowercase().contains(&pattern)
    }
}

/// Scenarios sharing a run order
#[derive(Debug, Clone)]
pub struct Suite {
    name: String,
    scenarios: Vec<Scenario>,
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    /// Append a scenario
    #[must_use]
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Suite name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenarios in order
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Get the scenario count
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }
}

/// What a step can touch: the page, the fixture data and values remembered
/// by earlier steps of the same scenario
pub struct ScenarioContext {
    page: Box<dyn JwtSurfaces>,
    data: Arc<TestData>,
    vars: HashMap<String, String>,
    wait: WaitOptions,
}

impl std::fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("vars", &self.vars)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl ScenarioContext {
    /// Create a context over a page
    #[must_use]
    pub fn new(page: Box<dyn JwtSurfaces>, data: Arc<TestData>, wait: WaitOptions) -> Self {
        Self {
            page,
            data,
            vars: HashMap::new(),
            wait,
        }
    }

    /// The page under test
    #[must_use]
    pub fn page(&self) -> &dyn JwtSurfaces {
        &*self.page
    }

    /// Shared fixture data
    #[must_use]
    pub fn data(&self) -> &TestData {
        &self.data
    }

    /// Auto-retrying assertions over the page
    #[must_use]
    pub fn expect(&self) -> Expect<'_> {
        Expect::new(&*self.page, self.wait)
    }

    /// Store a value for later steps
    pub fn remember(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self.vars.insert(key.into(), value.into());
    }

    /// Retrieve a value stored by an earlier step
    pub fn recall(&self, key: &str) -> ProbeResult<String> {
        self.vars
            .get(key)
            .cloned()
            .ok_or_else(|| ProbeError::UnknownValue {
                key: key.to_string(),
            })
    }
}

/// What happens to the rest of the run after a scenario fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Keep running and report every failure
    #[default]
    CollectAll,
    /// Run no further scenarios after the first failure
    StopOnFirst,
}

/// Runs suites scenario by scenario
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    config: Arc<RunConfig>,
    data: Arc<TestData>,
    fixture: SessionFixture,
    failure_mode: FailureMode,
    filter: Option<String>,
    stop: Arc<AtomicBool>,
}

impl SuiteRunner {
    /// Create a runner
    #[must_use]
    pub fn new(config: Arc<RunConfig>, data: Arc<TestData>, fixture: SessionFixture) -> Self {
        let failure_mode = if config.fail_fast {
            FailureMode::StopOnFirst
        } else {
            FailureMode::CollectAll
        };
        Self {
            config,
            data,
            fixture,
            failure_mode,
            filter: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the failure mode
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Run only scenarios whose id or title contains `pattern`
    #[must_use]
    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    fn selected<'s>(&self, suite: &'s Suite) -> impl Iterator<Item = &'s Scenario> + 's {
        let filter = self.filter.clone();
        suite
            .scenarios()
            .iter()
            .filter(move |s| filter.as_deref().map_or(true, |p| s.matches(p)))
    }

    /// Run every selected scenario of a suite in order
    pub async fn run(&self, suite: &Suite) -> SuiteReport {
        let start = Instant::now();
        let mut report = SuiteReport {
            name: suite.name().to_string(),
            ..SuiteReport::default()
        };

        for scenario in self.selected(suite) {
            if self.stop.load(Ordering::SeqCst) {
                report.skipped.push(scenario.id().to_string());
                continue;
            }

            let result = self.run_scenario(suite.name(), scenario).await;
            if !result.passed() && self.failure_mode == FailureMode::StopOnFirst {
                tracing::warn!(scenario = scenario.id(), "stopping run after first failure");
                self.stop.store(true, Ordering::SeqCst);
            }
            report.scenarios.push(result);
        }

        report.duration_ms = millis(start.elapsed());
        report
    }

    /// Run one scenario on its own page session
    pub async fn run_scenario(&self, suite: &str, scenario: &Scenario) -> ScenarioReport {
        let span = tracing::info_span!("scenario", suite, id = scenario.id());
        self.run_scenario_inner(suite, scenario).instrument(span).await
    }

    async fn run_scenario_inner(&self, suite: &str, scenario: &Scenario) -> ScenarioReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut report = ScenarioReport {
            suite: suite.to_string(),
            id: scenario.id().to_string(),
            title: scenario.title().to_string(),
            state: ScenarioState::NotStarted,
            steps: Vec::with_capacity(scenario.steps().len()),
            started_at,
            duration_ms: 0,
            error: None,
            teardown_error: None,
            retain_trace: false,
            screenshot: None,
        };

        let driver = match self.fixture.setup().await {
            Ok(driver) => driver,
            Err(e) => {
                tracing::error!(error = %e, "session setup failed");
                report.steps = scenario
                    .steps()
                    .iter()
                    .map(|s| StepReport::skipped(s.name(), s.kind()))
                    .collect();
                report.error = Some(ErrorReport::from(&e));
                report.state = ScenarioState::Failed;
                report.duration_ms = millis(start.elapsed());
                report.retain_trace = self.config.trace.should_retain(false);
                return report;
            }
        };

        let page = JwtIoPage::new(Arc::clone(&driver), &self.config);
        let mut ctx = ScenarioContext::new(
            Box::new(page),
            Arc::clone(&self.data),
            self.config.expect_wait(),
        );

        let mut state = ScenarioState::NotStarted;
        let step_timeout = self.config.step_timeout();

        for step in scenario.steps() {
            if state == ScenarioState::Failed {
                report.steps.push(StepReport::skipped(step.name(), step.kind()));
                continue;
            }

            let step_start = Instant::now();
            let outcome = match tokio::time::timeout(step_timeout, (step.action)(&mut ctx)).await
            {
                Ok(result) => result,
                Err(_) => Err(ProbeError::timeout(
                    format!("step '{}'", step.name()),
                    millis(step_timeout),
                )),
            };
            let mut step_report = StepReport {
                name: step.name().to_string(),
                kind: step.kind(),
                status: StepStatus::Passed,
                started_ms: millis(step_start.duration_since(start)),
                duration_ms: millis(step_start.elapsed()),
                error: None,
            };

            match outcome {
                Ok(()) => {
                    state = state.advance(step.kind());
                    tracing::debug!(step = step.name(), ?state, "step passed");
                }
                Err(e) => {
                    tracing::warn!(step = step.name(), error = %e, "step failed");
                    let error = ErrorReport::from(&e);
                    step_report.status = StepStatus::Failed;
                    step_report.error = Some(error.clone());
                    report.error = Some(error);
                    state = ScenarioState::Failed;
                }
            }
            report.steps.push(step_report);
        }

        let passed = state != ScenarioState::Failed;
        report.state = state.finish(passed);

        if self.config.screenshot.should_capture(passed) {
            match driver.screenshot().await {
                Ok(shot) => report.screenshot = Some(shot),
                Err(e) => tracing::warn!(error = %e, "screenshot failed"),
            }
        }
        report.retain_trace = self.config.trace.should_retain(passed);

        drop(ctx);
        if let Err(e) = self.fixture.teardown(&*driver, passed).await {
            report.teardown_error = Some(e.to_string());
        }

        report.duration_ms = millis(start.elapsed());
        if passed {
            tracing::info!(duration_ms = report.duration_ms, "scenario passed");
        } else {
            tracing::info!(duration_ms = report.duration_ms, "scenario failed");
        }
        report
    }
}

/// Run suites concurrently, at most `workers` at a time.
///
/// Scenarios inside each suite still run sequentially. Reports come back in
/// the order the suites were given.
pub async fn run_suites(runner: &SuiteRunner, suites: Vec<Suite>) -> RunReport {
    let start = Instant::now();
    let mut report = RunReport::new();
    let workers = runner.config.effective_workers().max(1);
    let permits = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();

    tracing::info!(suites = suites.len(), workers, "starting run");

    for (index, suite) in suites.into_iter().enumerate() {
        let runner = runner.clone();
        let permits = Arc::clone(&permits);
        let span = tracing::info_span!("suite", name = suite.name());
        let _ = tasks.spawn(
            async move {
                let _permit = permits.acquire_owned().await;
                (index, runner.run(&suite).await)
            }
            .instrument(span),
        );
    }

    let mut finished = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => finished.push(result),
            Err(e) => {
                tracing::error!(error = %e, "suite task aborted");
                report.errors.push(format!("suite task aborted: {e}"));
            }
        }
    }
    finished.sort_by_key(|(index, _)| *index);
    report.suites = finished.into_iter().map(|(_, suite)| suite).collect();
    report.duration_ms = millis(start.elapsed());
    report
}
