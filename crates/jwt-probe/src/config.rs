//! Run configuration
//!
//! One declarative record consumed once at process start. Loaded from YAML;
//! every field has a default so a partial file is valid.

use crate::result::{ProbeError, ProbeResult};
use crate::wait::{
    WaitOptions, DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
        }
    }
}

/// When to capture a screenshot at the end of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenshotPolicy {
    /// Every scenario
    #[default]
    On,
    /// Never
    Off,
    /// Failed scenarios only
    OnlyOnFailure,
}

impl ScreenshotPolicy {
    /// Whether a scenario with the given outcome gets a screenshot
    #[must_use]
    pub const fn should_capture(self, passed: bool) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::OnlyOnFailure => !passed,
        }
    }
}

/// When to keep a step trace for a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TracePolicy {
    /// Every scenario
    #[default]
    On,
    /// Never
    Off,
    /// Failed scenarios only
    RetainOnFailure,
}

impl TracePolicy {
    /// Whether a scenario with the given outcome keeps its trace
    #[must_use]
    pub const fn should_retain(self, passed: bool) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::RetainOnFailure => !passed,
        }
    }
}

/// Global per-run settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Address of the application under test
    pub base_url: String,
    /// Per-step timeout in milliseconds
    pub timeout_ms: u64,
    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
    /// Auto-retrying assertion timeout in milliseconds
    pub expect_timeout_ms: u64,
    /// Polling interval for locators and assertions
    pub poll_interval_ms: u64,
    /// Pause between keystrokes for paced typing
    pub keystroke_delay_ms: u64,
    /// Browser viewport
    pub viewport: Viewport,
    /// Run the browser without a window
    pub headless: bool,
    /// Chromium sandbox (disable in containers)
    pub sandbox: bool,
    /// Path to the Chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Run independent suites in parallel
    pub fully_parallel: bool,
    /// Maximum suites in flight (0 = available parallelism)
    pub workers: usize,
    /// Stop after the first failed scenario
    pub fail_fast: bool,
    /// Screenshot capture policy
    pub screenshot: ScreenshotPolicy,
    /// Step trace policy
    pub trace: TracePolicy,
    /// Directory receiving the HTML/JUnit reports and artifacts
    pub report_dir: PathBuf,
    /// Fixture data file (None = built-in data)
    pub data_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: "https://jwt.io/".to_string(),
            timeout_ms: 30_000,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            expect_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            keystroke_delay_ms: 50,
            viewport: Viewport::default(),
            headless: true,
            sandbox: true,
            chromium_path: None,
            fully_parallel: true,
            workers: 0,
            fail_fast: false,
            screenshot: ScreenshotPolicy::On,
            trace: TracePolicy::On,
            report_dir: PathBuf::from("reports"),
            data_path: None,
        }
    }
}

impl RunConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document and validate it
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| ProbeError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| ProbeError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> ProbeResult<()> {
        let invalid = |message: String| Err(ProbeError::Config { message });

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return invalid(format!(
                "base_url must be an http(s) address, got {:?}",
                self.base_url
            ));
        }
        if self.timeout_ms == 0 || self.navigation_timeout_ms == 0 || self.expect_timeout_ms == 0
        {
            return invalid("timeouts must be greater than zero".to_string());
        }
        if self.poll_interval_ms == 0 {
            return invalid("poll_interval_ms must be greater than zero".to_string());
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return invalid("viewport dimensions must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the report directory
    #[must_use]
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = dir.into();
        self
    }

    /// Set the per-step timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set the assertion timeout
    #[must_use]
    pub const fn with_expect_timeout_ms(mut self, ms: u64) -> Self {
        self.expect_timeout_ms = ms;
        self
    }

    /// Set the keystroke delay
    #[must_use]
    pub const fn with_keystroke_delay_ms(mut self, ms: u64) -> Self {
        self.keystroke_delay_ms = ms;
        self
    }

    /// Set fail fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the number of parallel suite workers
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set screenshot policy
    #[must_use]
    pub const fn with_screenshot(mut self, policy: ScreenshotPolicy) -> Self {
        self.screenshot = policy;
        self
    }

    /// Set trace policy
    #[must_use]
    pub const fn with_trace(mut self, policy: TracePolicy) -> Self {
        self.trace = policy;
        self
    }

    /// Per-step timeout
    #[must_use]
    pub const fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Navigation timeout
    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Keystroke pacing for the encoder secret
    #[must_use]
    pub const fn keystroke_delay(&self) -> Duration {
        Duration::from_millis(self.keystroke_delay_ms)
    }

    /// Wait options for auto-retrying assertions
    #[must_use]
    pub const fn expect_wait(&self) -> WaitOptions {
        WaitOptions::new(Duration::from_millis(self.expect_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }

    /// Get effective number of parallel suite workers
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if !self.fully_parallel {
            1
        } else if self.workers == 0 {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        } else {
            self.workers
        }
    }
}
