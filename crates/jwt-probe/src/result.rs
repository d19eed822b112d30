//! Result and error types for jwt-probe.
//!
//! Errors fall into four classes that the runner reports at scenario
//! granularity: navigation, locator resolution, assertion and fixture data.
//! Browser plumbing and I/O errors sit next to them.

use std::fmt;
use thiserror::Error;

/// Result type for jwt-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the target UI
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page-level error reported by the driver
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("{what} timed out after {ms}ms")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// No element matched the locator within the poll window
    #[error("Locator '{locator}' resolved to no element after {ms}ms (selector: {selector})")]
    LocatorNotFound {
        /// Locator name
        locator: String,
        /// Selector expression
        selector: String,
        /// Poll window in milliseconds
        ms: u64,
    },

    /// A strict locator matched more than one element
    #[error("Locator '{locator}' is ambiguous: {count} elements match (selector: {selector})")]
    LocatorAmbiguous {
        /// Locator name
        locator: String,
        /// Selector expression
        selector: String,
        /// Number of matching elements
        count: usize,
    },

    /// Observed value differs from the expected one
    #[error("{0}")]
    Assertion(AssertionFailure),

    /// Fixture data could not be loaded
    #[error("Fixture data error in {path}: {message}")]
    FixtureData {
        /// Source of the fixture data
        path: String,
        /// Error message
        message: String,
    },

    /// A step recalled a value no earlier step remembered
    #[error("No value remembered under '{key}'")]
    UnknownValue {
        /// Variable name
        key: String,
    },

    /// Session fixture (setup/teardown) failed
    #[error("Session fixture error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(what: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            ms,
        }
    }

    /// Short class name used in reports
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Navigation { .. } | Self::Timeout { .. } => "navigation",
            Self::LocatorNotFound { .. } | Self::LocatorAmbiguous { .. } => "locator",
            Self::Assertion(_) => "assertion",
            Self::FixtureData { .. } | Self::UnknownValue { .. } => "data",
            Self::BrowserLaunch { .. }
            | Self::Page { .. }
            | Self::Session { .. }
            | Self::Screenshot { .. } => "browser",
            Self::Config { .. } | Self::Io(_) | Self::Json(_) | Self::Yaml(_) => "environment",
        }
    }
}

impl From<AssertionFailure> for ProbeError {
    fn from(failure: AssertionFailure) -> Self {
        Self::Assertion(failure)
    }
}

/// Details of a failed assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    /// What was checked (e.g. "decoded payload")
    pub subject: String,
    /// Matcher description (e.g. "to contain text")
    pub matcher: String,
    /// Expected value
    pub expected: String,
    /// Last observed value
    pub actual: String,
}

impl AssertionFailure {
    /// Create a new assertion failure
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        matcher: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            matcher: matcher.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Render an expected/actual diff, one line per side
    #[must_use]
    pub fn diff(&self) -> String {
        let mut out = String::new();
        for line in self.expected.lines() {
            out.push_str(&format!("- {line}\n"));
        }
        if self.expected.is_empty() {
            out.push_str("- \n");
        }
        for line in self.actual.lines() {
            out.push_str(&format!("+ {line}\n"));
        }
        if self.actual.is_empty() {
            out.push_str("+ \n");
        }
        out
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} {}\n  expected: {:?}\n  received: {:?}",
            self.subject, self.matcher, self.expected, self.actual
        )
    }
}
