//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a named, lazily resolved reference to zero or more DOM
//! elements. It holds no element identity: every action re-resolves the
//! selector against the live page, waiting up to the locator's timeout for
//! exactly one match when the locator is strict.

use std::fmt;
use std::time::Duration;

/// Default timeout for locator auto-waiting (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for locator auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// XPath expression
    XPath(String),
    /// CSS selector
    Css(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Selector {
    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// The raw selector expression, used in error context
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::XPath(s) | Self::Css(s) | Self::TestId(s) => s,
        }
    }

    /// JavaScript expression evaluating to an array of every matching element
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i)); }} \
                 return out; }})()",
                js_string(s)
            ),
            Self::Css(s) => format!("Array.from(document.querySelectorAll({}))", js_string(s)),
            Self::TestId(id) => format!(
                "Array.from(document.querySelectorAll({}))",
                js_string(&format!("[data-testid=\"{id}\"]"))
            ),
        }
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_all_query())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Css(s) => write!(f, "css={s}"),
            Self::TestId(s) => write!(f, "testid={s}"),
        }
    }
}

/// Encode a string as a JavaScript string literal
pub(crate) fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Locator options for customizing resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
    /// Whether to require a single-element match
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            strict: true,
        }
    }
}

/// A named locator for finding elements on the live page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    name: &'static str,
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a new named locator
    #[must_use]
    pub fn new(name: &'static str, selector: Selector) -> Self {
        Self {
            name,
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Create a named XPath locator
    #[must_use]
    pub fn xpath(name: &'static str, expr: impl Into<String>) -> Self {
        Self::new(name, Selector::xpath(expr))
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Allow or forbid multiple matches
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Locator name, used in logs and error context
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.selector)
    }
}
