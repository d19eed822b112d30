//! PageDriver - abstract browser page trait
//!
//! The page abstraction talks to the browser only through [`PageDriver`].
//! `ChromiumDriver` (feature `browser`) speaks CDP through chromiumoxide;
//! [`MockDriver`] is an in-memory element table for unit tests.
//!
//! Element operations act on the first element matching the selector.
//! Strictness and auto-waiting live one layer up, in the page object.

use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Timestamp when screenshot was taken
    pub timestamp: SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if screenshot has data
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Abstract driver trait for one browser page
#[async_trait]
pub trait PageDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to URL and wait for the load state, bounded by `timeout`
    async fn goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> ProbeResult<()>;

    /// Number of elements currently matching the selector
    async fn count(&self, selector: &Selector) -> ProbeResult<usize>;

    /// Attribute of the first match; `None` if the element or attribute is missing
    async fn attribute(&self, selector: &Selector, name: &str) -> ProbeResult<Option<String>>;

    /// `textContent` of the first match; `None` if no element matches
    async fn text_content(&self, selector: &Selector) -> ProbeResult<Option<String>>;

    /// `value` of the first matching form control
    async fn input_value(&self, selector: &Selector) -> ProbeResult<String>;

    /// Click the first match
    async fn click(&self, selector: &Selector) -> ProbeResult<()>;

    /// Replace the value of the first match in one write
    async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()>;

    /// Type `text` one character at a time, pausing `delay` between keystrokes
    async fn type_text(&self, selector: &Selector, text: &str, delay: Duration)
        -> ProbeResult<()>;

    /// Take a PNG screenshot of the viewport
    async fn screenshot(&self) -> ProbeResult<Screenshot>;

    /// Current page URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Close the page
    async fn close(&self) -> ProbeResult<()>;
}

/// Element state held by [`MockDriver`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// How many DOM nodes the selector matches
    pub count: usize,
    /// Text content
    pub text: Option<String>,
    /// Form value
    pub value: String,
    /// Attributes
    pub attributes: HashMap<String, String>,
}

impl MockElement {
    /// A single element with no content
    #[must_use]
    pub fn single() -> Self {
        Self {
            count: 1,
            ..Self::default()
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the match count
    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// Mock driver for unit testing
///
/// Elements are keyed by selector expression. Every call is recorded.
#[derive(Debug, Default)]
pub struct MockDriver {
    elements: Mutex<HashMap<String, MockElement>>,
    url: Mutex<String>,
    history: Mutex<Vec<String>>,
    screenshot: Option<Screenshot>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element under a selector
    #[must_use]
    pub fn with_element(self, selector: &Selector, element: MockElement) -> Self {
        self.set_element(selector, element);
        self
    }

    /// Set the screenshot returned by [`PageDriver::screenshot`]
    #[must_use]
    pub fn with_screenshot(mut self, screenshot: Screenshot) -> Self {
        self.screenshot = Some(screenshot);
        self
    }

    /// Replace an element
    pub fn set_element(&self, selector: &Selector, element: MockElement) {
        let _ = lock(&self.elements).insert(selector.expression().to_string(), element);
    }

    /// Current state of an element
    #[must_use]
    pub fn element(&self, selector: &Selector) -> Option<MockElement> {
        lock(&self.elements).get(selector.expression()).cloned()
    }

    /// Recorded calls, in order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }

    /// Check if a call with the given prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        lock(&self.history).iter().any(|c| c.starts_with(prefix))
    }

    fn record(&self, call: String) {
        lock(&self.history).push(call);
    }

    fn with_present<R>(
        &self,
        selector: &Selector,
        f: impl FnOnce(&mut MockElement) -> R,
    ) -> ProbeResult<R> {
        let mut elements = lock(&self.elements);
        match elements.get_mut(selector.expression()) {
            Some(el) if el.count > 0 => Ok(f(el)),
            _ => Err(ProbeError::page(format!("no element matches {selector}"))),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str, wait_until: LoadState, _timeout: Duration) -> ProbeResult<()> {
        self.record(format!("goto:{url}:{wait_until}"));
        *lock(&self.url) = url.to_string();
        Ok(())
    }

    async fn count(&self, selector: &Selector) -> ProbeResult<usize> {
        Ok(lock(&self.elements)
            .get(selector.expression())
            .map_or(0, |e| e.count))
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> ProbeResult<Option<String>> {
        Ok(lock(&self.elements)
            .get(selector.expression())
            .filter(|e| e.count > 0)
            .and_then(|e| e.attributes.get(name).cloned()))
    }

    async fn text_content(&self, selector: &Selector) -> ProbeResult<Option<String>> {
        Ok(lock(&self.elements)
            .get(selector.expression())
            .filter(|e| e.count > 0)
            .map(|e| e.text.clone().unwrap_or_default()))
    }

    async fn input_value(&self, selector: &Selector) -> ProbeResult<String> {
        self.with_present(selector, |e| e.value.clone())
    }

    async fn click(&self, selector: &Selector) -> ProbeResult<()> {
        self.with_present(selector, |_| ())?;
        self.record(format!("click:{}", selector.expression()));
        Ok(())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
        self.with_present(selector, |e| e.value = text.to_string())?;
        self.record(format!("fill:{}:{text}", selector.expression()));
        Ok(())
    }

    async fn type_text(
        &self,
        selector: &Selector,
        text: &str,
        delay: Duration,
    ) -> ProbeResult<()> {
        for ch in text.chars() {
            self.with_present(selector, |e| e.value.push(ch))?;
            self.record(format!(
                "type:{}:{ch}:{}ms",
                selector.expression(),
                delay.as_millis()
            ));
        }
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Screenshot> {
        self.screenshot
            .clone()
            .ok_or_else(|| ProbeError::Screenshot {
                message: "No mock screenshot set".to_string(),
            })
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(lock(&self.url).clone())
    }

    async fn close(&self) -> ProbeResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}
