//! Wait mechanisms.
//!
//! Every suspension point in a scenario goes through [`poll_until`]: a bounded
//! poll-until-ready loop with an explicit timeout and polling interval. The
//! probe always runs at least once, so a zero timeout means "check now".

use crate::result::ProbeResult;
use std::future::Future;
use std::time::{Duration, Instant};

/// Default timeout for wait operations (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default navigation timeout (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
}

impl LoadState {
    /// `document.readyState` values that satisfy this load state
    #[must_use]
    pub const fn ready_states(&self) -> &'static [&'static str] {
        match self {
            Self::Load => &["complete"],
            Self::DomContentLoaded => &["interactive", "complete"],
        }
    }

    /// Whether the given `document.readyState` satisfies this load state
    #[must_use]
    pub fn is_satisfied_by(&self, ready_state: &str) -> bool {
        self.ready_states().contains(&ready_state)
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::DomContentLoaded => write!(f, "domcontentloaded"),
        }
    }
}

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Upper bound on the total wait
    pub timeout: Duration,
    /// Pause between probes
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitOptions {
    /// Create wait options with the given timeout and default interval
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Timeout in whole milliseconds, for error messages
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// What a single probe observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness<T, P> {
    /// The condition holds; stop polling
    Ready(T),
    /// Not yet; carries the latest observation for error reporting
    Pending(P),
}

/// Result of a completed wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T, P> {
    /// The probe reported ready
    Ready {
        /// Value produced by the probe
        value: T,
        /// Time spent waiting
        elapsed: Duration,
        /// Number of probes run
        attempts: u32,
    },
    /// The timeout elapsed first
    TimedOut {
        /// Last observation, if any probe ran
        last: Option<P>,
        /// Time spent waiting
        elapsed: Duration,
        /// Number of probes run
        attempts: u32,
    },
}

impl<T, P> WaitOutcome<T, P> {
    /// Whether the wait succeeded
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Number of probes that ran
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts, .. } | Self::TimedOut { attempts, .. } => *attempts,
        }
    }
}

/// Poll `probe` until it reports ready or `options.timeout` elapses.
///
/// Errors returned by the probe abort the wait immediately; only
/// [`Readiness::Pending`] is retried.
pub async fn poll_until<T, P, F, Fut>(
    options: &WaitOptions,
    mut probe: F,
) -> ProbeResult<WaitOutcome<T, P>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Readiness<T, P>>>,
{
    let start = Instant::now();
    let mut attempts = 0_u32;

    loop {
        attempts += 1;
        let last = match probe().await? {
            Readiness::Ready(value) => {
                return Ok(WaitOutcome::Ready {
                    value,
                    elapsed: start.elapsed(),
                    attempts,
                });
            }
            Readiness::Pending(observed) => observed,
        };

        let elapsed = start.elapsed();
        if elapsed >= options.timeout {
            return Ok(WaitOutcome::TimedOut {
                last: Some(last),
                elapsed,
                attempts,
            });
        }

        let remaining = options.timeout - elapsed;
        tokio::time::sleep(options.poll_interval.min(remaining)).await;
    }
}
