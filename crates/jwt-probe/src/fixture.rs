//! Session fixtures
//!
//! Every scenario gets a fresh page session from a [`SessionFactory`] and
//! releases it through the [`TeardownHook`]s registered on a
//! [`SessionFixture`]. Hooks run whether the scenario passed or failed, in
//! reverse registration order, so [`ClosePage`] (registered first) runs last.

use crate::driver::PageDriver;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Produces one isolated page session per call
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a new page session
    async fn open(&self) -> ProbeResult<Box<dyn PageDriver>>;

    /// Factory name for logging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Cleanup run after a scenario finishes with its session
#[async_trait]
pub trait TeardownHook: Send + Sync {
    /// Release resources held by the session
    ///
    /// # Errors
    ///
    /// Returns an error if cleanup fails. Remaining hooks still run.
    async fn teardown(&self, session: &dyn PageDriver, passed: bool) -> ProbeResult<()>;

    /// Hook name for logging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Closes the page and its browser context
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosePage;

#[async_trait]
impl TeardownHook for ClosePage {
    async fn teardown(&self, session: &dyn PageDriver, _passed: bool) -> ProbeResult<()> {
        session.close().await
    }

    fn name(&self) -> &str {
        "close-page"
    }
}

/// Session-per-scenario fixture
#[derive(Clone)]
pub struct SessionFixture {
    factory: Arc<dyn SessionFactory>,
    hooks: Vec<Arc<dyn TeardownHook>>,
}

impl std::fmt::Debug for SessionFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFixture")
            .field("factory", &self.factory.name())
            .field(
                "hooks",
                &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SessionFixture {
    /// Create a fixture that closes each page after its scenario
    #[must_use]
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            hooks: vec![Arc::new(ClosePage)],
        }
    }

    /// Create a fixture with no teardown hooks
    #[must_use]
    pub fn bare(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            hooks: Vec::new(),
        }
    }

    /// Register an additional teardown hook
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn TeardownHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Number of registered hooks
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Open a session for one scenario
    pub async fn setup(&self) -> ProbeResult<Arc<dyn PageDriver>> {
        let session = self
            .factory
            .open()
            .await
            .map_err(|e| match e {
                ProbeError::Session { .. } | ProbeError::BrowserLaunch { .. } => e,
                other => ProbeError::Session {
                    message: format!("opening session via {}: {other}", self.factory.name()),
                },
            })?;
        tracing::debug!(factory = self.factory.name(), "session opened");
        Ok(Arc::from(session))
    }

    /// Run every hook against the session, newest first.
    ///
    /// All hooks run even if one fails; the first error is returned.
    pub async fn teardown(&self, session: &dyn PageDriver, passed: bool) -> ProbeResult<()> {
        let mut first_error = None;

        for hook in self.hooks.iter().rev() {
            match hook.teardown(session, passed).await {
                Ok(()) => tracing::debug!(hook = hook.name(), "teardown hook ran"),
                Err(e) => {
                    tracing::warn!(hook = hook.name(), error = %e, "teardown hook failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
