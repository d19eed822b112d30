//! Browser control for headless testing.
//!
//! With the `browser` feature this module launches Chromium through
//! chromiumoxide and hands out one isolated page per scenario. Element work
//! is done by evaluating small scripts built from [`Selector`] queries;
//! keystrokes go through the CDP `Input.insertText` command so reactive
//! editors see one input event per character.

use crate::config::RunConfig;

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1366,
            viewport_height: 768,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Derive browser settings from a run configuration
    #[must_use]
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            headless: config.headless,
            viewport_width: config.viewport.width,
            viewport_height: config.viewport.height,
            chromium_path: config.chromium_path.clone(),
            sandbox: config.sandbox,
        }
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{PageDriver, Screenshot};
    use crate::fixture::SessionFactory;
    use crate::locator::{js_string, Selector};
    use crate::result::{ProbeError, ProbeResult};
    use crate::wait::{poll_until, LoadState, Readiness, WaitOptions, WaitOutcome};
    use async_trait::async_trait;
    use base64::Engine;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
    use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::browser_protocol::target::{
        CreateBrowserContextParams, CreateTargetParams,
    };
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// A launched Chromium instance that opens one isolated page per session
    #[derive(Debug)]
    pub struct ChromiumSessionFactory {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl ChromiumSessionFactory {
        /// Launch a new browser instance
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                });

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(|e| ProbeError::BrowserLaunch {
                message: e.to_string(),
            })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| ProbeError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            tracing::debug!(headless = config.headless, "chromium launched");

            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        ///
        /// # Errors
        ///
        /// Returns error if the browser refuses to close
        pub async fn close(self) -> ProbeResult<()> {
            {
                let mut browser = self.inner.lock().await;
                browser.close().await.map_err(|e| ProbeError::BrowserLaunch {
                    message: e.to_string(),
                })?;
            }
            self.handle.abort();
            Ok(())
        }
    }

    #[async_trait]
    impl SessionFactory for ChromiumSessionFactory {
        async fn open(&self) -> ProbeResult<Box<dyn PageDriver>> {
            let mut browser = self.inner.lock().await;
            let context_id = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .map_err(|e| ProbeError::Session {
                    message: e.to_string(),
                })?;
            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context_id.clone())
                .build()
                .map_err(|message| ProbeError::Session { message })?;
            let page = browser
                .new_page(target)
                .await
                .map_err(|e| ProbeError::page(e.to_string()))?;

            Ok(Box::new(ChromiumDriver {
                page,
                context_id,
                browser: Arc::clone(&self.inner),
            }))
        }
    }

    /// One Chromium page in its own browser context
    pub struct ChromiumDriver {
        page: CdpPage,
        context_id: BrowserContextId,
        browser: Arc<Mutex<CdpBrowser>>,
    }

    impl std::fmt::Debug for ChromiumDriver {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ChromiumDriver")
                .field("context_id", &self.context_id)
                .finish_non_exhaustive()
        }
    }

    impl ChromiumDriver {
        async fn eval<T: DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
            let result = self
                .page
                .evaluate(script)
                .await
                .map_err(|e| ProbeError::page(e.to_string()))?;
            result
                .into_value()
                .map_err(|e| ProbeError::page(e.to_string()))
        }

        /// Run `body` with `el` bound to the first match, or return `null`
        fn on_first(selector: &Selector, body: &str) -> String {
            format!(
                "(() => {{ const el = {}[0]; if (!el) {{ return null; }} {body} }})()",
                selector.to_all_query()
            )
        }

        async fn require<T: DeserializeOwned>(
            &self,
            selector: &Selector,
            body: &str,
        ) -> ProbeResult<T> {
            let value: Option<T> = self.eval(Self::on_first(selector, body)).await?;
            value.ok_or_else(|| ProbeError::page(format!("no element matches {selector}")))
        }
    }

    const SET_VALUE: &str = "el.focus(); \
        const proto = Object.getPrototypeOf(el); \
        const desc = Object.getOwnPropertyDescriptor(proto, 'value'); \
        if (desc && desc.set) { desc.set.call(el, VALUE); } else { el.value = VALUE; } \
        el.dispatchEvent(new Event('input', { bubbles: true })); \
        el.dispatchEvent(new Event('change', { bubbles: true })); \
        return true;";

    #[async_trait]
    impl PageDriver for ChromiumDriver {
        async fn goto(
            &self,
            url: &str,
            wait_until: LoadState,
            timeout: Duration,
        ) -> ProbeResult<()> {
            let navigation_error = |message: String| ProbeError::Navigation {
                url: url.to_string(),
                message,
            };

            let started = tokio::time::Instant::now();
            tokio::time::timeout(timeout, self.page.goto(url))
                .await
                .map_err(|_| {
                    navigation_error(format!("page did not respond within {}ms", timeout.as_millis()))
                })?
                .map_err(|e| navigation_error(e.to_string()))?;

            let remaining = timeout.saturating_sub(started.elapsed());
            let outcome = poll_until(&WaitOptions::new(remaining), || async move {
                let state: String = self.eval("document.readyState".to_string()).await?;
                if wait_until.is_satisfied_by(&state) {
                    Ok(Readiness::Ready(()))
                } else {
                    Ok(Readiness::Pending(state))
                }
            })
            .await?;

            match outcome {
                WaitOutcome::Ready { .. } => Ok(()),
                WaitOutcome::TimedOut { last, .. } => Err(navigation_error(format!(
                    "load state '{wait_until}' not reached within {}ms (readyState: {})",
                    timeout.as_millis(),
                    last.unwrap_or_default()
                ))),
            }
        }

        async fn count(&self, selector: &Selector) -> ProbeResult<usize> {
            self.eval(selector.to_count_query()).await
        }

        async fn attribute(&self, selector: &Selector, name: &str) -> ProbeResult<Option<String>> {
            self.eval(Self::on_first(
                selector,
                &format!("return el.getAttribute({});", js_string(name)),
            ))
            .await
        }

        async fn text_content(&self, selector: &Selector) -> ProbeResult<Option<String>> {
            self.eval(Self::on_first(selector, "return el.textContent || '';"))
                .await
        }

        async fn input_value(&self, selector: &Selector) -> ProbeResult<String> {
            self.require(selector, "return el.value ?? '';").await
        }

        async fn click(&self, selector: &Selector) -> ProbeResult<()> {
            let _: bool = self
                .require(
                    selector,
                    "el.scrollIntoView({ block: 'center' }); el.click(); return true;",
                )
                .await?;
            Ok(())
        }

        async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
            let body = SET_VALUE.replace("VALUE", &js_string(text));
            let _: bool = self.require(selector, &body).await?;
            Ok(())
        }

        async fn type_text(
            &self,
            selector: &Selector,
            text: &str,
            delay: Duration,
        ) -> ProbeResult<()> {
            let _: bool = self.require(selector, "el.focus(); return true;").await?;
            for (i, ch) in text.chars().enumerate() {
                if i > 0 {
                    tokio::time::sleep(delay).await;
                }
                self.page
                    .execute(InsertTextParams::new(ch.to_string()))
                    .await
                    .map_err(|e| ProbeError::page(e.to_string()))?;
            }
            Ok(())
        }

        async fn screenshot(&self) -> ProbeResult<Screenshot> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let shot = self
                .page
                .execute(params)
                .await
                .map_err(|e| ProbeError::Screenshot {
                    message: e.to_string(),
                })?;

            let data = base64::engine::general_purpose::STANDARD
                .decode(&shot.data)
                .map_err(|e| ProbeError::Screenshot {
                    message: e.to_string(),
                })?;
            Ok(Screenshot::new(data))
        }

        async fn current_url(&self) -> ProbeResult<String> {
            let url = self
                .page
                .url()
                .await
                .map_err(|e| ProbeError::page(e.to_string()))?;
            Ok(url.unwrap_or_default())
        }

        async fn close(&self) -> ProbeResult<()> {
            self.page
                .clone()
                .close()
                .await
                .map_err(|e| ProbeError::page(e.to_string()))?;
            let mut browser = self.browser.lock().await;
            browser
                .dispose_browser_context(self.context_id.clone())
                .await
                .map_err(|e| ProbeError::Session {
                    message: e.to_string(),
                })?;
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumSessionFactory};
