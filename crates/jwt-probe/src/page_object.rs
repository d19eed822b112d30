//! Page object for the JWT encoder/decoder site.
//!
//! [`JwtIoPage`] is the only place that knows the site's DOM. It implements
//! the capability traits in [`crate::surface`] on top of a [`PageDriver`],
//! resolving every locator lazily, at the moment an action runs.

use crate::config::RunConfig;
use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::surface::{
    Banner, FormSurface, Navigable, NotificationSurface, SecretVariant, SignatureState, TabSurface,
};
use crate::wait::{poll_until, LoadState, Readiness, WaitOptions, WaitOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for page objects representing a page of the UI
pub trait PageObject {
    /// Path of the page relative to the base URL
    fn url_pattern(&self) -> &str;

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// XPath expressions for the site's elements
pub mod selectors {
    /// Decoder tab; `data-active="true"` when selected
    pub const DECODER_TAB: &str = r#"//li[@data-testid="decoder-tab"]"#;
    /// Encoder tab; `data-active="true"` when selected
    pub const ENCODER_TAB: &str = r#"//li[@data-testid="encoder-tab"]"#;
    /// Decoder's encoded value editor
    pub const ENCODED_VALUE: &str = "//*[contains(@class,'npm__react-simple-code-editor__textarea')]";
    /// Decoded header JSON
    pub const DECODED_HEADER: &str = "//*[@data-testid='decoder__header__json']";
    /// Decoded payload JSON
    pub const DECODED_PAYLOAD: &str = "//*[@data-testid='decoder__payload__json']";
    /// Decoder secret input
    pub const DECODER_SECRET: &str =
        "//div[contains(@data-testid,'decoder__se')]/following-sibling::div[1]//textarea";
    /// Encoder header JSON editor
    pub const ENCODER_HEADER: &str = "//div[@data-testid='encoder__header__json']//textarea";
    /// Encoder payload JSON editor
    pub const ENCODER_PAYLOAD: &str = "//div[@data-testid='encoder__payload__json']//textarea";
    /// Encoder secret input
    pub const ENCODER_SECRET: &str =
        "//div[contains(@data-testid,'encoder__se')]/following-sibling::div[1]//textarea";
    /// Encoder output token
    pub const GENERATED_TOKEN: &str = "//*[@data-testid='encoder__jwt__output']";
    /// "Invalid Signature" banner
    pub const INVALID_SIGNATURE: &str =
        r#"//*[@data-testid="decoder__jwtEditor___notificationBar__error"]"#;
    /// "Signature Verified" banner
    pub const SIGNATURE_VERIFIED: &str =
        r#"//*[@data-testid="decoder__jwtEditor___notificationBar__success"]"#;
}

/// The site's home page
pub struct JwtIoPage {
    driver: Arc<dyn PageDriver>,
    base_url: String,
    navigation_timeout: Duration,
    locator_wait: WaitOptions,
    keystroke_delay: Duration,
}

impl std::fmt::Debug for JwtIoPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIoPage")
            .field("base_url", &self.base_url)
            .field("navigation_timeout", &self.navigation_timeout)
            .field("locator_wait", &self.locator_wait)
            .field("keystroke_delay", &self.keystroke_delay)
            .finish_non_exhaustive()
    }
}

impl PageObject for JwtIoPage {
    fn url_pattern(&self) -> &str {
        "/"
    }

    fn page_name(&self) -> &str {
        "jwt.io home"
    }
}

impl JwtIoPage {
    /// Wrap a page session using the run's timeouts
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, config: &RunConfig) -> Self {
        Self {
            driver,
            base_url: config.base_url.clone(),
            navigation_timeout: config.navigation_timeout(),
            locator_wait: config.expect_wait(),
            keystroke_delay: config.keystroke_delay(),
        }
    }

    /// Override how long locators wait for their element
    #[must_use]
    pub const fn with_locator_wait(mut self, wait: WaitOptions) -> Self {
        self.locator_wait = wait;
        self
    }

    /// Override the pause between typed characters
    #[must_use]
    pub const fn with_keystroke_delay(mut self, delay: Duration) -> Self {
        self.keystroke_delay = delay;
        self
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// Absolute URL of this page
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.url_pattern().trim_start_matches('/')
        )
    }

    fn locator(&self, name: &'static str, xpath: &str) -> Locator {
        Locator::xpath(name, xpath)
            .with_timeout(self.locator_wait.timeout)
            .with_poll_interval(self.locator_wait.poll_interval)
    }

    fn banner_locator(&self, banner: Banner) -> Locator {
        match banner {
            Banner::InvalidSignature => {
                self.locator("invalid_signature", selectors::INVALID_SIGNATURE)
            }
            Banner::SignatureVerified => {
                self.locator("signature_verified", selectors::SIGNATURE_VERIFIED)
            }
        }
    }

    /// Wait until the locator matches an element.
    ///
    /// A strict locator matching several elements fails immediately.
    async fn resolve(&self, locator: &Locator) -> ProbeResult<()> {
        let options = WaitOptions::new(locator.options().timeout)
            .with_poll_interval(locator.options().poll_interval);
        let selector = locator.selector();

        let outcome = poll_until(&options, || async move {
            let count = self.driver.count(selector).await?;
            match count {
                0 => Ok(Readiness::Pending(count)),
                1 => Ok(Readiness::Ready(())),
                _ if locator.options().strict => Err(ProbeError::LocatorAmbiguous {
                    locator: locator.name().to_string(),
                    selector: selector.expression().to_string(),
                    count,
                }),
                _ => Ok(Readiness::Ready(())),
            }
        })
        .await?;

        match outcome {
            WaitOutcome::Ready { attempts, .. } => {
                tracing::trace!(locator = locator.name(), attempts, "locator resolved");
                Ok(())
            }
            WaitOutcome::TimedOut { .. } => Err(ProbeError::LocatorNotFound {
                locator: locator.name().to_string(),
                selector: selector.expression().to_string(),
                ms: options.timeout_ms(),
            }),
        }
    }

    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        self.resolve(locator).await?;
        tracing::debug!(locator = locator.name(), chars = text.chars().count(), "fill");
        self.driver.fill(locator.selector(), text).await
    }

    async fn read_text(&self, locator: &Locator) -> ProbeResult<String> {
        self.resolve(locator).await?;
        Ok(self
            .driver
            .text_content(locator.selector())
            .await?
            .unwrap_or_default())
    }

    async fn is_tab_active(&self, locator: &Locator) -> ProbeResult<bool> {
        match self.resolve(locator).await {
            Ok(()) => {}
            Err(ProbeError::LocatorNotFound { .. }) => {
                tracing::debug!(locator = locator.name(), "tab not found, reading as inactive");
                return Ok(false);
            }
            Err(e) => return Err(e),
        }
        let active = self
            .driver
            .attribute(locator.selector(), "data-active")
            .await?;
        Ok(active.as_deref() == Some("true"))
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.resolve(locator).await?;
        tracing::debug!(locator = locator.name(), "click");
        self.driver.click(locator.selector()).await
    }
}

#[async_trait]
impl Navigable for JwtIoPage {
    async fn navigate(&self) -> ProbeResult<()> {
        let url = self.url();
        tracing::info!(%url, page = self.page_name(), "navigate");
        self.driver
            .goto(&url, LoadState::Load, self.navigation_timeout)
            .await
            .map_err(|e| match e {
                ProbeError::Navigation { .. } => e,
                other => ProbeError::Navigation {
                    url,
                    message: other.to_string(),
                },
            })
    }
}

#[async_trait]
impl TabSurface for JwtIoPage {
    async fn is_decoder_tab_active(&self) -> ProbeResult<bool> {
        self.is_tab_active(&self.locator("decoder_tab", selectors::DECODER_TAB))
            .await
    }

    async fn is_encoder_tab_active(&self) -> ProbeResult<bool> {
        self.is_tab_active(&self.locator("encoder_tab", selectors::ENCODER_TAB))
            .await
    }

    async fn click_decoder_tab(&self) -> ProbeResult<()> {
        self.click(&self.locator("decoder_tab", selectors::DECODER_TAB))
            .await
    }

    async fn click_encoder_tab(&self) -> ProbeResult<()> {
        self.click(&self.locator("encoder_tab", selectors::ENCODER_TAB))
            .await
    }
}

#[async_trait]
impl FormSurface for JwtIoPage {
    async fn fill_encoded_value(&self, token: &str) -> ProbeResult<()> {
        self.fill(&self.locator("encoded_value", selectors::ENCODED_VALUE), token)
            .await
    }

    async fn fill_secret(&self, secret: &str, variant: SecretVariant) -> ProbeResult<()> {
        match variant {
            SecretVariant::Decoder => {
                self.fill(
                    &self.locator("decoder_secret", selectors::DECODER_SECRET),
                    secret,
                )
                .await
            }
            SecretVariant::Encoder => {
                // The encoder re-signs on every input event; typing keeps it in step.
                let locator = self.locator("encoder_secret", selectors::ENCODER_SECRET);
                self.fill(&locator, "").await?;
                self.driver
                    .type_text(locator.selector(), secret, self.keystroke_delay)
                    .await
            }
        }
    }

    async fn fill_header_json(&self, json: &str) -> ProbeResult<()> {
        self.fill(&self.locator("encoder_header", selectors::ENCODER_HEADER), json)
            .await
    }

    async fn fill_payload_json(&self, json: &str) -> ProbeResult<()> {
        self.fill(
            &self.locator("encoder_payload", selectors::ENCODER_PAYLOAD),
            json,
        )
        .await
    }

    async fn read_encoded_value(&self) -> ProbeResult<String> {
        let locator = self.locator("encoded_value", selectors::ENCODED_VALUE);
        self.resolve(&locator).await?;
        self.driver.input_value(locator.selector()).await
    }

    async fn read_decoded_payload_text(&self) -> ProbeResult<String> {
        self.read_text(&self.locator("decoded_payload", selectors::DECODED_PAYLOAD))
            .await
    }

    async fn read_decoded_header_text(&self) -> ProbeResult<String> {
        self.read_text(&self.locator("decoded_header", selectors::DECODED_HEADER))
            .await
    }

    async fn read_generated_token(&self) -> ProbeResult<String> {
        let text = self
            .read_text(&self.locator("generated_token", selectors::GENERATED_TOKEN))
            .await?;
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl NotificationSurface for JwtIoPage {
    async fn read_banner(&self, banner: Banner) -> ProbeResult<String> {
        self.read_text(&self.banner_locator(banner)).await
    }

    async fn signature_state(&self) -> ProbeResult<SignatureState> {
        let verified = self.banner_locator(Banner::SignatureVerified);
        let invalid = self.banner_locator(Banner::InvalidSignature);
        if self.driver.count(verified.selector()).await? > 0 {
            Ok(SignatureState::Verified)
        } else if self.driver.count(invalid.selector()).await? > 0 {
            Ok(SignatureState::Invalid)
        } else {
            Ok(SignatureState::Unknown)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::Selector;
    use crate::surface::JwtSurfaces;

    fn quick() -> WaitOptions {
        WaitOptions::new(Duration::from_millis(30)).with_poll_interval(Duration::from_millis(5))
    }

    fn page_with(driver: MockDriver) -> (Arc<MockDriver>, JwtIoPage) {
        let driver = Arc::new(driver);
        let page = JwtIoPage::new(driver.clone(), &RunConfig::default())
            .with_locator_wait(quick())
            .with_keystroke_delay(Duration::from_millis(50));
        (driver, page)
    }

    fn xp(expr: &str) -> Selector {
        Selector::xpath(expr)
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_loads_root() {
            let (driver, page) = page_with(MockDriver::new());
            page.navigate().await.unwrap();
            assert_eq!(driver.history(), vec!["goto:https://jwt.io/:load".to_string()]);
        }

        #[test]
        fn test_url_joins_base_and_path() {
            let config = RunConfig::default().with_base_url("http://localhost:8080");
            let page = JwtIoPage::new(Arc::new(MockDriver::new()), &config);
            assert_eq!(page.url(), "http://localhost:8080/");
            assert_eq!(page.page_name(), "jwt.io home");
        }
    }

    mod tab_tests {
        use super::*;

        #[tokio::test]
        async fn test_decoder_tab_active() {
            let driver = MockDriver::new().with_element(
                &xp(selectors::DECODER_TAB),
                MockElement::single().with_attribute("data-active", "true"),
            );
            let (_, page) = page_with(driver);
            assert!(page.is_decoder_tab_active().await.unwrap());
        }

        #[tokio::test]
        async fn test_missing_attribute_is_inactive() {
            let driver =
                MockDriver::new().with_element(&xp(selectors::ENCODER_TAB), MockElement::single());
            let (_, page) = page_with(driver);
            assert!(!page.is_encoder_tab_active().await.unwrap());
        }

        #[tokio::test]
        async fn test_missing_tab_is_inactive() {
            let (_, page) = page_with(MockDriver::new());
            assert!(!page.is_decoder_tab_active().await.unwrap());
        }

        #[tokio::test]
        async fn test_click_encoder_tab() {
            let driver =
                MockDriver::new().with_element(&xp(selectors::ENCODER_TAB), MockElement::single());
            let (driver, page) = page_with(driver);
            page.click_encoder_tab().await.unwrap();
            assert!(driver.was_called(&format!("click:{}", selectors::ENCODER_TAB)));
        }
    }

    mod form_tests {
        use super::*;

        #[tokio::test]
        async fn test_encoded_value_round_trip() {
            let driver = MockDriver::new()
                .with_element(&xp(selectors::ENCODED_VALUE), MockElement::single());
            let (_, page) = page_with(driver);
            page.fill_encoded_value("a.b.c").await.unwrap();
            assert_eq!(page.read_encoded_value().await.unwrap(), "a.b.c");
        }

        #[tokio::test]
        async fn test_encoder_secret_is_typed_per_keystroke() {
            let sel = xp(selectors::ENCODER_SECRET);
            let driver =
                MockDriver::new().with_element(&sel, MockElement::single().with_count(1));
            let (driver, page) = page_with(driver);
            page.fill_secret("xyz", SecretVariant::Encoder).await.unwrap();

            let history = driver.history();
            assert_eq!(history[0], format!("fill:{}:", selectors::ENCODER_SECRET));
            let typed: Vec<_> = history.iter().filter(|c| c.starts_with("type:")).collect();
            assert_eq!(typed.len(), 3);
            assert!(typed.iter().all(|c| c.ends_with(":50ms")));
            assert_eq!(driver.element(&sel).unwrap().value, "xyz");
        }

        #[tokio::test]
        async fn test_decoder_secret_is_one_write() {
            let driver = MockDriver::new()
                .with_element(&xp(selectors::DECODER_SECRET), MockElement::single());
            let (driver, page) = page_with(driver);
            page.fill_secret("s3cret", SecretVariant::Decoder)
                .await
                .unwrap();
            assert_eq!(driver.history().len(), 1);
            assert!(!driver.was_called("type:"));
        }

        #[tokio::test]
        async fn test_blank_payload_reads_empty() {
            let driver = MockDriver::new()
                .with_element(&xp(selectors::DECODED_PAYLOAD), MockElement::single());
            let (_, page) = page_with(driver);
            assert_eq!(page.read_decoded_payload_text().await.unwrap(), "");
        }

        #[tokio::test]
        async fn test_generated_token_is_trimmed() {
            let driver = MockDriver::new().with_element(
                &xp(selectors::GENERATED_TOKEN),
                MockElement::single().with_text("  a.b.c\n"),
            );
            let (_, page) = page_with(driver);
            assert_eq!(page.read(crate::surface::Surface::GeneratedToken).await.unwrap(), "a.b.c");
        }
    }

    mod resolution_tests {
        use super::*;

        #[tokio::test]
        async fn test_missing_element_is_locator_not_found() {
            let (_, page) = page_with(MockDriver::new());
            let err = page.fill_header_json("{}").await.unwrap_err();
            match err {
                ProbeError::LocatorNotFound { locator, ms, .. } => {
                    assert_eq!(locator, "encoder_header");
                    assert_eq!(ms, 30);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_ambiguous_match_fails_fast() {
            let driver = MockDriver::new().with_element(
                &xp(selectors::ENCODED_VALUE),
                MockElement::single().with_count(2),
            );
            let (_, page) = page_with(driver);
            let err = page.read_encoded_value().await.unwrap_err();
            assert!(matches!(err, ProbeError::LocatorAmbiguous { count: 2, .. }));
        }

        #[tokio::test]
        async fn test_element_appearing_late_is_found() {
            let sel = xp(selectors::DECODED_HEADER);
            let driver = Arc::new(MockDriver::new());
            let page = JwtIoPage::new(driver.clone(), &RunConfig::default()).with_locator_wait(
                WaitOptions::new(Duration::from_secs(2))
                    .with_poll_interval(Duration::from_millis(5)),
            );
            let late = driver.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                late.set_element(&sel, MockElement::single().with_text("{\"alg\": \"HS256\"}"));
            });
            let text = page.read_decoded_header_text().await.unwrap();
            handle.await.unwrap();
            assert!(text.contains("HS256"));
        }
    }

    mod notification_tests {
        use super::*;

        #[tokio::test]
        async fn test_read_banner() {
            let driver = MockDriver::new().with_element(
                &xp(selectors::INVALID_SIGNATURE),
                MockElement::single().with_text("Invalid Signature"),
            );
            let (_, page) = page_with(driver);
            assert_eq!(
                page.read_banner(Banner::InvalidSignature).await.unwrap(),
                "Invalid Signature"
            );
        }

        #[tokio::test]
        async fn test_signature_state() {
            let (driver, page) = page_with(MockDriver::new());
            assert_eq!(page.signature_state().await.unwrap(), SignatureState::Unknown);
            driver.set_element(&xp(selectors::SIGNATURE_VERIFIED), MockElement::single());
            assert_eq!(page.signature_state().await.unwrap(), SignatureState::Verified);
        }
    }
}
