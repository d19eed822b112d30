//! Assertions
//!
//! [`Expect`] retries against a live [`Surface`] until the matcher holds or
//! the expect timeout elapses, then fails with the last observed value.
//! `check_*` functions judge values a step has already read.

use crate::result::{AssertionFailure, ProbeResult};
use crate::surface::{JwtSurfaces, Surface};
use crate::token::segment_count;
use crate::wait::{poll_until, Readiness, WaitOptions, WaitOutcome};
use std::fmt::Debug;

/// Collapse runs of whitespace and trim, the way rendered text is compared
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Auto-retrying assertions over the page
#[derive(Clone, Copy)]
pub struct Expect<'a> {
    page: &'a dyn JwtSurfaces,
    wait: WaitOptions,
}

impl Debug for Expect<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expect").field("wait", &self.wait).finish_non_exhaustive()
    }
}

impl<'a> Expect<'a> {
    /// Create assertions over `page`, retrying within `wait`
    #[must_use]
    pub const fn new(page: &'a dyn JwtSurfaces, wait: WaitOptions) -> Self {
        Self { page, wait }
    }

    /// Text equals `expected` after whitespace normalization
    pub async fn to_have_text(&self, surface: Surface, expected: &str) -> ProbeResult<String> {
        let want = normalize_whitespace(expected);
        self.poll(surface, "to have text", expected, |text| {
            normalize_whitespace(text) == want
        })
        .await
    }

    /// Text contains `expected`
    pub async fn to_contain_text(&self, surface: Surface, expected: &str) -> ProbeResult<String> {
        self.poll(surface, "to contain text", expected, |text| {
            text.contains(expected)
        })
        .await
    }

    /// Text is empty or blank
    pub async fn to_be_empty(&self, surface: Surface) -> ProbeResult<String> {
        self.poll(surface, "to be empty", "", |text| text.trim().is_empty())
            .await
    }

    /// Text is a token with exactly `count` segments
    pub async fn to_have_segments(&self, surface: Surface, count: usize) -> ProbeResult<String> {
        self.poll(
            surface,
            "to have segments",
            &count.to_string(),
            |text| segment_count(text) == count,
        )
        .await
    }

    /// Text is non-empty and differs from `previous`
    pub async fn to_differ_from(&self, surface: Surface, previous: &str) -> ProbeResult<String> {
        self.poll(surface, "to differ from", previous, |text| {
            !text.trim().is_empty() && text != previous
        })
        .await
    }

    async fn poll<F>(
        &self,
        surface: Surface,
        matcher: &str,
        expected: &str,
        matches: F,
    ) -> ProbeResult<String>
    where
        F: Fn(&str) -> bool + Send + Sync,
    {
        let page = self.page;
        let matches = &matches;

        let outcome = poll_until(&self.wait, || async move {
            let text = page.read(surface).await?;
            if matches(&text) {
                Ok(Readiness::Ready(text))
            } else {
                Ok(Readiness::Pending(text))
            }
        })
        .await?;

        match outcome {
            WaitOutcome::Ready { value, .. } => Ok(value),
            WaitOutcome::TimedOut { last, attempts, .. } => {
                tracing::debug!(%surface, matcher, attempts, "expectation timed out");
                Err(AssertionFailure::new(
                    surface.to_string(),
                    matcher,
                    expected,
                    last.unwrap_or_default(),
                )
                .into())
            }
        }
    }
}

/// Values are equal
pub fn check_eq<T: PartialEq + Debug>(subject: &str, expected: &T, actual: &T) -> ProbeResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(AssertionFailure::new(
            subject,
            "to equal",
            format!("{expected:?}"),
            format!("{actual:?}"),
        )
        .into())
    }
}

/// Values differ
pub fn check_ne<T: PartialEq + Debug>(subject: &str, unexpected: &T, actual: &T) -> ProbeResult<()> {
    if unexpected == actual {
        Err(AssertionFailure::new(
            subject,
            "not to equal",
            format!("not {unexpected:?}"),
            format!("{actual:?}"),
        )
        .into())
    } else {
        Ok(())
    }
}

/// Condition holds
pub fn check_true(subject: &str, condition: bool) -> ProbeResult<()> {
    check_eq(subject, &true, &condition)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::Selector;
    use crate::page_object::{selectors, JwtIoPage};
    use crate::result::ProbeError;
    use crate::surface::Banner;
    use std::sync::Arc;
    use std::time::Duration;

    fn quick() -> WaitOptions {
        WaitOptions::new(Duration::from_millis(40)).with_poll_interval(Duration::from_millis(5))
    }

    fn page(driver: &Arc<MockDriver>) -> JwtIoPage {
        JwtIoPage::new(driver.clone(), &RunConfig::default()).with_locator_wait(quick())
    }

    fn payload(text: &str) -> Arc<MockDriver> {
        Arc::new(MockDriver::new().with_element(
            &Selector::xpath(selectors::DECODED_PAYLOAD),
            MockElement::single().with_text(text),
        ))
    }

    mod expect_tests {
        use super::*;

        #[tokio::test]
        async fn test_to_contain_text_passes() {
            let driver = payload("{\n  \"a\": 1,\n  \"c\": 3\n}");
            let page = page(&driver);
            let expect = Expect::new(&page, quick());
            expect
                .to_contain_text(Surface::DecodedPayload, "\"c\": 3")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_to_contain_text_reports_last_value() {
            let driver = payload("{\"c\": 4}");
            let page = page(&driver);
            let err = Expect::new(&page, quick())
                .to_contain_text(Surface::DecodedPayload, "\"c\": 3")
                .await
                .unwrap_err();
            match err {
                ProbeError::Assertion(failure) => {
                    assert_eq!(failure.subject, "decoded payload");
                    assert_eq!(failure.expected, "\"c\": 3");
                    assert_eq!(failure.actual, "{\"c\": 4}");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_to_have_text_normalizes_whitespace() {
            let driver = Arc::new(MockDriver::new().with_element(
                &Selector::xpath(selectors::SIGNATURE_VERIFIED),
                MockElement::single().with_text("\n  Signature   Verified "),
            ));
            let page = page(&driver);
            Expect::new(&page, quick())
                .to_have_text(
                    Surface::Notification(Banner::SignatureVerified),
                    "Signature Verified",
                )
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_to_have_segments_and_empty() {
            let token = Selector::xpath(selectors::GENERATED_TOKEN);
            let driver =
                Arc::new(MockDriver::new().with_element(&token, MockElement::single()));
            let page = page(&driver);
            let expect = Expect::new(&page, quick());
            expect.to_be_empty(Surface::GeneratedToken).await.unwrap();
            assert!(expect
                .to_have_segments(Surface::GeneratedToken, 3)
                .await
                .is_err());

            driver.set_element(&token, MockElement::single().with_text("h.p.s"));
            let value = expect
                .to_have_segments(Surface::GeneratedToken, 3)
                .await
                .unwrap();
            assert_eq!(value, "h.p.s");
            expect
                .to_differ_from(Surface::GeneratedToken, "h.p.old")
                .await
                .unwrap();
        }
    }

    mod check_tests {
        use super::*;

        #[test]
        fn test_check_eq() {
            assert!(check_eq("token", &"a", &"a").is_ok());
            let err = check_eq("token", &"a", &"b").unwrap_err();
            assert!(err.to_string().contains("received: \"\\\"b\\\"\""));
        }

        #[test]
        fn test_check_ne_and_true() {
            assert!(check_ne("token", &1, &2).is_ok());
            assert!(check_ne("token", &1, &1).is_err());
            assert!(check_true("decoder tab active", true).is_ok());
            assert_eq!(
                check_true("decoder tab active", false).unwrap_err().class(),
                "assertion"
            );
        }

        #[test]
        fn test_normalize_whitespace() {
            assert_eq!(normalize_whitespace("  a \n\t b "), "a b");
        }
    }
}
