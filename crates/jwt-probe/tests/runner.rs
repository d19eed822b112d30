//! Runner behavior: failure modes, timeouts, teardown and reports.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use async_trait::async_trait;
use common::{data, fast_config, FakeJwtSite, FakeOptions, FakeSiteFactory};
use jwt_probe::page_object::selectors;
use jwt_probe::prelude::*;
use jwt_probe::suites::decoder_suite;
use jwt_probe::{
    run_suites, segment_count, FailureMode, JwtIoPage, PageDriver, Reporter, RunConfig,
    ScenarioState, ScreenshotPolicy, SessionFactory, SessionFixture, SignatureState, StepStatus,
    SuiteRunner, TeardownHook, TracePolicy,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn runner_with(config: RunConfig, factory: &Arc<FakeSiteFactory>) -> SuiteRunner {
    SuiteRunner::new(Arc::new(config), data(), SessionFixture::new(factory.clone()))
}

fn open_decoder_step() -> Scenario {
    Scenario::new("open", "Open the decoder").step("Navigate", StepKind::Navigate, |ctx| {
        Box::pin(async move {
            ctx.page().navigate().await?;
            check_true("decoder tab active", ctx.page().is_decoder_tab_active().await?)
        })
    })
}

// ============================================================================
// Failure modes
// ============================================================================

#[tokio::test]
async fn test_stop_on_first_failure_skips_remaining_scenarios() {
    let factory = Arc::new(FakeSiteFactory::new(FakeOptions {
        reject_signatures: true,
        ..FakeOptions::default()
    }));
    let runner = runner_with(fast_config().with_fail_fast(true), &factory);
    let report = runner.run(&decoder_suite()).await;

    let ran: Vec<&str> = report.scenarios.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ran, ["example-1-decode", "example-2-secret-verification"]);
    assert!(report.scenarios[0].passed());
    assert!(!report.scenarios[1].passed());
    assert_eq!(
        report.skipped,
        [
            "scenario-1-decode-with-warning",
            "scenario-2-correct-secret",
            "scenario-3-wrong-secrets",
        ]
    );
    assert_eq!(factory.opened(), 2);
}

#[tokio::test]
async fn test_collect_all_overrides_fail_fast_config() {
    let factory = Arc::new(FakeSiteFactory::new(FakeOptions {
        reject_signatures: true,
        ..FakeOptions::default()
    }));
    let runner = runner_with(fast_config().with_fail_fast(true), &factory)
        .with_failure_mode(FailureMode::CollectAll);
    let report = runner.run(&decoder_suite()).await;

    assert_eq!(report.scenarios.len(), 5);
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn test_failed_step_skips_the_rest_of_its_scenario() {
    let factory = Arc::new(FakeSiteFactory::new(FakeOptions {
        reject_signatures: true,
        ..FakeOptions::default()
    }));
    let report = runner_with(fast_config(), &factory)
        .with_filter("scenario-2")
        .run(&decoder_suite())
        .await;

    let scenario = &report.scenarios[0];
    assert_eq!(scenario.state, ScenarioState::Failed);
    let statuses: Vec<StepStatus> = scenario.steps.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        [
            StepStatus::Passed,
            StepStatus::Passed,
            StepStatus::Passed,
            StepStatus::Passed,
            StepStatus::Failed,
            StepStatus::Skipped,
            StepStatus::Skipped,
        ]
    );
    let error = scenario.error.as_ref().unwrap();
    assert_eq!(error.class, "locator");
    assert!(error.message.contains("signature_verified"));
}

#[tokio::test]
async fn test_assertion_failure_carries_diff() {
    let factory = Arc::new(FakeSiteFactory::default());
    let scenario = open_decoder_step().step("Paste", StepKind::Populate, |ctx| {
        Box::pin(async move {
            let token = ctx.data().jwt_token.clone();
            ctx.page().fill_encoded_value(&token).await?;
            let _ = ctx
                .expect()
                .to_contain_text(Surface::DecodedPayload, "\"c\": 4")
                .await?;
            Ok(())
        })
    });
    let report = runner_with(fast_config(), &factory)
        .run_scenario("adhoc", &scenario)
        .await;

    let error = report.error.unwrap();
    assert_eq!(error.class, "assertion");
    assert!(error.message.contains("decoded payload"));
    assert!(error.diff.unwrap().contains("\"c\": 3"));
}

// ============================================================================
// Locator resolution
// ============================================================================

#[tokio::test]
async fn test_ambiguous_locator_fails_without_waiting() {
    let factory = Arc::new(FakeSiteFactory::new(FakeOptions {
        duplicated: vec![selectors::DECODER_TAB],
        ..FakeOptions::default()
    }));
    let config = fast_config().with_expect_timeout_ms(10_000);
    let started = std::time::Instant::now();
    let report = runner_with(config, &factory)
        .run_scenario("adhoc", &open_decoder_step())
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    let error = report.error.unwrap();
    assert_eq!(error.class, "locator");
    assert!(error.message.contains("2"));
}

#[tokio::test]
async fn test_missing_tab_reads_as_inactive() {
    let factory = Arc::new(FakeSiteFactory::new(FakeOptions {
        hidden: vec![selectors::DECODER_TAB],
        ..FakeOptions::default()
    }));
    let report = runner_with(fast_config(), &factory)
        .run_scenario("adhoc", &open_decoder_step())
        .await;

    let error = report.error.unwrap();
    assert_eq!(error.class, "assertion");
    assert!(error.message.contains("decoder tab active"));
}

#[tokio::test]
async fn test_unreachable_site_is_a_navigation_failure() {
    let factory = Arc::new(FakeSiteFactory::new(FakeOptions {
        unreachable: true,
        ..FakeOptions::default()
    }));
    let report = runner_with(fast_config(), &factory)
        .run_scenario("adhoc", &open_decoder_step())
        .await;

    assert_eq!(report.error.unwrap().class, "navigation");
    assert_eq!(factory.closed(), 1);
}

// ============================================================================
// Timeouts and context
// ============================================================================

#[tokio::test]
async fn test_step_timeout_fails_the_step() {
    let factory = Arc::new(FakeSiteFactory::default());
    let scenario = open_decoder_step()
        .step("Hang", StepKind::Mixed, |_ctx| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
        })
        .step("Never reached", StepKind::Assert, |_ctx| Box::pin(async { Ok(()) }));
    let report = runner_with(fast_config().with_timeout_ms(100), &factory)
        .run_scenario("adhoc", &scenario)
        .await;

    assert_eq!(report.steps[1].status, StepStatus::Failed);
    assert_eq!(report.steps[2].status, StepStatus::Skipped);
    let error = report.steps[1].error.as_ref().unwrap();
    assert!(error.message.contains("Hang"));
    assert!(error.message.contains("100"));
}

#[tokio::test]
async fn test_recalling_unknown_value_is_a_data_error() {
    let factory = Arc::new(FakeSiteFactory::default());
    let scenario = open_decoder_step().step("Recall", StepKind::Assert, |ctx| {
        Box::pin(async move {
            let _ = ctx.recall("never_stored")?;
            Ok(())
        })
    });
    let report = runner_with(fast_config(), &factory)
        .run_scenario("adhoc", &scenario)
        .await;

    let error = report.error.unwrap();
    assert_eq!(error.class, "data");
    assert!(error.message.contains("never_stored"));
}

#[tokio::test]
async fn test_values_carry_between_steps() {
    let factory = Arc::new(FakeSiteFactory::default());
    let scenario = open_decoder_step()
        .step("Store", StepKind::Populate, |ctx| {
            Box::pin(async move {
                ctx.remember("greeting", "hello");
                Ok(())
            })
        })
        .step("Load", StepKind::Assert, |ctx| {
            Box::pin(async move {
                check_eq("greeting", &"hello".to_string(), &ctx.recall("greeting")?)
            })
        });
    let report = runner_with(fast_config(), &factory)
        .run_scenario("adhoc", &scenario)
        .await;

    assert!(report.passed());
    assert_eq!(report.state, ScenarioState::Passed);
}

// ============================================================================
// Sessions and teardown
// ============================================================================

#[derive(Debug)]
struct RefusingFactory;

#[async_trait]
impl SessionFactory for RefusingFactory {
    async fn open(&self) -> ProbeResult<Box<dyn PageDriver>> {
        Err(ProbeError::BrowserLaunch {
            message: "chromium not found".to_string(),
        })
    }
}

#[tokio::test]
async fn test_setup_failure_skips_every_step() {
    let runner = SuiteRunner::new(
        Arc::new(fast_config()),
        data(),
        SessionFixture::new(Arc::new(RefusingFactory)),
    );
    let report = runner.run(&decoder_suite()).await;

    assert_eq!(report.scenarios.len(), 5);
    for scenario in &report.scenarios {
        assert_eq!(scenario.state, ScenarioState::Failed);
        assert!(scenario.steps.iter().all(|s| s.status == StepStatus::Skipped));
        assert_eq!(scenario.error.as_ref().unwrap().class, "browser");
    }
}

#[derive(Debug, Default)]
struct RecordingHook {
    outcomes: Mutex<Vec<bool>>,
}

#[async_trait]
impl TeardownHook for RecordingHook {
    async fn teardown(&self, session: &dyn PageDriver, passed: bool) -> ProbeResult<()> {
        // Runs before close-page, so the page still answers
        let _ = session.current_url().await?;
        self.outcomes.lock().unwrap().push(passed);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[tokio::test]
async fn test_hooks_see_outcome_and_run_before_close() {
    let factory = Arc::new(FakeSiteFactory::new(FakeOptions {
        reject_signatures: true,
        ..FakeOptions::default()
    }));
    let hook = Arc::new(RecordingHook::default());
    let fixture = SessionFixture::new(factory.clone()).with_hook(hook.clone());
    assert_eq!(fixture.hook_count(), 2);

    let runner = SuiteRunner::new(Arc::new(fast_config()), data(), fixture)
        .with_filter("example-");
    let report = runner.run(&decoder_suite()).await;

    assert_eq!(report.scenarios.len(), 2);
    assert_eq!(*hook.outcomes.lock().unwrap(), [true, false]);
    assert_eq!(factory.closed(), 2);
}

#[tokio::test]
async fn test_close_failure_is_reported_but_does_not_fail_scenario() {
    let factory = Arc::new(FakeSiteFactory::new(FakeOptions {
        fail_close: true,
        ..FakeOptions::default()
    }));
    let report = runner_with(fast_config(), &factory)
        .run_scenario("adhoc", &open_decoder_step())
        .await;

    assert!(report.passed());
    assert!(report.teardown_error.unwrap().contains("detached"));
}

// ============================================================================
// Page details
// ============================================================================

#[tokio::test]
async fn test_encoder_secret_is_typed_with_pacing() {
    let site = Arc::new(FakeJwtSite::default());
    let config = fast_config().with_keystroke_delay_ms(7);
    let page = JwtIoPage::new(site.clone(), &config);

    page.navigate().await.unwrap();
    page.click_encoder_tab().await.unwrap();
    page.fill_secret("s3cr3t", SecretVariant::Encoder)
        .await
        .unwrap();

    let keys = site.keystrokes();
    let typed: String = keys.iter().map(|(c, _)| *c).collect();
    assert_eq!(typed, "s3cr3t");
    assert!(keys.iter().all(|(_, d)| *d == Duration::from_millis(7)));
    assert_eq!(segment_count(&page.read_generated_token().await.unwrap()), 3);
}

#[tokio::test]
async fn test_signature_state_tracks_banners() {
    let site = Arc::new(FakeJwtSite::default());
    let page = JwtIoPage::new(site.clone(), &fast_config());
    let data = data();

    page.navigate().await.unwrap();
    assert_eq!(page.signature_state().await.unwrap(), SignatureState::Unknown);
    page.fill_encoded_value(&data.jwt_token).await.unwrap();
    assert_eq!(page.signature_state().await.unwrap(), SignatureState::Invalid);
    page.fill_secret(&data.secret, SecretVariant::Decoder)
        .await
        .unwrap();
    assert_eq!(page.signature_state().await.unwrap(), SignatureState::Verified);
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn test_reports_follow_artifact_policies() {
    let dir = TempDir::new().unwrap();
    let factory = Arc::new(FakeSiteFactory::new(FakeOptions {
        reject_signatures: true,
        ..FakeOptions::default()
    }));
    let config = fast_config()
        .with_report_dir(dir.path())
        .with_screenshot(ScreenshotPolicy::OnlyOnFailure)
        .with_trace(TracePolicy::RetainOnFailure);
    let runner = runner_with(config, &factory);
    let report = run_suites(&runner, vec![decoder_suite()]).await;
    assert_eq!(report.failed_count(), 2);

    let artifacts = Reporter::new(dir.path()).write(&report).unwrap();

    assert_eq!(artifacts.screenshots.len(), 2);
    assert_eq!(artifacts.traces.len(), 2);
    assert!(artifacts.screenshots.iter().all(|p| p.exists()));
    let html = std::fs::read_to_string(&artifacts.html).unwrap();
    assert!(html.contains("example-2-secret-verification"));
    let junit = std::fs::read_to_string(&artifacts.junit).unwrap();
    assert!(junit.contains("tests=\"5\""));
    assert!(junit.contains("failures=\"2\""));
}

#[tokio::test]
async fn test_no_artifacts_when_policies_off() {
    let dir = TempDir::new().unwrap();
    let factory = Arc::new(FakeSiteFactory::default());
    let config = fast_config()
        .with_screenshot(ScreenshotPolicy::Off)
        .with_trace(TracePolicy::Off);
    let report = run_suites(&runner_with(config, &factory), vec![decoder_suite()]).await;

    let artifacts = Reporter::new(dir.path()).write(&report).unwrap();
    assert!(artifacts.screenshots.is_empty());
    assert!(artifacts.traces.is_empty());
    assert!(artifacts.html.exists());
    assert!(!dir.path().join("screenshots").exists());
}
