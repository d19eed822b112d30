//! Scenario catalog
//!
//! Two suites cover the site: `decoder` pastes a known token and checks the
//! decoded view and signature banners; `encoder` builds tokens from custom
//! header, payload and secret and decodes them again.

mod decoder;
mod encoder;

use crate::assertion::check_true;
use crate::harness::{ScenarioContext, Suite};
use crate::result::ProbeResult;
use crate::surface::{Banner, Surface};

pub use decoder::decoder_suite;
pub use encoder::encoder_suite;

/// Names of the built-in suites, in run order
pub const SUITE_NAMES: [&str; 2] = ["decoder", "encoder"];

/// Every built-in suite
#[must_use]
pub fn catalog() -> Vec<Suite> {
    vec![decoder_suite(), encoder_suite()]
}

/// Built-in suite by name
#[must_use]
pub fn suite(name: &str) -> Option<Suite> {
    match name {
        "decoder" => Some(decoder_suite()),
        "encoder" => Some(encoder_suite()),
        _ => None,
    }
}

async fn open_decoder(ctx: &ScenarioContext) -> ProbeResult<()> {
    ctx.page().navigate().await?;
    check_true(
        "decoder tab active",
        ctx.page().is_decoder_tab_active().await?,
    )
}

async fn open_encoder(ctx: &ScenarioContext) -> ProbeResult<()> {
    ctx.page().navigate().await?;
    ctx.page().click_encoder_tab().await?;
    expect_encoder_tab(ctx).await
}

async fn switch_to_decoder(ctx: &ScenarioContext) -> ProbeResult<()> {
    ctx.page().click_decoder_tab().await?;
    check_true(
        "decoder tab active",
        ctx.page().is_decoder_tab_active().await?,
    )
}

async fn expect_encoder_tab(ctx: &ScenarioContext) -> ProbeResult<()> {
    check_true(
        "encoder tab active",
        ctx.page().is_encoder_tab_active().await?,
    )
}

async fn expect_contains(ctx: &ScenarioContext, surface: Surface, needles: &[&str]) -> ProbeResult<()> {
    for needle in needles {
        let _ = ctx.expect().to_contain_text(surface, needle).await?;
    }
    Ok(())
}

async fn expect_banner(ctx: &ScenarioContext, banner: Banner) -> ProbeResult<()> {
    let _ = ctx
        .expect()
        .to_have_text(Surface::Notification(banner), banner.text())
        .await?;
    Ok(())
}

/// Wait for a complete three-segment token in the encoder output
async fn generated_token(ctx: &ScenarioContext) -> ProbeResult<String> {
    ctx.expect().to_have_segments(Surface::GeneratedToken, 3).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut ids: Vec<String> = catalog()
            .iter()
            .flat_map(|s| s.scenarios().iter().map(|c| c.id().to_string()))
            .collect();
        assert_eq!(ids.len(), 10);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_suite_lookup() {
        for name in SUITE_NAMES {
            assert_eq!(suite(name).map(|s| s.name().to_string()).as_deref(), Some(name));
        }
        assert!(suite("visual").is_none());
    }

    #[test]
    fn test_every_scenario_starts_by_navigating() {
        use crate::harness::StepKind;
        for suite in catalog() {
            for scenario in suite.scenarios() {
                assert_eq!(scenario.steps()[0].kind(), StepKind::Navigate, "{}", scenario.id());
            }
        }
    }
}
