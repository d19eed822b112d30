use super::{expect_banner, expect_contains, open_decoder};
use crate::assertion::{check_eq, check_ne, check_true};
use crate::harness::{Scenario, ScenarioContext, StepKind, Suite};
use crate::result::ProbeResult;
use crate::surface::{Banner, SecretVariant, Surface};
use crate::token::TokenParts;

const PAYLOAD_CLAIMS: [&str; 3] = ["\"a\": 1", "\"b\": 2", "\"c\": 3"];
const HEADER_CLAIMS: [&str; 2] = ["\"alg\": \"HS256\"", "\"typ\": \"JWT\""];

const MORE_WRONG_SECRETS: [&str; 2] = [
    "anotherwrongsecretanotherwrongsecretanotherwrongsecret",
    "yetanotherwrongsecretyetanotherwrongsecretyetanotherwrongsecret",
];

/// Decoder suite
#[must_use]
pub fn decoder_suite() -> Suite {
    Suite::new("decoder")
        .scenario(example_1_decode())
        .scenario(example_2_secret_verification())
        .scenario(scenario_1_decode_with_warning())
        .scenario(scenario_2_correct_secret())
        .scenario(scenario_3_wrong_secrets())
}

async fn paste_token(ctx: &ScenarioContext) -> ProbeResult<()> {
    ctx.page().fill_encoded_value(&ctx.data().jwt_token).await
}

async fn paste_and_remember(ctx: &mut ScenarioContext) -> ProbeResult<()> {
    paste_token(ctx).await?;
    let token = ctx.page().read_encoded_value().await?;
    ctx.remember("original_token", token);
    Ok(())
}

async fn token_unchanged(ctx: &ScenarioContext) -> ProbeResult<()> {
    let original = ctx.recall("original_token")?;
    let current = ctx.page().read_encoded_value().await?;
    check_eq("encoded value", &original, &current)
}

async fn enter_decoder_secret(ctx: &ScenarioContext, secret: &str) -> ProbeResult<()> {
    ctx.page().fill_secret(secret, SecretVariant::Decoder).await
}

async fn resign_keeps_payload(ctx: &ScenarioContext) -> ProbeResult<()> {
    let original_token = ctx.recall("original_token")?;
    let original_payload = ctx.page().read_decoded_payload_text().await?;

    ctx.page().click_encoder_tab().await?;
    ctx.page()
        .fill_secret(&ctx.data().new_secret, SecretVariant::Encoder)
        .await?;
    ctx.page().click_decoder_tab().await?;

    let new_token = ctx
        .expect()
        .to_differ_from(Surface::EncodedValue, &original_token)
        .await?;
    check_ne("encoded value after re-signing", &original_token, &new_token)?;

    let (before, after) = (
        TokenParts::parse(&original_token),
        TokenParts::parse(&new_token),
    );
    check_true(
        "only the signature segment changed",
        matches!((&before, &after), (Some(b), Some(a)) if b.differs_only_in_signature(a)),
    )?;

    let new_payload = ctx.page().read_decoded_payload_text().await?;
    check_eq("decoded payload after re-signing", &original_payload, &new_payload)
}

fn example_1_decode() -> Scenario {
    Scenario::new("example-1-decode", "EXAMPLE 1: JWT Decoder Test")
        .step(
            "Navigate to JWT.io and ensure JWT Decoder is active",
            StepKind::Navigate,
            |ctx| Box::pin(open_decoder(ctx)),
        )
        .step(
            "Paste the token and verify payload value",
            StepKind::Populate,
            |ctx| Box::pin(paste_token(ctx)),
        )
        .step(
            "Verify if the value of \"c\" is 3 in the Decoded Payload",
            StepKind::Assert,
            |ctx| Box::pin(expect_contains(ctx, Surface::DecodedPayload, &["\"c\": 3"])),
        )
        .step(
            "Verify \"Invalid Signature\" message",
            StepKind::Assert,
            |ctx| Box::pin(expect_banner(ctx, Banner::InvalidSignature)),
        )
}

fn example_2_secret_verification() -> Scenario {
    Scenario::new(
        "example-2-secret-verification",
        "EXAMPLE 2: JWT Decoder with Secret Verification",
    )
    .step(
        "Navigate to JWT.io and ensure JWT Decoder is active",
        StepKind::Navigate,
        |ctx| Box::pin(open_decoder(ctx)),
    )
    .step(
        "Paste the token in the Encoded Value text area",
        StepKind::Populate,
        |ctx| Box::pin(paste_and_remember(ctx)),
    )
    .step(
        "Verify \"Invalid Signature\" above the Encoded Value text area",
        StepKind::Assert,
        |ctx| Box::pin(expect_banner(ctx, Banner::InvalidSignature)),
    )
    .step(
        "Paste the secret in the Secret text area",
        StepKind::Populate,
        |ctx| {
            Box::pin(async move {
                let secret = ctx.data().secret.clone();
                enter_decoder_secret(ctx, &secret).await
            })
        },
    )
    .step(
        "Verify \"Signature Verified\" above the Encoded Value text area",
        StepKind::Assert,
        |ctx| Box::pin(expect_banner(ctx, Banner::SignatureVerified)),
    )
    .step(
        "Assert the token is the same as the one entered",
        StepKind::Assert,
        |ctx| Box::pin(token_unchanged(ctx)),
    )
    .step(
        "Verify if the value of \"c\" is 3 in the Decoded Payload",
        StepKind::Assert,
        |ctx| Box::pin(expect_contains(ctx, Surface::DecodedPayload, &["\"c\": 3"])),
    )
    .step(
        "Assert changing the secret changes the token but the payload remains the same",
        StepKind::Mixed,
        |ctx| Box::pin(resign_keeps_payload(ctx)),
    )
}

fn scenario_1_decode_with_warning() -> Scenario {
    Scenario::new(
        "scenario-1-decode-with-warning",
        "Scenario 1: Paste a JWT and see it decoded with an \"Invalid Signature\" warning",
    )
    .step(
        "Navigate to JWT.io and ensure JWT Decoder tab is active",
        StepKind::Navigate,
        |ctx| Box::pin(open_decoder(ctx)),
    )
    .step(
        "Paste a valid JWT token in the Encoded Value text area",
        StepKind::Populate,
        |ctx| Box::pin(paste_token(ctx)),
    )
    .step(
        "Verify the decoded header shows algorithm HS256 and type JWT",
        StepKind::Assert,
        |ctx| Box::pin(expect_contains(ctx, Surface::DecodedHeader, &HEADER_CLAIMS)),
    )
    .step(
        "Verify the decoded payload contains expected values",
        StepKind::Assert,
        |ctx| Box::pin(expect_contains(ctx, Surface::DecodedPayload, &PAYLOAD_CLAIMS)),
    )
    .step(
        "Assert \"Invalid Signature\" appears without a secret",
        StepKind::Assert,
        |ctx| Box::pin(expect_banner(ctx, Banner::InvalidSignature)),
    )
}

fn scenario_2_correct_secret() -> Scenario {
    Scenario::new(
        "scenario-2-correct-secret",
        "Scenario 2: Enter the correct secret to turn \"Invalid Signature\" into \"Signature Verified\"",
    )
    .step(
        "Navigate to JWT.io and ensure JWT Decoder tab is active",
        StepKind::Navigate,
        |ctx| Box::pin(open_decoder(ctx)),
    )
    .step(
        "Paste a valid JWT token in the Encoded Value text area",
        StepKind::Populate,
        |ctx| Box::pin(paste_and_remember(ctx)),
    )
    .step(
        "Verify \"Invalid Signature\" initially appears",
        StepKind::Assert,
        |ctx| Box::pin(expect_banner(ctx, Banner::InvalidSignature)),
    )
    .step(
        "Enter the correct secret in the Secret field",
        StepKind::Populate,
        |ctx| {
            Box::pin(async move {
                let secret = ctx.data().secret.clone();
                enter_decoder_secret(ctx, &secret).await
            })
        },
    )
    .step(
        "Verify \"Signature Verified\" appears",
        StepKind::Assert,
        |ctx| Box::pin(expect_banner(ctx, Banner::SignatureVerified)),
    )
    .step("Confirm token remains unchanged", StepKind::Assert, |ctx| {
        Box::pin(token_unchanged(ctx))
    })
    .step(
        "Verify payload values remain consistent",
        StepKind::Assert,
        |ctx| Box::pin(expect_contains(ctx, Surface::DecodedPayload, &PAYLOAD_CLAIMS)),
    )
}

fn scenario_3_wrong_secrets() -> Scenario {
    Scenario::new(
        "scenario-3-wrong-secrets",
        "Scenario 3: Wrong secrets show \"Invalid Signature\" but content stays readable",
    )
    .step(
        "Navigate to JWT.io and ensure JWT Decoder tab is active",
        StepKind::Navigate,
        |ctx| Box::pin(open_decoder(ctx)),
    )
    .step(
        "Paste a valid JWT token in the Encoded Value text area",
        StepKind::Populate,
        |ctx| Box::pin(paste_token(ctx)),
    )
    .step(
        "Enter an incorrect secret in the Secret field",
        StepKind::Populate,
        |ctx| {
            Box::pin(async move {
                let secret = ctx.data().incorrect_secret.clone();
                enter_decoder_secret(ctx, &secret).await
            })
        },
    )
    .step(
        "Verify \"Invalid Signature\" persists",
        StepKind::Assert,
        |ctx| Box::pin(expect_banner(ctx, Banner::InvalidSignature)),
    )
    .step("Try multiple incorrect secrets", StepKind::Mixed, |ctx| {
        Box::pin(async move {
            for secret in MORE_WRONG_SECRETS {
                enter_decoder_secret(ctx, secret).await?;
                expect_banner(ctx, Banner::InvalidSignature).await?;
            }
            Ok(())
        })
    })
    .step(
        "Verify payload is still readable despite invalid signature",
        StepKind::Assert,
        |ctx| Box::pin(expect_contains(ctx, Surface::DecodedPayload, &PAYLOAD_CLAIMS)),
    )
    .step(
        "Verify header information remains accessible",
        StepKind::Assert,
        |ctx| Box::pin(expect_contains(ctx, Surface::DecodedHeader, &HEADER_CLAIMS)),
    )
}
