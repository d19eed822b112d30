use super::{expect_banner, expect_contains, generated_token, open_encoder, switch_to_decoder};
use crate::assertion::check_ne;
use crate::harness::{Scenario, ScenarioContext, StepKind, Suite};
use crate::result::ProbeResult;
use crate::surface::{Banner, SecretVariant, Surface};
use crate::test_data::pretty;

const CUSTOM_CLAIMS: [&str; 3] = [
    "\"sub\": \"123456789056\"",
    "\"name\": \"sumit kumar\"",
    "\"admin\": true",
];
const MODIFIED_CLAIMS: [&str; 4] = [
    "\"sub\": \"987654321\"",
    "\"name\": \"Jane Smith\"",
    "\"admin\": false",
    "\"role\": \"user\"",
];
const UNICODE_CLAIMS: [&str; 4] = [
    "\"name\": \"José María\"",
    "\"emoji\": \"🚀✨🎉\"",
    "\"chinese\": \"你好世界\"",
    "\"arabic\": \"مرحبا بالعالم\"",
];
const HEADER_CLAIMS: [&str; 2] = ["\"alg\": \"HS256\"", "\"typ\": \"JWT\""];

/// Encoder suite
#[must_use]
pub fn encoder_suite() -> Suite {
    Suite::new("encoder")
        .scenario(scenario_4_custom_token())
        .scenario(scenario_5_payload_regeneration())
        .scenario(scenario_6_hs256_to_hs512())
        .scenario(scenario_7_unicode_payload())
        .scenario(scenario_8_empty_fields())
}

#[derive(Debug, Clone, Copy)]
enum Doc {
    CustomHeader,
    Hs512Header,
    CustomPayload,
    ModifiedPayload,
    SpecialCharPayload,
}

fn doc(ctx: &ScenarioContext, doc: Doc) -> String {
    let data = ctx.data();
    pretty(match doc {
        Doc::CustomHeader => &data.custom_header,
        Doc::Hs512Header => &data.hs512_header,
        Doc::CustomPayload => &data.custom_payload,
        Doc::ModifiedPayload => &data.modified_payload,
        Doc::SpecialCharPayload => &data.special_char_payload,
    })
}

async fn fill_header(ctx: &ScenarioContext, header: Doc) -> ProbeResult<()> {
    let json = doc(ctx, header);
    ctx.page().fill_header_json(&json).await
}

async fn fill_payload(ctx: &ScenarioContext, payload: Doc) -> ProbeResult<()> {
    let json = doc(ctx, payload);
    ctx.page().fill_payload_json(&json).await
}

async fn sign_with(ctx: &ScenarioContext, secret: &str) -> ProbeResult<()> {
    ctx.page().fill_secret(secret, SecretVariant::Encoder).await
}

async fn sign_with_encoder_secret(ctx: &ScenarioContext) -> ProbeResult<()> {
    let secret = ctx.data().encoder_secret.clone();
    sign_with(ctx, &secret).await
}

async fn note_token(ctx: &mut ScenarioContext, key: &'static str) -> ProbeResult<()> {
    let token = generated_token(ctx).await?;
    ctx.remember(key, token);
    Ok(())
}

async fn decode_remembered(ctx: &ScenarioContext, key: &str) -> ProbeResult<()> {
    let token = ctx.recall(key)?;
    ctx.page().fill_encoded_value(&token).await
}

async fn verify_with(ctx: &ScenarioContext, secret: &str) -> ProbeResult<()> {
    ctx.page().fill_secret(secret, SecretVariant::Decoder).await?;
    expect_banner(ctx, Banner::SignatureVerified).await
}

async fn verify_with_encoder_secret(ctx: &ScenarioContext) -> ProbeResult<()> {
    let secret = ctx.data().encoder_secret.clone();
    verify_with(ctx, &secret).await
}

/// Fill every encoder input and wait until the output holds a full token,
/// so a following blank-field check starts from a rendered token.
async fn restore_encoder_inputs(ctx: &ScenarioContext) -> ProbeResult<()> {
    fill_header(ctx, Doc::CustomHeader).await?;
    fill_payload(ctx, Doc::CustomPayload).await?;
    sign_with_encoder_secret(ctx).await?;
    let _ = generated_token(ctx).await?;
    Ok(())
}

async fn expect_no_token(ctx: &ScenarioContext) -> ProbeResult<()> {
    let _ = ctx.expect().to_be_empty(Surface::GeneratedToken).await?;
    Ok(())
}

fn scenario_4_custom_token() -> Scenario {
    Scenario::new(
        "scenario-4-custom-token",
        "Scenario 4: Create a JWT from custom header, payload and secret and decode it",
    )
    .step(
        "Navigate to JWT.io and switch to JWT Encoder tab",
        StepKind::Navigate,
        |ctx| Box::pin(open_encoder(ctx)),
    )
    .step(
        "Modify the header JSON (algorithm, type)",
        StepKind::Populate,
        |ctx| Box::pin(fill_header(ctx, Doc::CustomHeader)),
    )
    .step(
        "Modify the payload JSON with custom data",
        StepKind::Populate,
        |ctx| Box::pin(fill_payload(ctx, Doc::CustomPayload)),
    )
    .step("Enter a secret for signing", StepKind::Populate, |ctx| {
        Box::pin(sign_with_encoder_secret(ctx))
    })
    .step(
        "Verify a new JWT token is generated",
        StepKind::Assert,
        |ctx| Box::pin(note_token(ctx, "generated_token")),
    )
    .step("Switch back to Decoder tab", StepKind::Mixed, |ctx| {
        Box::pin(switch_to_decoder(ctx))
    })
    .step(
        "Verify the generated token decodes correctly",
        StepKind::Mixed,
        |ctx| {
            Box::pin(async move {
                decode_remembered(ctx, "generated_token").await?;
                expect_contains(ctx, Surface::DecodedHeader, &HEADER_CLAIMS).await?;
                expect_contains(ctx, Surface::DecodedPayload, &CUSTOM_CLAIMS).await
            })
        },
    )
    .step(
        "Verify signature is valid with the same secret",
        StepKind::Mixed,
        |ctx| Box::pin(verify_with_encoder_secret(ctx)),
    )
}

fn scenario_5_payload_regeneration() -> Scenario {
    Scenario::new(
        "scenario-5-payload-regeneration",
        "Scenario 5: Modify payload data and see the JWT regenerate with new values",
    )
    .step(
        "Navigate to JWT.io and switch to JWT Encoder tab",
        StepKind::Navigate,
        |ctx| Box::pin(open_encoder(ctx)),
    )
    .step("Enter initial payload data", StepKind::Populate, |ctx| {
        Box::pin(fill_payload(ctx, Doc::CustomPayload))
    })
    .step("Set a secret for signing", StepKind::Populate, |ctx| {
        Box::pin(sign_with_encoder_secret(ctx))
    })
    .step("Note the generated token", StepKind::Assert, |ctx| {
        Box::pin(note_token(ctx, "initial_token"))
    })
    .step(
        "Modify payload values (add/remove/change fields)",
        StepKind::Populate,
        |ctx| Box::pin(fill_payload(ctx, Doc::ModifiedPayload)),
    )
    .step("Verify token changes automatically", StepKind::Assert, |ctx| {
        Box::pin(async move {
            let initial = ctx.recall("initial_token")?;
            let _ = ctx
                .expect()
                .to_differ_from(Surface::GeneratedToken, &initial)
                .await?;
            let modified = generated_token(ctx).await?;
            check_ne("generated token", &initial, &modified)?;
            ctx.remember("modified_token", modified);
            Ok(())
        })
    })
    .step(
        "Switch to Decoder tab and verify new payload",
        StepKind::Mixed,
        |ctx| {
            Box::pin(async move {
                switch_to_decoder(ctx).await?;
                decode_remembered(ctx, "modified_token").await?;
                expect_contains(ctx, Surface::DecodedPayload, &MODIFIED_CLAIMS).await
            })
        },
    )
    .step(
        "Confirm signature verification works",
        StepKind::Mixed,
        |ctx| Box::pin(verify_with_encoder_secret(ctx)),
    )
}

fn scenario_6_hs256_to_hs512() -> Scenario {
    Scenario::new(
        "scenario-6-hs256-to-hs512",
        "Scenario 6: Switch the algorithm from HS256 to HS512 and generate different valid tokens",
    )
    .step(
        "Navigate to JWT.io and switch to JWT Encoder tab",
        StepKind::Navigate,
        |ctx| Box::pin(open_encoder(ctx)),
    )
    .step(
        "Create a token with HS256 algorithm",
        StepKind::Populate,
        |ctx| {
            Box::pin(async move {
                fill_header(ctx, Doc::CustomHeader).await?;
                fill_payload(ctx, Doc::CustomPayload).await?;
                sign_with_encoder_secret(ctx).await
            })
        },
    )
    .step(
        "Note the generated token and signature length",
        StepKind::Assert,
        |ctx| Box::pin(note_token(ctx, "hs256_token")),
    )
    .step(
        "Change algorithm to HS512 in header and use a 512-bit secret for signing",
        StepKind::Populate,
        |ctx| {
            Box::pin(async move {
                fill_header(ctx, Doc::Hs512Header).await?;
                let secret = ctx.data().encoder_secret512.clone();
                sign_with(ctx, &secret).await
            })
        },
    )
    .step(
        "Verify token regenerates with different signature",
        StepKind::Assert,
        |ctx| {
            Box::pin(async move {
                let hs256 = ctx.recall("hs256_token")?;
                let _ = ctx
                    .expect()
                    .to_differ_from(Surface::GeneratedToken, &hs256)
                    .await?;
                let hs512 = generated_token(ctx).await?;
                check_ne("generated token", &hs256, &hs512)?;
                ctx.remember("hs512_token", hs512);
                Ok(())
            })
        },
    )
    .step(
        "Test decoding for each algorithm variant",
        StepKind::Mixed,
        |ctx| {
            Box::pin(async move {
                switch_to_decoder(ctx).await?;
                decode_remembered(ctx, "hs256_token").await?;
                expect_contains(ctx, Surface::DecodedHeader, &["\"alg\": \"HS256\""]).await?;
                decode_remembered(ctx, "hs512_token").await?;
                expect_contains(ctx, Surface::DecodedHeader, &["\"alg\": \"HS512\""]).await
            })
        },
    )
    .step(
        "Verify signature verification works for each",
        StepKind::Mixed,
        |ctx| {
            Box::pin(async move {
                decode_remembered(ctx, "hs256_token").await?;
                verify_with_encoder_secret(ctx).await?;
                decode_remembered(ctx, "hs512_token").await?;
                let secret = ctx.data().encoder_secret512.clone();
                verify_with(ctx, &secret).await
            })
        },
    )
}

fn scenario_7_unicode_payload() -> Scenario {
    Scenario::new(
        "scenario-7-unicode-payload",
        "Scenario 7: Special characters and Unicode survive encoding and decoding",
    )
    .step(
        "Navigate to JWT.io and switch to JWT Encoder tab",
        StepKind::Navigate,
        |ctx| Box::pin(open_encoder(ctx)),
    )
    .step(
        "Create payload with special characters (!@#$%^&*)",
        StepKind::Populate,
        |ctx| {
            Box::pin(async move {
                fill_header(ctx, Doc::CustomHeader).await?;
                fill_payload(ctx, Doc::SpecialCharPayload).await?;
                sign_with_encoder_secret(ctx).await
            })
        },
    )
    .step(
        "Generate token and verify encoding",
        StepKind::Assert,
        |ctx| Box::pin(note_token(ctx, "generated_token")),
    )
    .step(
        "Switch to Decoder tab and verify decoding",
        StepKind::Mixed,
        |ctx| {
            Box::pin(async move {
                switch_to_decoder(ctx).await?;
                decode_remembered(ctx, "generated_token").await
            })
        },
    )
    .step("Verify Unicode characters are preserved", StepKind::Assert, |ctx| {
        Box::pin(expect_contains(ctx, Surface::DecodedPayload, &UNICODE_CLAIMS))
    })
    .step(
        "Verify special characters are encoded/decoded correctly",
        StepKind::Assert,
        |ctx| {
            Box::pin(expect_contains(
                ctx,
                Surface::DecodedPayload,
                &["\"specialChars\": \"!@#$%^&*()_+-=[]{}|;:,.<>?\""],
            ))
        },
    )
    .step(
        "Verify very long string values are shown in decoded payload",
        StepKind::Assert,
        |ctx| {
            Box::pin(expect_contains(
                ctx,
                Surface::DecodedPayload,
                &[
                    "\"longString\": \"This is a very long string",
                    "encoding and decoding processes\"",
                ],
            ))
        },
    )
    .step("Verify signature with secret", StepKind::Mixed, |ctx| {
        Box::pin(verify_with_encoder_secret(ctx))
    })
}

fn scenario_8_empty_fields() -> Scenario {
    Scenario::new(
        "scenario-8-empty-fields",
        "Scenario 8: No token is generated when a required field is empty",
    )
    .step(
        "Navigate to JWT.io and switch to JWT Encoder tab",
        StepKind::Navigate,
        |ctx| Box::pin(open_encoder(ctx)),
    )
    .step(
        "Test with empty header - verify no token generated",
        StepKind::Mixed,
        |ctx| {
            Box::pin(async move {
                restore_encoder_inputs(ctx).await?;
                ctx.page().fill_header_json("").await?;
                expect_no_token(ctx).await
            })
        },
    )
    .step(
        "Test with empty payload - verify no token generated",
        StepKind::Mixed,
        |ctx| {
            Box::pin(async move {
                restore_encoder_inputs(ctx).await?;
                ctx.page().fill_payload_json("").await?;
                expect_no_token(ctx).await
            })
        },
    )
    .step(
        "Test with empty secret - verify no token generated",
        StepKind::Mixed,
        |ctx| {
            Box::pin(async move {
                restore_encoder_inputs(ctx).await?;
                sign_with(ctx, "").await?;
                expect_no_token(ctx).await
            })
        },
    )
}
