//! Fixture data shared by every scenario.
//!
//! Loaded once before any scenario runs and shared read-only. A malformed
//! record is a data failure raised at load time.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

const BUILTIN: &str = include_str!("../fixtures/test_data.json");

/// Tokens, secrets and JSON documents used by the scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestData {
    /// HS256 token with payload `{"a":1,"b":2,"c":3}`
    pub jwt_token: String,
    /// Secret that verifies `jwt_token`
    pub secret: String,
    /// Secret that does not verify `jwt_token`
    pub incorrect_secret: String,
    /// Replacement secret for the re-signing check
    pub new_secret: String,
    /// HS256 signing secret for encoder scenarios
    pub encoder_secret: String,
    /// HS512 signing secret (at least 512 bits)
    pub encoder_secret512: String,
    /// HS256 header
    pub custom_header: Value,
    /// HS512 header
    pub hs512_header: Value,
    /// Payload for token creation
    pub custom_payload: Value,
    /// Payload with added, removed and changed claims
    pub modified_payload: Value,
    /// Payload with Unicode, special characters and a long string
    pub special_char_payload: Value,
}

impl TestData {
    /// Data compiled into the binary
    pub fn builtin() -> ProbeResult<Self> {
        Self::from_json_str("<builtin>", BUILTIN)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let source = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|e| ProbeError::FixtureData {
            path: source.clone(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&source, &json)
    }

    /// Load from `path` if given, otherwise the built-in data
    pub fn load_or_builtin(path: Option<&Path>) -> ProbeResult<Self> {
        path.map_or_else(Self::builtin, Self::load)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(source: &str, json: &str) -> ProbeResult<Self> {
        let data: Self = serde_json::from_str(json).map_err(|e| ProbeError::FixtureData {
            path: source.to_string(),
            message: e.to_string(),
        })?;
        data.validate(source)?;
        Ok(data)
    }

    fn validate(&self, source: &str) -> ProbeResult<()> {
        let fail = |message: String| {
            Err(ProbeError::FixtureData {
                path: source.to_string(),
                message,
            })
        };

        if self.jwt_token.split('.').count() != 3 {
            return fail("jwtToken must have three segments".to_string());
        }
        for (key, value) in [
            ("secret", &self.secret),
            ("incorrectSecret", &self.incorrect_secret),
            ("newSecret", &self.new_secret),
            ("encoderSecret", &self.encoder_secret),
            ("encoderSecret512", &self.encoder_secret512),
        ] {
            if value.is_empty() {
                return fail(format!("{key} must not be empty"));
            }
        }
        if self.secret == self.incorrect_secret {
            return fail("incorrectSecret must differ from secret".to_string());
        }
        if self.encoder_secret512.len() < 64 {
            return fail("encoderSecret512 must be at least 512 bits".to_string());
        }
        for (key, value) in [
            ("customHeader", &self.custom_header),
            ("hs512Header", &self.hs512_header),
            ("customPayload", &self.custom_payload),
            ("modifiedPayload", &self.modified_payload),
            ("specialCharPayload", &self.special_char_payload),
        ] {
            if !value.is_object() {
                return fail(format!("{key} must be a JSON object"));
            }
        }
        Ok(())
    }
}

/// JSON as the site's editors show it: two-space indentation
#[must_use]
pub fn pretty(value: &Value) -> String {
    format!("{value:#}")
}
