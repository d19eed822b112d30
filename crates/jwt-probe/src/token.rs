//! Compact-serialized token inspection.
//!
//! Only structure is inspected here: segment counts and base64url-decoded
//! JSON. Signatures are never verified; the site under test does that.

use crate::result::{ProbeError, ProbeResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Number of `.`-separated segments; an empty (or blank) token has none
#[must_use]
pub fn segment_count(token: &str) -> usize {
    let token = token.trim();
    if token.is_empty() {
        0
    } else {
        token.split('.').count()
    }
}

/// The three segments of a compact token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParts {
    /// Encoded header
    pub header: String,
    /// Encoded payload
    pub payload: String,
    /// Encoded signature
    pub signature: String,
}

impl TokenParts {
    /// Split a token into exactly three segments
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.trim().split('.');
        let header = parts.next()?;
        let payload = parts.next()?;
        let signature = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            header: header.to_string(),
            payload: payload.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Decoded header JSON
    pub fn header_json(&self) -> ProbeResult<serde_json::Value> {
        decode_segment("header", &self.header)
    }

    /// Decoded payload JSON
    pub fn payload_json(&self) -> ProbeResult<serde_json::Value> {
        decode_segment("payload", &self.payload)
    }

    /// `alg` claim of the header, if present
    pub fn algorithm(&self) -> ProbeResult<Option<String>> {
        Ok(self
            .header_json()?
            .get("alg")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    /// Same header and payload, different signature
    #[must_use]
    pub fn differs_only_in_signature(&self, other: &Self) -> bool {
        self.header == other.header
            && self.payload == other.payload
            && self.signature != other.signature
    }

    /// Re-join the segments
    #[must_use]
    pub fn compact(&self) -> String {
        format!("{}.{}.{}", self.header, self.payload, self.signature)
    }
}

fn decode_segment(name: &str, segment: &str) -> ProbeResult<serde_json::Value> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| ProbeError::page(format!("token {name} is not base64url: {e}")))?;
    Ok(serde_json::from_slice(&bytes)?)
}
