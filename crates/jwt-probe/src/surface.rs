//! Capability interfaces of the JWT encoder/decoder UI.
//!
//! Scenarios see the page only through these traits. Selectors and DOM
//! details stay inside the adapter that implements them
//! ([`crate::page_object::JwtIoPage`]).

use crate::result::ProbeResult;
use async_trait::async_trait;
use std::fmt;

/// Notification banners shown above the encoded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Banner {
    /// Signature did not verify against the entered secret
    InvalidSignature,
    /// Signature verified
    SignatureVerified,
}

impl Banner {
    /// Text the site shows in this banner
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::InvalidSignature => "Invalid Signature",
            Self::SignatureVerified => "Signature Verified",
        }
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid-signature banner"),
            Self::SignatureVerified => write!(f, "signature-verified banner"),
        }
    }
}

/// Which secret field a fill targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretVariant {
    /// Decoder secret; filled in one write
    Decoder,
    /// Encoder secret; typed one character at a time
    Encoder,
}

/// Signature state as displayed by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureState {
    /// "Signature Verified" banner visible
    Verified,
    /// "Invalid Signature" banner visible
    Invalid,
    /// No banner visible
    Unknown,
}

/// A readable text surface of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Decoder's encoded value field
    EncodedValue,
    /// Decoded header JSON
    DecodedHeader,
    /// Decoded payload JSON
    DecodedPayload,
    /// Encoder's generated token
    GeneratedToken,
    /// A notification banner
    Notification(Banner),
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncodedValue => write!(f, "encoded value"),
            Self::DecodedHeader => write!(f, "decoded header"),
            Self::DecodedPayload => write!(f, "decoded payload"),
            Self::GeneratedToken => write!(f, "generated token"),
            Self::Notification(b) => write!(f, "{b}"),
        }
    }
}

/// Page loading
#[async_trait]
pub trait Navigable: Send + Sync {
    /// Load the application root and wait for the load event
    async fn navigate(&self) -> ProbeResult<()>;
}

/// Decoder/encoder tab strip
#[async_trait]
pub trait TabSurface: Send + Sync {
    /// Whether the decoder tab is active; a missing tab reads as inactive
    async fn is_decoder_tab_active(&self) -> ProbeResult<bool>;

    /// Whether the encoder tab is active; a missing tab reads as inactive
    async fn is_encoder_tab_active(&self) -> ProbeResult<bool>;

    /// Click the decoder tab
    async fn click_decoder_tab(&self) -> ProbeResult<()>;

    /// Click the encoder tab
    async fn click_encoder_tab(&self) -> ProbeResult<()>;
}

/// Editable fields and the values derived from them.
///
/// Fills clear the field first. Reads return an empty string for a blank
/// surface.
#[async_trait]
pub trait FormSurface: Send + Sync {
    /// Replace the decoder's encoded value
    async fn fill_encoded_value(&self, token: &str) -> ProbeResult<()>;

    /// Replace a secret
    async fn fill_secret(&self, secret: &str, variant: SecretVariant) -> ProbeResult<()>;

    /// Replace the encoder's header JSON
    async fn fill_header_json(&self, json: &str) -> ProbeResult<()>;

    /// Replace the encoder's payload JSON
    async fn fill_payload_json(&self, json: &str) -> ProbeResult<()>;

    /// Current encoded value
    async fn read_encoded_value(&self) -> ProbeResult<String>;

    /// Decoded payload text
    async fn read_decoded_payload_text(&self) -> ProbeResult<String>;

    /// Decoded header text
    async fn read_decoded_header_text(&self) -> ProbeResult<String>;

    /// Encoder output token
    async fn read_generated_token(&self) -> ProbeResult<String>;
}

/// Notification banners
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Text of a banner, waiting for it to appear
    async fn read_banner(&self, banner: Banner) -> ProbeResult<String>;

    /// Which banner is visible right now, without waiting
    async fn signature_state(&self) -> ProbeResult<SignatureState>;
}

/// Everything a scenario can do with the page
#[async_trait]
pub trait JwtSurfaces: Navigable + TabSurface + FormSurface + NotificationSurface {
    /// Read any text surface
    async fn read(&self, surface: Surface) -> ProbeResult<String> {
        match surface {
            Surface::EncodedValue => self.read_encoded_value().await,
            Surface::DecodedHeader => self.read_decoded_header_text().await,
            Surface::DecodedPayload => self.read_decoded_payload_text().await,
            Surface::GeneratedToken => self.read_generated_token().await,
            Surface::Notification(banner) => self.read_banner(banner).await,
        }
    }
}

impl<T> JwtSurfaces for T where T: Navigable + TabSurface + FormSurface + NotificationSurface + ?Sized
{}
