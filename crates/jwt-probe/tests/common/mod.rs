//! In-process stand-in for the JWT encoder/decoder site.
//!
//! `FakeJwtSite` answers the page object's selectors the way the real site
//! renders them: the decoder decodes and verifies HS256/HS384/HS512 tokens,
//! the encoder re-signs on every edit, and switching tabs carries tokens
//! across the way the site does.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use jwt_probe::page_object::selectors;
use jwt_probe::{
    LoadState, PageDriver, ProbeError, ProbeResult, RunConfig, Screenshot, Selector,
    SessionFactory, TestData,
};
use serde_json::Value;
use sha2::{Sha256, Sha384, Sha512};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_SECRET: &str = "a-string-secret-at-least-256-bits-long";

/// Run configuration with short waits for in-process tests
pub fn fast_config() -> RunConfig {
    RunConfig::default()
        .with_base_url("http://fake.jwt.test/")
        .with_timeout_ms(5_000)
        .with_expect_timeout_ms(300)
        .with_keystroke_delay_ms(0)
}

pub fn data() -> Arc<TestData> {
    Arc::new(TestData::builtin().expect("built-in fixture data"))
}

/// Compact token signed with an HMAC algorithm
pub fn sign(header: &Value, payload: &Value, secret: &str) -> Option<String> {
    let head = URL_SAFE_NO_PAD.encode(serde_json::to_string(header).ok()?);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_string(payload).ok()?);
    let input = format!("{head}.{body}");
    let alg = header.get("alg")?.as_str()?;
    let signature = hmac(alg, secret, &input)?;
    Some(format!("{input}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

fn hmac(alg: &str, secret: &str, input: &str) -> Option<Vec<u8>> {
    macro_rules! mac {
        ($digest:ty) => {{
            let mut mac = Hmac::<$digest>::new_from_slice(secret.as_bytes()).ok()?;
            mac.update(input.as_bytes());
            Some(mac.finalize().into_bytes().to_vec())
        }};
    }
    match alg {
        "HS256" => mac!(Sha256),
        "HS384" => mac!(Sha384),
        "HS512" => mac!(Sha512),
        _ => None,
    }
}

fn decode_segment(segment: &str) -> Option<Value> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Knobs for breaking the fake site in specific ways
#[derive(Debug, Clone, Default)]
pub struct FakeOptions {
    /// Selectors that never render
    pub hidden: Vec<&'static str>,
    /// Selectors that render twice
    pub duplicated: Vec<&'static str>,
    /// Never show "Signature Verified"
    pub reject_signatures: bool,
    /// Navigation fails
    pub unreachable: bool,
    /// Closing the page fails
    pub fail_close: bool,
    /// The encoder still signs when its secret is empty
    pub sign_empty_secret: bool,
    /// The encoder output catches up this long after the last edit
    pub render_lag: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Decoder,
    Encoder,
}

#[derive(Debug)]
struct SiteState {
    loaded: bool,
    url: String,
    tab: Tab,
    token: String,
    decoder_secret: String,
    header: String,
    payload: String,
    encoder_secret: String,
    keystrokes: Vec<(char, Duration)>,
    rendered: String,
    edited_at: Option<Instant>,
}

impl SiteState {
    fn fresh() -> Self {
        Self {
            loaded: false,
            url: "about:blank".to_string(),
            tab: Tab::Decoder,
            token: String::new(),
            decoder_secret: String::new(),
            header: format!("{:#}", serde_json::json!({ "alg": "HS256", "typ": "JWT" })),
            payload: format!(
                "{:#}",
                serde_json::json!({
                    "sub": "1234567890",
                    "name": "John Doe",
                    "admin": true,
                    "iat": 1_516_239_022
                })
            ),
            encoder_secret: DEFAULT_SECRET.to_string(),
            keystrokes: Vec::new(),
            rendered: String::new(),
            edited_at: None,
        }
    }

    fn decoded(&self) -> Option<(Value, Value, String)> {
        let mut parts = self.token.trim().split('.');
        let header = decode_segment(parts.next()?)?;
        let payload = decode_segment(parts.next()?)?;
        let signature = parts.next()?.to_string();
        if parts.next().is_some() {
            return None;
        }
        Some((header, payload, signature))
    }

    fn verified(&self) -> bool {
        let Some((header, _, signature)) = self.decoded() else {
            return false;
        };
        if self.decoder_secret.is_empty() {
            return false;
        }
        let Some(alg) = header.get("alg").and_then(Value::as_str) else {
            return false;
        };
        self.token
            .trim()
            .rsplit_once('.')
            .and_then(|(input, _)| hmac(alg, &self.decoder_secret, input))
            .is_some_and(|mac| URL_SAFE_NO_PAD.encode(mac) == signature)
    }

    fn generated(&self, options: &FakeOptions) -> String {
        if self.header.trim().is_empty()
            || self.payload.trim().is_empty()
            || (self.encoder_secret.is_empty() && !options.sign_empty_secret)
        {
            return String::new();
        }
        let (Ok(header), Ok(payload)) = (
            serde_json::from_str::<Value>(&self.header),
            serde_json::from_str::<Value>(&self.payload),
        ) else {
            return String::new();
        };
        sign(&header, &payload, &self.encoder_secret).unwrap_or_default()
    }

    /// Catch the rendered output up with the inputs once the lag has passed
    fn settle(&mut self, options: &FakeOptions) {
        let due = match (options.render_lag, self.edited_at) {
            (Some(lag), Some(at)) => at.elapsed() >= lag,
            _ => true,
        };
        if due {
            self.rendered = self.generated(options);
        }
    }

    /// Token the encoder output shows right now
    fn displayed(&mut self, options: &FakeOptions) -> String {
        self.settle(options);
        self.rendered.clone()
    }

    fn edited(&mut self, options: &FakeOptions) {
        self.settle(options);
        self.edited_at = Some(Instant::now());
    }
}

/// One page of the fake site
#[derive(Debug)]
pub struct FakeJwtSite {
    state: Mutex<SiteState>,
    options: FakeOptions,
    closed: Arc<AtomicUsize>,
}

impl Default for FakeJwtSite {
    fn default() -> Self {
        Self::new(FakeOptions::default())
    }
}

impl FakeJwtSite {
    pub fn new(options: FakeOptions) -> Self {
        Self::with_counter(options, Arc::new(AtomicUsize::new(0)))
    }

    fn with_counter(options: FakeOptions, closed: Arc<AtomicUsize>) -> Self {
        Self {
            state: Mutex::new(SiteState::fresh()),
            options,
            closed,
        }
    }

    /// Characters typed so far, with the requested pause
    pub fn keystrokes(&self) -> Vec<(char, Duration)> {
        self.state.lock().unwrap().keystrokes.clone()
    }

    /// Token the encoder currently shows
    pub fn generated_token(&self) -> String {
        self.state.lock().unwrap().displayed(&self.options)
    }

    pub fn times_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn count_in(&self, state: &SiteState, expr: &str) -> usize {
        if !state.loaded || self.options.hidden.contains(&expr) {
            return 0;
        }
        let decoder = state.tab == Tab::Decoder;
        let present = match expr {
            e if e == selectors::DECODER_TAB || e == selectors::ENCODER_TAB => true,
            e if e == selectors::ENCODED_VALUE
                || e == selectors::DECODED_HEADER
                || e == selectors::DECODED_PAYLOAD
                || e == selectors::DECODER_SECRET =>
            {
                decoder
            }
            e if e == selectors::ENCODER_HEADER
                || e == selectors::ENCODER_PAYLOAD
                || e == selectors::ENCODER_SECRET
                || e == selectors::GENERATED_TOKEN =>
            {
                !decoder
            }
            e if e == selectors::SIGNATURE_VERIFIED => {
                decoder
                    && state.decoded().is_some()
                    && !self.options.reject_signatures
                    && state.verified()
            }
            e if e == selectors::INVALID_SIGNATURE => {
                decoder
                    && state.decoded().is_some()
                    && (self.options.reject_signatures || !state.verified())
            }
            _ => false,
        };
        match (present, self.options.duplicated.contains(&expr)) {
            (false, _) => 0,
            (true, false) => 1,
            (true, true) => 2,
        }
    }

    fn missing(selector: &Selector) -> ProbeError {
        ProbeError::page(format!("no element matches {selector}"))
    }

    fn field<'s>(state: &'s mut SiteState, expr: &str) -> Option<&'s mut String> {
        match expr {
            e if e == selectors::ENCODED_VALUE => Some(&mut state.token),
            e if e == selectors::DECODER_SECRET => Some(&mut state.decoder_secret),
            e if e == selectors::ENCODER_HEADER => Some(&mut state.header),
            e if e == selectors::ENCODER_PAYLOAD => Some(&mut state.payload),
            e if e == selectors::ENCODER_SECRET => Some(&mut state.encoder_secret),
            _ => None,
        }
    }
}

#[async_trait]
impl PageDriver for FakeJwtSite {
    async fn goto(&self, url: &str, _wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        if self.options.unreachable {
            return Err(ProbeError::Navigation {
                url: url.to_string(),
                message: format!("net::ERR_NAME_NOT_RESOLVED after {}ms", timeout.as_millis()),
            });
        }
        let mut state = self.state.lock().unwrap();
        let keystrokes = std::mem::take(&mut state.keystrokes);
        *state = SiteState::fresh();
        state.keystrokes = keystrokes;
        state.loaded = true;
        state.url = url.to_string();
        state.settle(&self.options);
        Ok(())
    }

    async fn count(&self, selector: &Selector) -> ProbeResult<usize> {
        let state = self.state.lock().unwrap();
        Ok(self.count_in(&state, selector.expression()))
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> ProbeResult<Option<String>> {
        let state = self.state.lock().unwrap();
        let expr = selector.expression();
        if self.count_in(&state, expr) == 0 || name != "data-active" {
            return Ok(None);
        }
        let active = if expr == selectors::DECODER_TAB {
            state.tab == Tab::Decoder
        } else if expr == selectors::ENCODER_TAB {
            state.tab == Tab::Encoder
        } else {
            return Ok(None);
        };
        Ok(Some(active.to_string()))
    }

    async fn text_content(&self, selector: &Selector) -> ProbeResult<Option<String>> {
        let mut state = self.state.lock().unwrap();
        let expr = selector.expression();
        if self.count_in(&state, expr) == 0 {
            return Ok(None);
        }
        let decoded = state.decoded();
        let text = match expr {
            e if e == selectors::DECODED_HEADER => decoded
                .map(|(h, _, _)| format!("{h:#}"))
                .unwrap_or_default(),
            e if e == selectors::DECODED_PAYLOAD => decoded
                .map(|(_, p, _)| format!("{p:#}"))
                .unwrap_or_default(),
            e if e == selectors::GENERATED_TOKEN => state.displayed(&self.options),
            e if e == selectors::SIGNATURE_VERIFIED => "Signature Verified".to_string(),
            e if e == selectors::INVALID_SIGNATURE => "Invalid Signature".to_string(),
            e if e == selectors::DECODER_TAB => "JWT Decoder".to_string(),
            e if e == selectors::ENCODER_TAB => "JWT Encoder".to_string(),
            e => Self::field(&mut state, e).map(|v| v.clone()).unwrap_or_default(),
        };
        Ok(Some(text))
    }

    async fn input_value(&self, selector: &Selector) -> ProbeResult<String> {
        let mut state = self.state.lock().unwrap();
        let expr = selector.expression();
        if self.count_in(&state, expr) == 0 {
            return Err(Self::missing(selector));
        }
        Self::field(&mut state, expr)
            .map(|v| v.clone())
            .ok_or_else(|| ProbeError::page(format!("{selector} is not a form control")))
    }

    async fn click(&self, selector: &Selector) -> ProbeResult<()> {
        let mut state = self.state.lock().unwrap();
        let expr = selector.expression();
        if self.count_in(&state, expr) == 0 {
            return Err(Self::missing(selector));
        }
        if expr == selectors::ENCODER_TAB && state.tab == Tab::Decoder {
            if let Some((header, payload, _)) = state.decoded() {
                state.header = format!("{header:#}");
                state.payload = format!("{payload:#}");
            }
            state.tab = Tab::Encoder;
        } else if expr == selectors::DECODER_TAB && state.tab == Tab::Encoder {
            let generated = state.displayed(&self.options);
            if !generated.is_empty() {
                state.token = generated;
            }
            state.tab = Tab::Decoder;
        }
        Ok(())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
        let mut state = self.state.lock().unwrap();
        let expr = selector.expression();
        if self.count_in(&state, expr) == 0 {
            return Err(Self::missing(selector));
        }
        state.edited(&self.options);
        let field = Self::field(&mut state, expr)
            .ok_or_else(|| ProbeError::page(format!("{selector} is not editable")))?;
        *field = text.to_string();
        Ok(())
    }

    async fn type_text(&self, selector: &Selector, text: &str, delay: Duration) -> ProbeResult<()> {
        for ch in text.chars() {
            let mut state = self.state.lock().unwrap();
            let expr = selector.expression();
            if self.count_in(&state, expr) == 0 {
                return Err(Self::missing(selector));
            }
            state.edited(&self.options);
            Self::field(&mut state, expr)
                .ok_or_else(|| ProbeError::page(format!("{selector} is not editable")))?
                .push(ch);
            state.keystrokes.push((ch, delay));
        }
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Screenshot> {
        Ok(Screenshot::new(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]))
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn close(&self) -> ProbeResult<()> {
        let _ = self.closed.fetch_add(1, Ordering::SeqCst);
        if self.options.fail_close {
            return Err(ProbeError::Session {
                message: "page already detached".to_string(),
            });
        }
        Ok(())
    }
}

/// Hands out fresh fake pages and counts them
#[derive(Debug, Default)]
pub struct FakeSiteFactory {
    pub options: FakeOptions,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl FakeSiteFactory {
    pub fn new(options: FakeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeSiteFactory {
    async fn open(&self) -> ProbeResult<Box<dyn PageDriver>> {
        let _ = self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeJwtSite::with_counter(
            self.options.clone(),
            Arc::clone(&self.closed),
        )))
    }

    fn name(&self) -> &str {
        "fake-jwt-site"
    }
}
