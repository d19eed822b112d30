//! jwt-probe: end-to-end UI tests for a JWT encoder/decoder site
//!
//! A page-abstraction layer over a browser page plus a scenario runner.
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌─────────────┐   ┌────────────┐
//! │ Suites     │──►│ SuiteRunner  │──►│ JwtIoPage   │──►│ PageDriver │
//! │ (scenarios)│   │ (per-scenario│   │ (capability │   │ (chromium  │
//! │            │   │  sessions)   │   │  traits)    │   │  or mock)  │
//! └────────────┘   └──────────────┘   └─────────────┘   └────────────┘
//! ```
//!
//! Scenarios see the page only through the traits in [`surface`]; every
//! selector lives in [`page_object::selectors`]. Each scenario runs on a
//! fresh session from a [`SessionFactory`] and is released through the
//! [`TeardownHook`]s of its [`SessionFixture`].

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod assertion;
mod browser;
#[allow(clippy::missing_errors_doc)]
pub mod config;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
#[allow(clippy::missing_errors_doc)]
mod fixture;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod harness;
mod locator;
#[allow(clippy::missing_errors_doc)]
pub mod page_object;
#[allow(
    clippy::missing_errors_doc,
    clippy::format_push_string,
    clippy::needless_raw_string_hashes
)]
mod reporter;
mod result;
/// Built-in scenario catalog
pub mod suites;
/// Capability interfaces of the page
pub mod surface;
#[allow(clippy::missing_errors_doc)]
mod test_data;
#[allow(clippy::missing_errors_doc)]
mod token;
mod wait;

pub use assertion::{check_eq, check_ne, check_true, normalize_whitespace, Expect};
pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::{ChromiumDriver, ChromiumSessionFactory};
pub use config::{RunConfig, ScreenshotPolicy, TracePolicy, Viewport};
pub use driver::{MockDriver, MockElement, PageDriver, Screenshot};
pub use fixture::{ClosePage, SessionFactory, SessionFixture, TeardownHook};
pub use harness::{
    run_suites, FailureMode, Scenario, ScenarioContext, ScenarioState, Step, StepFuture, StepKind,
    Suite, SuiteRunner,
};
pub use locator::{Locator, LocatorOptions, Selector};
pub use page_object::{JwtIoPage, PageObject};
pub use reporter::{
    render_html, render_junit, render_trace, ErrorReport, ReportArtifacts, Reporter, RunReport,
    ScenarioReport, StepReport, StepStatus, SuiteReport,
};
pub use result::{AssertionFailure, ProbeError, ProbeResult};
pub use surface::{
    Banner, FormSurface, JwtSurfaces, Navigable, NotificationSurface, SecretVariant,
    SignatureState, Surface, TabSurface,
};
pub use test_data::{pretty, TestData};
pub use token::{segment_count, TokenParts};
pub use wait::{poll_until, LoadState, Readiness, WaitOptions, WaitOutcome};

/// Prelude for writing scenarios
pub mod prelude {
    pub use crate::{
        check_eq, check_ne, check_true, Banner, FormSurface, JwtSurfaces, Navigable,
        NotificationSurface, ProbeError, ProbeResult, Scenario, ScenarioContext, SecretVariant,
        StepKind, Suite, Surface, TabSurface,
    };
}
