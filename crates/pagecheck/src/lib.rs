//! Pagecheck: page objects and polling assertions for browser tests
//!
//! Browser state is eventually consistent: a redirect lands a moment after
//! the click, a cookie written before a refresh may come back stale, a hero
//! image appears once scripts finish. Pagecheck turns such checks into
//! bounded polling loops that report the last real mismatch when they give
//! up.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PAGECHECK Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Page       │    │ Matchers / │    │ Browser    │            │
//! │   │ Objects    │───►│ Poll loop  │───►│ Driver     │            │
//! │   │ (URIs,     │    │ (retry)    │    │ (CDP/mock) │            │
//! │   │  probes)   │    │            │    │            │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │          ▲                 │                                    │
//! │          │                 ▼                                    │
//! │   ┌────────────┐    ┌────────────┐                              │
//! │   │ TestContext│    │ Step sink  │                              │
//! │   │ (config,   │    │ (tracing / │                              │
//! │   │  base URL) │    │  recorder) │                              │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pagecheck::prelude::*;
//!
//! let config = EnvironmentConfig::load(Path::new("config"), "staging")?;
//! let ctx = TestContext::for_projects(config, "test_home", &["cms"], driver)?;
//!
//! let home = Page::builder("HomePage", "/en")
//!     .alternate_uri("/en-gb")
//!     .probe(element_visible(Selector::css("#hero")))
//!     .build();
//!
//! home.open(&ctx)?;
//! ctx.assert_that("Home page reached", &home, &is_navigated_to(&ctx))?;
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Matchers and the polling/retry engine
pub mod assertion;

/// Chromium driver (feature `browser`)
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
pub mod cdp;

pub mod collectors;

/// Environment configuration
#[allow(clippy::missing_errors_doc, clippy::struct_excessive_bools)]
pub mod config;

mod context;

pub mod cookies;

/// Browser driver abstraction
pub mod driver;

pub mod expected_elements;

pub mod logging;

/// Page matchers
pub mod matchers;

/// Test doubles (scriptable browser, proptest strategies)
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod mock;

pub mod page_object;

pub mod project;

/// Step reporting
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod reporter;

mod result;

pub mod uri;

pub use assertion::retry::{poll, poll_until, Poll, PollPolicy, Stopwatch};
pub use assertion::soft::{AssertionFailure, SoftAssertions};
pub use assertion::{all_of, assert_that, wait_until, wait_until_call, AllOf, Matcher};
#[cfg(feature = "browser")]
pub use cdp::CdpDriver;
pub use config::{BuildEnvType, EnvironmentConfig, ViewType, WebDriverType};
pub use context::TestContext;
pub use cookies::{Cookie, CookieManager};
pub use driver::{BrowserDriver, DriverConfig, DriverError, ElementHandle, Selector};
pub use expected_elements::{ElementRef, ExpectedElements, ViewScope};
pub use logging::LogFormat;
pub use matchers::{is_loaded, is_navigated_to, is_opened, with_query_param, IsLoaded, IsOpened};
pub use page_object::{element_visible, Page, PageBuilder, PageObject, PageUris, ReadinessProbe};
pub use project::{ProjectRegistry, ResolvedProject, E2E_TAG};
pub use reporter::{StepRecord, StepRecorder, StepSink, StepStatus, TracingSteps};
pub use result::{PageCheckError, PageCheckResult};
pub use uri::{compare_uris, matches_any, UriMatch};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::retry::{PollPolicy, Stopwatch};
    pub use super::assertion::soft::SoftAssertions;
    pub use super::assertion::{assert_that, wait_until, wait_until_call, Matcher};
    pub use super::config::{EnvironmentConfig, ViewType};
    pub use super::context::TestContext;
    pub use super::cookies::{Cookie, CookieManager};
    pub use super::driver::{BrowserDriver, DriverError, ElementHandle, Selector};
    pub use super::expected_elements::ExpectedElements;
    pub use super::matchers::*;
    pub use super::page_object::{element_visible, Page, PageObject, ReadinessProbe};
    pub use super::result::{PageCheckError, PageCheckResult};
    pub use super::uri::UriMatch;
    #[cfg(feature = "browser")]
    pub use super::cdp::CdpDriver;
}
