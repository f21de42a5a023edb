//! Page Object Model Support
//!
//! A [`Page`] is a logical destination in the browser: a name, one or more
//! acceptable URIs, a readiness probe and the elements it shows once fully
//! rendered. Its state is never stored. Every check reads the live browser
//! through the [`TestContext`] again.
//!
//! - **Opened**: the browser location matches any acceptable URI
//! - **Loaded**: the readiness probe succeeds
//! - **Navigated to**: opened, then loaded
//!
//! Custom page types embed a [`Page`] and implement [`PageObject`]:
//!
//! ```ignore
//! struct HomePage {
//!     page: Page,
//! }
//!
//! impl HomePage {
//!     fn new() -> Self {
//!         Self {
//!             page: Page::builder_for::<Self>("/en/home")
//!                 .alternate_uri("/en-gb/home")
//!                 .probe(element_visible(Selector::css("#hero")))
//!                 .build(),
//!         }
//!     }
//! }
//!
//! impl PageObject for HomePage {
//!     fn page(&self) -> &Page {
//!         &self.page
//!     }
//! }
//!
//! home.open(&ctx)?;
//! home.wait_until_navigated_to(&ctx)?;
//! ```

use crate::assertion::retry::{Poll, PollPolicy};
use crate::assertion::Matcher;
use crate::context::TestContext;
use crate::driver::Selector;
use crate::expected_elements::ExpectedElements;
use crate::matchers::{is_loaded, is_opened};
use crate::reporter::step;
use crate::result::{PageCheckError, PageCheckResult};
use crate::uri::{compare_uris, display_uri, matches_any, opened_uri, resolve_uri, UriMatch};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Check telling whether a page finished rendering
pub trait ReadinessProbe: Send + Sync {
    /// Succeed once the page is ready
    ///
    /// # Errors
    ///
    /// Returns the reason the page is not ready
    fn wait_until_ready(&self, ctx: &TestContext) -> PageCheckResult<()>;
}

impl<F> ReadinessProbe for F
where
    F: Fn(&TestContext) -> PageCheckResult<()> + Send + Sync,
{
    fn wait_until_ready(&self, ctx: &TestContext) -> PageCheckResult<()> {
        self(ctx)
    }
}

/// Probe waiting for an element to become visible
#[derive(Debug, Clone)]
pub struct ElementVisible {
    selector: Selector,
}

/// Ready once `selector` is visible, polled under the heavy-pages policy
#[must_use]
pub const fn element_visible(selector: Selector) -> ElementVisible {
    ElementVisible { selector }
}

impl ReadinessProbe for ElementVisible {
    fn wait_until_ready(&self, ctx: &TestContext) -> PageCheckResult<()> {
        let driver = ctx.driver();
        Poll::new(ctx.heavy_policy())
            .describe(format!("{} visible", self.selector))
            .retry_if(PageCheckError::is_transient)
            .run(|| {
                if driver.is_visible(&self.selector)? {
                    Ok(())
                } else {
                    Err(PageCheckError::ElementNotVisible {
                        selector: self.selector.to_string(),
                        visible: true,
                    })
                }
            })
    }
}

/// Acceptable URIs of a page, primary first.
///
/// Relative references resolve against the context base URL. Query
/// parameters and the fragment only decorate the primary URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUris {
    primary: String,
    alternates: Vec<String>,
    query: Vec<(String, String)>,
    fragment: Option<String>,
}

impl PageUris {
    /// Page reachable at `primary`
    #[must_use]
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            alternates: Vec::new(),
            query: Vec::new(),
            fragment: None,
        }
    }

    /// Accept another URI for the same page
    #[must_use]
    pub fn with_alternate(mut self, uri: impl Into<String>) -> Self {
        self.alternates.push(uri.into());
        self
    }

    /// Add a query parameter, replacing any previous value with that name
    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.query.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.query.push((name, value)),
        }
        self
    }

    /// Set the fragment of the primary URI
    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Query parameters in insertion order
    #[must_use]
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// Primary URI resolved against `base`
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::InvalidUrl`] if the reference cannot be resolved
    pub fn primary(&self, base: Option<&Url>) -> PageCheckResult<Url> {
        let mut url = resolve_uri(base, &self.primary)?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        if let Some(fragment) = &self.fragment {
            url.set_fragment(Some(fragment));
        }
        Ok(url)
    }

    /// Every acceptable URI resolved against `base`, primary first
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::InvalidUrl`] if any reference cannot be resolved
    pub fn all(&self, base: Option<&Url>) -> PageCheckResult<Vec<Url>> {
        let mut uris = vec![self.primary(base)?];
        for alternate in &self.alternates {
            uris.push(resolve_uri(base, alternate)?);
        }
        Ok(uris)
    }
}

/// A logical page
#[derive(Clone)]
pub struct Page {
    name: String,
    uris: PageUris,
    probe: Option<Arc<dyn ReadinessProbe>>,
    expected_elements: ExpectedElements,
    error_pages: Vec<(String, Selector)>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("name", &self.name)
            .field("uris", &self.uris)
            .field("has_probe", &self.probe.is_some())
            .field("expected_elements", &self.expected_elements)
            .field("error_pages", &self.error_pages)
            .finish()
    }
}

impl Page {
    /// Start building a page named `name` reachable at `uri`
    #[must_use]
    pub fn builder(name: impl Into<String>, uri: impl Into<String>) -> PageBuilder {
        PageBuilder {
            page: Self {
                name: name.into(),
                uris: PageUris::new(uri),
                probe: None,
                expected_elements: ExpectedElements::default(),
                error_pages: Vec::new(),
            },
        }
    }

    /// Start building a page named after the type `T`
    #[must_use]
    pub fn builder_for<T: ?Sized>(uri: impl Into<String>) -> PageBuilder {
        Self::builder(short_type_name::<T>(), uri)
    }

    /// Page name used in steps and errors
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acceptable URIs
    #[must_use]
    pub const fn uris(&self) -> &PageUris {
        &self.uris
    }

    /// Expected elements of the fully loaded page
    #[must_use]
    pub const fn expected_elements(&self) -> &ExpectedElements {
        &self.expected_elements
    }

    /// Whether a readiness probe is set
    #[must_use]
    pub fn has_probe(&self) -> bool {
        self.probe.is_some()
    }

    /// Copy of this page with one query parameter merged in
    #[must_use]
    pub fn with_query_param(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut page = self.clone();
        page.uris = page.uris.with_query_param(name, value);
        page
    }

    fn require_http(&self, url: Url) -> PageCheckResult<Url> {
        if matches!(url.scheme(), "http" | "https") {
            Ok(url)
        } else {
            Err(PageCheckError::configuration(format!(
                "{} URI must start with valid http(s) scheme, got {url}",
                self.name
            )))
        }
    }

    /// Primary URI resolved against the context base URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URI is not http(s), or
    /// [`PageCheckError::InvalidUrl`] if it cannot be resolved
    pub fn primary_uri(&self, ctx: &TestContext) -> PageCheckResult<Url> {
        self.require_http(self.uris.primary(ctx.base_url())?)
    }

    /// Every acceptable URI resolved against the context base URL
    ///
    /// # Errors
    ///
    /// Same as [`Page::primary_uri`], for any of the URIs
    pub fn all_uris(&self, ctx: &TestContext) -> PageCheckResult<Vec<Url>> {
        self.uris
            .all(ctx.base_url())?
            .into_iter()
            .map(|url| self.require_http(url))
            .collect()
    }

    /// Poll until the browser shows any acceptable URI
    pub(crate) fn match_uris(
        &self,
        ctx: &TestContext,
        flags: UriMatch,
        policy: PollPolicy,
    ) -> PageCheckResult<()> {
        let expected = self.all_uris(ctx)?;
        Poll::new(policy)
            .describe(format!("{} opened", self.name))
            .retry_if(PageCheckError::is_transient)
            .run(|| {
                let opened = opened_uri(ctx.driver(), flags)?;
                if matches_any(&opened, &expected, flags) {
                    Ok(())
                } else {
                    Err(PageCheckError::UriMismatch {
                        page: self.name.clone(),
                        expected: expected.iter().map(display_uri).collect(),
                        actual: opened.to_string(),
                    })
                }
            })
    }

    fn check_error_pages(&self, ctx: &TestContext) -> PageCheckResult<()> {
        for (label, selector) in &self.error_pages {
            if ctx.driver().is_visible(selector)? {
                return Err(PageCheckError::Environment {
                    message: format!("{label} is loaded"),
                });
            }
        }
        Ok(())
    }

    fn run_probe(&self, ctx: &TestContext) -> PageCheckResult<()> {
        let probe = self.probe.as_ref().ok_or_else(|| {
            PageCheckError::configuration(format!(
                "{} has no readiness probe, cannot wait for it to load",
                self.name
            ))
        })?;
        probe.wait_until_ready(ctx)
    }
}

/// Builder for [`Page`]
#[derive(Debug)]
pub struct PageBuilder {
    page: Page,
}

impl PageBuilder {
    /// Accept another URI for the same page
    #[must_use]
    pub fn alternate_uri(mut self, uri: impl Into<String>) -> Self {
        self.page.uris = self.page.uris.with_alternate(uri);
        self
    }

    /// Add a query parameter to the primary URI
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.page.uris = self.page.uris.with_query_param(name, value);
        self
    }

    /// Set the fragment of the primary URI
    #[must_use]
    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.page.uris = self.page.uris.with_fragment(fragment);
        self
    }

    /// Readiness probe run by the loaded check
    #[must_use]
    pub fn probe(mut self, probe: impl ReadinessProbe + 'static) -> Self {
        self.page.probe = Some(Arc::new(probe));
        self
    }

    /// Elements the fully loaded page shows
    #[must_use]
    pub fn expected_elements(mut self, expected: ExpectedElements) -> Self {
        self.page.expected_elements = expected;
        self
    }

    /// Known error page, recognised by a visible `selector`
    #[must_use]
    pub fn error_page(mut self, label: impl Into<String>, selector: Selector) -> Self {
        self.page.error_pages.push((label.into(), selector));
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> Page {
        self.page
    }
}

/// Capabilities of a page object
///
/// Implementors only provide [`PageObject::page`]; every check is derived
/// from it.
pub trait PageObject {
    /// The page definition
    fn page(&self) -> &Page;

    /// Page name used in steps and errors
    fn name(&self) -> &str {
        self.page().name()
    }

    /// Navigate to the primary URI
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::Navigation`] if the driver fails to navigate
    fn open(&self, ctx: &TestContext) -> PageCheckResult<()> {
        let url = self.page().primary_uri(ctx)?;
        step(ctx.steps(), &format!("Open {}: {url}", self.name()), || {
            info!(page = self.name(), %url, "opening page");
            ctx.driver()
                .navigate_to(url.as_str())
                .map_err(|source| PageCheckError::Navigation {
                    page: self.name().to_string(),
                    url: url.to_string(),
                    source,
                })
        })
    }

    /// Open the page, then wait until it is loaded
    ///
    /// # Errors
    ///
    /// Returns the navigation or loading failure
    fn load(&self, ctx: &TestContext) -> PageCheckResult<()> {
        step(ctx.steps(), &format!("Load {}", self.name()), || {
            self.open(ctx)?;
            self.wait_until_loaded(ctx)
        })
    }

    /// Whether the browser shows this page within the standard timeout
    ///
    /// # Errors
    ///
    /// Only structural failures (bad URI, driver failure) are returned;
    /// a page that never shows up is `Ok(false)`
    fn check_if_opened(
        &self,
        ctx: &TestContext,
        query_needed: bool,
        fragment_needed: bool,
    ) -> PageCheckResult<bool> {
        let flags = UriMatch::new(query_needed, fragment_needed);
        swallow_transient(self.page().match_uris(ctx, flags, ctx.standard_policy()))
    }

    /// Fail unless the browser shows this page within the heavy-pages timeout
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::UriMismatch`] with the last observed location
    fn wait_until_opened(&self, ctx: &TestContext) -> PageCheckResult<()> {
        is_opened(ctx).check(self)
    }

    /// Whether the browser leaves the primary URI within `timeout`
    ///
    /// # Errors
    ///
    /// Only structural failures are returned
    fn redirected_within(&self, ctx: &TestContext, timeout: Duration) -> PageCheckResult<bool> {
        let primary = self.page().primary_uri(ctx)?;
        let policy = ctx.standard_policy().with_timeout(timeout);
        let outcome = Poll::new(policy)
            .describe(format!("redirect out of {}", self.name()))
            .retry_if(PageCheckError::is_transient)
            .run(|| {
                let opened = opened_uri(ctx.driver(), UriMatch::LOOSE)?;
                if compare_uris(&opened, &primary, UriMatch::LOOSE) {
                    Err(PageCheckError::Timeout {
                        message: format!("still at {}", display_uri(&opened)),
                        ms: policy.timeout_ms(),
                    })
                } else {
                    debug!(page = self.name(), to = %opened, "redirected");
                    Ok(())
                }
            });
        swallow_transient(outcome)
    }

    /// Fail unless the browser leaves the primary URI within `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::Timeout`] if no redirect happened
    fn wait_until_redirect_within(&self, ctx: &TestContext, timeout: Duration) -> PageCheckResult<()> {
        step(
            ctx.steps(),
            &format!("Wait until redirected out of {}", self.name()),
            || {
                if self.redirected_within(ctx, timeout)? {
                    Ok(())
                } else {
                    Err(PageCheckError::Timeout {
                        message: format!(
                            "Browser did not redirect out of {} within {} seconds",
                            self.name(),
                            timeout.as_secs()
                        ),
                        ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    })
                }
            },
        )
    }

    /// Run the readiness probe, reported as a step
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the page has no probe, an
    /// environment error if a known error page is shown, or
    /// [`PageCheckError::NotLoaded`] wrapping the probe failure
    fn wait_until_loaded(&self, ctx: &TestContext) -> PageCheckResult<()> {
        let page = self.page();
        step(ctx.steps(), &format!("{} should be loaded", self.name()), || {
            page.check_error_pages(ctx)?;
            page.run_probe(ctx).map_err(|source| match source {
                PageCheckError::Configuration { .. } => source,
                source => PageCheckError::NotLoaded {
                    page: self.name().to_string(),
                    url: match ctx.driver().current_url() {
                        Ok(url) => url,
                        Err(err) => format!("<unavailable: {err}>"),
                    },
                    source: Box::new(source),
                },
            })
        })
    }

    /// Whether the readiness probe succeeds
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the page has no probe
    fn check_if_loaded(&self, ctx: &TestContext) -> PageCheckResult<bool> {
        swallow_transient(self.page().run_probe(ctx))
    }

    /// Wait until opened, then until loaded
    ///
    /// # Errors
    ///
    /// Returns the first failing stage; the probe never runs on the wrong page
    fn wait_until_navigated_to(&self, ctx: &TestContext) -> PageCheckResult<()> {
        self.wait_until_opened(ctx)?;
        is_loaded(ctx).check(self)
    }

    /// Check every expected element of the active layout
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no element is expected in this
    /// layout, or every failed expectation at once
    fn should_be_fully_loaded(&self, ctx: &TestContext) -> PageCheckResult<()> {
        let expected = self.page().expected_elements();
        if expected.count_for(ctx.view_type()) == 0 {
            return Err(PageCheckError::configuration(format!(
                "{} is expected to fully load, but no expected elements have been set",
                self.name()
            )));
        }
        expected.should_be_fully_loaded(ctx)
    }
}

impl PageObject for Page {
    fn page(&self) -> &Page {
        self
    }
}

fn swallow_transient(outcome: PageCheckResult<()>) -> PageCheckResult<bool> {
    match outcome {
        Ok(()) => Ok(true),
        Err(err) if err.is_transient() => Ok(false),
        Err(err) => Err(err),
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
