//! Page matchers
//!
//! Matchers over page objects that read the live browser through a
//! [`TestContext`]:
//!
//! ```ignore
//! ctx.assert_that("", &home, &is_opened(&ctx).query_needed(true))?;
//! ctx.assert_that("Home page reached", &home, &is_navigated_to(&ctx))?;
//! ```
//!
//! The generic matchers from [`crate::assertion`] are re-exported so one
//! import covers both.

use crate::assertion::{all_of, AllOf, Matcher};
use crate::context::TestContext;
use crate::page_object::PageObject;
use crate::reporter::step;
use crate::result::PageCheckResult;
use crate::uri::UriMatch;
use std::fmt;
use std::time::Duration;

pub use crate::assertion::{contains_str, equal_to, is_empty, not};

/// Matches pages the browser currently shows
#[derive(Clone, Copy)]
pub struct IsOpened<'a> {
    ctx: &'a TestContext,
    flags: UriMatch,
    timeout: Option<Duration>,
}

/// Poll the browser location against every acceptable page URI.
///
/// Query and fragment are ignored unless asked for; the budget defaults to
/// the heavy-pages timeout.
#[must_use]
pub const fn is_opened(ctx: &TestContext) -> IsOpened<'_> {
    IsOpened {
        ctx,
        flags: UriMatch::LOOSE,
        timeout: None,
    }
}

impl IsOpened<'_> {
    /// Compare query strings too
    #[must_use]
    pub const fn query_needed(mut self, needed: bool) -> Self {
        self.flags = self.flags.with_query(needed);
        self
    }

    /// Compare fragments too
    #[must_use]
    pub const fn fragment_needed(mut self, needed: bool) -> Self {
        self.flags = self.flags.with_fragment(needed);
        self
    }

    /// Override the time budget
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for IsOpened<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsOpened")
            .field("flags", &self.flags)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<P: PageObject + ?Sized> Matcher<P> for IsOpened<'_> {
    fn describe(&self) -> String {
        "Page (with proper URI) opened".to_string()
    }

    fn check(&self, actual: &P) -> PageCheckResult<()> {
        let mut policy = self.ctx.heavy_policy();
        if let Some(timeout) = self.timeout {
            policy = policy.with_timeout(timeout);
        }
        step(
            self.ctx.steps(),
            &format!("Validate that {} is opened", actual.name()),
            || actual.page().match_uris(self.ctx, self.flags, policy),
        )
    }
}

/// Matches pages whose readiness probe succeeds
#[derive(Clone, Copy)]
pub struct IsLoaded<'a> {
    ctx: &'a TestContext,
}

/// Run the page readiness probe
#[must_use]
pub const fn is_loaded(ctx: &TestContext) -> IsLoaded<'_> {
    IsLoaded { ctx }
}

impl fmt::Debug for IsLoaded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsLoaded").finish_non_exhaustive()
    }
}

impl<P: PageObject + ?Sized> Matcher<P> for IsLoaded<'_> {
    fn describe(&self) -> String {
        "Loaded Page".to_string()
    }

    fn check(&self, actual: &P) -> PageCheckResult<()> {
        step(
            self.ctx.steps(),
            &format!("Validate that {} is loaded", actual.name()),
            || actual.wait_until_loaded(self.ctx),
        )
    }
}

/// Opened, then loaded
#[must_use]
pub fn is_navigated_to<'a, P: PageObject + ?Sized + 'a>(ctx: &'a TestContext) -> AllOf<'a, P> {
    all_of(Vec::new()).and(is_opened(ctx)).and(is_loaded(ctx))
}

/// Opened with the exact query string, then loaded
#[must_use]
pub fn with_query_param<'a, P: PageObject + ?Sized + 'a>(ctx: &'a TestContext) -> AllOf<'a, P> {
    all_of(Vec::new())
        .and(is_opened(ctx).query_needed(true))
        .and(is_loaded(ctx))
}
