//! Browser cookies
//!
//! [`CookieManager`] wraps the driver's cookie jar. Its main job is
//! [`CookieManager::set_and_validate_cookies`]: make sure a set of required
//! cookies holds the expected values even when a refresh briefly serves a
//! stale jar. Every round sets what is missing, refreshes, and checks again.
//!
//! Refreshing is assumed to be safe for the page under test.

use crate::assertion::retry::{Poll, PollPolicy};
use crate::assertion::{is_empty, Matcher};
use crate::collectors::only_one;
use crate::driver::BrowserDriver;
use crate::result::{PageCheckError, PageCheckResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Sleep between cookie validation rounds
pub const COOKIE_POLLING_INTERVAL_MS: u64 = 1_000;

const UNSET_COOKIES_REASON: &str = "No required cookies should be left unset";

/// A browser cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path the cookie is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Cookie {
    /// Create a cookie for the current page
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    /// Scope the cookie to a domain
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Scope the cookie to a path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Same name and value; scope is ignored
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Cookie operations over one browser session
#[derive(Clone)]
pub struct CookieManager {
    driver: Arc<dyn BrowserDriver>,
    policy: PollPolicy,
}

impl fmt::Debug for CookieManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieManager")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CookieManager {
    /// Create a manager validating cookies within `timeout`
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, timeout: Duration) -> Self {
        Self {
            driver,
            policy: PollPolicy::new(timeout)
                .with_polling_interval(Duration::from_millis(COOKIE_POLLING_INTERVAL_MS)),
        }
    }

    /// Override the validation policy
    #[must_use]
    pub const fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Policy used by [`Self::set_and_validate_cookies`]
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Add a cookie without touching existing ones
    ///
    /// # Errors
    ///
    /// Returns the driver failure
    pub fn add_cookie(&self, cookie: &Cookie) -> PageCheckResult<()> {
        info!(cookie = %cookie, "Adding cookie");
        self.driver.add_cookie(cookie)?;
        Ok(())
    }

    /// Replace any cookie with the same name
    ///
    /// # Errors
    ///
    /// Returns the driver failure
    pub fn set_cookie(&self, cookie: &Cookie) -> PageCheckResult<()> {
        self.delete_cookie(&cookie.name)?;
        self.add_cookie(cookie)
    }

    /// Delete every cookie with the given name
    ///
    /// # Errors
    ///
    /// Returns the driver failure
    pub fn delete_cookie(&self, name: &str) -> PageCheckResult<()> {
        info!(cookie = name, "Deleting cookie");
        self.driver.delete_cookie(name)?;
        Ok(())
    }

    /// The single cookie called `name`
    ///
    /// # Errors
    ///
    /// Fails when no cookie or more than one cookie has that name
    pub fn get_cookie(&self, name: &str) -> PageCheckResult<Cookie> {
        let cookies = self.driver.cookies()?;
        only_one(
            cookies.into_iter().filter(|c| c.name == name),
            &format!("cookie {name}"),
        )
    }

    /// Value of the single cookie called `name`
    ///
    /// # Errors
    ///
    /// Fails when no cookie or more than one cookie has that name
    pub fn cookie_value(&self, name: &str) -> PageCheckResult<String> {
        Ok(self.get_cookie(name)?.value)
    }

    /// Whether at least one cookie called `name` exists
    ///
    /// # Errors
    ///
    /// Returns the driver failure
    pub fn is_cookie_present(&self, name: &str) -> PageCheckResult<bool> {
        Ok(self.driver.cookies()?.iter().any(|c| c.name == name))
    }

    /// Whether the browser holds exactly one cookie with this name and value.
    ///
    /// A closed browser, a missing or duplicated cookie, or an unreadable jar
    /// all count as not set.
    #[must_use]
    pub fn is_cookie_set(&self, cookie: &Cookie) -> bool {
        if !self.driver.is_open() {
            return false;
        }
        match self.get_cookie(&cookie.name) {
            Ok(current) => current.value == cookie.value,
            Err(err) => {
                debug!(cookie = %cookie.name, "cookie not set: {err}");
                false
            }
        }
    }

    /// Cookies from `required` that do not currently hold their value
    #[must_use]
    pub fn unset_cookies(&self, required: &[Cookie]) -> Vec<Cookie> {
        required
            .iter()
            .filter(|c| !self.is_cookie_set(c))
            .cloned()
            .collect()
    }

    /// Set every required cookie and keep re-checking until all hold.
    ///
    /// Returns at once, without refreshing, when every cookie already holds
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns the last "cookies left unset" mismatch on timeout, or the
    /// first driver failure
    pub fn set_and_validate_cookies(&self, required: &[Cookie]) -> PageCheckResult<()> {
        if self.unset_cookies(required).is_empty() {
            debug!(count = required.len(), "required cookies already set");
            return Ok(());
        }

        Poll::new(self.policy)
            .describe("set required cookies")
            .retry_if(PageCheckError::is_transient)
            .run(|| {
                for cookie in self.unset_cookies(required) {
                    self.set_cookie(&cookie)?;
                }
                self.driver.refresh()?;
                let still_unset = self.unset_cookies(required);
                is_empty()
                    .check(&still_unset)
                    .map_err(|e| e.with_reason(UNSET_COOKIES_REASON))
            })
    }
}
