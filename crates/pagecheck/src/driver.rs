//! Browser driver abstraction
//!
//! Everything the page checks need from a live browser goes through the
//! [`BrowserDriver`] trait: reading the current location, navigating,
//! refreshing, cookies and element probes. The trait is synchronous; each
//! call blocks until the browser answers or the driver's own command timeout
//! fires.
//!
//! # Implementations
//!
//! - [`crate::mock::MockDriver`] - scriptable in-memory browser for tests
//! - `CdpDriver` - chromiumoxide-backed driver (feature `browser`)

use crate::cookies::Cookie;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by a browser driver
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// The browser did not answer within the driver command timeout
    #[error("timeout occurred: {message}")]
    Timeout {
        /// Error message
        message: String,
    },

    /// Generic driver-level failure
    #[error("{message}")]
    WebDriver {
        /// Error message
        message: String,
    },

    /// The browser session is gone
    #[error("browser session is closed")]
    SessionClosed,

    /// An element handle could not be resolved
    #[error("no such element: {element}")]
    NoSuchElement {
        /// Element id or selector
        element: String,
    },
}

impl DriverError {
    /// Build a generic driver error
    #[must_use]
    pub fn webdriver(message: impl Into<String>) -> Self {
        Self::WebDriver {
            message: message.into(),
        }
    }

    /// Whether this is a command timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Element locator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Text content selector
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// JavaScript expression resolving to the first matching node (or null)
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({s:?})"),
            Self::XPath(s) => {
                format!("document.evaluate({s:?}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue")
            }
            Self::Text(t) => {
                format!("Array.from(document.querySelectorAll('*')).find(el => el.textContent.includes({t:?}))")
            }
            Self::TestId(id) => format!("document.querySelector('[data-testid={id:?}]')"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{s}"),
            Self::XPath(s) => write!(f, "xpath:{s}"),
            Self::Text(t) => write!(f, "text:{t}"),
            Self::TestId(id) => write!(f, "testid:{id}"),
        }
    }
}

/// Opaque handle to an element found by a driver.
///
/// Only the driver that produced it can turn it back into a locator, see
/// [`BrowserDriver::locator_of`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific element id
    pub id: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Browser launch configuration for drivers that start their own browser
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Browser locale / Accept-Language
    pub locale: String,
    /// Timeout for a single browser command
    pub command_timeout: Duration,
    /// Executable path override
    pub executable_path: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            locale: "en-GB".to_string(),
            command_timeout: Duration::from_secs(30),
            executable_path: None,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set browser locale
    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Set the per-command timeout
    #[must_use]
    pub const fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the browser executable
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }
}

/// Live browser session used by page checks.
///
/// A driver owns exactly one browser session. Calls are made from a single
/// test thread; implementations only need interior mutability, not
/// cross-session coordination.
pub trait BrowserDriver: Send + Sync {
    /// Current location shown in the address bar
    fn current_url(&self) -> Result<String, DriverError>;

    /// Navigate to an absolute URL
    fn navigate_to(&self, url: &str) -> Result<(), DriverError>;

    /// Reload the current page
    fn refresh(&self) -> Result<(), DriverError>;

    /// Cookies visible to the current page
    fn cookies(&self) -> Result<Vec<Cookie>, DriverError>;

    /// Add a cookie for the current page
    fn add_cookie(&self, cookie: &Cookie) -> Result<(), DriverError>;

    /// Delete every cookie with the given name
    fn delete_cookie(&self, name: &str) -> Result<(), DriverError>;

    /// Whether an element matching the selector is rendered and visible
    fn is_visible(&self, selector: &Selector) -> Result<bool, DriverError>;

    /// Whether an element matching the selector is present in the DOM
    fn exists(&self, selector: &Selector) -> Result<bool, DriverError>;

    /// Find the first element matching the selector
    fn find_element(&self, selector: &Selector) -> Result<Option<ElementHandle>, DriverError>;

    /// Resolve an element handle back to the locator it was found with
    fn locator_of(&self, element: &ElementHandle) -> Result<Selector, DriverError>;

    /// Whether the browser session is still open
    fn is_open(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let selector = Selector::css("#submit");
            assert_eq!(selector.to_query(), "document.querySelector(\"#submit\")");
        }

        #[test]
        fn test_xpath_query() {
            let selector = Selector::xpath("//h1");
            assert!(selector.to_query().contains("document.evaluate(\"//h1\""));
        }

        #[test]
        fn test_test_id_query() {
            let selector = Selector::test_id("login");
            assert!(selector.to_query().contains("data-testid="));
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("a.b").to_string(), "css:a.b");
            assert_eq!(Selector::text("Hello").to_string(), "text:Hello");
        }
    }

    mod driver_error_tests {
        use super::*;

        #[test]
        fn test_timeout_detection() {
            let err = DriverError::Timeout {
                message: "page load".into(),
            };
            assert!(err.is_timeout());
            assert!(!DriverError::webdriver("crash").is_timeout());
        }

        #[test]
        fn test_display() {
            assert_eq!(
                DriverError::SessionClosed.to_string(),
                "browser session is closed"
            );
        }
    }

    mod driver_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = DriverConfig::default();
            assert!(config.headless);
            assert_eq!(config.locale, "en-GB");
            assert!(config.executable_path.is_none());
        }

        #[test]
        fn test_builder() {
            let config = DriverConfig::new()
                .headless(false)
                .viewport(390, 844)
                .locale("de-DE")
                .command_timeout(Duration::from_secs(5))
                .executable_path("/usr/bin/chromium");
            assert!(!config.headless);
            assert_eq!(config.viewport_width, 390);
            assert_eq!(config.locale, "de-DE");
            assert_eq!(config.command_timeout, Duration::from_secs(5));
            assert_eq!(config.executable_path.as_deref(), Some("/usr/bin/chromium"));
        }
    }
}
