//! Test doubles for page checks
//!
//! [`MockDriver`] stands in for a live browser so page objects, cookie
//! handling and matchers can be tested without launching anything.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pagecheck::mock::MockDriver;
//!
//! let driver = Arc::new(
//!     MockDriver::new()
//!         .with_redirect("https://site.com/", "https://site.com/en/home")
//!         .with_visible(Selector::css("#main")),
//! );
//! let ctx = TestContext::new(config, driver.clone());
//! home.wait_until_navigated_to(&ctx)?;
//! assert_eq!(driver.navigations(), 0);
//! ```

pub mod browser;
#[cfg(any(test, feature = "proptest"))]
pub mod strategies;

pub use browser::MockDriver;
#[cfg(any(test, feature = "proptest"))]
pub use strategies::{arb_cookie, arb_cookie_set, arb_url};
