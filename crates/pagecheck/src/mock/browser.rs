//! Scriptable in-memory browser
//!
//! [`MockDriver`] plays back a scripted sequence of locations, keeps a cookie
//! jar, and answers element probes from configured selectors. Every call is
//! counted so tests can assert how often the browser was touched.

use crate::cookies::Cookie;
use crate::driver::{BrowserDriver, DriverError, ElementHandle, Selector};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Counters {
    url_reads: usize,
    navigations: usize,
    refreshes: usize,
    cookie_adds: usize,
    cookie_deletes: usize,
    visibility_checks: usize,
}

#[derive(Debug)]
struct MockState {
    locations: VecDeque<String>,
    visited: Vec<String>,
    redirects: HashMap<String, String>,
    navigation_error: Option<DriverError>,
    refresh_error: Option<DriverError>,
    cookies: Vec<Cookie>,
    committed_cookies: Vec<Cookie>,
    stale_refreshes: usize,
    visible: HashSet<Selector>,
    visible_after: HashMap<Selector, usize>,
    existing: HashSet<Selector>,
    elements: HashMap<String, Selector>,
    open: bool,
    counters: Counters,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            locations: VecDeque::from(["about:blank".to_string()]),
            visited: Vec::new(),
            redirects: HashMap::new(),
            navigation_error: None,
            refresh_error: None,
            cookies: Vec::new(),
            committed_cookies: Vec::new(),
            stale_refreshes: 0,
            visible: HashSet::new(),
            visible_after: HashMap::new(),
            existing: HashSet::new(),
            elements: HashMap::new(),
            open: true,
            counters: Counters::default(),
        }
    }
}

impl MockState {
    fn current_location(&self) -> String {
        self.locations.front().cloned().unwrap_or_default()
    }

    fn is_visible(&mut self, selector: &Selector) -> bool {
        if let Some(remaining) = self.visible_after.get_mut(selector) {
            if *remaining == 0 {
                self.visible_after.remove(selector);
                self.visible.insert(selector.clone());
            } else {
                *remaining -= 1;
                return false;
            }
        }
        self.visible.contains(selector)
    }
}

/// In-memory [`BrowserDriver`] for tests
///
/// ```ignore
/// let driver = MockDriver::new()
///     .with_url_sequence(["https://site.com/loading", "https://site.com/en/home"])
///     .with_visible(Selector::css("#main"));
/// ```
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create a browser showing `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn edit(self, change: impl FnOnce(&mut MockState)) -> Self {
        change(&mut self.state());
        self
    }

    /// Show `url` on every read
    #[must_use]
    pub fn with_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.edit(|s| s.locations = VecDeque::from([url]))
    }

    /// Show each location once per read; the last one sticks
    #[must_use]
    pub fn with_url_sequence<I, S>(self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let locations: VecDeque<String> = urls.into_iter().map(Into::into).collect();
        self.edit(|s| {
            if !locations.is_empty() {
                s.locations = locations;
            }
        })
    }

    /// Land on `to` whenever `from` is requested
    #[must_use]
    pub fn with_redirect(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let (from, to) = (from.into(), to.into());
        self.edit(|s| {
            s.redirects.insert(from, to);
        })
    }

    /// Fail every navigation with `error`
    #[must_use]
    pub fn with_navigation_error(self, error: DriverError) -> Self {
        self.edit(|s| s.navigation_error = Some(error))
    }

    /// Fail every refresh with `error`
    #[must_use]
    pub fn with_refresh_error(self, error: DriverError) -> Self {
        self.edit(|s| s.refresh_error = Some(error))
    }

    /// Start with a cookie in the jar
    #[must_use]
    pub fn with_cookie(self, cookie: Cookie) -> Self {
        self.edit(|s| {
            s.cookies.push(cookie.clone());
            s.committed_cookies.push(cookie);
        })
    }

    /// The next `count` refreshes throw away cookies set since the last good refresh
    #[must_use]
    pub fn with_stale_refreshes(self, count: usize) -> Self {
        self.edit(|s| s.stale_refreshes = count)
    }

    /// Make a selector visible (and present)
    #[must_use]
    pub fn with_visible(self, selector: Selector) -> Self {
        self.edit(|s| {
            s.visible.insert(selector);
        })
    }

    /// Make a selector visible after `checks` negative visibility probes
    #[must_use]
    pub fn with_visible_after(self, selector: Selector, checks: usize) -> Self {
        self.edit(|s| {
            s.visible_after.insert(selector, checks);
        })
    }

    /// Make a selector present in the DOM but hidden
    #[must_use]
    pub fn with_existing(self, selector: Selector) -> Self {
        self.edit(|s| {
            s.existing.insert(selector);
        })
    }

    /// Register an element handle that resolves to `selector`
    #[must_use]
    pub fn with_element(self, id: impl Into<String>, selector: Selector) -> Self {
        let id = id.into();
        self.edit(|s| {
            s.elements.insert(id, selector);
        })
    }

    /// Change the location at runtime
    pub fn set_url(&self, url: impl Into<String>) {
        self.state().locations = VecDeque::from([url.into()]);
    }

    /// Change a selector's visibility at runtime
    pub fn set_visible(&self, selector: Selector, visible: bool) {
        let mut state = self.state();
        state.visible_after.remove(&selector);
        if visible {
            state.visible.insert(selector);
        } else {
            state.visible.remove(&selector);
        }
    }

    /// Close the browser session
    pub fn close(&self) {
        self.state().open = false;
    }

    /// Current cookie jar
    #[must_use]
    pub fn cookie_jar(&self) -> Vec<Cookie> {
        self.state().cookies.clone()
    }

    /// Every URL passed to `navigate_to`, in order
    #[must_use]
    pub fn visited(&self) -> Vec<String> {
        self.state().visited.clone()
    }

    /// Number of location reads
    #[must_use]
    pub fn url_reads(&self) -> usize {
        self.state().counters.url_reads
    }

    /// Number of navigations
    #[must_use]
    pub fn navigations(&self) -> usize {
        self.state().counters.navigations
    }

    /// Number of refreshes
    #[must_use]
    pub fn refreshes(&self) -> usize {
        self.state().counters.refreshes
    }

    /// Number of added cookies
    #[must_use]
    pub fn cookie_adds(&self) -> usize {
        self.state().counters.cookie_adds
    }

    /// Number of cookie deletions
    #[must_use]
    pub fn cookie_deletes(&self) -> usize {
        self.state().counters.cookie_deletes
    }

    /// Number of visibility probes
    #[must_use]
    pub fn visibility_checks(&self) -> usize {
        self.state().counters.visibility_checks
    }
}

impl BrowserDriver for MockDriver {
    fn current_url(&self) -> Result<String, DriverError> {
        let mut state = self.state();
        if !state.open {
            return Err(DriverError::SessionClosed);
        }
        state.counters.url_reads += 1;
        let location = state.current_location();
        if state.locations.len() > 1 {
            state.locations.pop_front();
        }
        Ok(location)
    }

    fn navigate_to(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        state.counters.navigations += 1;
        state.visited.push(url.to_string());
        if let Some(error) = &state.navigation_error {
            return Err(error.clone());
        }
        let landing = state
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        state.locations = VecDeque::from([landing]);
        Ok(())
    }

    fn refresh(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        state.counters.refreshes += 1;
        if let Some(error) = &state.refresh_error {
            return Err(error.clone());
        }
        if state.stale_refreshes > 0 {
            state.stale_refreshes -= 1;
            state.cookies = state.committed_cookies.clone();
        } else {
            state.committed_cookies = state.cookies.clone();
        }
        Ok(())
    }

    fn cookies(&self) -> Result<Vec<Cookie>, DriverError> {
        let state = self.state();
        if !state.open {
            return Err(DriverError::SessionClosed);
        }
        Ok(state.cookies.clone())
    }

    fn add_cookie(&self, cookie: &Cookie) -> Result<(), DriverError> {
        let mut state = self.state();
        state.counters.cookie_adds += 1;
        state.cookies.retain(|c| {
            !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path)
        });
        state.cookies.push(cookie.clone());
        Ok(())
    }

    fn delete_cookie(&self, name: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        state.counters.cookie_deletes += 1;
        state.cookies.retain(|c| c.name != name);
        Ok(())
    }

    fn is_visible(&self, selector: &Selector) -> Result<bool, DriverError> {
        let mut state = self.state();
        state.counters.visibility_checks += 1;
        Ok(state.is_visible(selector))
    }

    fn exists(&self, selector: &Selector) -> Result<bool, DriverError> {
        let state = self.state();
        Ok(state.existing.contains(selector) || state.visible.contains(selector))
    }

    fn find_element(&self, selector: &Selector) -> Result<Option<ElementHandle>, DriverError> {
        let state = self.state();
        let registered = state
            .elements
            .iter()
            .find(|(_, s)| *s == selector)
            .map(|(id, _)| ElementHandle::new(id.clone()));
        if registered.is_some() {
            return Ok(registered);
        }
        let present = state.existing.contains(selector) || state.visible.contains(selector);
        Ok(present.then(|| ElementHandle::new(selector.to_string())))
    }

    fn locator_of(&self, element: &ElementHandle) -> Result<Selector, DriverError> {
        self.state()
            .elements
            .get(&element.id)
            .cloned()
            .ok_or_else(|| DriverError::NoSuchElement {
                element: element.id.clone(),
            })
    }

    fn is_open(&self) -> bool {
        self.state().open
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod location_tests {
        use super::*;

        #[test]
        fn test_starts_blank() {
            assert_eq!(MockDriver::new().current_url().unwrap(), "about:blank");
        }

        #[test]
        fn test_sequence_last_location_sticks() {
            let driver = MockDriver::new().with_url_sequence(["a", "b"]);
            assert_eq!(driver.current_url().unwrap(), "a");
            assert_eq!(driver.current_url().unwrap(), "b");
            assert_eq!(driver.current_url().unwrap(), "b");
            assert_eq!(driver.url_reads(), 3);
        }

        #[test]
        fn test_navigation_follows_redirects() {
            let driver = MockDriver::new().with_redirect("https://s.com/old", "https://s.com/new");
            driver.navigate_to("https://s.com/old").unwrap();
            assert_eq!(driver.current_url().unwrap(), "https://s.com/new");
            assert_eq!(driver.visited(), vec!["https://s.com/old"]);
        }

        #[test]
        fn test_navigation_error_is_injected() {
            let driver = MockDriver::new().with_navigation_error(DriverError::Timeout {
                message: "page load".into(),
            });
            assert!(driver.navigate_to("https://s.com").unwrap_err().is_timeout());
            assert_eq!(driver.navigations(), 1);
        }

        #[test]
        fn test_closed_session() {
            let driver = MockDriver::new();
            driver.close();
            assert!(!driver.is_open());
            assert!(matches!(driver.current_url(), Err(DriverError::SessionClosed)));
        }
    }

    mod cookie_jar_tests {
        use super::*;

        #[test]
        fn test_add_replaces_same_scope() {
            let driver = MockDriver::new().with_cookie(Cookie::new("a", "1"));
            driver.add_cookie(&Cookie::new("a", "2")).unwrap();
            assert_eq!(driver.cookie_jar(), vec![Cookie::new("a", "2")]);
        }

        #[test]
        fn test_stale_refresh_reverts_jar() {
            let driver = MockDriver::new().with_stale_refreshes(1);
            driver.add_cookie(&Cookie::new("a", "1")).unwrap();
            driver.refresh().unwrap();
            assert!(driver.cookie_jar().is_empty());

            driver.add_cookie(&Cookie::new("a", "1")).unwrap();
            driver.refresh().unwrap();
            assert_eq!(driver.cookie_jar().len(), 1);
        }
    }

    mod element_tests {
        use super::*;

        #[test]
        fn test_visible_after_checks() {
            let header = Selector::css("header");
            let driver = MockDriver::new().with_visible_after(header.clone(), 2);
            assert!(!driver.is_visible(&header).unwrap());
            assert!(!driver.is_visible(&header).unwrap());
            assert!(driver.is_visible(&header).unwrap());
            assert_eq!(driver.visibility_checks(), 3);
        }

        #[test]
        fn test_existing_is_not_visible() {
            let hidden = Selector::css(".spinner");
            let driver = MockDriver::new().with_existing(hidden.clone());
            assert!(driver.exists(&hidden).unwrap());
            assert!(!driver.is_visible(&hidden).unwrap());
        }

        #[test]
        fn test_set_visible() {
            let banner = Selector::css(".banner");
            let driver = MockDriver::new();
            driver.set_visible(banner.clone(), true);
            assert!(driver.is_visible(&banner).unwrap());
            driver.set_visible(banner.clone(), false);
            assert!(!driver.is_visible(&banner).unwrap());
        }

        #[test]
        fn test_locator_of_registered_element() {
            let footer = Selector::css("footer");
            let driver = MockDriver::new().with_element("el-1", footer.clone());
            let handle = driver.find_element(&footer).unwrap().unwrap();
            assert_eq!(handle, ElementHandle::new("el-1"));
            assert_eq!(driver.locator_of(&handle).unwrap(), footer);
        }

        #[test]
        fn test_locator_of_unknown_element() {
            let err = MockDriver::new()
                .locator_of(&ElementHandle::new("ghost"))
                .unwrap_err();
            assert_eq!(err.to_string(), "no such element: ghost");
        }
    }
}
