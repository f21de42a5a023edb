//! Expected elements of a fully loaded page
//!
//! A page may declare which elements it shows once completely rendered, per
//! layout. Checking them is soft: every expectation runs, and all failures
//! are reported together.
//!
//! ```ignore
//! let expected = ExpectedElements::builder()
//!     .on_desktop(Selector::css("#desktop-menu")).should_be_visible()
//!     .on_mobile(Selector::css("#desktop-menu")).should_not_be_visible()
//!     .on_both_views(Selector::css("footer")).should_exist()
//!     .build();
//! ```

use crate::assertion::retry::Poll;
use crate::assertion::soft::SoftAssertions;
use crate::config::ViewType;
use crate::context::TestContext;
use crate::driver::{ElementHandle, Selector};
use crate::reporter::step;
use crate::result::{PageCheckError, PageCheckResult};
use std::fmt;

/// Summary line of a failed full-load check
pub const NOT_FULLY_LOADED: &str = "The page has not been fully loaded";

/// Layouts an expectation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewScope {
    /// Desktop layout only
    Desktop,
    /// Mobile layout only
    Mobile,
    /// Every layout
    Both,
}

impl ViewScope {
    /// Whether an expectation with this scope runs in `view`
    #[must_use]
    pub const fn applies_to(self, view: ViewType) -> bool {
        matches!(
            (self, view),
            (Self::Both, _) | (Self::Desktop, ViewType::Desktop) | (Self::Mobile, ViewType::Mobile)
        )
    }
}

/// Element an expectation is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementRef {
    /// Located by selector
    Selector(Selector),
    /// Handle previously found by the driver
    Handle(ElementHandle),
}

impl From<Selector> for ElementRef {
    fn from(selector: Selector) -> Self {
        Self::Selector(selector)
    }
}

impl From<ElementHandle> for ElementRef {
    fn from(handle: ElementHandle) -> Self {
        Self::Handle(handle)
    }
}

impl ElementRef {
    fn locator(&self, ctx: &TestContext) -> PageCheckResult<Selector> {
        match self {
            Self::Selector(selector) => Ok(selector.clone()),
            Self::Handle(handle) => Ok(ctx.driver().locator_of(handle)?),
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(selector) => fmt::Display::fmt(selector, f),
            Self::Handle(handle) => write!(f, "element#{}", handle.id),
        }
    }
}

/// State an element should reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// Rendered and visible
    Visible,
    /// Absent or hidden
    NotVisible,
    /// Present in the document, visible or not
    Exists,
}

#[derive(Debug, Clone)]
struct Expectation {
    scope: ViewScope,
    element: ElementRef,
    state: ElementState,
}

impl Expectation {
    fn verify(&self, ctx: &TestContext) -> PageCheckResult<()> {
        let selector = self.element.locator(ctx)?;
        let driver = ctx.driver();
        Poll::new(ctx.standard_policy())
            .describe(format!("{selector} {:?}", self.state))
            .retry_if(PageCheckError::is_transient)
            .run(|| {
                let holds = match self.state {
                    ElementState::Visible => driver.is_visible(&selector)?,
                    ElementState::NotVisible => !driver.is_visible(&selector)?,
                    ElementState::Exists => driver.exists(&selector)?,
                };
                if holds {
                    return Ok(());
                }
                Err(match self.state {
                    ElementState::Exists => PageCheckError::MissingValue {
                        what: format!("element {selector}"),
                    },
                    state => PageCheckError::ElementNotVisible {
                        selector: selector.to_string(),
                        visible: state == ElementState::Visible,
                    },
                })
            })
    }
}

/// Elements a fully loaded page shows, per layout
#[derive(Debug, Clone, Default)]
pub struct ExpectedElements {
    expectations: Vec<Expectation>,
}

impl ExpectedElements {
    /// Start declaring expectations
    #[must_use]
    pub fn builder() -> ExpectedElementsBuilder {
        ExpectedElementsBuilder::default()
    }

    /// Whether nothing at all was declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    /// Number of expectations that run in `view`
    #[must_use]
    pub fn count_for(&self, view: ViewType) -> usize {
        self.for_view(view).count()
    }

    fn for_view(&self, view: ViewType) -> impl Iterator<Item = &Expectation> {
        self.expectations
            .iter()
            .filter(move |e| e.scope.applies_to(view))
    }

    /// Check every expectation for the active layout, softly
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::SoftFailures`] listing every failed
    /// expectation
    pub fn should_be_fully_loaded(&self, ctx: &TestContext) -> PageCheckResult<()> {
        step(ctx.steps(), "Check if all elements have been fully loaded", || {
            let mut soft = SoftAssertions::new();
            for expectation in self.for_view(ctx.view_type()) {
                soft.check(expectation.element.to_string(), expectation.verify(ctx));
            }
            soft.verify(NOT_FULLY_LOADED)
        })
    }
}

/// Builder choosing the layout of the next expectation
#[derive(Debug, Default)]
pub struct ExpectedElementsBuilder {
    expectations: Vec<Expectation>,
}

impl ExpectedElementsBuilder {
    /// Next expectation holds on desktop only
    #[must_use]
    pub fn on_desktop(self, element: impl Into<ElementRef>) -> ElementExpectationBuilder {
        self.element(ViewScope::Desktop, element.into())
    }

    /// Next expectation holds on mobile only
    #[must_use]
    pub fn on_mobile(self, element: impl Into<ElementRef>) -> ElementExpectationBuilder {
        self.element(ViewScope::Mobile, element.into())
    }

    /// Next expectation holds in every layout
    #[must_use]
    pub fn on_both_views(self, element: impl Into<ElementRef>) -> ElementExpectationBuilder {
        self.element(ViewScope::Both, element.into())
    }

    fn element(self, scope: ViewScope, element: ElementRef) -> ElementExpectationBuilder {
        ElementExpectationBuilder {
            parent: self,
            scope,
            element,
        }
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> ExpectedElements {
        ExpectedElements {
            expectations: self.expectations,
        }
    }
}

/// Builder choosing the state of an element
#[derive(Debug)]
pub struct ElementExpectationBuilder {
    parent: ExpectedElementsBuilder,
    scope: ViewScope,
    element: ElementRef,
}

impl ElementExpectationBuilder {
    /// The element should be visible
    #[must_use]
    pub fn should_be_visible(self) -> ExpectedElementsBuilder {
        self.finish(ElementState::Visible)
    }

    /// The element should be absent or hidden
    #[must_use]
    pub fn should_not_be_visible(self) -> ExpectedElementsBuilder {
        self.finish(ElementState::NotVisible)
    }

    /// The element should be present in the document
    #[must_use]
    pub fn should_exist(self) -> ExpectedElementsBuilder {
        self.finish(ElementState::Exists)
    }

    fn finish(self, state: ElementState) -> ExpectedElementsBuilder {
        let mut parent = self.parent;
        parent.expectations.push(Expectation {
            scope: self.scope,
            element: self.element,
            state,
        });
        parent
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::EnvironmentConfig;
    use crate::mock::MockDriver;
    use std::sync::Arc;

    fn ctx(driver: MockDriver, mobile: bool) -> TestContext {
        let mut config = EnvironmentConfig::default();
        config.timeouts.timeout_ms = 60;
        config.timeouts.polling_interval_ms = 10;
        config.browser.mobile = mobile;
        TestContext::new(config, Arc::new(driver))
    }

    fn menu() -> Selector {
        Selector::css("#menu")
    }

    fn burger() -> Selector {
        Selector::css("#burger")
    }

    mod scope_tests {
        use super::*;

        #[test]
        fn test_applies_to() {
            assert!(ViewScope::Both.applies_to(ViewType::Mobile));
            assert!(ViewScope::Desktop.applies_to(ViewType::Desktop));
            assert!(!ViewScope::Desktop.applies_to(ViewType::Mobile));
            assert!(!ViewScope::Mobile.applies_to(ViewType::Desktop));
        }

        #[test]
        fn test_count_for_view() {
            let expected = ExpectedElements::builder()
                .on_desktop(menu())
                .should_be_visible()
                .on_mobile(burger())
                .should_be_visible()
                .on_both_views(Selector::css("footer"))
                .should_exist()
                .build();
            assert_eq!(expected.count_for(ViewType::Desktop), 2);
            assert_eq!(expected.count_for(ViewType::Mobile), 2);
            assert!(!expected.is_empty());
        }
    }

    mod fully_loaded_tests {
        use super::*;

        #[test]
        fn test_passes_when_every_expectation_holds() {
            let driver = MockDriver::new()
                .with_visible(menu())
                .with_existing(Selector::css("footer"));
            let expected = ExpectedElements::builder()
                .on_desktop(menu())
                .should_be_visible()
                .on_desktop(burger())
                .should_not_be_visible()
                .on_both_views(Selector::css("footer"))
                .should_exist()
                .build();
            expected.should_be_fully_loaded(&ctx(driver, false)).unwrap();
        }

        #[test]
        fn test_other_view_is_skipped() {
            let driver = MockDriver::new().with_visible(burger());
            let expected = ExpectedElements::builder()
                .on_desktop(menu())
                .should_be_visible()
                .on_mobile(burger())
                .should_be_visible()
                .build();
            expected.should_be_fully_loaded(&ctx(driver, true)).unwrap();
        }

        #[test]
        fn test_reports_every_failure() {
            let driver = MockDriver::new().with_visible(burger());
            let expected = ExpectedElements::builder()
                .on_both_views(menu())
                .should_be_visible()
                .on_both_views(burger())
                .should_not_be_visible()
                .on_both_views(Selector::css("footer"))
                .should_exist()
                .build();
            let err = expected
                .should_be_fully_loaded(&ctx(driver, false))
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "The page has not been fully loaded:\n  \
                 - Element css:#menu should be visible\n  \
                 - Element css:#burger should not be visible\n  \
                 - Cannot find element css:footer"
            );
        }

        #[test]
        fn test_waits_for_late_element() {
            let driver = MockDriver::new().with_visible_after(menu(), 2);
            let expected = ExpectedElements::builder()
                .on_both_views(menu())
                .should_be_visible()
                .build();
            expected.should_be_fully_loaded(&ctx(driver, false)).unwrap();
        }

        #[test]
        fn test_element_handle_resolved_through_driver() {
            let driver = MockDriver::new()
                .with_element("el-1", menu())
                .with_visible(menu());
            let expected = ExpectedElements::builder()
                .on_both_views(ElementHandle::new("el-1"))
                .should_be_visible()
                .build();
            expected.should_be_fully_loaded(&ctx(driver, false)).unwrap();
        }

        #[test]
        fn test_unknown_handle_is_reported() {
            let expected = ExpectedElements::builder()
                .on_both_views(ElementHandle::new("gone"))
                .should_be_visible()
                .build();
            let err = expected
                .should_be_fully_loaded(&ctx(MockDriver::new(), false))
                .unwrap_err();
            assert!(err.to_string().contains("no such element: gone"));
        }
    }
}
