//! Test context
//!
//! A [`TestContext`] carries everything a page check needs: the browser, the
//! configuration, the step sink and the website of the project under test.
//! It is built once per test and passed to page objects explicitly.

use crate::assertion::retry::PollPolicy;
use crate::assertion::{self, Matcher};
use crate::config::{EnvironmentConfig, ViewType};
use crate::cookies::CookieManager;
use crate::driver::BrowserDriver;
use crate::project::{ProjectRegistry, ResolvedProject};
use crate::reporter::{StepSink, TracingSteps};
use crate::result::{PageCheckError, PageCheckResult};
use std::fmt;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Per-test browser, configuration and reporting
#[derive(Clone)]
pub struct TestContext {
    driver: Arc<dyn BrowserDriver>,
    config: Arc<EnvironmentConfig>,
    steps: Arc<dyn StepSink>,
    project: Option<ResolvedProject>,
    base_url: Option<Url>,
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("execution_environment", &self.config.execution_environment)
            .field("project", &self.project)
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

impl TestContext {
    /// Create a context logging steps through `tracing`
    #[must_use]
    pub fn new(config: EnvironmentConfig, driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            driver,
            config: Arc::new(config),
            steps: Arc::new(TracingSteps),
            project: None,
            base_url: None,
        }
    }

    /// Create a context for a test carrying `tags`, resolving its project
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no single project can be chosen or it
    /// has no website
    pub fn for_projects(
        config: EnvironmentConfig,
        test_name: &str,
        tags: &[&str],
        driver: Arc<dyn BrowserDriver>,
    ) -> PageCheckResult<Self> {
        Self::new(config, driver).resolve_project(test_name, tags)
    }

    /// Report steps to `steps`
    #[must_use]
    pub fn with_steps(mut self, steps: Arc<dyn StepSink>) -> Self {
        self.steps = steps;
        self
    }

    /// Use `base_url` for relative page URIs
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Resolve the project of a test from its tags and use its website as
    /// the base URL. The choice is attached to the report as
    /// `project (baseUrl)`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no single project can be chosen or it
    /// has no website
    pub fn resolve_project(mut self, test_name: &str, tags: &[&str]) -> PageCheckResult<Self> {
        let project = ProjectRegistry::from_config(&self.config).resolve(&self.config, test_name, tags)?;
        info!(project = %project.name, base_url = %project.base_url, "project resolved");
        self.steps.attach("project (baseUrl)", &project.to_string());
        self.base_url = Some(project.base_url.clone());
        self.project = Some(project);
        Ok(self)
    }

    /// Browser driver
    #[must_use]
    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// Shared handle to the browser driver
    #[must_use]
    pub fn driver_handle(&self) -> Arc<dyn BrowserDriver> {
        Arc::clone(&self.driver)
    }

    /// Environment configuration
    #[must_use]
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Step sink
    #[must_use]
    pub fn steps(&self) -> &dyn StepSink {
        self.steps.as_ref()
    }

    /// Project resolved from the test tags
    #[must_use]
    pub const fn project(&self) -> Option<&ResolvedProject> {
        self.project.as_ref()
    }

    /// Base URL for relative page URIs, if any
    #[must_use]
    pub const fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Base URL for relative page URIs
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no base URL was set or resolved
    pub fn require_base_url(&self) -> PageCheckResult<&Url> {
        self.base_url.as_ref().ok_or_else(|| {
            PageCheckError::configuration(
                "No base URL available: resolve the test project or set a base URL first",
            )
        })
    }

    /// Host of the base URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no base URL was set or resolved
    pub fn domain_name(&self) -> PageCheckResult<String> {
        let base_url = self.require_base_url()?;
        let host = base_url.host_str().unwrap_or_default();
        Ok(match base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    /// Layout the browser renders
    #[must_use]
    pub fn view_type(&self) -> ViewType {
        self.config.view_type()
    }

    /// Policy for ordinary waits
    #[must_use]
    pub fn standard_policy(&self) -> PollPolicy {
        self.config.standard_policy()
    }

    /// Policy for known slow pages
    #[must_use]
    pub fn heavy_policy(&self) -> PollPolicy {
        self.config.heavy_policy()
    }

    /// Cookie operations validated within the standard timeout
    #[must_use]
    pub fn cookies(&self) -> CookieManager {
        CookieManager::new(self.driver_handle(), self.standard_policy().timeout)
    }

    /// Check `actual` once, reported as a step
    ///
    /// # Errors
    ///
    /// Returns the mismatch
    pub fn assert_that<T: ?Sized>(
        &self,
        reason: &str,
        actual: &T,
        matcher: &impl Matcher<T>,
    ) -> PageCheckResult<()> {
        assertion::assert_that(self.steps(), reason, actual, matcher)
    }

    /// Re-check `actual` under the standard policy
    ///
    /// # Errors
    ///
    /// Returns the last mismatch on timeout
    pub fn wait_until<T: ?Sized>(
        &self,
        reason: &str,
        actual: &T,
        matcher: &impl Matcher<T>,
    ) -> PageCheckResult<()> {
        assertion::wait_until(reason, actual, matcher, self.standard_policy())
    }

    /// Fetch and check a fresh value under the standard policy
    ///
    /// # Errors
    ///
    /// Returns the last mismatch on timeout
    pub fn wait_until_call<T>(
        &self,
        reason: &str,
        supplier: impl FnMut() -> PageCheckResult<T>,
        matcher: &impl Matcher<T>,
    ) -> PageCheckResult<T> {
        assertion::wait_until_call(reason, supplier, matcher, self.standard_policy())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assertion::equal_to;
    use crate::config::ProjectSettings;
    use crate::mock::MockDriver;
    use crate::reporter::StepRecorder;
    use std::cell::Cell;

    fn config() -> EnvironmentConfig {
        let mut config = EnvironmentConfig::default();
        config.timeouts.timeout_ms = 300;
        config.timeouts.polling_interval_ms = 10;
        config.projects.insert(
            "cms".to_string(),
            ProjectSettings {
                website: Some("https://www.example.com:8080/".to_string()),
                ..ProjectSettings::default()
            },
        );
        config
    }

    #[test]
    fn test_for_projects_sets_base_url_and_attaches() {
        let recorder = Arc::new(StepRecorder::new());
        let ctx = TestContext::new(config(), Arc::new(MockDriver::new()))
            .with_steps(recorder.clone())
            .resolve_project("test_home", &["cms"])
            .unwrap();

        assert_eq!(ctx.base_url().unwrap().as_str(), "https://www.example.com:8080/");
        assert_eq!(ctx.project().unwrap().name, "cms");
        assert_eq!(ctx.domain_name().unwrap(), "www.example.com:8080");
        assert_eq!(
            recorder.attachments(),
            vec![(
                "project (baseUrl)".to_string(),
                "cms (https://www.example.com:8080/)".to_string()
            )]
        );
    }

    #[test]
    fn test_for_projects_propagates_configuration_error() {
        let err = TestContext::for_projects(config(), "test_home", &["smoke"], Arc::new(MockDriver::new()))
            .unwrap_err();
        assert!(matches!(err, PageCheckError::Configuration { .. }));
    }

    #[test]
    fn test_missing_base_url() {
        let ctx = TestContext::new(config(), Arc::new(MockDriver::new()));
        assert!(ctx.base_url().is_none());
        assert!(matches!(
            ctx.require_base_url(),
            Err(PageCheckError::Configuration { .. })
        ));
    }

    #[test]
    fn test_wait_until_call_uses_standard_policy() {
        let ctx = TestContext::new(config(), Arc::new(MockDriver::new()));
        let calls = Cell::new(0);
        let started = std::time::Instant::now();
        let next = || {
            calls.set(calls.get() + 1);
            Ok(calls.get())
        };
        let err = ctx.wait_until_call("", next, &equal_to(0)).unwrap_err();
        assert!(err.is_transient());
        assert!(started.elapsed() >= std::time::Duration::from_millis(300));
        assert!(calls.get() > 1);
    }

    #[test]
    fn test_assert_that_reports_step() {
        let recorder = Arc::new(StepRecorder::new());
        let ctx = TestContext::new(config(), Arc::new(MockDriver::new())).with_steps(recorder.clone());
        ctx.assert_that("answer", &42, &equal_to(42)).unwrap();
        assert_eq!(recorder.step_names(), vec!["answer"]);
    }

    #[test]
    fn test_cookie_manager_uses_standard_timeout() {
        let ctx = TestContext::new(config(), Arc::new(MockDriver::new()));
        assert_eq!(
            ctx.cookies().policy().timeout,
            std::time::Duration::from_millis(300)
        );
    }
}
