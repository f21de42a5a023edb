//! Project resolution
//!
//! Each test declares tags. Tags naming a known project decide which website
//! the test runs against. A test touching several projects must also carry
//! the [`E2E_TAG`], and then runs against the `e2e` website.

use crate::config::EnvironmentConfig;
use crate::result::{PageCheckError, PageCheckResult};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

/// Tag of tests spanning several projects
pub const E2E_TAG: &str = "e2e";

/// A project with its resolved website
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    /// Project tag
    pub name: String,
    /// Website of the project
    pub base_url: Url,
}

impl fmt::Display for ResolvedProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.base_url)
    }
}

/// Known project tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRegistry {
    projects: BTreeSet<String>,
}

impl ProjectRegistry {
    /// Create a registry of the given project tags
    #[must_use]
    pub fn new<I, S>(projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            projects: projects.into_iter().map(Into::into).collect(),
        }
    }

    /// Every project present in the configuration, plus `e2e`
    #[must_use]
    pub fn from_config(config: &EnvironmentConfig) -> Self {
        Self::new(config.projects.keys().cloned()).with_project(E2E_TAG)
    }

    /// Register another project tag
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.projects.insert(project.into());
        self
    }

    /// Whether `tag` names a project
    #[must_use]
    pub fn is_project(&self, tag: &str) -> bool {
        self.projects.contains(tag)
    }

    /// Pick the project a test runs against from its tags.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no project tag is present, or if
    /// several are present without the `e2e` tag
    pub fn main_project(&self, test_name: &str, tags: &[&str]) -> PageCheckResult<String> {
        let project_tags: BTreeSet<&str> = tags
            .iter()
            .copied()
            .filter(|tag| self.is_project(tag))
            .collect();

        match project_tags.len() {
            0 => Err(PageCheckError::configuration(format!(
                "{test_name} is broken: missing project tag"
            ))),
            1 => Ok(project_tags
                .into_iter()
                .next()
                .map(str::to_string)
                .unwrap_or_default()),
            _ if project_tags.contains(E2E_TAG) => Ok(E2E_TAG.to_string()),
            _ => Err(PageCheckError::configuration(format!(
                "{test_name} is broken: tests with multiple project tags must also be tagged '{E2E_TAG}'"
            ))),
        }
    }

    /// Pick the project a test runs against and look up its website.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the project cannot be chosen or has
    /// no website configured
    pub fn resolve(
        &self,
        config: &EnvironmentConfig,
        test_name: &str,
        tags: &[&str],
    ) -> PageCheckResult<ResolvedProject> {
        let name = self.main_project(test_name, tags)?;
        let base_url = config.base_url_for(&name)?;
        Ok(ResolvedProject { name, base_url })
    }
}
