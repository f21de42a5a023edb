//! Environment configuration
//!
//! Settings come from YAML files in one directory, merged in this order
//! (later wins):
//!
//! 1. `secrets.yaml`
//! 2. `common.yaml`
//! 3. `<execution environment>.yaml`
//! 4. `PAGECHECK_*` environment variables
//!
//! Nested maps are merged key by key; missing files are skipped. An
//! environment variable addresses a nested key with `__`, e.g.
//! `PAGECHECK_TIMEOUTS__TIMEOUT_MS=5000` or
//! `PAGECHECK_PROJECTS__CMS__WEBSITE=https://cms.example.com`.
//!
//! ```yaml
//! # common.yaml
//! timeouts:
//!   timeout_ms: 2000
//!   heavy_pages_timeout_ms: 4000
//! projects:
//!   cms:
//!     website: https://www.example.com/
//! browser:
//!   locale: en-GB
//! ```

use crate::assertion::retry::{PollPolicy, DEFAULT_POLLING_INTERVAL_MS};
use crate::result::{PageCheckError, PageCheckResult};
use crate::uri::parse_uri;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml_ng::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Prefix of environment variables overriding file settings
pub const ENV_PREFIX: &str = "PAGECHECK_";

/// Environment variable naming the execution environment
pub const EXECUTION_ENVIRONMENT_VAR: &str = "PAGECHECK_EXECUTION_ENVIRONMENT";

/// Marker of local sandbox environments
pub const LOCAL_SANDBOX: &str = "local-sandbox";

/// Marker of pipeline sandbox environments
pub const PIPELINE_SANDBOX: &str = "pipeline-sandbox";

/// Hosts a sandbox run is expected to target
pub const SANDBOX_HOSTS: [&str; 3] = ["host.docker.internal", "web-proxy", "mybox.com"];

/// Which build of the application is under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildEnvType {
    /// Production build
    Prd,
    /// Test build
    Tst,
}

/// Layout the browser renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    /// Desktop layout
    Desktop,
    /// Mobile layout
    Mobile,
}

/// How the browser is provided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebDriverType {
    /// Local browser without a window
    #[serde(alias = "HEADLESS")]
    Headless,
    /// Local browser with a window
    #[default]
    #[serde(alias = "NATIVE")]
    Native,
    /// Local Selenoid grid
    #[serde(alias = "SELENOID")]
    Selenoid,
    /// Moon cloud grid
    #[serde(alias = "MOON")]
    Moon,
}

impl WebDriverType {
    /// Default hub URL of remote types
    #[must_use]
    pub const fn default_remote_url(&self) -> Option<&'static str> {
        match self {
            Self::Headless | Self::Native => None,
            Self::Selenoid => Some("http://localhost:4444/wd/hub"),
            Self::Moon => Some("https://ourentity.cloud.aerokube.com/wd/hub"),
        }
    }

    /// Whether the browser runs on a remote grid
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.default_remote_url().is_some()
    }
}

/// Timeout budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Standard polling timeout
    pub timeout_ms: u64,
    /// Timeout for known slow pages
    pub heavy_pages_timeout_ms: u64,
    /// Timeout for payment processing
    pub payment_processing_timeout_ms: u64,
    /// Sleep between polling attempts
    pub polling_interval_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            heavy_pages_timeout_ms: 4_000,
            payment_processing_timeout_ms: 60_000,
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
        }
    }
}

/// Per-project settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Base URL of the project website
    pub website: Option<String>,
    /// Path of the endpoint exposing the deployed version
    pub version_path: Option<String>,
    /// Path of the endpoint exposing feature toggles
    pub feature_toggles_path: Option<String>,
}

/// Browser settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Browser name
    pub name: String,
    /// Browser version
    #[serde(deserialize_with = "stringish")]
    pub version: String,
    /// Locale and Accept-Language
    pub locale: String,
    /// Force the mobile layout
    pub mobile: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            name: "chrome".to_string(),
            version: "97".to_string(),
            locale: "en-GB".to_string(),
            mobile: false,
        }
    }
}

/// Web driver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverSettings {
    /// How the browser is provided
    #[serde(rename = "type")]
    pub driver_type: WebDriverType,
    /// Hub URL overriding the type default
    pub remote_url: Option<String>,
    /// Remote grid user
    pub remote_user: Option<String>,
    /// Remote grid password
    pub remote_password: Option<String>,
    /// Enable VNC on remote browsers
    pub enable_vnc: bool,
    /// Record video on remote browsers
    pub enable_video: bool,
    /// Maximum parallel remote sessions
    pub session_count: usize,
    /// Browser allocation timeout on the remote grid, in minutes
    pub allocation_timeout_minutes: u64,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            driver_type: WebDriverType::Native,
            remote_url: None,
            remote_user: None,
            remote_password: None,
            enable_vnc: true,
            enable_video: false,
            session_count: 4,
            allocation_timeout_minutes: 10,
        }
    }
}

impl WebDriverSettings {
    /// Hub URL, if the browser is remote
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        if !self.driver_type.is_remote() {
            return None;
        }
        self.remote_url
            .as_deref()
            .or_else(|| self.driver_type.default_remote_url())
    }

    /// Hub URL with the grid credentials as user info
    ///
    /// # Errors
    ///
    /// Returns error if the hub URL is invalid or cannot carry credentials
    pub fn authenticated_remote_url(&self) -> PageCheckResult<Option<Url>> {
        let Some(raw) = self.remote_url() else {
            return Ok(None);
        };
        let mut url = parse_uri(raw)?;
        if let Some(user) = &self.remote_user {
            url.set_username(user)
                .map_err(|()| PageCheckError::configuration(format!("{raw} cannot carry a user name")))?;
            url.set_password(self.remote_password.as_deref())
                .map_err(|()| PageCheckError::configuration(format!("{raw} cannot carry a password")))?;
        }
        Ok(Some(url))
    }

    /// Authenticated hub URL without its path
    ///
    /// # Errors
    ///
    /// Returns error if the hub URL is invalid or cannot carry credentials
    pub fn remote_base_url(&self) -> PageCheckResult<Option<Url>> {
        Ok(self.authenticated_remote_url()?.map(|mut url| {
            url.set_path("");
            url
        }))
    }
}

/// Complete environment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Execution environment name, e.g. `staging` or `local-sandbox`
    pub execution_environment: String,
    /// Site language
    pub language: String,
    /// Timeout budgets
    pub timeouts: TimeoutSettings,
    /// Per-project settings keyed by project tag
    pub projects: BTreeMap<String, ProjectSettings>,
    /// Browser settings
    pub browser: BrowserSettings,
    /// Web driver settings
    pub webdriver: WebDriverSettings,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            execution_environment: "local".to_string(),
            language: "en".to_string(),
            timeouts: TimeoutSettings::default(),
            projects: BTreeMap::new(),
            browser: BrowserSettings::default(),
            webdriver: WebDriverSettings::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Load configuration for `execution_environment` from `dir` and the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns error if a file cannot be read or the merged settings are invalid
    pub fn load(dir: &Path, execution_environment: &str) -> PageCheckResult<Self> {
        Self::load_with_vars(dir, execution_environment, std::env::vars())
    }

    /// Load configuration for the environment named by
    /// [`EXECUTION_ENVIRONMENT_VAR`].
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::Environment`] if the variable is not set
    pub fn load_current(dir: &Path) -> PageCheckResult<Self> {
        let environment =
            std::env::var(EXECUTION_ENVIRONMENT_VAR).map_err(|_| PageCheckError::Environment {
                message: format!("{EXECUTION_ENVIRONMENT_VAR} is not set"),
            })?;
        Self::load(dir, &environment)
    }

    /// Same as [`Self::load`] with explicit variables instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns error if a file cannot be read or the merged settings are invalid
    pub fn load_with_vars<I>(
        dir: &Path,
        execution_environment: &str,
        vars: I,
    ) -> PageCheckResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut merged = Value::Mapping(Mapping::new());
        for name in ["secrets", "common", execution_environment] {
            if let Some(layer) = read_layer(&dir.join(format!("{name}.yaml")))? {
                merge_values(&mut merged, layer);
            }
        }
        apply_env_overrides(&mut merged, vars);

        let mut config: Self = serde_yaml_ng::from_value(merged)?;
        config.execution_environment = execution_environment.to_string();
        Ok(config)
    }

    /// Parse configuration from one YAML document
    ///
    /// # Errors
    ///
    /// Returns error if the YAML is invalid
    pub fn from_yaml(yaml: &str) -> PageCheckResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Policy for ordinary waits
    #[must_use]
    pub const fn standard_policy(&self) -> PollPolicy {
        PollPolicy::from_millis(self.timeouts.timeout_ms, self.timeouts.polling_interval_ms)
    }

    /// Policy for known slow pages
    #[must_use]
    pub const fn heavy_policy(&self) -> PollPolicy {
        PollPolicy::from_millis(
            self.timeouts.heavy_pages_timeout_ms,
            self.timeouts.polling_interval_ms,
        )
    }

    /// Policy for payment processing
    #[must_use]
    pub const fn payment_policy(&self) -> PollPolicy {
        PollPolicy::from_millis(
            self.timeouts.payment_processing_timeout_ms,
            self.timeouts.polling_interval_ms,
        )
    }

    /// Base URL of a project
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the project has no URL, or the URL
    /// parse failure
    pub fn base_url_for(&self, project: &str) -> PageCheckResult<Url> {
        let website = self
            .projects
            .get(project)
            .and_then(|p| p.website.as_deref())
            .ok_or_else(|| {
                PageCheckError::configuration(format!(
                    "The project URL for '{project}' is not present in the configuration"
                ))
            })?;
        parse_uri(website)
    }

    /// Version endpoint path of a project
    #[must_use]
    pub fn version_path(&self, project: &str) -> Option<&str> {
        self.projects.get(project)?.version_path.as_deref()
    }

    /// Feature-toggle endpoint path of a project
    #[must_use]
    pub fn feature_toggles_path(&self, project: &str) -> Option<&str> {
        self.projects.get(project)?.feature_toggles_path.as_deref()
    }

    /// Whether tests run against production
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.execution_environment.contains("production")
    }

    /// Build type under test; anything but production counts as test
    #[must_use]
    pub fn build_env_type(&self) -> BuildEnvType {
        if self.is_production() {
            BuildEnvType::Prd
        } else {
            BuildEnvType::Tst
        }
    }

    /// Whether tests run in a local sandbox
    #[must_use]
    pub fn is_local_sandbox(&self) -> bool {
        self.execution_environment.contains(LOCAL_SANDBOX)
    }

    /// Whether tests run in a pipeline sandbox
    #[must_use]
    pub fn is_pipeline_sandbox(&self) -> bool {
        self.execution_environment.contains(PIPELINE_SANDBOX)
    }

    /// Whether tests run in any sandbox
    #[must_use]
    pub fn is_sandbox(&self) -> bool {
        self.is_local_sandbox() || self.is_pipeline_sandbox()
    }

    /// Refuse to continue outside a sandbox
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the expected sandbox hosts
    pub fn validate_sandbox_run(&self, message_prefix: &str, base_url: &str) -> PageCheckResult<()> {
        if self.is_sandbox() {
            return Ok(());
        }
        let prefix = if message_prefix.is_empty() {
            String::new()
        } else {
            format!("{message_prefix}: ")
        };
        let [local, headless, moon] = SANDBOX_HOSTS;
        Err(PageCheckError::configuration(format!(
            "{prefix}Non-sandbox environment detected. Expected to find {local}, {headless} or {moon}. \
             Found: {base_url} - please verify your environment setting. Currently using: {}",
            self.execution_environment
        )))
    }

    /// Layout the browser renders
    #[must_use]
    pub const fn view_type(&self) -> ViewType {
        if self.browser.mobile {
            ViewType::Mobile
        } else {
            ViewType::Desktop
        }
    }

    /// Whether the desktop layout is rendered
    #[must_use]
    pub const fn is_desktop(&self) -> bool {
        !self.browser.mobile
    }
}

fn read_layer(path: &Path) -> PageCheckResult<Option<Value>> {
    if !path.exists() {
        debug!(path = %path.display(), "config layer not found, skipping");
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml_ng::from_str(&text)?;
    debug!(path = %path.display(), "config layer loaded");
    Ok(match value {
        Value::Null => None,
        other => Some(other),
    })
}

/// Merge `overlay` into `base`; maps merge key by key, anything else is replaced
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn apply_env_overrides<I>(root: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (name, raw) in vars {
        let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = rest.split("__").map(str::to_lowercase).collect();
        if path.iter().any(String::is_empty) {
            continue;
        }
        let value = serde_yaml_ng::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
        debug!(key = %path.join("."), "config overridden from environment");
        set_path(root, &path, value);
    }
}

fn set_path(root: &mut Value, path: &[String], value: Value) {
    let mut node = root;
    for key in path {
        if !node.is_mapping() {
            *node = Value::Mapping(Mapping::new());
        }
        node = match node {
            Value::Mapping(map) => map
                .entry(Value::String(key.clone()))
                .or_insert(Value::Null),
            _ => return,
        };
    }
    *node = value;
}

fn stringish<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string, found {other:?}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn write(dir: &Path, name: &str, yaml: &str) {
        std::fs::write(dir.join(name), yaml).unwrap();
    }

    fn no_vars() -> Vec<(String, String)> {
        Vec::new()
    }

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = EnvironmentConfig::default();
            assert_eq!(config.language, "en");
            assert_eq!(config.timeouts.timeout_ms, 2_000);
            assert_eq!(config.timeouts.heavy_pages_timeout_ms, 4_000);
            assert_eq!(config.timeouts.payment_processing_timeout_ms, 60_000);
            assert_eq!(config.browser.name, "chrome");
            assert_eq!(config.browser.version, "97");
            assert_eq!(config.browser.locale, "en-GB");
            assert!(!config.browser.mobile);
            assert_eq!(config.webdriver.driver_type, WebDriverType::Native);
            assert_eq!(config.webdriver.session_count, 4);
            assert_eq!(config.webdriver.allocation_timeout_minutes, 10);
            assert!(config.webdriver.enable_vnc);
            assert!(!config.webdriver.enable_video);
        }

        #[test]
        fn test_policies() {
            let config = EnvironmentConfig::default();
            assert_eq!(config.standard_policy().timeout, Duration::from_millis(2_000));
            assert_eq!(config.heavy_policy().timeout, Duration::from_millis(4_000));
            assert_eq!(config.payment_policy().timeout, Duration::from_millis(60_000));
            assert_eq!(config.standard_policy().polling_interval, Duration::from_millis(200));
        }

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = EnvironmentConfig::from_yaml("timeouts:\n  timeout_ms: 500\n").unwrap();
            assert_eq!(config.timeouts.timeout_ms, 500);
            assert_eq!(config.timeouts.heavy_pages_timeout_ms, 4_000);
            assert_eq!(config.browser.locale, "en-GB");
        }

        #[test]
        fn test_numeric_browser_version() {
            let config = EnvironmentConfig::from_yaml("browser:\n  version: 120\n").unwrap();
            assert_eq!(config.browser.version, "120");
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_environment_file_wins_over_common() {
            let dir = tempfile::tempdir().unwrap();
            write(
                dir.path(),
                "common.yaml",
                "timeouts:\n  timeout_ms: 1000\n  heavy_pages_timeout_ms: 3000\nprojects:\n  cms:\n    website: https://www.example.com/\n",
            );
            write(
                dir.path(),
                "staging.yaml",
                "timeouts:\n  timeout_ms: 5000\nprojects:\n  cms:\n    version_path: /version\n",
            );

            let config = EnvironmentConfig::load_with_vars(dir.path(), "staging", no_vars()).unwrap();
            assert_eq!(config.execution_environment, "staging");
            assert_eq!(config.timeouts.timeout_ms, 5_000);
            assert_eq!(config.timeouts.heavy_pages_timeout_ms, 3_000);
            assert_eq!(config.version_path("cms"), Some("/version"));
            assert_eq!(
                config.base_url_for("cms").unwrap().as_str(),
                "https://www.example.com/"
            );
        }

        #[test]
        fn test_secrets_have_lowest_precedence() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "secrets.yaml", "webdriver:\n  remote_password: s3cret\n  remote_user: bob\n");
            write(dir.path(), "common.yaml", "webdriver:\n  remote_user: alice\n");

            let config = EnvironmentConfig::load_with_vars(dir.path(), "staging", no_vars()).unwrap();
            assert_eq!(config.webdriver.remote_user.as_deref(), Some("alice"));
            assert_eq!(config.webdriver.remote_password.as_deref(), Some("s3cret"));
        }

        #[test]
        fn test_missing_files_give_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let config = EnvironmentConfig::load_with_vars(dir.path(), "nowhere", no_vars()).unwrap();
            assert_eq!(config.timeouts, TimeoutSettings::default());
            assert_eq!(config.execution_environment, "nowhere");
        }

        #[test]
        fn test_env_overrides_win() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "common.yaml", "browser:\n  mobile: false\n");
            let vars = vec![
                ("PAGECHECK_BROWSER__MOBILE".to_string(), "true".to_string()),
                ("PAGECHECK_TIMEOUTS__TIMEOUT_MS".to_string(), "750".to_string()),
                ("PAGECHECK_BROWSER__VERSION".to_string(), "121".to_string()),
                (
                    "PAGECHECK_PROJECTS__CMS__WEBSITE".to_string(),
                    "https://cms.example.com".to_string(),
                ),
                ("PAGECHECK_WEBDRIVER__TYPE".to_string(), "SELENOID".to_string()),
                ("UNRELATED".to_string(), "x".to_string()),
            ];

            let config = EnvironmentConfig::load_with_vars(dir.path(), "staging", vars).unwrap();
            assert!(config.browser.mobile);
            assert_eq!(config.view_type(), ViewType::Mobile);
            assert_eq!(config.timeouts.timeout_ms, 750);
            assert_eq!(config.browser.version, "121");
            assert_eq!(config.webdriver.driver_type, WebDriverType::Selenoid);
            assert_eq!(
                config.base_url_for("cms").unwrap().as_str(),
                "https://cms.example.com/"
            );
        }

        #[test]
        fn test_invalid_yaml_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "common.yaml", "timeouts: [unclosed\n");
            let err = EnvironmentConfig::load_with_vars(dir.path(), "staging", no_vars()).unwrap_err();
            assert!(matches!(err, PageCheckError::Yaml(_)));
        }
    }

    mod helper_tests {
        use super::*;

        fn in_environment(name: &str) -> EnvironmentConfig {
            EnvironmentConfig {
                execution_environment: name.to_string(),
                ..EnvironmentConfig::default()
            }
        }

        #[test]
        fn test_missing_project_url() {
            let err = EnvironmentConfig::default().base_url_for("cms").unwrap_err();
            assert_eq!(
                err.to_string(),
                "Wrong framework usage: The project URL for 'cms' is not present in the configuration"
            );
        }

        #[test]
        fn test_build_env_type() {
            assert_eq!(in_environment("production-eu").build_env_type(), BuildEnvType::Prd);
            assert_eq!(in_environment("staging").build_env_type(), BuildEnvType::Tst);
        }

        #[test]
        fn test_sandbox_detection() {
            assert!(in_environment("local-sandbox").is_local_sandbox());
            assert!(in_environment("pipeline-sandbox-moon").is_pipeline_sandbox());
            assert!(!in_environment("staging").is_sandbox());
        }

        #[test]
        fn test_validate_sandbox_run() {
            assert!(in_environment("local-sandbox")
                .validate_sandbox_run("", "http://host.docker.internal")
                .is_ok());

            let err = in_environment("staging")
                .validate_sandbox_run("Seeding users", "https://www.example.com")
                .unwrap_err();
            let text = err.to_string();
            assert!(text.contains("Seeding users: Non-sandbox environment detected."));
            assert!(text.contains("host.docker.internal, web-proxy or mybox.com"));
            assert!(text.contains("Found: https://www.example.com"));
            assert!(text.ends_with("Currently using: staging"));
        }
    }

    mod webdriver_tests {
        use super::*;

        #[test]
        fn test_remote_types() {
            assert!(!WebDriverType::Native.is_remote());
            assert!(!WebDriverType::Headless.is_remote());
            assert!(WebDriverType::Selenoid.is_remote());
            assert!(WebDriverType::Moon.is_remote());
        }

        #[test]
        fn test_local_has_no_remote_url() {
            let settings = WebDriverSettings::default();
            assert!(settings.remote_url().is_none());
            assert!(settings.authenticated_remote_url().unwrap().is_none());
        }

        #[test]
        fn test_authenticated_remote_url() {
            let settings = WebDriverSettings {
                driver_type: WebDriverType::Selenoid,
                remote_user: Some("bob".into()),
                remote_password: Some("pw".into()),
                ..WebDriverSettings::default()
            };
            assert_eq!(
                settings.authenticated_remote_url().unwrap().unwrap().as_str(),
                "http://bob:pw@localhost:4444/wd/hub"
            );
            assert_eq!(
                settings.remote_base_url().unwrap().unwrap().as_str(),
                "http://bob:pw@localhost:4444/"
            );
        }

        #[test]
        fn test_remote_url_override() {
            let settings = WebDriverSettings {
                driver_type: WebDriverType::Moon,
                remote_url: Some("https://grid.internal/wd/hub".into()),
                ..WebDriverSettings::default()
            };
            assert_eq!(settings.remote_url(), Some("https://grid.internal/wd/hub"));
        }

        #[test]
        fn test_type_parses_either_case() {
            let lower: WebDriverType = serde_yaml_ng::from_str("moon").unwrap();
            let upper: WebDriverType = serde_yaml_ng::from_str("HEADLESS").unwrap();
            assert_eq!(lower, WebDriverType::Moon);
            assert_eq!(upper, WebDriverType::Headless);
        }
    }
}
