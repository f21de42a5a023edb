//! Result and error types for pagecheck.

use crate::collectors::human_readable_list;
use crate::driver::DriverError;
use thiserror::Error;

/// Result type for pagecheck operations
pub type PageCheckResult<T> = Result<T, PageCheckError>;

/// Errors that can occur while checking pages
#[derive(Debug, Error)]
pub enum PageCheckError {
    /// A matcher rejected the observed value
    #[error("{}Expected: {expected}\n     but: {actual}", reason_prefix(.reason))]
    Mismatch {
        /// Assertion reason, empty when none was given
        reason: String,
        /// Description of what was expected
        expected: String,
        /// Description of what was observed
        actual: String,
    },

    /// The browser location matched none of the page URIs
    #[error(
        "Expected: {page} (URI: {}) opened\n     but: was wrong URL: {actual}",
        human_readable_list(.expected, "or")
    )]
    UriMismatch {
        /// Page name
        page: String,
        /// Every acceptable URI, primary first
        expected: Vec<String>,
        /// URI observed in the browser
        actual: String,
    },

    /// The browser location could not be parsed as a URI
    #[error("Browser is showing broken URI: {url}")]
    BrokenUri {
        /// Raw location reported by the browser
        url: String,
    },

    /// The page readiness probe failed
    #[error(
        "Expected: Loaded {page}\n     but: {page} did not load (current URL: {url}) callback threw:\n{}",
        indent(&.source.to_string())
    )]
    NotLoaded {
        /// Page name
        page: String,
        /// URL shown by the browser when the probe failed
        url: String,
        /// Failure raised by the readiness probe
        source: Box<PageCheckError>,
    },

    /// An element did not reach the expected visibility
    #[error("Element {selector} should {}be visible", negation(.visible))]
    ElementNotVisible {
        /// Element locator
        selector: String,
        /// Expected visibility
        visible: bool,
    },

    /// Several independent checks failed together
    #[error("{header}:\n{}", bullet_list(.failures))]
    SoftFailures {
        /// Summary line
        header: String,
        /// Full message of each failed check
        failures: Vec<String>,
    },

    /// Navigation to a page failed
    #[error("Could not open {page} ({url}): {source}")]
    Navigation {
        /// Page name
        page: String,
        /// URL that was requested
        url: String,
        /// Underlying driver failure
        source: DriverError,
    },

    /// A wait finished without any concrete failure to report
    #[error("{message}")]
    Timeout {
        /// Human-readable description
        message: String,
        /// Budget that was exhausted, in milliseconds
        ms: u64,
    },

    /// The framework was used incorrectly (missing probe, unknown project...)
    #[error("Wrong framework usage: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// The execution environment is not the expected one
    #[error("Environment error: {message}")]
    Environment {
        /// Error message
        message: String,
    },

    /// No item was found where exactly one was required
    #[error("Cannot find {what}")]
    MissingValue {
        /// Item description
        what: String,
    },

    /// Several items were found where exactly one was required
    #[error("More than one {what} found")]
    MultipleValues {
        /// Item description
        what: String,
    },

    /// A URL could not be parsed
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// Offending input
        url: String,
        /// Parser error
        source: url::ParseError,
    },

    /// Browser driver failure
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PageCheckError {
    /// Build a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Build a generic mismatch without a reason
    #[must_use]
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Mismatch {
            reason: String::new(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the failure may go away on its own and is worth polling again.
    ///
    /// Structural failures (configuration, environment, navigation, raw
    /// driver errors) are returned on first occurrence.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Mismatch { .. }
                | Self::UriMismatch { .. }
                | Self::BrokenUri { .. }
                | Self::NotLoaded { .. }
                | Self::ElementNotVisible { .. }
                | Self::SoftFailures { .. }
                | Self::Timeout { .. }
                | Self::MissingValue { .. }
                | Self::MultipleValues { .. }
        )
    }

    /// Attach an assertion reason to a mismatch that has none yet
    #[must_use]
    pub fn with_reason(self, reason: &str) -> Self {
        match self {
            Self::Mismatch {
                reason: existing,
                expected,
                actual,
            } if existing.is_empty() => Self::Mismatch {
                reason: reason.to_string(),
                expected,
                actual,
            },
            other => other,
        }
    }
}

fn reason_prefix(reason: &str) -> String {
    if reason.is_empty() {
        String::new()
    } else {
        format!("{reason}\n")
    }
}

fn negation(visible: &bool) -> &'static str {
    if *visible {
        ""
    } else {
        "not "
    }
}

/// One `  - ` entry per item; continuation lines sit under the entry text
fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| {
            let mut lines = item.lines();
            let first = lines.next().unwrap_or_default();
            std::iter::once(format!("  - {first}"))
                .chain(lines.map(|line| format!("    {line}")))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
