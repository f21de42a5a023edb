//! Soft Assertions
//!
//! Run several checks, keep going after a failure and report every failure
//! in one error at the end.

use crate::result::{PageCheckError, PageCheckResult};
use serde::{Deserialize, Serialize};

/// A single recorded failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionFailure {
    /// What was being checked
    pub label: String,
    /// Failure message
    pub message: String,
    /// Index of the check in the sequence
    pub index: usize,
}

impl AssertionFailure {
    /// First line of the message
    #[must_use]
    pub fn headline(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Soft assertions collector
///
/// ```ignore
/// let mut soft = SoftAssertions::new();
/// soft.check("header", header_visible());
/// soft.check("footer", footer_visible());
/// soft.verify("The page has not been fully loaded")?;
/// ```
#[derive(Debug, Default)]
pub struct SoftAssertions {
    failures: Vec<AssertionFailure>,
    assertion_count: usize,
}

impl SoftAssertions {
    /// Create a new soft assertions collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one check
    pub fn check(&mut self, label: impl Into<String>, outcome: PageCheckResult<()>) {
        let index = self.assertion_count;
        self.assertion_count += 1;
        if let Err(err) = outcome {
            self.failures.push(AssertionFailure {
                label: label.into(),
                message: err.to_string(),
                index,
            });
        }
    }

    /// Get all failures
    #[must_use]
    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    /// Get the total number of checks recorded
    #[must_use]
    pub const fn assertion_count(&self) -> usize {
        self.assertion_count
    }

    /// Check if all recorded checks passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fail with every recorded failure listed under `header`
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::SoftFailures`] if any check failed
    pub fn verify(&self, header: &str) -> PageCheckResult<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(PageCheckError::SoftFailures {
            header: header.to_string(),
            failures: self
                .failures
                .iter()
                .map(|f| f.message.clone())
                .collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_all_passed() {
        let mut soft = SoftAssertions::new();
        soft.check("a", Ok(()));
        soft.check("b", Ok(()));
        assert!(soft.all_passed());
        assert_eq!(soft.assertion_count(), 2);
        assert!(soft.verify("broken").is_ok());
    }

    #[test]
    fn test_collects_every_failure() {
        let mut soft = SoftAssertions::new();
        soft.check("a", Err(PageCheckError::mismatch("x", "y")));
        soft.check("b", Ok(()));
        soft.check(
            "c",
            Err(PageCheckError::ElementNotVisible {
                selector: "css:#footer".into(),
                visible: true,
            }),
        );

        assert_eq!(soft.failures().len(), 2);
        assert_eq!(soft.failures()[1].index, 2);
        assert_eq!(soft.failures()[1].label, "c");

        let text = soft.verify("The page has not been fully loaded").unwrap_err().to_string();
        assert_eq!(
            text,
            "The page has not been fully loaded:\n  \
             - Expected: x\n         \
             but: y\n  \
             - Element css:#footer should be visible"
        );
        assert!(text.contains("but: y"));
    }

    #[test]
    fn test_multi_line_failures_stay_under_their_entry() {
        let mut soft = SoftAssertions::new();
        soft.check(
            "title",
            Err(PageCheckError::mismatch("\"Home\"", "was \"Error\"").with_reason("Title")),
        );
        soft.check("price", Err(PageCheckError::mismatch("<10>", "was <12>")));

        assert_eq!(soft.failures()[0].headline(), "Title");
        let text = soft.verify("Broken page").unwrap_err().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Broken page:",
                "  - Title",
                "    Expected: \"Home\"",
                "         but: was \"Error\"",
                "  - Expected: <10>",
                "         but: was <12>",
            ]
        );
    }
}
