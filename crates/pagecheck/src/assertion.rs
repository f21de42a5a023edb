//! Assertions for page checks.
//!
//! A [`Matcher`] describes what it expects and checks one observed value.
//! [`assert_that`] checks once inside a reporting step; [`wait_until`] and
//! [`wait_until_call`] keep checking under a [`PollPolicy`] until the value
//! matches or the budget runs out.

pub mod retry;
pub mod soft;

use crate::reporter::{step, StepSink};
use crate::result::{PageCheckError, PageCheckResult};
use retry::{Poll, PollPolicy};
use std::fmt::{Debug, Display};

/// Expectation over a value of type `T`
pub trait Matcher<T: ?Sized> {
    /// What a matching value looks like, e.g. `an empty collection`
    fn describe(&self) -> String;

    /// Check `actual`, describing the mismatch on failure
    ///
    /// # Errors
    ///
    /// Returns the mismatch when `actual` does not match
    fn check(&self, actual: &T) -> PageCheckResult<()>;
}

impl<T: ?Sized, M: Matcher<T> + ?Sized> Matcher<T> for Box<M> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn check(&self, actual: &T) -> PageCheckResult<()> {
        (**self).check(actual)
    }
}

impl<T: ?Sized, M: Matcher<T> + ?Sized> Matcher<T> for &M {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn check(&self, actual: &T) -> PageCheckResult<()> {
        (**self).check(actual)
    }
}

/// Check `actual` once inside a reporting step.
///
/// The step is named after `reason`, or `Perform assertion via <matcher>`
/// when no reason is given.
///
/// # Errors
///
/// Returns the mismatch, annotated with `reason`
pub fn assert_that<T: ?Sized>(
    steps: &dyn StepSink,
    reason: &str,
    actual: &T,
    matcher: &impl Matcher<T>,
) -> PageCheckResult<()> {
    let name = if reason.is_empty() {
        format!("Perform assertion via {}", matcher.describe())
    } else {
        reason.to_string()
    };
    step(steps, &name, || {
        matcher.check(actual).map_err(|e| e.with_reason(reason))
    })
}

/// Re-check a fixed value until it matches.
///
/// Useful when the matcher itself observes live state, e.g. a page matcher
/// reading the browser location.
///
/// # Errors
///
/// Returns the last mismatch once `policy` is exhausted, or the first
/// non-transient failure
pub fn wait_until<T: ?Sized>(
    reason: &str,
    actual: &T,
    matcher: &impl Matcher<T>,
    policy: PollPolicy,
) -> PageCheckResult<()> {
    Poll::new(policy)
        .describe(wait_label(reason, || matcher.describe()))
        .retry_if(PageCheckError::is_transient)
        .run(|| matcher.check(actual).map_err(|e| e.with_reason(reason)))
}

/// Fetch a fresh value on every attempt and check it.
///
/// # Errors
///
/// Returns the last mismatch (or supplier failure) once `policy` is
/// exhausted, or the first non-transient failure
pub fn wait_until_call<T, S>(
    reason: &str,
    mut supplier: S,
    matcher: &impl Matcher<T>,
    policy: PollPolicy,
) -> PageCheckResult<T>
where
    S: FnMut() -> PageCheckResult<T>,
{
    Poll::new(policy)
        .describe(wait_label(reason, || matcher.describe()))
        .retry_if(PageCheckError::is_transient)
        .run(|| {
            let value = supplier()?;
            matcher
                .check(&value)
                .map_err(|e| e.with_reason(reason))?;
            Ok(value)
        })
}

fn wait_label(reason: &str, describe: impl FnOnce() -> String) -> String {
    if reason.is_empty() {
        describe()
    } else {
        reason.to_string()
    }
}

/// Matches values equal to the expected one
#[derive(Debug, Clone)]
pub struct EqualTo<V> {
    expected: V,
}

/// Match values equal to `expected`
#[must_use]
pub const fn equal_to<V>(expected: V) -> EqualTo<V> {
    EqualTo { expected }
}

impl<T, V> Matcher<T> for EqualTo<V>
where
    T: PartialEq<V> + Debug + ?Sized,
    V: Debug,
{
    fn describe(&self) -> String {
        format!("<{:?}>", self.expected)
    }

    fn check(&self, actual: &T) -> PageCheckResult<()> {
        if *actual == self.expected {
            Ok(())
        } else {
            Err(PageCheckError::mismatch(
                Matcher::<T>::describe(self),
                format!("was <{actual:?}>"),
            ))
        }
    }
}

/// Matches empty collections
#[derive(Debug, Clone, Copy, Default)]
pub struct IsEmpty;

/// Match empty collections
#[must_use]
pub const fn is_empty() -> IsEmpty {
    IsEmpty
}

impl<I: Display> Matcher<[I]> for IsEmpty {
    fn describe(&self) -> String {
        "an empty collection".to_string()
    }

    fn check(&self, actual: &[I]) -> PageCheckResult<()> {
        if actual.is_empty() {
            return Ok(());
        }
        let items = actual
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(PageCheckError::mismatch(
            Matcher::<[I]>::describe(self),
            format!("<[{items}]>"),
        ))
    }
}

impl<I: Display> Matcher<Vec<I>> for IsEmpty {
    fn describe(&self) -> String {
        Matcher::<[I]>::describe(self)
    }

    fn check(&self, actual: &Vec<I>) -> PageCheckResult<()> {
        Matcher::<[I]>::check(self, actual.as_slice())
    }
}

/// Matches strings containing a substring
#[derive(Debug, Clone)]
pub struct ContainsStr {
    needle: String,
}

/// Match strings containing `needle`
#[must_use]
pub fn contains_str(needle: impl Into<String>) -> ContainsStr {
    ContainsStr {
        needle: needle.into(),
    }
}

impl Matcher<str> for ContainsStr {
    fn describe(&self) -> String {
        format!("a string containing {:?}", self.needle)
    }

    fn check(&self, actual: &str) -> PageCheckResult<()> {
        if actual.contains(&self.needle) {
            Ok(())
        } else {
            Err(PageCheckError::mismatch(
                Matcher::<str>::describe(self),
                format!("was {actual:?}"),
            ))
        }
    }
}

impl Matcher<String> for ContainsStr {
    fn describe(&self) -> String {
        Matcher::<str>::describe(self)
    }

    fn check(&self, actual: &String) -> PageCheckResult<()> {
        Matcher::<str>::check(self, actual.as_str())
    }
}

/// Inverts another matcher.
///
/// Only mismatches are inverted; structural failures of the inner matcher
/// pass through unchanged.
#[derive(Debug, Clone)]
pub struct Not<M> {
    inner: M,
}

/// Match values the inner matcher rejects
#[must_use]
pub const fn not<M>(inner: M) -> Not<M> {
    Not { inner }
}

impl<T: ?Sized, M: Matcher<T>> Matcher<T> for Not<M> {
    fn describe(&self) -> String {
        format!("not {}", self.inner.describe())
    }

    fn check(&self, actual: &T) -> PageCheckResult<()> {
        match self.inner.check(actual) {
            Ok(()) => Err(PageCheckError::mismatch(
                Matcher::<T>::describe(self),
                format!("was {}", self.inner.describe()),
            )),
            Err(err) if err.is_transient() => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Logical AND over several matchers.
///
/// Matchers run in order and stop at the first mismatch, which is returned
/// unchanged. Later matchers never observe a value an earlier one rejected.
pub struct AllOf<'a, T: ?Sized> {
    matchers: Vec<Box<dyn Matcher<T> + 'a>>,
}

/// Combine matchers with logical AND
#[must_use]
pub fn all_of<'a, T: ?Sized>(matchers: Vec<Box<dyn Matcher<T> + 'a>>) -> AllOf<'a, T> {
    AllOf { matchers }
}

impl<'a, T: ?Sized> AllOf<'a, T> {
    /// Append another matcher
    #[must_use]
    pub fn and(mut self, matcher: impl Matcher<T> + 'a) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// Number of combined matchers
    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Whether no matcher was combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl<T: ?Sized> Matcher<T> for AllOf<'_, T> {
    fn describe(&self) -> String {
        self.matchers
            .iter()
            .map(|m| format!("({})", m.describe()))
            .collect::<Vec<_>>()
            .join(" and ")
    }

    fn check(&self, actual: &T) -> PageCheckResult<()> {
        self.matchers.iter().try_for_each(|m| m.check(actual))
    }
}

impl<T: ?Sized> Debug for AllOf<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllOf")
            .field("matchers", &Matcher::<T>::describe(self))
            .finish()
    }
}
