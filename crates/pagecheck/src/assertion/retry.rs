//! Bounded polling of eventually-consistent browser state.
//!
//! A condition is evaluated immediately, then again every polling interval
//! until it succeeds or the timeout elapses. On timeout the last failure is
//! handed back unchanged so reports show the real mismatch, never a generic
//! "timed out" message.
//!
//! Each failed attempt is followed by a sleep, then the deadline is checked,
//! so a polling interval longer than the timeout means one attempt only.
//! Even a zero timeout evaluates the condition once, without sleeping. An
//! attempt that hangs is not interrupted; only the driver's own command
//! timeout bounds it.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default polling timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

/// Default timeout for known slow pages
pub const DEFAULT_HEAVY_TIMEOUT_MS: u64 = 4_000;

/// Default sleep between attempts
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 200;

/// Timeout budget and polling interval for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Total time budget
    pub timeout: Duration,
    /// Sleep between attempts
    pub polling_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_millis(DEFAULT_TIMEOUT_MS, DEFAULT_POLLING_INTERVAL_MS)
    }
}

impl PollPolicy {
    /// Create a policy with the default polling interval
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            polling_interval: Duration::from_millis(DEFAULT_POLLING_INTERVAL_MS),
        }
    }

    /// Create a policy from millisecond values
    #[must_use]
    pub const fn from_millis(timeout_ms: u64, polling_interval_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            polling_interval: Duration::from_millis(polling_interval_ms),
        }
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout in milliseconds
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-clock deadline for a polling loop
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
    timeout: Duration,
}

impl Stopwatch {
    /// Start measuring against a timeout
    #[must_use]
    pub fn start(timeout: Duration) -> Self {
        Self {
            started: Instant::now(),
            timeout,
        }
    }

    /// Time since the stopwatch started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the budget is used up
    #[must_use]
    pub fn is_timeout_reached(&self) -> bool {
        self.elapsed() >= self.timeout
    }

    /// Block the calling thread
    pub fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A configured polling loop.
///
/// ```ignore
/// let url = Poll::new(policy)
///     .describe("wait for redirect")
///     .run(|| current_location_if_changed())?;
/// ```
pub struct Poll<E> {
    policy: PollPolicy,
    description: Option<String>,
    retry_if: fn(&E) -> bool,
}

impl<E> Poll<E> {
    /// Poll with the given policy, retrying every failure
    #[must_use]
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            description: None,
            retry_if: |_| true,
        }
    }

    /// Label attempts in debug logs
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Only retry failures accepted by `predicate`; others are returned at once
    #[must_use]
    pub fn retry_if(mut self, predicate: fn(&E) -> bool) -> Self {
        self.retry_if = predicate;
        self
    }

    /// The policy this loop runs with
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Run `attempt` until it succeeds, fails permanently or time runs out.
    ///
    /// # Errors
    ///
    /// Returns the most recent failure of `attempt`.
    pub fn run<T, F>(&self, mut attempt: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        let stopwatch = Stopwatch::start(self.policy.timeout);
        let label = self.description.as_deref().unwrap_or("condition");
        let mut attempts = 0_usize;

        loop {
            attempts += 1;
            match attempt() {
                Ok(value) => {
                    debug!(
                        attempts,
                        elapsed_ms = stopwatch.elapsed().as_millis() as u64,
                        "{label} satisfied"
                    );
                    return Ok(value);
                }
                Err(err) => {
                    if !(self.retry_if)(&err) {
                        debug!(attempts, "{label} failed permanently: {err}");
                        return Err(err);
                    }
                    if stopwatch.is_timeout_reached() {
                        return Err(self.give_up(label, attempts, err));
                    }
                    debug!(attempts, "{label} not satisfied yet: {err}");
                    stopwatch.sleep(self.policy.polling_interval);
                    if stopwatch.is_timeout_reached() {
                        return Err(self.give_up(label, attempts, err));
                    }
                }
            }
        }
    }

    fn give_up(&self, label: &str, attempts: usize, err: E) -> E {
        warn!(
            attempts,
            timeout_ms = self.policy.timeout_ms(),
            "{label} not satisfied in time"
        );
        err
    }
}

impl<E> Debug for Poll<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poll")
            .field("policy", &self.policy)
            .field("description", &self.description)
            .finish()
    }
}

/// Poll `attempt` with `policy`, retrying every failure.
///
/// # Errors
///
/// Returns the most recent failure of `attempt`.
pub fn poll<T, E, F>(policy: PollPolicy, attempt: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    Poll::new(policy).run(attempt)
}

/// Poll a boolean probe; `true` as soon as it holds, `false` on timeout
pub fn poll_until(policy: PollPolicy, mut check: impl FnMut() -> bool) -> bool {
    Poll::<&str>::new(policy)
        .run(|| if check() { Ok(()) } else { Err("not yet") })
        .is_ok()
}
