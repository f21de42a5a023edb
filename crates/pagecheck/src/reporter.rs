//! Step reporting
//!
//! Page checks label what they do as named steps ("Open HomePage: ...",
//! "Validate that HomePage is opened"). A [`StepSink`] receives those steps;
//! reporting is purely observational and never changes control flow.
//!
//! # Sinks
//!
//! - [`NoopSteps`] - discard everything
//! - [`TracingSteps`] - log steps through `tracing`
//! - [`StepRecorder`] - keep serialisable step records and attachments

use crate::result::PageCheckResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Step result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step passed
    Passed,
    /// Step failed
    Failed,
}

impl StepStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// A finished step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name
    pub name: String,
    /// Step status
    pub status: StepStatus,
    /// Time spent in the step
    pub duration: Duration,
    /// Error message if failed
    pub error: Option<String>,
}

impl StepRecord {
    /// Create a passing step record
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Passed,
            duration,
            error: None,
        }
    }

    /// Create a failing step record
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Failed,
            duration,
            error: Some(error.into()),
        }
    }
}

/// Receiver of step events
pub trait StepSink: Send + Sync {
    /// A step is about to run
    fn step_started(&self, _name: &str) {}

    /// A step completed
    fn step_finished(&self, _record: &StepRecord) {}

    /// Attach a named text artefact to the report
    fn attach(&self, _name: &str, _content: &str) {}
}

/// Sink that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSteps;

impl StepSink for NoopSteps {}

/// Sink that logs steps
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSteps;

impl StepSink for TracingSteps {
    fn step_started(&self, name: &str) {
        debug!(step = name, "step started");
    }

    fn step_finished(&self, record: &StepRecord) {
        let duration_ms = record.duration.as_millis() as u64;
        match &record.error {
            None => info!(step = %record.name, duration_ms, "step passed"),
            Some(error) => warn!(step = %record.name, duration_ms, "step failed: {error}"),
        }
    }

    fn attach(&self, name: &str, content: &str) {
        info!(attachment = name, "{content}");
    }
}

/// In-memory sink keeping every step and attachment
///
/// ```ignore
/// let recorder = Arc::new(StepRecorder::new());
/// let ctx = TestContext::new(config, driver).with_steps(recorder.clone());
/// home.open(&ctx)?;
/// println!("{}", recorder.summary());
/// ```
#[derive(Debug, Default)]
pub struct StepRecorder {
    steps: Mutex<Vec<StepRecord>>,
    attachments: Mutex<Vec<(String, String)>>,
}

#[derive(Serialize)]
struct Report<'a> {
    steps: &'a [StepRecord],
    attachments: &'a [(String, String)],
}

impl StepRecorder {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished steps in completion order
    #[must_use]
    pub fn steps(&self) -> Vec<StepRecord> {
        lock(&self.steps).clone()
    }

    /// Names of finished steps in completion order
    #[must_use]
    pub fn step_names(&self) -> Vec<String> {
        lock(&self.steps).iter().map(|s| s.name.clone()).collect()
    }

    /// Recorded attachments as `(name, content)`
    #[must_use]
    pub fn attachments(&self) -> Vec<(String, String)> {
        lock(&self.attachments).clone()
    }

    /// Get number of failed steps
    #[must_use]
    pub fn failed_count(&self) -> usize {
        lock(&self.steps)
            .iter()
            .filter(|s| s.status.is_failed())
            .count()
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        let steps = lock(&self.steps);
        let passed = steps.iter().filter(|s| s.status.is_passed()).count();
        let total_ms: u128 = steps.iter().map(|s| s.duration.as_millis()).sum();
        format!("{passed}/{} steps passed in {total_ms}ms", steps.len())
    }

    /// Serialise steps and attachments as JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialisation fails
    pub fn to_json(&self) -> PageCheckResult<String> {
        let steps = lock(&self.steps);
        let attachments = lock(&self.attachments);
        let report = Report {
            steps: &steps,
            attachments: &attachments,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Write the JSON report to a file
    ///
    /// # Errors
    ///
    /// Returns error if serialisation or file writing fails
    pub fn write_json(&self, output_path: &Path) -> PageCheckResult<()> {
        std::fs::write(output_path, self.to_json()?)?;
        Ok(())
    }
}

impl StepSink for StepRecorder {
    fn step_finished(&self, record: &StepRecord) {
        lock(&self.steps).push(record.clone());
    }

    fn attach(&self, name: &str, content: &str) {
        lock(&self.attachments).push((name.to_string(), content.to_string()));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `body` as a named step, reporting its outcome to `sink`
///
/// # Errors
///
/// Returns whatever `body` returns
pub fn step<T>(
    sink: &dyn StepSink,
    name: &str,
    body: impl FnOnce() -> PageCheckResult<T>,
) -> PageCheckResult<T> {
    sink.step_started(name);
    let started = Instant::now();
    let outcome = body();
    let record = match &outcome {
        Ok(_) => StepRecord::passed(name, started.elapsed()),
        Err(err) => StepRecord::failed(name, started.elapsed(), err.to_string()),
    };
    sink.step_finished(&record);
    outcome
}
