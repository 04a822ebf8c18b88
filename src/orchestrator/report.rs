//! Observation channel for a run. Reporters only watch; nothing they do
//! feeds back into the run.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::{AbortReason, RunOutcome, RunStatus, StepEvent};
use crate::utils::format_score;

#[cfg_attr(test, mockall::automock)]
pub trait Reporter: Send {
    fn step_started(&mut self, step: &str);
    fn step_finished(&mut self, event: &StepEvent);
    fn run_finished(&mut self, outcome: &RunOutcome);
}

impl<T: Reporter + ?Sized> Reporter for Box<T> {
    fn step_started(&mut self, step: &str) {
        (**self).step_started(step)
    }

    fn step_finished(&mut self, event: &StepEvent) {
        (**self).step_finished(event)
    }

    fn run_finished(&mut self, outcome: &RunOutcome) {
        (**self).run_finished(outcome)
    }
}

/// Reports through `tracing` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn step_started(&mut self, step: &str) {
        info!("Starting step {}", step);
    }

    fn step_finished(&mut self, event: &StepEvent) {
        info!(
            step = %event.step,
            passed = event.passed,
            points = event.points,
            score = event.score,
            "{}",
            event.explanation
        );
    }

    fn run_finished(&mut self, outcome: &RunOutcome) {
        match &outcome.status {
            RunStatus::Completed => info!(
                "Run {} completed, score {}",
                outcome.run_id,
                format_score(outcome.score, outcome.max_score)
            ),
            RunStatus::Aborted { step, reason } => warn!(
                "Run {} stopped at {} ({}), score {}",
                outcome.run_id,
                step,
                describe(reason),
                format_score(outcome.score, outcome.max_score)
            ),
            RunStatus::Rejected { reason } => {
                warn!("Run {} rejected: {}", outcome.run_id, reason)
            }
        }
    }
}

fn describe(reason: &AbortReason) -> String {
    match reason {
        AbortReason::Failed(explanation) => format!("failed: {explanation}"),
        AbortReason::Fault(error) => format!("fault: {error}"),
    }
}

/// Human readable narration of a run.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}") {
            warn!("Failed to write report: {}", e);
        }
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn step_started(&mut self, step: &str) {
        self.emit(&format!("////// {step} \\\\\\\\\\\\"));
    }

    fn step_finished(&mut self, event: &StepEvent) {
        let mark = if event.passed { "(+)" } else { "(-)" };
        let result = if event.passed { "passed" } else { "failed" };
        self.emit(&format!(
            "{mark} {} {result}: {}",
            event.step, event.explanation
        ));
    }

    fn run_finished(&mut self, outcome: &RunOutcome) {
        match &outcome.status {
            RunStatus::Completed => {}
            RunStatus::Aborted { step, reason } => {
                self.emit(&format!("Stopped at {step}: {}", describe(reason)));
            }
            RunStatus::Rejected { reason } => {
                self.emit(&format!("Scenario rejected: {reason}"));
            }
        }
        self.emit(&format!(
            "Your score: {}",
            format_score(outcome.score, outcome.max_score)
        ));
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    StepStarted { step: &'a str, at: DateTime<Utc> },
    StepFinished(&'a StepEvent),
    RunFinished(&'a RunOutcome),
}

/// One JSON object per line and event.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl JsonReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, record: Record<'_>) {
        let written = serde_json::to_writer(&mut self.out, &record)
            .map_err(std::io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush());
        if let Err(e) = written {
            warn!("Failed to write report: {}", e);
        }
    }
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn step_started(&mut self, step: &str) {
        self.emit(Record::StepStarted {
            step,
            at: Utc::now(),
        });
    }

    fn step_finished(&mut self, event: &StepEvent) {
        self.emit(Record::StepFinished(event));
    }

    fn run_finished(&mut self, outcome: &RunOutcome) {
        self.emit(Record::RunFinished(outcome));
    }
}
