//! Shared deterministic types for the bootstrap sequence.
//!
//! These types define the contract between step definitions, the sequencer,
//! and the reporting layer. They hold no I/O handles and serialize to a
//! stable JSON shape for the run report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::context::EnvContext;

/// What happens to the rest of the sequence when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Failure halts the run; later steps are never entered.
    Abort,
    /// Failure is logged and the run proceeds.
    WarnAndContinue,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::WarnAndContinue => "warn-and-continue",
        }
    }
}

/// Lifecycle of a single step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        }
    }
}

/// How a step that returned normally ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The step did its work (or found it already done).
    Done,
    /// The operator declined the step.
    Declined,
}

/// Successful result of a step action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub completion: Completion,
    /// One-line summary of which branch the step took.
    pub detail: String,
    /// Operator-facing text that must not be persisted (e.g. a generated secret).
    pub notice: Option<String>,
    /// Values to add to the environment context for later steps.
    pub exports: Vec<(String, String)>,
    /// Number of attempts performed, for polling steps.
    pub attempts: Option<u32>,
}

impl StepReport {
    pub fn completed(detail: impl Into<String>) -> Self {
        Self {
            completion: Completion::Done,
            detail: detail.into(),
            notice: None,
            exports: Vec::new(),
            attempts: None,
        }
    }

    pub fn declined(detail: impl Into<String>) -> Self {
        Self {
            completion: Completion::Declined,
            ..Self::completed(detail)
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn with_export(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.exports.push((key.into(), value.into()));
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }
}

/// Per-step entry of a run outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position in the sequence.
    pub index: usize,
    pub label: String,
    pub policy: FailurePolicy,
    pub status: StepStatus,
    pub detail: Option<String>,
    pub attempts: Option<u32>,
    pub error: Option<String>,
    #[serde(skip)]
    pub notice: Option<String>,
}

impl StepRecord {
    pub fn pending(index: usize, label: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            index,
            label: label.into(),
            policy,
            status: StepStatus::Pending,
            detail: None,
            attempts: None,
            error: None,
            notice: None,
        }
    }
}

/// Overall result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum SequenceResult {
    /// Every step ran; warn-and-continue failures may have occurred.
    Completed,
    /// An abort-policy step failed.
    Aborted {
        index: usize,
        label: String,
        error: String,
    },
}

impl fmt::Display for SequenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceResult::Completed => write!(f, "completed"),
            SequenceResult::Aborted { index, .. } => write!(f, "aborted-at-step-{index}"),
        }
    }
}

/// Records and final context produced by `run_sequence`.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub records: Vec<StepRecord>,
    pub result: SequenceResult,
    /// Context after all step exports were applied.
    pub context: EnvContext,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        self.result == SequenceResult::Completed
    }

    pub fn record(&self, label: &str) -> Option<&StepRecord> {
        self.records.iter().find(|record| record.label == label)
    }

    /// Steps that failed under a warn-and-continue policy.
    pub fn warnings(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(|record| {
            record.status == StepStatus::Failed && record.policy == FailurePolicy::WarnAndContinue
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_result_displays_step_index() {
        let result = SequenceResult::Aborted {
            index: 3,
            label: "apply migrations".to_string(),
            error: "boom".to_string(),
        };
        assert_eq!(result.to_string(), "aborted-at-step-3");
        assert_eq!(SequenceResult::Completed.to_string(), "completed");
    }

    #[test]
    fn record_serialization_omits_notice() {
        let mut record = StepRecord::pending(1, "ensure secret key", FailurePolicy::Abort);
        record.notice = Some("SECRET_KEY=hunter2".to_string());
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"policy\":\"abort\""));
    }

    #[test]
    fn declined_report_keeps_detail() {
        let report = StepReport::declined("operator declined");
        assert_eq!(report.completion, Completion::Declined);
        assert_eq!(report.detail, "operator declined");
        assert!(report.exports.is_empty());
    }
}
