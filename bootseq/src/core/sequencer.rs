//! Linear, fail-fast execution of bootstrap steps.

use tracing::{debug, info, instrument, warn};

use crate::core::context::EnvContext;
use crate::core::error::StepError;
use crate::core::types::{
    Completion, FailurePolicy, RunOutcome, SequenceResult, StepRecord, StepReport, StepStatus,
};

/// One ordered unit of the bootstrap pipeline.
pub trait Step {
    /// Human-readable label used in progress output and diagnostics.
    fn label(&self) -> &str;

    fn policy(&self) -> FailurePolicy;

    /// Perform the step. Must be safe to re-run after a previous success.
    fn run(&self, ctx: &EnvContext) -> Result<StepReport, StepError>;
}

/// Progress notifications emitted while a sequence runs.
#[derive(Debug, Clone, Copy)]
pub enum StepEvent<'a> {
    Started {
        index: usize,
        total: usize,
        label: &'a str,
    },
    Finished {
        total: usize,
        record: &'a StepRecord,
    },
}

/// Run `steps` strictly in order against `context`.
///
/// A failing `Abort` step stops the run; every later step stays unentered and
/// is recorded as `Skipped`. `WarnAndContinue` failures are logged and the run
/// proceeds. Exports from a finished step are applied to the context before
/// the next step starts.
#[instrument(skip_all, fields(steps = steps.len()))]
pub fn run_sequence<F>(steps: &[Box<dyn Step + '_>], context: EnvContext, mut on_event: F) -> RunOutcome
where
    F: FnMut(StepEvent<'_>),
{
    let total = steps.len();
    let mut records: Vec<StepRecord> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| StepRecord::pending(i + 1, step.label(), step.policy()))
        .collect();
    let mut context = context;
    let mut result = SequenceResult::Completed;

    for (i, step) in steps.iter().enumerate() {
        let index = i + 1;
        records[i].status = StepStatus::Running;
        on_event(StepEvent::Started {
            index,
            total,
            label: step.label(),
        });
        debug!(index, label = step.label(), "step started");

        let record = &mut records[i];
        match step.run(&context) {
            Ok(report) => {
                context = context.with_exports(&report.exports);
                apply_report(record, report);
                info!(index, label = %record.label, status = record.status.as_str(), "step finished");
            }
            Err(err) => {
                record.status = StepStatus::Failed;
                record.attempts = err.attempts();
                record.error = Some(err.to_string());
                match record.policy {
                    FailurePolicy::Abort => {
                        warn!(index, label = %record.label, err = %err, "step failed, aborting");
                        result = SequenceResult::Aborted {
                            index,
                            label: record.label.clone(),
                            error: err.to_string(),
                        };
                    }
                    FailurePolicy::WarnAndContinue => {
                        warn!(index, label = %record.label, err = %err, "step failed, continuing");
                    }
                }
            }
        }

        on_event(StepEvent::Finished {
            total,
            record: &records[i],
        });

        if matches!(result, SequenceResult::Aborted { .. }) {
            for later in &mut records[index..] {
                later.status = StepStatus::Skipped;
            }
            break;
        }
    }

    RunOutcome {
        records,
        result,
        context,
    }
}

fn apply_report(record: &mut StepRecord, report: StepReport) {
    record.status = match report.completion {
        Completion::Done => StepStatus::Succeeded,
        Completion::Declined => StepStatus::Skipped,
    };
    record.detail = Some(report.detail);
    record.notice = report.notice;
    record.attempts = report.attempts;
}
