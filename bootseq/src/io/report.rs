//! Persisted run report (`.bootseq/last_run.json`).
//!
//! The report is an operator artifact for post-mortems: step records and the
//! overall result. Context values are never written.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::{RunOutcome, SequenceResult, StepRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub variant: String,
    pub outcome: String,
    pub result: SequenceResult,
    pub duration_ms: u64,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn new(variant: &str, outcome: &RunOutcome, duration_ms: u64) -> Self {
        Self {
            variant: variant.to_string(),
            outcome: outcome.result.to_string(),
            result: outcome.result.clone(),
            duration_ms,
            steps: outcome
                .records
                .iter()
                .map(|record| StepRecord {
                    notice: None,
                    ..record.clone()
                })
                .collect(),
        }
    }
}

pub fn load_report(path: &Path) -> Result<RunReport> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read run report {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse run report {}", path.display()))
}

/// Atomically write the report to disk (temp file + rename).
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    debug!(path = %path.display(), outcome = %report.outcome, "writing run report");
    let mut buf = serde_json::to_string_pretty(report).context("serialize run report")?;
    buf.push('\n');
    super::write_atomic(path, &buf)
}
