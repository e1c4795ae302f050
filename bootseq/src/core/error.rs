//! Failure taxonomy for bootstrap steps.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons a step action can fail.
///
/// Delegated command failures carry the rendered `anyhow` chain as text so the
/// record stays serializable and comparable in tests.
#[derive(Debug, Error)]
pub enum StepError {
    /// A single probe failed; the polling loop retries it silently.
    #[error("probe of {endpoint} failed: {reason}")]
    TransientProbeFailure { endpoint: String, reason: String },

    #[error("{endpoint} not reachable after {attempts} attempts")]
    ProbeTimeout { endpoint: String, attempts: u32 },

    #[error("invalid {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("prepare directory {}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("operator prompt failed: {0}")]
    SecretPrompt(String),

    #[error("dependency installation failed: {0}")]
    DependencyInstallFailure(String),

    #[error("computing schema changes failed: {0}")]
    MigrationComputeFailure(String),

    #[error("applying schema changes failed: {0}")]
    MigrationApplyFailure(String),

    #[error("static asset collection failed: {0}")]
    StaticCollectionFailure(String),

    #[error("superuser creation failed: {0}")]
    SuperuserCreationFailure(String),

    #[error("no provider API keys configured (limited functionality)")]
    NoApiKeys,
}

impl StepError {
    /// Attempt count to record for polling failures.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            StepError::ProbeTimeout { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// Render an `anyhow` error chain on one line, as `main` does.
pub fn chain(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_timeout_reports_attempts() {
        let err = StepError::ProbeTimeout {
            endpoint: "db:5432".to_string(),
            attempts: 30,
        };
        assert_eq!(err.to_string(), "db:5432 not reachable after 30 attempts");
        assert_eq!(err.attempts(), Some(30));
    }

    #[test]
    fn command_failures_have_no_attempts() {
        let err = StepError::MigrationApplyFailure("exit status 1".to_string());
        assert_eq!(err.attempts(), None);
        assert!(err.to_string().contains("applying schema changes"));
    }

    #[test]
    fn chain_includes_context() {
        let err = anyhow::anyhow!("exit status 2").context("run manage.py migrate");
        assert_eq!(chain(&err), "run manage.py migrate: exit status 2");
    }
}
