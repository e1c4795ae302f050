use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::core::context::EnvContext;
use crate::core::error::StepError;
use crate::core::sequencer::Step;
use crate::core::types::{FailurePolicy, StepReport};

pub const LABEL: &str = "ensure directories";

/// Creates each configured directory only if it is missing.
pub struct EnsureDirectories {
    pub root: PathBuf,
    pub directories: Vec<PathBuf>,
}

impl Step for EnsureDirectories {
    fn label(&self) -> &str {
        LABEL
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    fn run(&self, _ctx: &EnvContext) -> Result<StepReport, StepError> {
        let mut created = Vec::new();
        let mut existed = Vec::new();
        for dir in &self.directories {
            let path = self.root.join(dir);
            if path.is_dir() {
                existed.push(dir.display().to_string());
                continue;
            }
            if path.exists() {
                return Err(StepError::NotADirectory(path));
            }
            fs::create_dir_all(&path).map_err(|source| StepError::Directory {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "created directory");
            created.push(dir.display().to_string());
        }
        Ok(StepReport::completed(describe(&created, &existed)))
    }
}

fn describe(created: &[String], existed: &[String]) -> String {
    let mut parts = Vec::new();
    if !created.is_empty() {
        parts.push(format!("created: {}", created.join(", ")));
    }
    if !existed.is_empty() {
        parts.push(format!("already existed: {}", existed.join(", ")));
    }
    if parts.is_empty() {
        return "no directories configured".to_string();
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(root: &std::path::Path) -> EnsureDirectories {
        EnsureDirectories {
            root: root.to_path_buf(),
            directories: vec![PathBuf::from("logs"), PathBuf::from("media/uploads")],
        }
    }

    #[test]
    fn creates_missing_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let report = step(temp.path()).run(&EnvContext::new()).expect("run");
        assert_eq!(report.detail, "created: logs, media/uploads");
        assert!(temp.path().join("media/uploads").is_dir());
    }

    #[test]
    fn second_run_reports_already_existed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let step = step(temp.path());
        step.run(&EnvContext::new()).expect("first");
        let report = step.run(&EnvContext::new()).expect("second");
        assert_eq!(report.detail, "already existed: logs, media/uploads");
    }

    #[test]
    fn mixed_branches_are_both_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("logs")).expect("mkdir");
        let report = step(temp.path()).run(&EnvContext::new()).expect("run");
        assert_eq!(report.detail, "created: media/uploads; already existed: logs");
    }

    #[test]
    fn file_in_the_way_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("logs"), "not a dir").expect("write");
        let err = step(temp.path()).run(&EnvContext::new()).expect_err("file");
        assert!(matches!(err, StepError::NotADirectory(_)));
    }
}
