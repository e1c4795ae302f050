//! Test-only fakes for probes, sleepers, application commands, and prompts.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::core::context::EnvContext;
use crate::core::error::StepError;
use crate::core::sequencer::Step;
use crate::core::types::{FailurePolicy, StepReport};
use crate::io::app::{AppCommand, AppCommands};
use crate::io::confirm::Confirm;
use crate::io::probe::{Endpoint, Probe, Sleeper};

/// Probe that succeeds on a fixed attempt (or never).
pub struct ScriptedProbe {
    open_on: Option<u32>,
    endpoints: RefCell<Vec<Endpoint>>,
}

impl ScriptedProbe {
    /// Reachable from the `attempt`-th probe onward (1-based).
    pub fn open_on(attempt: u32) -> Self {
        Self {
            open_on: Some(attempt),
            endpoints: RefCell::new(Vec::new()),
        }
    }

    pub fn never() -> Self {
        Self {
            open_on: None,
            endpoints: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.endpoints.borrow().len() as u32
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints.borrow().clone()
    }
}

impl Probe for ScriptedProbe {
    fn probe(&self, endpoint: &Endpoint) -> Result<(), StepError> {
        self.endpoints.borrow_mut().push(endpoint.clone());
        match self.open_on {
            Some(open_on) if self.calls() >= open_on => Ok(()),
            _ => Err(StepError::TransientProbeFailure {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

/// Sleeper that records requested pauses instead of blocking.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

/// Application commands that record calls and fail on one chosen command.
pub struct ScriptedApp {
    fail_on: Option<AppCommand>,
    calls: RefCell<Vec<AppCommand>>,
}

impl ScriptedApp {
    pub fn succeeding() -> Self {
        Self {
            fail_on: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_on(command: AppCommand) -> Self {
        Self {
            fail_on: Some(command),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<AppCommand> {
        self.calls.borrow().clone()
    }
}

impl AppCommands for ScriptedApp {
    fn run(&self, command: AppCommand, _ctx: &EnvContext) -> Result<()> {
        self.calls.borrow_mut().push(command);
        if self.fail_on == Some(command) {
            return Err(anyhow!("{} exited with exit status: 1", command.name()));
        }
        Ok(())
    }
}

/// Confirmation that answers from a queue and records the questions asked.
///
/// Answers `no` once the queue is exhausted.
pub struct ScriptedConfirm {
    answers: Vec<bool>,
    asked: RefCell<Vec<String>>,
    next: Cell<usize>,
}

impl ScriptedConfirm {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers,
            asked: RefCell::new(Vec::new()),
            next: Cell::new(0),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, question: &str) -> Result<bool> {
        self.asked.borrow_mut().push(question.to_string());
        let i = self.next.get();
        self.next.set(i + 1);
        Ok(self.answers.get(i).copied().unwrap_or(false))
    }
}

type StepFn = dyn Fn(&EnvContext) -> Result<StepReport, StepError>;

/// Ad-hoc step backed by a closure.
pub struct FnStep {
    label: String,
    policy: FailurePolicy,
    action: Box<StepFn>,
}

impl FnStep {
    pub fn new<F>(label: impl Into<String>, policy: FailurePolicy, action: F) -> Self
    where
        F: Fn(&EnvContext) -> Result<StepReport, StepError> + 'static,
    {
        Self {
            label: label.into(),
            policy,
            action: Box::new(action),
        }
    }
}

impl Step for FnStep {
    fn label(&self) -> &str {
        &self.label
    }

    fn policy(&self) -> FailurePolicy {
        self.policy
    }

    fn run(&self, ctx: &EnvContext) -> Result<StepReport, StepError> {
        (self.action)(ctx)
    }
}

/// Temporary project root with an optional `bootseq.toml`.
pub struct TestProject {
    temp: tempfile::TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn write_config(&self, toml: &str) -> Result<()> {
        std::fs::write(self.root().join(crate::io::config::CONFIG_FILE_NAME), toml)?;
        Ok(())
    }
}
