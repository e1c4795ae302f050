//! Delegated application commands (`manage.py`, `pip`).
//!
//! The [`AppCommands`] trait decouples step definitions from the framework that
//! actually migrates, collects, and creates users. Tests use scripted
//! implementations that never spawn processes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::context::EnvContext;
use crate::io::config::AppConfig;
use crate::io::process::{run_command_inherited, run_command_with_timeout};

/// Opaque framework operations the sequencer delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    InstallDependencies,
    /// Compute schema delta.
    MakeMigrations,
    /// Apply schema delta.
    Migrate,
    /// Collect static assets, clearing the destination first.
    CollectStatic,
    /// Create the administrative user; `interactive` attaches the terminal.
    CreateSuperuser { interactive: bool },
}

impl AppCommand {
    /// Stable name used for log files and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            AppCommand::InstallDependencies => "install-dependencies",
            AppCommand::MakeMigrations => "makemigrations",
            AppCommand::Migrate => "migrate",
            AppCommand::CollectStatic => "collectstatic",
            AppCommand::CreateSuperuser { .. } => "createsuperuser",
        }
    }
}

/// Abstraction over the application framework's management commands.
pub trait AppCommands {
    /// Run `command` as one atomic unit. `Ok` means it succeeded.
    fn run(&self, command: AppCommand, ctx: &EnvContext) -> Result<()>;
}

/// Runs Django management commands through the configured interpreter.
#[derive(Debug, Clone)]
pub struct DjangoCommands {
    pub python: String,
    pub manage_py: PathBuf,
    pub workdir: PathBuf,
    pub requirements: PathBuf,
    pub log_dir: PathBuf,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl DjangoCommands {
    /// Resolve relative paths in `cfg` against the project `root`.
    pub fn from_config(root: &Path, cfg: &AppConfig, log_dir: &Path) -> Self {
        Self {
            python: cfg.python.clone(),
            manage_py: cfg.manage_py.clone(),
            workdir: root.join(&cfg.workdir),
            requirements: cfg.requirements.clone(),
            log_dir: root.join(log_dir),
            timeout: Duration::from_secs(cfg.command_timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
        }
    }

    fn args(&self, command: AppCommand) -> Vec<String> {
        let manage = self.manage_py.display().to_string();
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match command {
            AppCommand::InstallDependencies => {
                let mut args = strings(&["-m", "pip", "install", "-r"]);
                args.push(self.requirements.display().to_string());
                args
            }
            AppCommand::MakeMigrations => {
                let mut args = vec![manage];
                args.extend(strings(&["makemigrations", "--noinput"]));
                args
            }
            AppCommand::Migrate => {
                let mut args = vec![manage];
                args.extend(strings(&["migrate", "--noinput"]));
                args
            }
            AppCommand::CollectStatic => {
                let mut args = vec![manage];
                args.extend(strings(&["collectstatic", "--noinput", "--clear"]));
                args
            }
            AppCommand::CreateSuperuser { interactive: true } => {
                vec![manage, "createsuperuser".to_string()]
            }
            AppCommand::CreateSuperuser { interactive: false } => {
                let mut args = vec![manage];
                args.extend(strings(&["createsuperuser", "--noinput"]));
                args
            }
        }
    }

    fn command(&self, command: AppCommand, ctx: &EnvContext) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.args(self.args(command))
            .current_dir(&self.workdir)
            .envs(ctx.iter());
        cmd
    }
}

impl AppCommands for DjangoCommands {
    #[instrument(skip_all, fields(command = command.name()))]
    fn run(&self, command: AppCommand, ctx: &EnvContext) -> Result<()> {
        info!(workdir = %self.workdir.display(), "running application command");
        let cmd = self.command(command, ctx);

        if let AppCommand::CreateSuperuser { interactive: true } = command {
            return match run_command_inherited(cmd, self.timeout)? {
                Some(status) if status.success() => Ok(()),
                Some(status) => Err(anyhow!("{} exited with {status}", command.name())),
                None => Err(anyhow!(
                    "{} timed out after {:?}",
                    command.name(),
                    self.timeout
                )),
            };
        }

        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run {}", command.name()))?;

        // Log write failures never change the command's outcome.
        let log_path = self.log_dir.join(format!("{}.log", command.name()));
        let see_log = match write_command_log(&log_path, &output.render_log(command.name())) {
            Ok(()) => format!(" (see {})", log_path.display()),
            Err(err) => {
                warn!(err = %format!("{err:#}"), "command log not written");
                String::new()
            }
        };

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "application command timed out");
            return Err(anyhow!(
                "{} timed out after {:?}{see_log}",
                command.name(),
                self.timeout,
            ));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "application command failed");
            let tail = output
                .stderr_tail()
                .map(|line| format!(": {line}"))
                .unwrap_or_default();
            return Err(anyhow!(
                "{} exited with {}{tail}{see_log}",
                command.name(),
                output.status,
            ));
        }

        debug!("application command completed");
        Ok(())
    }
}

fn write_command_log(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create command log dir {}", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("write command log {}", path.display()))
}
