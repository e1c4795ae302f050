//! Hand control to the caller-supplied command after a successful run.

use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::core::context::EnvContext;

/// Replace the current process with `argv`, exporting `ctx` into its environment.
///
/// Only returns on failure. On non-Unix targets the command is spawned and the
/// process exits with its status instead.
pub fn exec_command(argv: &[String], ctx: &EnvContext) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("no command to exec"))?;
    let mut cmd = Command::new(program);
    cmd.args(args).envs(ctx.iter());
    info!(program = %program, args = args.len(), "handing off");
    exec(cmd).with_context(|| format!("exec {program}"))
}

#[cfg(unix)]
fn exec(mut cmd: Command) -> Result<()> {
    use std::os::unix::process::CommandExt;
    Err(cmd.exec().into())
}

#[cfg(not(unix))]
fn exec(mut cmd: Command) -> Result<()> {
    let status = cmd.status().context("run command")?;
    std::process::exit(status.code().unwrap_or(crate::exit_codes::ABORTED));
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        let err = exec_command(&[], &EnvContext::new()).expect_err("empty");
        assert!(err.to_string().contains("no command"));
    }

    #[test]
    fn missing_program_reports_exec_failure() {
        let argv = vec!["/nonexistent/bootseq-server".to_string()];
        let err = exec_command(&argv, &EnvContext::new()).expect_err("missing");
        assert!(format!("{err:#}").contains("exec /nonexistent/bootseq-server"));
    }
}
