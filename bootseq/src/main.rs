//! Environment bootstrap sequencer for the stock analysis web application.
//!
//! Runs the provisioning steps for a deployment variant, reports progress on
//! stdout, and either execs the wrapped server command (container) or prints
//! next steps (local).

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bootseq::bootstrap::{prepare, run_bootstrap};
use bootseq::core::secret::{DEFAULT_SECRET_KEY_LENGTH, generate_secret_key};
use bootseq::core::sequencer::StepEvent;
use bootseq::core::types::{FailurePolicy, SequenceResult, StepRecord, StepStatus};
use bootseq::exit_codes;
use bootseq::io::app::DjangoCommands;
use bootseq::io::confirm::{AlwaysYes, Confirm, StdinConfirm};
use bootseq::io::handoff::exec_command;
use bootseq::io::probe::{TcpProbe, ThreadSleeper};
use bootseq::logging;
use bootseq::variant::{Capabilities, FinalAction, Variant, build_steps, next_steps};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "bootseq",
    version,
    about = "Idempotent environment bootstrap sequencer"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the bootstrap steps, then hand off to COMMAND (container) or print next steps (local).
    Run {
        #[arg(long, value_enum, default_value_t = Variant::Container)]
        variant: Variant,
        /// Project root; relative config paths resolve against it.
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Config file (default: `<root>/bootseq.toml`).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Dotenv file merged under the process environment (default: `<root>/.env`).
        #[arg(long)]
        env_file: Option<PathBuf>,
        /// Answer yes to every operator prompt.
        #[arg(short, long)]
        yes: bool,
        /// Command to exec after a completed container run.
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Print the ordered steps of a variant without running them.
    Plan {
        #[arg(long, value_enum, default_value_t = Variant::Container)]
        variant: Variant,
        #[arg(long, default_value = ".")]
        root: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a freshly generated secret key.
    SecretKey {
        #[arg(long, default_value_t = DEFAULT_SECRET_KEY_LENGTH)]
        length: usize,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            variant,
            root,
            config,
            env_file,
            yes,
            command,
        } => cmd_run(variant, root, config, env_file, yes, command),
        Command::Plan {
            variant,
            root,
            config,
        } => cmd_plan(variant, root, config),
        Command::SecretKey { length } => cmd_secret_key(length),
    }
}

fn cmd_run(
    variant: Variant,
    root: PathBuf,
    config: Option<PathBuf>,
    env_file: Option<PathBuf>,
    yes: bool,
    command: Vec<String>,
) -> Result<i32> {
    let variant_cfg = variant.config();
    if !command.is_empty() && variant_cfg.final_action != FinalAction::Exec {
        anyhow::bail!("the {variant} variant does not run a trailing command");
    }
    let prepared = prepare(&root, config.as_deref(), env_file.as_deref())?;
    let cfg = prepared.config.clone();

    let probe = TcpProbe {
        connect_timeout: cfg.database.connect_timeout(),
    };
    let app = DjangoCommands::from_config(&root, &cfg.app, &cfg.log_dir);
    let confirm: &dyn Confirm = if yes { &AlwaysYes } else { &StdinConfirm };
    let caps = Capabilities {
        probe: &probe,
        sleeper: &ThreadSleeper,
        app: &app,
        confirm,
    };

    println!("bootseq: variant={variant} root={}", root.display());
    let outcome = run_bootstrap(variant_cfg, prepared, caps, print_event);

    if let SequenceResult::Aborted {
        index,
        label,
        error,
    } = &outcome.run.result
    {
        eprintln!("bootstrap aborted at step {index} ({label}): {error}");
        match &outcome.report_path {
            Some(path) => eprintln!("fix the cause and re-run; report: {}", path.display()),
            None => eprintln!("fix the cause and re-run"),
        }
        return Ok(exit_codes::ABORTED);
    }

    let warnings = outcome.run.warnings().count();
    println!("bootstrap completed ({warnings} warning(s))");

    match variant_cfg.final_action {
        FinalAction::Exec if !command.is_empty() => {
            std::io::stdout().flush().context("flush stdout")?;
            exec_command(&command, &outcome.run.context)?;
        }
        FinalAction::Exec => info!("no command given, exiting"),
        FinalAction::PrintNextSteps => println!("\n{}", next_steps(&cfg)),
    }
    Ok(exit_codes::OK)
}

fn cmd_plan(variant: Variant, root: PathBuf, config: Option<PathBuf>) -> Result<i32> {
    let prepared = prepare(&root, config.as_deref(), None)?;
    let cfg = &prepared.config;
    let probe = TcpProbe {
        connect_timeout: cfg.database.connect_timeout(),
    };
    let app = DjangoCommands::from_config(&root, &cfg.app, &cfg.log_dir);
    let caps = Capabilities {
        probe: &probe,
        sleeper: &ThreadSleeper,
        app: &app,
        confirm: &AlwaysYes,
    };
    let steps = build_steps(variant.config(), &root, cfg, caps);
    for (i, step) in steps.iter().enumerate() {
        println!("{}. {} [{}]", i + 1, step.label(), step.policy().as_str());
    }
    Ok(exit_codes::OK)
}

fn cmd_secret_key(length: usize) -> Result<i32> {
    if length < 32 {
        anyhow::bail!("--length must be >= 32");
    }
    println!("{}", generate_secret_key(length));
    Ok(exit_codes::OK)
}

fn print_event(event: StepEvent<'_>) {
    match event {
        StepEvent::Started {
            index,
            total,
            label,
        } => println!("[{index}/{total}] {label}"),
        StepEvent::Finished { record, .. } => print_record(record),
    }
}

fn print_record(record: &StepRecord) {
    let detail = record.detail.as_deref().unwrap_or("");
    let error = record.error.as_deref().unwrap_or("");
    match (record.status, record.policy) {
        (StepStatus::Succeeded, _) => println!("  ok: {detail}"),
        (StepStatus::Skipped, _) => println!("  skipped: {detail}"),
        (StepStatus::Failed, FailurePolicy::WarnAndContinue) => eprintln!("  warning: {error}"),
        (StepStatus::Failed, FailurePolicy::Abort) => eprintln!("  FAILED: {error}"),
        (StepStatus::Pending | StepStatus::Running, _) => {}
    }
    if let Some(notice) = &record.notice {
        println!("\n{notice}\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_defaults_to_container() {
        let cli = Cli::parse_from(["bootseq", "run"]);
        assert!(matches!(
            cli.command,
            Command::Run {
                variant: Variant::Container,
                yes: false,
                ..
            }
        ));
    }

    #[test]
    fn parse_run_with_trailing_command() {
        let cli = Cli::parse_from([
            "bootseq",
            "run",
            "--variant",
            "container",
            "--",
            "gunicorn",
            "--bind",
            "0.0.0.0:8000",
        ]);
        let Command::Run { command, .. } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(command, vec!["gunicorn", "--bind", "0.0.0.0:8000"]);
    }

    #[test]
    fn parse_local_with_yes() {
        let cli = Cli::parse_from(["bootseq", "run", "--variant", "local", "-y"]);
        assert!(matches!(
            cli.command,
            Command::Run {
                variant: Variant::Local,
                yes: true,
                ..
            }
        ));
    }
}
