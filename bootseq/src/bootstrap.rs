//! Orchestration for a single `bootseq run`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::context::EnvContext;
use crate::core::sequencer::{StepEvent, run_sequence};
use crate::core::types::RunOutcome;
use crate::io::config::{BootstrapConfig, CONFIG_FILE_NAME, load_config};
use crate::io::env::load_context;
use crate::io::report::{RunReport, write_report};
use crate::variant::{Capabilities, VariantConfig, build_steps};

/// Inputs resolved before any step runs.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub root: PathBuf,
    pub config: BootstrapConfig,
    pub context: EnvContext,
}

/// Load config (default `<root>/bootseq.toml`) and the environment context
/// (default `<root>/.env` overlaid by the process environment).
pub fn prepare(root: &Path, config_path: Option<&Path>, env_file: Option<&Path>) -> Result<Prepared> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
    let config = load_config(&config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    let env_file = env_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(".env"));
    let context = load_context(Some(&env_file)).context("load environment")?;
    Ok(Prepared {
        root: root.to_path_buf(),
        config,
        context,
    })
}

/// Result of a bootstrap run, including where the report was written.
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    pub run: RunOutcome,
    /// `None` when the report could not be written.
    pub report_path: Option<PathBuf>,
}

/// Run every step of `variant` and persist the run report.
///
/// Step failures are part of the returned outcome. A report that cannot be
/// written is logged and does not change the outcome.
#[instrument(skip_all, fields(variant = %variant.variant))]
pub fn run_bootstrap<F>(
    variant: &VariantConfig,
    prepared: Prepared,
    caps: Capabilities<'_>,
    on_event: F,
) -> BootstrapOutcome
where
    F: FnMut(StepEvent<'_>),
{
    let start = Instant::now();
    let Prepared {
        root,
        config,
        context,
    } = prepared;

    let steps = build_steps(variant, &root, &config, caps);
    info!(steps = steps.len(), "bootstrap started");
    let run = run_sequence(&steps, context, on_event);

    let report_path = root.join(&config.report_path);
    let report = RunReport::new(
        variant.variant.as_str(),
        &run,
        start.elapsed().as_millis() as u64,
    );
    let report_path = match write_report(&report_path, &report) {
        Ok(()) => Some(report_path),
        Err(err) => {
            warn!(
                path = %report_path.display(),
                err = %format!("{err:#}"),
                "run report not written"
            );
            None
        }
    };

    if run.is_completed() {
        info!(warnings = run.warnings().count(), "bootstrap completed");
    } else {
        warn!(result = %run.result, "bootstrap aborted");
    }
    BootstrapOutcome { run, report_path }
}
