//! Deployment variants and step list assembly.
//!
//! Both variants share the same step definitions; they differ only in the
//! rows of [`VARIANTS`].

use std::fmt;
use std::path::Path;

use clap::ValueEnum;

use crate::core::sequencer::Step;
use crate::io::app::AppCommands;
use crate::io::config::BootstrapConfig;
use crate::io::confirm::Confirm;
use crate::io::probe::{Endpoint, PollPolicy, Probe, Sleeper};
use crate::steps::{
    ApplyMigrations, CollectStatic, CreateSuperuser, EnsureDirectories, EnsureSecretKey,
    InstallDependencies, ReportApiKeys, WaitForDatabase,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Non-interactive container start: waits for the database, then execs.
    Container,
    /// Local setup: installs dependencies and asks before optional steps.
    Local,
}

impl Variant {
    pub fn config(self) -> &'static VariantConfig {
        match self {
            Variant::Container => &VARIANTS[0],
            Variant::Local => &VARIANTS[1],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Container => "container",
            Variant::Local => "local",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the process does after a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalAction {
    /// Exec into the caller-supplied command, if one was given.
    Exec,
    /// Print instructions for the operator.
    PrintNextSteps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantConfig {
    pub variant: Variant,
    pub wait_for_database: bool,
    pub interactive_prompts: bool,
    pub install_dependencies: bool,
    pub final_action: FinalAction,
}

pub static VARIANTS: [VariantConfig; 2] = [
    VariantConfig {
        variant: Variant::Container,
        wait_for_database: true,
        interactive_prompts: false,
        install_dependencies: false,
        final_action: FinalAction::Exec,
    },
    VariantConfig {
        variant: Variant::Local,
        wait_for_database: false,
        interactive_prompts: true,
        install_dependencies: true,
        final_action: FinalAction::PrintNextSteps,
    },
];

/// Side-effecting capabilities the steps borrow for the duration of a run.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub probe: &'a dyn Probe,
    pub sleeper: &'a dyn Sleeper,
    pub app: &'a dyn AppCommands,
    pub confirm: &'a dyn Confirm,
}

/// Assemble the ordered step list for `variant`.
///
/// Steps a variant does not use are left out of the list entirely.
pub fn build_steps<'a>(
    variant: &VariantConfig,
    root: &Path,
    cfg: &BootstrapConfig,
    caps: Capabilities<'a>,
) -> Vec<Box<dyn Step + 'a>> {
    let prompt = variant.interactive_prompts.then_some(caps.confirm);
    let mut steps: Vec<Box<dyn Step + 'a>> = vec![Box::new(EnsureDirectories {
        root: root.to_path_buf(),
        directories: cfg.directories.clone(),
    })];
    if variant.wait_for_database {
        steps.push(Box::new(WaitForDatabase {
            fallback: Endpoint::new(cfg.database.host.clone(), cfg.database.port),
            policy: PollPolicy {
                max_attempts: cfg.database.max_attempts,
                interval: cfg.database.interval(),
            },
            probe: caps.probe,
            sleeper: caps.sleeper,
        }));
    }
    steps.push(Box::new(EnsureSecretKey {
        env_var: cfg.secret.env_var.clone(),
        length: cfg.secret.length,
        confirm: prompt,
    }));
    steps.push(Box::new(ReportApiKeys));
    if variant.install_dependencies {
        steps.push(Box::new(InstallDependencies { app: caps.app }));
    }
    steps.push(Box::new(ApplyMigrations { app: caps.app }));
    steps.push(Box::new(CollectStatic { app: caps.app }));
    steps.push(Box::new(CreateSuperuser {
        app: caps.app,
        confirm: prompt,
    }));
    steps
}

/// Instructions printed by the local variant after a completed run.
pub fn next_steps(cfg: &BootstrapConfig) -> String {
    let manage = cfg.app.manage_py.display();
    let python = &cfg.app.python;
    [
        "Next steps:".to_string(),
        format!(
            "  1. Make sure {} is saved in your .env file.",
            cfg.secret.env_var
        ),
        "  2. Add any provider API keys (e.g. GEMINI_API_KEY) to .env.".to_string(),
        format!("  3. Start the development server: {python} {manage} runserver"),
        "  4. Open http://127.0.0.1:8000/ in your browser.".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::confirm::AlwaysYes;
    use crate::steps::{api_keys, app, database, directories, secret};
    use crate::test_support::{RecordingSleeper, ScriptedApp, ScriptedProbe};

    fn labels(variant: Variant) -> Vec<String> {
        let probe = ScriptedProbe::open_on(1);
        let sleeper = RecordingSleeper::default();
        let app = ScriptedApp::succeeding();
        let caps = Capabilities {
            probe: &probe,
            sleeper: &sleeper,
            app: &app,
            confirm: &AlwaysYes,
        };
        let temp = tempfile::tempdir().expect("tempdir");
        let steps = build_steps(
            variant.config(),
            temp.path(),
            &BootstrapConfig::default(),
            caps,
        );
        steps.iter().map(|step| step.label().to_string()).collect()
    }

    #[test]
    fn container_waits_for_database_and_skips_install() {
        assert_eq!(
            labels(Variant::Container),
            vec![
                directories::LABEL,
                database::LABEL,
                secret::LABEL,
                api_keys::LABEL,
                app::MIGRATE_LABEL,
                app::STATIC_LABEL,
                app::SUPERUSER_LABEL,
            ]
        );
    }

    #[test]
    fn local_installs_and_omits_probe() {
        assert_eq!(
            labels(Variant::Local),
            vec![
                directories::LABEL,
                secret::LABEL,
                api_keys::LABEL,
                app::INSTALL_LABEL,
                app::MIGRATE_LABEL,
                app::STATIC_LABEL,
                app::SUPERUSER_LABEL,
            ]
        );
    }

    #[test]
    fn variant_table_matches_lookup() {
        for row in &VARIANTS {
            assert_eq!(row.variant.config(), row);
        }
        assert_eq!(Variant::Container.config().final_action, FinalAction::Exec);
        assert!(Variant::Local.config().interactive_prompts);
    }

    #[test]
    fn next_steps_mention_runserver() {
        let text = next_steps(&BootstrapConfig::default());
        assert!(text.contains("python manage.py runserver"));
        assert!(text.contains("SECRET_KEY"));
    }
}
