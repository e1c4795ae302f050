//! Steps that delegate to the application framework.

use crate::core::context::EnvContext;
use crate::core::error::{StepError, chain};
use crate::core::sequencer::Step;
use crate::core::types::{FailurePolicy, StepReport};
use crate::io::app::{AppCommand, AppCommands};
use crate::io::confirm::Confirm;

pub const INSTALL_LABEL: &str = "install dependencies";
pub const MIGRATE_LABEL: &str = "apply migrations";
pub const STATIC_LABEL: &str = "collect static assets";
pub const SUPERUSER_LABEL: &str = "create superuser";

pub struct InstallDependencies<'a> {
    pub app: &'a dyn AppCommands,
}

impl Step for InstallDependencies<'_> {
    fn label(&self) -> &str {
        INSTALL_LABEL
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    fn run(&self, ctx: &EnvContext) -> Result<StepReport, StepError> {
        self.app
            .run(AppCommand::InstallDependencies, ctx)
            .map_err(|err| StepError::DependencyInstallFailure(chain(&err)))?;
        Ok(StepReport::completed("dependencies installed"))
    }
}

/// Computes then applies the schema delta. Apply never runs after a failed compute.
pub struct ApplyMigrations<'a> {
    pub app: &'a dyn AppCommands,
}

impl Step for ApplyMigrations<'_> {
    fn label(&self) -> &str {
        MIGRATE_LABEL
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    fn run(&self, ctx: &EnvContext) -> Result<StepReport, StepError> {
        self.app
            .run(AppCommand::MakeMigrations, ctx)
            .map_err(|err| StepError::MigrationComputeFailure(chain(&err)))?;
        self.app
            .run(AppCommand::Migrate, ctx)
            .map_err(|err| StepError::MigrationApplyFailure(chain(&err)))?;
        Ok(StepReport::completed("schema changes computed and applied"))
    }
}

pub struct CollectStatic<'a> {
    pub app: &'a dyn AppCommands,
}

impl Step for CollectStatic<'_> {
    fn label(&self) -> &str {
        STATIC_LABEL
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    fn run(&self, ctx: &EnvContext) -> Result<StepReport, StepError> {
        self.app
            .run(AppCommand::CollectStatic, ctx)
            .map_err(|err| StepError::StaticCollectionFailure(chain(&err)))?;
        Ok(StepReport::completed("static assets collected"))
    }
}

/// Creates the administrative user.
///
/// With `confirm` set the operator is asked first and the framework command
/// runs attached to the terminal; without it the command runs non-interactively.
/// Failure never aborts the run.
pub struct CreateSuperuser<'a> {
    pub app: &'a dyn AppCommands,
    pub confirm: Option<&'a dyn Confirm>,
}

impl Step for CreateSuperuser<'_> {
    fn label(&self) -> &str {
        SUPERUSER_LABEL
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::WarnAndContinue
    }

    fn run(&self, ctx: &EnvContext) -> Result<StepReport, StepError> {
        let interactive = match self.confirm {
            Some(confirm) => {
                let accepted = confirm
                    .confirm("Create an administrative user now?")
                    .map_err(|err| StepError::SuperuserCreationFailure(chain(&err)))?;
                if !accepted {
                    return Ok(StepReport::declined("operator declined"));
                }
                true
            }
            None => false,
        };
        self.app
            .run(AppCommand::CreateSuperuser { interactive }, ctx)
            .map_err(|err| StepError::SuperuserCreationFailure(chain(&err)))?;
        Ok(StepReport::completed("superuser created"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Completion;
    use crate::io::confirm::{AlwaysNo, AlwaysYes};
    use crate::test_support::ScriptedApp;

    #[test]
    fn migrations_run_compute_then_apply() {
        let app = ScriptedApp::succeeding();
        ApplyMigrations { app: &app }
            .run(&EnvContext::new())
            .expect("run");
        assert_eq!(
            app.calls(),
            vec![AppCommand::MakeMigrations, AppCommand::Migrate]
        );
    }

    #[test]
    fn compute_failure_never_applies() {
        let app = ScriptedApp::failing_on(AppCommand::MakeMigrations);
        let err = ApplyMigrations { app: &app }
            .run(&EnvContext::new())
            .expect_err("compute fails");
        assert!(matches!(err, StepError::MigrationComputeFailure(_)));
        assert_eq!(app.calls(), vec![AppCommand::MakeMigrations]);
    }

    #[test]
    fn apply_failure_is_distinct() {
        let app = ScriptedApp::failing_on(AppCommand::Migrate);
        let err = ApplyMigrations { app: &app }
            .run(&EnvContext::new())
            .expect_err("apply fails");
        assert!(matches!(err, StepError::MigrationApplyFailure(_)));
    }

    #[test]
    fn static_failure_maps_to_static_error() {
        let app = ScriptedApp::failing_on(AppCommand::CollectStatic);
        let err = CollectStatic { app: &app }
            .run(&EnvContext::new())
            .expect_err("collect fails");
        assert!(matches!(err, StepError::StaticCollectionFailure(_)));
    }

    #[test]
    fn install_failure_maps_to_dependency_error() {
        let app = ScriptedApp::failing_on(AppCommand::InstallDependencies);
        let err = InstallDependencies { app: &app }
            .run(&EnvContext::new())
            .expect_err("install fails");
        assert!(matches!(err, StepError::DependencyInstallFailure(_)));
    }

    #[test]
    fn automated_superuser_runs_non_interactive() {
        let app = ScriptedApp::succeeding();
        CreateSuperuser {
            app: &app,
            confirm: None,
        }
        .run(&EnvContext::new())
        .expect("run");
        assert_eq!(
            app.calls(),
            vec![AppCommand::CreateSuperuser { interactive: false }]
        );
    }

    #[test]
    fn declined_superuser_never_calls_app() {
        let app = ScriptedApp::succeeding();
        let report = CreateSuperuser {
            app: &app,
            confirm: Some(&AlwaysNo),
        }
        .run(&EnvContext::new())
        .expect("run");
        assert_eq!(report.completion, Completion::Declined);
        assert!(app.calls().is_empty());
    }

    #[test]
    fn accepted_superuser_runs_interactive() {
        let app = ScriptedApp::succeeding();
        CreateSuperuser {
            app: &app,
            confirm: Some(&AlwaysYes),
        }
        .run(&EnvContext::new())
        .expect("run");
        assert_eq!(
            app.calls(),
            vec![AppCommand::CreateSuperuser { interactive: true }]
        );
    }
}
