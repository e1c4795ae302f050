use crate::core::context::EnvContext;
use crate::core::error::{StepError, chain};
use crate::core::secret::generate_secret_key;
use crate::core::sequencer::Step;
use crate::core::types::{FailurePolicy, StepReport};
use crate::io::confirm::Confirm;

pub const LABEL: &str = "ensure secret key";

/// Generates the application secret key when the context lacks one.
///
/// The key is exported into the context and surfaced as a notice; persisting
/// it is left to the operator.
pub struct EnsureSecretKey<'a> {
    pub env_var: String,
    pub length: usize,
    /// Asked before generating; `None` generates without asking.
    pub confirm: Option<&'a dyn Confirm>,
}

impl Step for EnsureSecretKey<'_> {
    fn label(&self) -> &str {
        LABEL
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    fn run(&self, ctx: &EnvContext) -> Result<StepReport, StepError> {
        if ctx.contains(&self.env_var) {
            return Ok(StepReport::completed(format!(
                "{} already configured",
                self.env_var
            )));
        }

        if let Some(confirm) = self.confirm {
            let question = format!("{} is not set. Generate one now?", self.env_var);
            let accepted = confirm
                .confirm(&question)
                .map_err(|err| StepError::SecretPrompt(chain(&err)))?;
            if !accepted {
                return Ok(StepReport::declined(format!(
                    "operator declined; set {} before serving",
                    self.env_var
                )));
            }
        }

        let key = generate_secret_key(self.length);
        let notice = format!(
            "Generated {var}. Add this line to your .env (it is not saved automatically):\n{var}={key}",
            var = self.env_var
        );
        Ok(StepReport::completed(format!("generated new {}", self.env_var))
            .with_notice(notice)
            .with_export(self.env_var.clone(), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::confirm::{AlwaysNo, AlwaysYes};

    fn step(confirm: Option<&dyn Confirm>) -> EnsureSecretKey<'_> {
        EnsureSecretKey {
            env_var: "SECRET_KEY".to_string(),
            length: 50,
            confirm,
        }
    }

    #[test]
    fn generates_and_exports_when_absent() {
        let report = step(None).run(&EnvContext::new()).expect("run");
        assert_eq!(report.detail, "generated new SECRET_KEY");
        let (key, value) = &report.exports[0];
        assert_eq!(key, "SECRET_KEY");
        assert_eq!(value.len(), 50);
        assert!(report.notice.expect("notice").contains(value.as_str()));
    }

    #[test]
    fn second_run_with_persisted_context_is_noop() {
        let step = step(None);
        let first = step.run(&EnvContext::new()).expect("first");
        let persisted = EnvContext::new().with_exports(&first.exports);

        let second = step.run(&persisted).expect("second");

        assert_eq!(second.detail, "SECRET_KEY already configured");
        assert!(second.exports.is_empty());
        assert!(second.notice.is_none());
    }

    #[test]
    fn confirmed_prompt_generates() {
        let report = step(Some(&AlwaysYes)).run(&EnvContext::new()).expect("run");
        assert_eq!(report.exports.len(), 1);
    }

    #[test]
    fn declined_prompt_skips_generation() {
        let report = step(Some(&AlwaysNo)).run(&EnvContext::new()).expect("run");
        assert_eq!(
            report.completion,
            crate::core::types::Completion::Declined
        );
        assert!(report.exports.is_empty());
    }

    #[test]
    fn present_key_never_prompts() {
        let ctx: EnvContext = [("SECRET_KEY", "existing")].into_iter().collect();
        let report = step(Some(&AlwaysNo)).run(&ctx).expect("run");
        assert_eq!(report.detail, "SECRET_KEY already configured");
    }
}
