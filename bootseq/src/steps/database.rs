use crate::core::context::EnvContext;
use crate::core::error::StepError;
use crate::core::sequencer::Step;
use crate::core::types::{FailurePolicy, StepReport};
use crate::io::probe::{Endpoint, PollPolicy, Probe, Sleeper, wait_for_endpoint};

pub const LABEL: &str = "wait for database";

pub const HOST_VAR: &str = "DB_HOST";
pub const PORT_VAR: &str = "DB_PORT";

/// Blocks until the database port accepts connections or the attempt bound is hit.
pub struct WaitForDatabase<'a> {
    /// Endpoint used when `DB_HOST` / `DB_PORT` are absent from the context.
    pub fallback: Endpoint,
    pub policy: PollPolicy,
    pub probe: &'a dyn Probe,
    pub sleeper: &'a dyn Sleeper,
}

impl WaitForDatabase<'_> {
    fn endpoint(&self, ctx: &EnvContext) -> Result<Endpoint, StepError> {
        let host = ctx.get(HOST_VAR).unwrap_or(self.fallback.host.as_str()).to_string();
        let port = match ctx.get(PORT_VAR) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|err| StepError::InvalidSetting {
                key: PORT_VAR.to_string(),
                reason: format!("{raw:?}: {err}"),
            })?,
            None => self.fallback.port,
        };
        Ok(Endpoint { host, port })
    }
}

impl Step for WaitForDatabase<'_> {
    fn label(&self) -> &str {
        LABEL
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    fn run(&self, ctx: &EnvContext) -> Result<StepReport, StepError> {
        let endpoint = self.endpoint(ctx)?;
        let attempt = wait_for_endpoint(self.probe, self.sleeper, &endpoint, self.policy)?;
        Ok(StepReport::completed(format!(
            "{endpoint} reachable after {attempt} attempt(s)"
        ))
        .with_attempts(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSleeper, ScriptedProbe};

    fn step<'a>(probe: &'a ScriptedProbe, sleeper: &'a RecordingSleeper) -> WaitForDatabase<'a> {
        WaitForDatabase {
            fallback: Endpoint::new("db", 5432),
            policy: PollPolicy::default(),
            probe,
            sleeper,
        }
    }

    #[test]
    fn context_overrides_fallback_endpoint() {
        let probe = ScriptedProbe::open_on(1);
        let sleeper = RecordingSleeper::default();
        let ctx: EnvContext = [(HOST_VAR, "postgres"), (PORT_VAR, "6543")]
            .into_iter()
            .collect();

        let report = step(&probe, &sleeper).run(&ctx).expect("run");

        assert_eq!(report.detail, "postgres:6543 reachable after 1 attempt(s)");
        assert_eq!(probe.endpoints(), vec![Endpoint::new("postgres", 6543)]);
    }

    #[test]
    fn invalid_port_fails_without_probing() {
        let probe = ScriptedProbe::open_on(1);
        let sleeper = RecordingSleeper::default();
        let ctx: EnvContext = [(PORT_VAR, "five")].into_iter().collect();

        let err = step(&probe, &sleeper).run(&ctx).expect_err("invalid");

        assert!(matches!(err, StepError::InvalidSetting { .. }));
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    fn records_attempt_count() {
        let probe = ScriptedProbe::open_on(4);
        let sleeper = RecordingSleeper::default();
        let report = step(&probe, &sleeper).run(&EnvContext::new()).expect("run");
        assert_eq!(report.attempts, Some(4));
    }
}
