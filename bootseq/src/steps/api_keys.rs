use crate::core::context::EnvContext;
use crate::core::error::StepError;
use crate::core::sequencer::Step;
use crate::core::types::{FailurePolicy, StepReport};

pub const LABEL: &str = "report api keys";

/// Provider name and the variable the application reads its key from.
pub const PROVIDERS: &[(&str, &str)] = &[
    ("gemini", "GEMINI_API_KEY"),
    ("alpha_vantage", "ALPHA_VANTAGE_API_KEY"),
    ("finnhub", "FINNHUB_API_KEY"),
    ("polygon", "POLYGON_API_KEY"),
    ("twelve_data", "TWELVE_DATA_API_KEY"),
    ("newsapi", "NEWSAPI_KEY"),
    ("twitter", "TWITTER_BEARER_TOKEN"),
    ("rapidapi", "RAPIDAPI_KEY"),
];

/// Reports which data providers have keys. Names only, never values.
pub struct ReportApiKeys;

pub fn available_providers(ctx: &EnvContext) -> Vec<&'static str> {
    PROVIDERS
        .iter()
        .filter(|(_, var)| ctx.contains(var))
        .map(|(name, _)| *name)
        .collect()
}

impl Step for ReportApiKeys {
    fn label(&self) -> &str {
        LABEL
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::WarnAndContinue
    }

    fn run(&self, ctx: &EnvContext) -> Result<StepReport, StepError> {
        let available = available_providers(ctx);
        if available.is_empty() {
            return Err(StepError::NoApiKeys);
        }
        Ok(StepReport::completed(format!(
            "available: {}",
            available.join(", ")
        )))
    }
}
