use chrono::NaiveDate;
use pmax_core::ConfigError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Collection failed or produced nothing usable. Fatal before any write.
    #[error("upstream data unavailable: {0}")]
    UpstreamData(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A metric or spend row that was skipped. Non-fatal; counted in the run summary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub identity: Option<String>,
    pub campaign_name: String,
    pub date: Option<NaiveDate>,
    pub reason: String,
}

impl ValidationIssue {
    pub(crate) fn new(
        identity: Option<String>,
        campaign_name: &str,
        date: Option<NaiveDate>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            campaign_name: campaign_name.to_string(),
            date,
            reason: reason.into(),
        }
    }
}
