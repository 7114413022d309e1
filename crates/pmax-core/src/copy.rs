//! Payloads exchanged with the replacement-copy generation collaborator.

use serde::{Deserialize, Serialize};

use crate::metrics::{AssetType, GraveyardEntry};

/// One flagged text asset that needs new copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTarget {
    pub asset_identity: String,
    pub asset_type: AssetType,
    pub original_copy: String,
    pub kill_reason: String,
    /// Failure category such as `voice` or `angle`, with a short explanation.
    pub diagnosis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub campaign_name: String,
    pub targets: Vec<GenerationTarget>,
    /// Previously removed copy for the same campaign.
    pub graveyard: Vec<GraveyardEntry>,
}

/// Generated replacement for one flagged asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementCopy {
    pub asset_identity: String,
    pub text: String,
    #[serde(default)]
    pub rationale: Option<String>,
}
