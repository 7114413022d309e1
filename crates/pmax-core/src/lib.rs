//! Shared domain types and configuration for the seasonal performance
//! review engine.

pub mod app_config;
pub mod budget;
pub mod campaigns;
pub mod config;
pub mod copy;
pub mod images;
pub mod metrics;
pub mod season;
pub mod thresholds;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use budget::{BudgetAction, CampaignBudgetRecord, CampaignSpend};
pub use campaigns::{load_campaigns, CampaignConfig, CampaignsFile, ImageProfiles};
pub use config::{load_app_config, load_app_config_from_env, load_engine_config, EngineConfig};
pub use copy::{GenerationRequest, GenerationTarget, ReplacementCopy};
pub use images::{
    AdAssetMapping, CampaignImageProfile, ContentCategory, ImagePerformance, ImageRegistryEntry,
    ImageSlot, ProfileKind,
};
pub use metrics::{
    asset_identity, ctr_percent, AssetMetricRecord, AssetStatus, AssetType, DailyMetricRow,
    GraveyardEntry,
};
pub use season::{resolve_season, Season, SeasonContext, SeasonMode};
pub use thresholds::{
    load_thresholds, AlertPolicy, BudgetPolicy, GapPolicy, SeasonBudget, SeasonTable,
    SeasonThresholds, TextCtrFloors, ThresholdsConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read config file {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },
}
