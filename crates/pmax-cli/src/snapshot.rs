//! Collector snapshot files. A snapshot that cannot be read is upstream
//! failure, not a config problem.

use std::path::Path;

use pmax_core::{CampaignSpend, DailyMetricRow, ImageRegistryEntry};
use pmax_engine::{EngineError, LiveAsset};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Metric rows and spend rows delivered by the collectors for one run.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Snapshot {
    #[serde(default)]
    pub rows: Vec<DailyMetricRow>,
    #[serde(default)]
    pub spends: Vec<CampaignSpend>,
}

/// Assets currently serving, for verification.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LiveSnapshot {
    #[serde(default)]
    pub assets: Vec<LiveAsset>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        EngineError::UpstreamData(format!("cannot read {}: {e}", path.display()))
    })?;
    parse_json(&raw, path)
}

pub(crate) fn parse_json<T: DeserializeOwned>(raw: &str, path: &Path) -> Result<T, EngineError> {
    serde_json::from_str(raw).map_err(|e| {
        EngineError::UpstreamData(format!("cannot parse {}: {e}", path.display()))
    })
}

pub(crate) fn read_snapshot(path: &Path) -> Result<Snapshot, EngineError> {
    read_json(path)
}

pub(crate) fn read_live_snapshot(path: &Path) -> Result<LiveSnapshot, EngineError> {
    read_json(path)
}

/// Registry import file: a JSON array of analyzed images.
pub(crate) fn read_registry_file(path: &Path) -> anyhow::Result<Vec<ImageRegistryEntry>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
    let entries = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("cannot parse {}: {e}", path.display()))?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pmax_core::AssetType;

    use super::*;

    #[test]
    fn parses_rows_and_spends() {
        let raw = r#"{
            "rows": [{
                "asset_id": "h1",
                "asset_text": "Best Nets Ever",
                "asset_type": "HEADLINE",
                "campaign_name": "Core Brand",
                "date": "2026-06-05",
                "impressions": 1000,
                "clicks": 15,
                "cost": "12.50",
                "conversions": "0"
            }],
            "spends": [{
                "campaign_name": "Core Brand",
                "week_ending": "2026-06-07",
                "spend": "700",
                "revenue": "900",
                "current_daily_budget": "100"
            }]
        }"#;
        let snapshot: Snapshot = parse_json(raw, &PathBuf::from("snap.json")).unwrap();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].asset_type, AssetType::Headline);
        assert_eq!(snapshot.spends[0].days_in_period, 7);
    }

    #[test]
    fn malformed_snapshot_is_upstream_failure() {
        let err = parse_json::<Snapshot>("{ not json", &PathBuf::from("snap.json")).unwrap_err();
        assert!(matches!(err, EngineError::UpstreamData(_)));
    }

    #[test]
    fn missing_snapshot_is_upstream_failure() {
        let err = read_snapshot(&PathBuf::from("/nonexistent/pmax-snapshot.json")).unwrap_err();
        assert!(matches!(err, EngineError::UpstreamData(msg) if msg.contains("cannot read")));
    }
}
