//! Offline unit tests for pmax-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use pmax_core::{AppConfig, AssetStatus, AssetType, ContentCategory, Environment};
use pmax_db::{AssetPerformanceRow, DbError, ImageRegistryRow, PoolConfig};
use rust_decimal::Decimal;
use sqlx::types::Json;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        thresholds_path: PathBuf::from("./config/thresholds.yaml"),
        campaigns_path: PathBuf::from("./config/campaigns.yaml"),
        notify_webhook_url: None,
        generator_url: None,
        generator_api_key: None,
        relay_timeout_secs: 30,
        relay_max_retries: 2,
        relay_backoff_base_ms: 1000,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

fn asset_row(asset_type: &str, status: &str) -> AssetPerformanceRow {
    AssetPerformanceRow {
        id: 1,
        identity: "h1".to_string(),
        window_end: NaiveDate::from_ymd_opt(2026, 6, 7).unwrap(),
        campaign_name: "Core Brand".to_string(),
        asset_type: asset_type.to_string(),
        asset_text: Some("Best Nets Ever".to_string()),
        impressions: 1000,
        clicks: 15,
        cost: Decimal::new(1250, 2),
        conversions: Decimal::ZERO,
        ctr: 1.5,
        status: status.to_string(),
        kill_reason: Some("CTR 1.50% < 4.00%".to_string()),
        diagnosis: None,
        replacement_text: None,
        replacement_unavailable: false,
        verification_status: None,
        verified_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn asset_row_converts_to_record() {
    let record = asset_row("HEADLINE", "FLAG").into_record().unwrap();
    assert_eq!(record.asset_type, AssetType::Headline);
    assert_eq!(record.status, AssetStatus::Flag);
    assert_eq!(record.impressions, 1000);
    assert!((record.ctr - 1.5).abs() < f64::EPSILON);
}

#[test]
fn asset_row_with_unknown_status_is_rejected() {
    let err = asset_row("HEADLINE", "RETIRED").into_record().unwrap_err();
    assert!(matches!(err, DbError::InvalidValue(_)));
}

#[test]
fn image_row_converts_to_entry() {
    let row = ImageRegistryRow {
        image_id: "img-001".to_string(),
        content_category: "product_hero".to_string(),
        eligible_slots: Json(Vec::new()),
        mappings: Json(Vec::new()),
        performance: Json(BTreeMap::new()),
        description: Some("Net on a driveway hoop".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let entry = row.into_entry().unwrap();
    assert_eq!(entry.content_category, ContentCategory::ProductHero);
    assert!(entry.is_available());
}
