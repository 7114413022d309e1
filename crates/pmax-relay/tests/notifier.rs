//! Integration tests for `WebhookNotifier` and report rendering.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pmax_core::{
    resolve_season, AssetType, CampaignConfig, CampaignSpend, CampaignsFile, ContentCategory,
    DailyMetricRow, EngineConfig, ImageProfiles, ProfileKind, ThresholdsConfig,
};
use pmax_engine::{run_review, upstream_failure, ReviewInput};
use pmax_relay::render::render_review;
use pmax_relay::{Notification, RelayConfig, RelayError, WebhookNotifier};
use rust_decimal::Decimal;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> RelayConfig {
    RelayConfig {
        timeout_secs: 5,
        max_retries: 2,
        backoff_base_ms: 0,
    }
}

fn engine_config() -> EngineConfig {
    let profile = BTreeMap::from([
        (ContentCategory::ProductHero, 20.0),
        (ContentCategory::ProductInUse, 30.0),
        (ContentCategory::LifestyleWithProduct, 30.0),
        (ContentCategory::LifestyleNoProduct, 10.0),
        (ContentCategory::ProductDetail, 10.0),
    ]);
    EngineConfig {
        thresholds: ThresholdsConfig::default(),
        campaigns: CampaignsFile {
            campaigns: vec![CampaignConfig {
                name: "Core Brand".to_string(),
                campaign_id: None,
                asset_group: None,
                image_profile: ProfileKind::CoreBrand,
                notes: None,
            }],
            image_profiles: ImageProfiles {
                core_brand: profile.clone(),
                replacement_net: profile,
            },
        },
    }
}

fn review_input() -> ReviewInput {
    ReviewInput {
        rows: vec![DailyMetricRow {
            asset_id: Some("h1".to_string()),
            asset_resource: None,
            asset_text: Some("Best Nets Ever".to_string()),
            asset_type: AssetType::Headline,
            campaign_name: "Core Brand".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 6, 5).unwrap(),
            impressions: 1000,
            clicks: 10,
            cost: Decimal::from(5),
            conversions: Decimal::ZERO,
        }],
        spends: vec![CampaignSpend {
            campaign_name: "Core Brand".to_string(),
            week_ending: NaiveDate::from_ymd_opt(2026, 6, 7).unwrap(),
            spend: Decimal::from(200),
            revenue: Decimal::from(250),
            current_daily_budget: Decimal::from(100),
            days_in_period: 7,
        }],
        ..ReviewInput::default()
    }
}

#[tokio::test]
async fn send_posts_text_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(serde_json::json!({ "text": "hello" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&format!("{}/hook", server.uri()), fast_config()).unwrap();
    notifier
        .send(&Notification::report("hello".to_string()))
        .await
        .expect("delivery should succeed");
}

#[tokio::test]
async fn send_retries_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&server.uri(), fast_config()).unwrap();
    notifier
        .send(&Notification::report("retry me".to_string()))
        .await
        .expect("third attempt should succeed");
}

#[tokio::test]
async fn send_surfaces_failure_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&server.uri(), fast_config()).unwrap();
    let err = notifier
        .send(&Notification::report("lost".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Status { status: 502, .. }));
}

#[tokio::test]
async fn alert_notification_carries_severity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "severity": "CRITICAL" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&server.uri(), fast_config()).unwrap();
    notifier
        .send_alerts(&[upstream_failure("collector timed out")])
        .await
        .unwrap();
}

#[test]
fn review_report_includes_flags_and_budget() {
    let date = NaiveDate::from_ymd_opt(2026, 6, 7).unwrap();
    let ctx = resolve_season(date, &ThresholdsConfig::default(), false);
    let output = run_review(&review_input(), &ctx, &engine_config(), 7).unwrap();
    let text = render_review(&output);

    assert!(text.starts_with("*Weekly PMax Review: Peak (active)*"));
    assert!(text.contains("Window 2026-06-01 to 2026-06-07"));
    assert!(text.contains("CTR 1.00% < 4.00%"));
    assert!(text.contains("- Core Brand: DECREASE"));
    assert!(!text.contains("PREVIEW"));
}

#[test]
fn preview_report_is_labeled() {
    let date = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
    let ctx = resolve_season(date, &ThresholdsConfig::default(), true);
    let mut input = review_input();
    for row in &mut input.rows {
        row.date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    }
    let output = run_review(&input, &ctx, &engine_config(), 7).unwrap();
    let text = render_review(&output);

    assert!(text.starts_with("*Weekly PMax Review: PREVIEW Deep Winter"));
    assert!(text.contains("PREVIEW: nothing was written"));
}
