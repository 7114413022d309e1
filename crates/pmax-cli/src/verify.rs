//! `pmax verify`: did last week's flags reach the ad platform?

use std::path::Path;

use chrono::NaiveDate;
use pmax_core::AppConfig;
use pmax_db::AssetPerformanceRow;
use pmax_engine::{compare, reconcile_registry, LiveAsset, PriorFlag};
use pmax_relay::render::render_verification;
use pmax_relay::Notification;

use crate::snapshot::read_live_snapshot;
use crate::{build_notifier, connect, notify_best_effort};

fn prior_flag(row: AssetPerformanceRow) -> anyhow::Result<PriorFlag> {
    Ok(PriorFlag {
        asset_type: row.asset_type.parse()?,
        identity: row.identity,
        window_end: row.window_end,
        campaign_name: row.campaign_name,
        asset_text: row.asset_text,
        replacement_text: row.replacement_text,
    })
}

/// Unlink registry mappings for images that are no longer live.
async fn reconcile_images(
    pool: &sqlx::PgPool,
    live: &[LiveAsset],
    date: NaiveDate,
) -> anyhow::Result<usize> {
    let registry = pmax_db::list_images(pool).await?;
    let changed = reconcile_registry(&registry, live, date);
    for entry in &changed {
        pmax_db::update_image_mappings(pool, &entry.image_id, &entry.mappings).await?;
    }
    Ok(changed.len())
}

pub(crate) async fn run(config: &AppConfig, live: &Path, date: NaiveDate) -> anyhow::Result<()> {
    let notifier = build_notifier(config)?;
    let snapshot = read_live_snapshot(live)?;

    let pool = connect(config).await?;
    let reconciled = reconcile_images(&pool, &snapshot.assets, date).await?;
    if reconciled > 0 {
        println!("unlinked stale mappings on {reconciled} registry image(s)");
    }

    let prior = pmax_db::list_flags_for_verification(&pool, date)
        .await?
        .into_iter()
        .map(prior_flag)
        .collect::<anyhow::Result<Vec<_>>>()?;

    if prior.is_empty() {
        println!("no prior flags to verify before {date}");
        return Ok(());
    }

    let report = compare(&prior, &snapshot.assets);
    for outcome in &report.outcomes {
        pmax_db::set_verification_status(
            &pool,
            &outcome.identity,
            outcome.window_end,
            outcome.status.as_str(),
        )
        .await?;
    }
    tracing::info!(
        flags = report.outcomes.len(),
        all_applied = report.all_applied(),
        reconciled,
        "verification statuses written"
    );

    let text = render_verification(&report);
    notify_best_effort(notifier.as_ref(), &Notification::report(text.clone())).await;
    println!("{text}");
    Ok(())
}
