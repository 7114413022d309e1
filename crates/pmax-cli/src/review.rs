//! `pmax review`: the weekly run.
//!
//! Order matters: the snapshot is read and validated before any write, so an
//! upstream failure aborts with a critical alert and leaves storage untouched.

use std::collections::HashMap;
use std::path::Path;

use chrono::Duration;
use pmax_core::{AppConfig, AssetStatus, EngineConfig, SeasonContext};
use pmax_db::FlagAnnotation;
use pmax_engine::{
    run_review, upstream_failure, EngineError, FlaggedAsset, GenerationResult, ReviewInput,
    ReviewOutput,
};
use pmax_relay::render::render_review;
use pmax_relay::{Notification, WebhookNotifier};
use serde::Serialize;

use crate::snapshot::read_snapshot;
use crate::{
    build_generator, build_notifier, connect, fail_run_best_effort, notify_best_effort, today,
    ReviewArgs,
};

/// Row shape handed to the spreadsheet-export collaborator.
#[derive(Debug, Serialize)]
pub(crate) struct ExportRow<'a> {
    pub campaign_name: &'a str,
    pub asset_type: &'a str,
    pub asset_identity: &'a str,
    pub original_copy: Option<&'a str>,
    pub ctr: f64,
    pub impressions: i64,
    pub kill_reason: &'a str,
    pub diagnosis: &'a str,
    pub replacement: Option<&'a str>,
    pub replacement_unavailable: bool,
}

pub(crate) fn export_rows(output: &ReviewOutput) -> Vec<ExportRow<'_>> {
    output
        .export_rows()
        .map(|f| ExportRow {
            campaign_name: &f.record.campaign_name,
            asset_type: f.record.asset_type.as_str(),
            asset_identity: &f.record.identity,
            original_copy: f.record.asset_text.as_deref(),
            ctr: f.record.ctr,
            impressions: f.record.impressions,
            kill_reason: &f.reason,
            diagnosis: &f.diagnosis,
            replacement: f.replacement.as_ref().map(|r| r.text.as_str()),
            replacement_unavailable: f.replacement_unavailable,
        })
        .collect()
}

fn annotation(flag: Option<&FlaggedAsset>) -> FlagAnnotation {
    flag.map_or_else(FlagAnnotation::default, |f| FlagAnnotation {
        kill_reason: Some(f.reason.clone()),
        diagnosis: Some(f.diagnosis.clone()),
        replacement_text: f.replacement.as_ref().map(|r| r.text.clone()),
        replacement_unavailable: f.replacement_unavailable,
    })
}

async fn abort_upstream(notifier: Option<&WebhookNotifier>, err: &EngineError) {
    tracing::error!(error = %err, "aborting review before any write");
    let alert = upstream_failure(&err.to_string());
    notify_best_effort(notifier, &Notification::alert(&alert)).await;
}

async fn persist(pool: &sqlx::PgPool, output: &ReviewOutput) -> anyhow::Result<()> {
    let flags: HashMap<&str, &FlaggedAsset> = output
        .flagged
        .iter()
        .map(|f| (f.record.identity.as_str(), f))
        .collect();

    for record in &output.records {
        let flag = if record.status == AssetStatus::Flag {
            flags.get(record.identity.as_str()).copied()
        } else {
            None
        };
        pmax_db::upsert_asset_performance(pool, record, &annotation(flag)).await?;
    }
    for budget in &output.budgets {
        pmax_db::upsert_budget_record(pool, budget).await?;
    }
    let mut buried = 0usize;
    for entry in output.graveyard_entries() {
        if pmax_db::insert_graveyard_entry(pool, &entry).await? {
            buried += 1;
        }
    }

    tracing::info!(
        records = output.records.len(),
        budgets = output.budgets.len(),
        graveyard = buried,
        "review persisted"
    );
    Ok(())
}

fn write_export(dir: &Path, output: &ReviewOutput) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("flagged-copy-{}.json", output.window.end));
    let body = serde_json::to_string_pretty(&export_rows(output))?;
    std::fs::write(&path, body)?;
    tracing::info!(path = %path.display(), "flagged copy exported");
    Ok(())
}

/// Request replacement copy and attach it. Runs even with nothing to
/// request so copy-less text flags are still marked unavailable.
async fn generate(
    config: &AppConfig,
    output: &mut ReviewOutput,
    input: &ReviewInput,
) -> anyhow::Result<()> {
    let requests = output.generation_requests(&input.graveyard);
    let result = if requests.is_empty() {
        GenerationResult::default()
    } else {
        match build_generator(config)? {
            Some(generator) => GenerationResult::from(generator.generate_all(&requests).await),
            None => GenerationResult::failed("copy generator not configured"),
        }
    };
    output.apply_generation(result);
    Ok(())
}

/// Prior-window records used for CTR-collapse comparison.
async fn load_prior(
    pool: &sqlx::PgPool,
    ctx: &SeasonContext,
) -> anyhow::Result<Vec<pmax_core::AssetMetricRecord>> {
    let earliest = ctx.date - Duration::days(i64::from(ctx.thresholds.lookback_days));
    Ok(pmax_db::fetch_prior_window(pool, ctx.date, earliest).await?)
}

pub(crate) async fn run(
    config: &AppConfig,
    engine: &EngineConfig,
    args: ReviewArgs,
) -> anyhow::Result<()> {
    let date = args.date.unwrap_or_else(today);
    let ctx = pmax_core::resolve_season(date, &engine.thresholds, args.preview);
    let notifier = build_notifier(config)?;
    tracing::info!(
        date = %date,
        season = %ctx.season,
        mode = %ctx.mode,
        preview = ctx.preview,
        "starting weekly review"
    );

    let snapshot = match read_snapshot(&args.snapshot) {
        Ok(s) => s,
        Err(e) => {
            abort_upstream(notifier.as_ref(), &e).await;
            return Err(e.into());
        }
    };

    let pool = connect(config).await?;
    let input = ReviewInput {
        rows: snapshot.rows,
        spends: snapshot.spends,
        prior_records: load_prior(&pool, &ctx).await?,
        graveyard: pmax_db::list_graveyard(&pool, None).await?,
    };

    let mut output = match run_review(&input, &ctx, engine, args.window_days) {
        Ok(o) => o,
        Err(e) => {
            if matches!(e, EngineError::UpstreamData(_)) {
                abort_upstream(notifier.as_ref(), &e).await;
            }
            return Err(e.into());
        }
    };

    generate(config, &mut output, &input).await?;

    if ctx.preview {
        tracing::info!("preview run: skipping persistence and export");
    } else {
        let run =
            pmax_db::create_review_run(&pool, output.window.end, ctx.season.key(), "cli").await?;
        if let Err(e) = pmax_db::start_review_run(&pool, run.id).await {
            fail_run_best_effort(&pool, run.id, format!("{e:#}")).await;
            return Err(e.into());
        }

        let persisted = async {
            persist(&pool, &output).await?;
            if let Some(dir) = &args.export_dir {
                if ctx.side_effects_enabled() {
                    write_export(dir, &output)?;
                }
            }
            anyhow::Ok(())
        }
        .await;

        if let Err(e) = persisted {
            fail_run_best_effort(&pool, run.id, format!("{e:#}")).await;
            return Err(e);
        }
        pmax_db::complete_review_run(&pool, run.id, &serde_json::to_value(&output.summary)?)
            .await?;
    }

    if let Some(path) = &args.out {
        std::fs::write(path, serde_json::to_string_pretty(&output)?)?;
    }

    let report = render_review(&output);
    notify_best_effort(notifier.as_ref(), &Notification::report(report.clone())).await;
    if let Some(notifier) = notifier.as_ref() {
        if let Err(e) = notifier.send_alerts(&output.alerts).await {
            tracing::error!(error = %e, "alert delivery failed");
        }
    }

    println!("{report}");
    Ok(())
}
