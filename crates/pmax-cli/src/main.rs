mod budget;
mod images;
mod review;
mod snapshot;
mod verify;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use pmax_core::{AppConfig, EngineConfig};
use pmax_relay::{HttpCopyGenerator, RelayConfig, WebhookNotifier};
use tracing_subscriber::EnvFilter;

use crate::images::ImagesCommands;

#[derive(Debug, Parser)]
#[command(name = "pmax")]
#[command(about = "Weekly seasonal performance review for PMax campaigns")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database utilities
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Print the season, mode and thresholds in force on a date
    Season {
        /// Run date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Run the weekly review over a collected snapshot
    Review(ReviewArgs),
    /// Check whether last week's flags were acted on
    Verify {
        /// Live-asset snapshot from the collector (JSON)
        #[arg(long)]
        live: std::path::PathBuf,

        /// Run date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show recent weekly budget decisions for one campaign
    Budget {
        /// Campaign slug from campaigns.yaml
        #[arg(long)]
        campaign: String,

        /// Number of most recent weeks to show
        #[arg(long, default_value_t = 8)]
        weeks: i64,
    },
    /// Image registry and mix analysis
    Images {
        #[command(subcommand)]
        command: ImagesCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[derive(Debug, Args)]
pub(crate) struct ReviewArgs {
    /// Collected metric and spend snapshot (JSON)
    #[arg(long)]
    pub snapshot: std::path::PathBuf,

    /// Report window end date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Classify regardless of season without writing, generating or exporting
    #[arg(long)]
    pub preview: bool,

    /// Write the full review output as JSON
    #[arg(long)]
    pub out: Option<std::path::PathBuf>,

    /// Directory for the flagged-copy export file
    #[arg(long)]
    pub export_dir: Option<std::path::PathBuf>,

    /// Days in the report window
    #[arg(long, default_value_t = pmax_engine::DEFAULT_WINDOW_DAYS)]
    pub window_days: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("pmax: no command given; see --help");
        return Ok(());
    };

    let config = pmax_core::load_app_config()?;
    init_tracing(&config);
    tracing::debug!(env = %config.env, "configuration loaded");

    match command {
        Commands::Db { command } => run_db(&config, command).await?,
        Commands::Season { date } => {
            let engine = pmax_core::load_engine_config(&config)?;
            print_season(&engine, date.unwrap_or_else(today));
        }
        Commands::Review(args) => {
            let engine = pmax_core::load_engine_config(&config)?;
            review::run(&config, &engine, args).await?;
        }
        Commands::Verify { live, date } => {
            verify::run(&config, &live, date.unwrap_or_else(today)).await?;
        }
        Commands::Budget { campaign, weeks } => {
            let engine = pmax_core::load_engine_config(&config)?;
            budget::run(&config, &engine, &campaign, weeks).await?;
        }
        Commands::Images { command } => {
            let engine = pmax_core::load_engine_config(&config)?;
            images::run(&config, &engine, command).await?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over `PMAX_LOG_LEVEL` when both are set.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

async fn run_db(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    match command {
        DbCommands::Ping => {
            pmax_db::health_check(&pool).await?;
            println!("database reachable");
        }
        DbCommands::Migrate => {
            let applied = pmax_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

fn print_season(engine: &EngineConfig, date: NaiveDate) {
    let ctx = pmax_core::resolve_season(date, &engine.thresholds, false);
    println!("{date}: {}", ctx.label());
    println!("  min impressions: {}", ctx.thresholds.min_impressions);
    println!(
        "  CTR floors: headline {:.1}%, long headline {:.1}%, description {:.1}%, image {:.1}%",
        ctx.thresholds.min_ctr.headline,
        ctx.thresholds.min_ctr.long_headline,
        ctx.thresholds.min_ctr.description,
        ctx.image_min_ctr
    );
    println!("  lookback: {} days", ctx.thresholds.lookback_days);
    println!("  target ROAS: {:.2}x", ctx.target_roas);
    println!(
        "  budget baseline: ${}/day (max ${}/day)",
        ctx.budget_baseline.recommended_daily, ctx.budget_baseline.max_daily
    );
}

pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool = pmax_db::connect_pool(
        &config.database_url,
        pmax_db::PoolConfig::from_app_config(config),
    )
    .await?;
    Ok(pool)
}

pub(crate) fn build_notifier(config: &AppConfig) -> anyhow::Result<Option<WebhookNotifier>> {
    let relay = RelayConfig::from_app_config(config);
    Ok(config
        .notify_webhook_url
        .as_deref()
        .map(|url| WebhookNotifier::new(url, relay))
        .transpose()?)
}

pub(crate) fn build_generator(config: &AppConfig) -> anyhow::Result<Option<HttpCopyGenerator>> {
    let relay = RelayConfig::from_app_config(config);
    Ok(config
        .generator_url
        .as_deref()
        .map(|url| HttpCopyGenerator::new(url, config.generator_api_key.as_deref(), relay))
        .transpose()?)
}

/// Deliver a notification if a webhook is configured. Delivery failure is
/// logged, never fatal: the report is also printed to stdout.
pub(crate) async fn notify_best_effort(
    notifier: Option<&WebhookNotifier>,
    notification: &pmax_relay::Notification,
) {
    let Some(notifier) = notifier else {
        tracing::debug!("no notification webhook configured");
        return;
    };
    if let Err(e) = notifier.send(notification).await {
        tracing::error!(error = %e, "notification delivery failed");
    }
}

/// Attempts to mark a review run as failed, logging a warning if that also fails.
pub(crate) async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(e) = pmax_db::fail_review_run(pool, run_id, &message).await {
        tracing::warn!(run_id, error = %e, "failed to mark review run as failed");
    }
}

#[cfg(test)]
mod tests;
