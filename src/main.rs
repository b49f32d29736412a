//! Sungai Watch - water-quality anomaly monitor
//!
//! Command-line front end over the classification service.
//!
//! # Usage
//!
//! ```bash
//! # Anomalies at one river, pH only, second page
//! sungai-watch anomalies --location "Sungai Brantas" --category ph --page 2
//!
//! # Statistics and a chart window for one location
//! sungai-watch stats --location-id 3 --parameter temperature
//!
//! # Correct a misread sample and reclassify it
//! sungai-watch correct 42 --ph 7.1 --temperature 26.5 --turbidity 12
//!
//! # Refresh every 30 seconds until Ctrl+C
//! sungai-watch watch --interval 30
//! ```
//!
//! # Environment Variables
//!
//! - `SUNGAI_CONFIG`: Path to the TOML config (default: ./sungai_watch.toml)
//! - `SUNGAI_API_URL`: Override `api.base_url`
//! - `RUST_LOG`: Logging level (default: info)

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use sungai_watch::collection::{AnomalyCollection, Category, LocationFilter};
use sungai_watch::config::{self, MonitorConfig};
use sungai_watch::reclassify::{CorrectionOutcome, ReclassificationCoordinator};
use sungai_watch::types::{CorrectionValues, DisplayRange, Parameter};
use sungai_watch::{series, watch, ClassificationApi, HttpClassificationClient, RecordNormalizer};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sungai-watch")]
#[command(about = "Water-quality anomaly monitor")]
#[command(version)]
struct CliArgs {
    /// Config file (overrides SUNGAI_CONFIG and ./sungai_watch.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Classification service root URL
    #[arg(long, global = true, env = "SUNGAI_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// List anomalous records for a location and category
    Anomalies {
        /// Location name, or "all"
        #[arg(long)]
        location: Option<String>,
        /// all, turbidity, ph or temperature
        #[arg(long, default_value = "all")]
        category: Category,
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Summary statistics and one chart window of recent samples
    Stats {
        /// Restrict to one location id
        #[arg(long)]
        location_id: Option<String>,
        /// Parameter plotted in the chart window
        #[arg(long, default_value = "pH")]
        parameter: Parameter,
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Submit corrected values for a record and reclassify it
    Correct {
        id: String,
        #[arg(long)]
        ph: f64,
        #[arg(long)]
        temperature: f64,
        #[arg(long)]
        turbidity: f64,
    },

    /// Delete a classification record
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Refetch the anomaly list periodically until Ctrl+C
    Watch {
        /// Seconds between refreshes
        #[arg(long, default_value = "60")]
        interval: u64,
    },

    /// Print the effective configuration as TOML
    Config,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut monitor_config = match &args.config {
        Some(path) => MonitorConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => MonitorConfig::load(),
    };
    if let Some(url) = args.api_url {
        monitor_config.api.base_url = url;
        monitor_config.validate().context("invalid --api-url")?;
    }
    config::init(monitor_config);
    let cfg = config::get();

    if let SubCommand::Config = args.command {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    let client = Arc::new(
        HttpClassificationClient::new(&cfg.api.base_url, cfg.request_timeout())
            .context("building classification client")?,
    );
    info!(base_url = %client.base_url(), timeout_secs = cfg.api.timeout_secs, "Classification service");

    let store = Arc::new(RwLock::new(AnomalyCollection::new(cfg.view.page_size)));
    let normalizer = RecordNormalizer::from_registry(cfg.thresholds.to_registry());
    let coordinator = ReclassificationCoordinator::new(Arc::clone(&client), store, normalizer)
        .with_timeout(cfg.request_timeout());

    match args.command {
        SubCommand::Anomalies {
            location,
            category,
            page,
        } => run_anomalies(&coordinator, cfg, location, category, page).await,
        SubCommand::Stats {
            location_id,
            parameter,
            page,
        } => run_stats(client.as_ref(), cfg, location_id.as_deref(), parameter, page).await,
        SubCommand::Correct {
            id,
            ph,
            temperature,
            turbidity,
        } => {
            let values = CorrectionValues {
                ph,
                temperature,
                turbidity,
            };
            run_correct(&coordinator, &id, values).await
        }
        SubCommand::Delete { id, yes } => run_delete(&coordinator, &id, yes).await,
        SubCommand::Watch { interval } => {
            if interval == 0 {
                bail!("--interval must be > 0");
            }
            let cancel_token = CancellationToken::new();
            let shutdown_token = cancel_token.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Received Ctrl+C, stopping watch");
                shutdown_token.cancel();
            });

            let summary =
                watch::run_watch(&coordinator, Duration::from_secs(interval), cancel_token).await;
            println!(
                "{} cycles, {} failed, last anomaly count: {}",
                summary.cycles,
                summary.failures,
                summary
                    .last_count
                    .map_or_else(|| "-".to_string(), |n| n.to_string())
            );
            Ok(())
        }
        SubCommand::Config => Ok(()),
    }
}

// ============================================================================
// Subcommands
// ============================================================================

async fn run_anomalies<A: ClassificationApi>(
    coordinator: &ReclassificationCoordinator<A>,
    cfg: &MonitorConfig,
    location: Option<String>,
    category: Category,
    page: usize,
) -> Result<()> {
    coordinator.refresh().await.context("fetching classifications")?;

    let store = coordinator.store();
    let mut view = store.write().await;
    if let Some(label) = location {
        view.set_location(LocationFilter::from_label(&label, &cfg.view.all_locations_label));
    }
    view.set_category(category);
    view.set_page(page);

    println!("locations: {}", view.location_options(&cfg.view.all_locations_label).join(" | "));
    let rendered = view.page_view();
    let counts = &rendered.counts;
    println!(
        "{}: all {} | turbidity {} | pH {} | temperature {}",
        view.location().label(&cfg.view.all_locations_label),
        counts.all,
        counts.turbidity,
        counts.ph,
        counts.temperature
    );
    println!(
        "page {}/{} ({} matching)",
        rendered.page, rendered.total_pages, rendered.total_filtered
    );

    for record in &rendered.records {
        println!(
            "#{:<6} {} {} {:<24} [{}]",
            record.id,
            record.date,
            record.time,
            record.location_name,
            record.anomaly_types.join(", ")
        );
        for parameter in Parameter::ALL {
            let verdict = record.verdict(parameter);
            if verdict.is_anomaly {
                println!(
                    "         {:<12} {} (normal {})",
                    parameter,
                    verdict.message,
                    DisplayRange::for_parameter(parameter).text()
                );
            }
        }
        if let Some(label) = &record.classification {
            println!("         classification: {label}");
        }
    }
    if rendered.records.is_empty() {
        println!("no anomalies on this page");
    }
    Ok(())
}

async fn run_stats<A: ClassificationApi>(
    api: &A,
    cfg: &MonitorConfig,
    location_id: Option<&str>,
    parameter: Parameter,
    page: usize,
) -> Result<()> {
    let samples = api
        .fetch_samples(location_id, cfg.api.sample_limit)
        .await
        .context("fetching samples")?;

    for summary in series::summarize_all(&samples) {
        println!(
            "{:<12} min {:>8} max {:>8} avg {:>8} ({} readings)",
            summary.parameter, summary.min, summary.max, summary.avg, summary.count
        );
    }

    if let Some(sample) = series::latest(&samples) {
        println!("latest sample: {}", sample.tanggal.as_deref().unwrap_or("-"));
    }

    let window = series::windowed_with(
        &samples,
        page,
        cfg.series.window_size,
        parameter,
        &cfg.window_options(),
    );
    println!(
        "{} window {}/{} ({} samples)",
        parameter, window.page_index, window.total_pages, window.total_samples
    );
    for (label, value) in window.labels.iter().zip(&window.values) {
        println!("  {label:<16} {value}");
    }
    Ok(())
}

async fn run_correct<A: ClassificationApi>(
    coordinator: &ReclassificationCoordinator<A>,
    id: &str,
    values: CorrectionValues,
) -> Result<()> {
    coordinator.refresh().await.context("fetching classifications")?;

    match coordinator.submit_correction(id, values).await? {
        CorrectionOutcome::Replaced(record) => {
            println!(
                "record {} reclassified as {}; still anomalous in [{}]",
                record.id,
                record.classification.as_deref().unwrap_or("-"),
                record.anomaly_types.join(", ")
            );
        }
        CorrectionOutcome::Cleared { id, classification } => {
            println!("record {id} reclassified as {classification}; no longer anomalous");
        }
        CorrectionOutcome::Discarded { id } => {
            println!("correction for record {id} accepted, but the record left the anomaly list meanwhile");
        }
        CorrectionOutcome::NotHeld { id } => {
            println!("record {id} is not in the current anomaly list; correction not sent");
        }
    }
    Ok(())
}

async fn run_delete<A: ClassificationApi>(
    coordinator: &ReclassificationCoordinator<A>,
    id: &str,
    yes: bool,
) -> Result<()> {
    if !yes && !confirm(&format!("Delete record {id}?"))? {
        println!("cancelled");
        return Ok(());
    }

    coordinator.refresh().await.context("fetching classifications")?;
    match coordinator.delete(id).await? {
        Some(record) => println!("deleted record {} ({})", record.id, record.location_name),
        None => println!("deleted record {id}"),
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
