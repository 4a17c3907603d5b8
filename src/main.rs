use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use covidscraper::{fetch, plot, process};
use reqwest::Client;
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) args: optional start date, optional state ────────────────
    let mut args = std::env::args().skip(1);
    let start_date = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("parsing start date {:?}", raw))?,
        None => NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
    };
    let state = args.next().unwrap_or_else(|| "AZ".to_string());

    // ─── 3) configure dirs ───────────────────────────────────────────
    let cache_dir = PathBuf::from("cache");
    let out_dir = PathBuf::from("out");
    for d in [&cache_dir, &out_dir] {
        fs::create_dir_all(d)?;
    }

    let cached = fetch::cached_snapshots(&cache_dir)?;
    info!("{} cached snapshots", cached.len());

    // ─── 4) fetch today's feed snapshot ──────────────────────────────
    let client = Client::new();
    let as_of = Local::now().date_naive();
    let entries = fetch::fetch_daily(&client, &cache_dir, as_of).await?;
    info!("{} daily records", entries.len());

    // ─── 5) reshape into the per-state series ────────────────────────
    let (table, regions) = process::reshape(&entries, start_date)?;
    info!(rows = table.len(), regions = regions.len(), "reshaped");

    // ─── 6) write the columnar snapshot ──────────────────────────────
    let parquet_path = out_dir.join(format!("series_{}.parquet", as_of.format("%Y_%m_%d")));
    process::write_series_parquet(&table, &parquet_path)?;

    // ─── 7) chart one state's new cases ──────────────────────────────
    let last_report = table
        .region(&state)
        .map(|row| row.date)
        .max()
        .with_context(|| format!("no rows for {} on or after {}", state, start_date))?;
    let chart_path = out_dir.join(format!("new_cases_{}.png", state));
    plot::render_new_cases(&table, &state, (start_date, last_report), &chart_path)?;

    info!("all done");
    Ok(())
}
