use anyhow::{Context, Result};
use std::{env, path::PathBuf};
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use tripscraper::{
    config::ENV_OUTPUT, fetch::HttpFetcher, ingest, output::write_parquet, IngestConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) run configuration from the orchestrator ──────────────────
    let config = IngestConfig::from_env().context("reading run configuration")?;
    let output = env::var(ENV_OUTPUT)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    // ─── 3) download + concatenate ───────────────────────────────────
    let fetcher =
        HttpFetcher::new(config.request_timeout).context("building HTTP client")?;
    let start = Instant::now();
    let table = ingest(&config, &fetcher).await?;
    info!(
        rows = table.num_rows(),
        files = table.files(),
        elapsed = ?start.elapsed(),
        "ingest finished"
    );

    // ─── 4) hand the table over ──────────────────────────────────────
    match output {
        Some(path) => {
            write_parquet(&table, &path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None if !table.is_empty() => {
            warn!("{} not set; result table discarded", ENV_OUTPUT);
        }
        None => {}
    }

    Ok(())
}
