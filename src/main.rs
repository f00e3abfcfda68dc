// =============================================================================
// kscan — Main Entry Point
// =============================================================================
//
// One-shot scan: load config, build the data provider, scan the watchlist,
// print the ranked report as JSON on stdout. Logs go to stderr.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kscan::{
    DataSource, DirectoryProvider, MarketDataProvider, ScannerConfig, Scanner, TtlCache,
    YahooClient,
};

const DEFAULT_CONFIG_PATH: &str = "kscan_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("KSCAN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    let mut config = ScannerConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(path = %config_path, error = %e, "Failed to load config, using defaults");
        ScannerConfig::default()
    });

    // Override watchlist from env if available.
    if let Ok(syms) = std::env::var("KSCAN_WATCHLIST") {
        config.watchlist = syms
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(dir) = std::env::var("KSCAN_DATA_DIR") {
        config.data_source = DataSource::Directory(PathBuf::from(dir));
    }

    info!(
        instruments = config.watchlist.len(),
        source = ?config.data_source,
        lookback_days = config.lookback_days,
        interval = %config.interval,
        "Configured watchlist"
    );

    // ── 2. Data provider & cache ─────────────────────────────────────────
    let provider: Arc<dyn MarketDataProvider> = match &config.data_source {
        DataSource::Yahoo => {
            Arc::new(YahooClient::new().context("failed to build Yahoo client")?)
        }
        DataSource::Directory(dir) => Arc::new(DirectoryProvider::new(dir.clone())),
    };
    let cache = Arc::new(TtlCache::new(Duration::from_secs(config.cache_ttl_secs)));

    // ── 3. Scan ──────────────────────────────────────────────────────────
    let scanner = Scanner::from_config(provider, &config).with_cache(cache);
    let report = scanner.scan(&config.watchlist).await;

    if report.is_empty() {
        warn!(
            skipped = report.skipped.len(),
            "No data available for any instrument in the watchlist"
        );
    } else {
        for (rank, result) in report.top(config.top_n).iter().enumerate() {
            info!(
                rank = rank + 1,
                symbol = %result.symbol,
                signal = %result.signal,
                k_score = %format!("{:.1}", result.score()),
                last_price = result.last_price,
                stop_loss = %format!("{:.2}", result.stop_loss()),
                target = %format!("{:.2}", result.target()),
                "Top pick"
            );
        }
    }

    // ── 4. Output ────────────────────────────────────────────────────────
    let json =
        serde_json::to_string_pretty(&report).context("failed to serialise scan report")?;
    println!("{json}");

    Ok(())
}
