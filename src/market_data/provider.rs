// =============================================================================
// Market data providers — where price series come from
// =============================================================================
//
// Providers may fail or return short series (network trouble, market closed).
// The scanner turns any such failure into a skipped instrument, so nothing
// here retries.
// =============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::{PricePoint, PriceSeries};

/// Source of historical bars for one instrument.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Bars covering roughly the last `lookback_days` calendar days at the
    /// given `interval`, oldest first.
    async fn fetch_series(
        &self,
        symbol: &str,
        lookback_days: u32,
        interval: &str,
    ) -> Result<PriceSeries>;
}

/// Start of a look-back window ending at `end`.
///
/// Errors instead of panicking when the window reaches past chrono's range.
pub fn window_start(end: DateTime<Utc>, lookback_days: u32) -> Result<DateTime<Utc>> {
    end.checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .with_context(|| format!("look-back of {lookback_days} days is out of range"))
}

// ---------------------------------------------------------------------------
// DirectoryProvider -- `<dir>/<SYMBOL>.json` files
// ---------------------------------------------------------------------------

/// Reads one JSON array of [`PricePoint`] per instrument from a directory.
///
/// The look-back window is measured back from the newest bar in the file,
/// not from the wall clock, so fixtures stay reproducible.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    dir: PathBuf,
}

impl DirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.json"))
    }
}

#[async_trait]
impl MarketDataProvider for DirectoryProvider {
    fn name(&self) -> &str {
        "directory"
    }

    async fn fetch_series(
        &self,
        symbol: &str,
        lookback_days: u32,
        interval: &str,
    ) -> Result<PriceSeries> {
        let path = self.path_for(symbol);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read bars from {}", path.display()))?;

        let points: Vec<PricePoint> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse bars from {}", path.display()))?;

        let mut series = PriceSeries::from_unordered(symbol, points);
        if let Some(newest) = series.last().map(|p| p.timestamp) {
            let cutoff = window_start(newest, lookback_days)?;
            let kept: Vec<PricePoint> = series
                .points()
                .iter()
                .filter(|p| p.timestamp >= cutoff)
                .copied()
                .collect();
            series = PriceSeries::from_unordered(symbol, kept);
        }

        debug!(symbol, interval, bars = series.len(), "bars loaded from directory");
        Ok(series)
    }
}
