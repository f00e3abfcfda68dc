// =============================================================================
// Scanner — batch driver over a watchlist
// =============================================================================
//
// Pipeline per scan:
//   1. For each symbol (bounded concurrency): cache hit, or fetch + analyze
//   2. Failures of any kind skip that symbol only
//   3. Fresh results go into the cache (when one was injected)
//   4. Survivors are put back in watchlist order, then ranked
//
// Re-ordering by watchlist position before the stable rank makes the output
// independent of the order in which fetches complete.
// =============================================================================

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::{analyze_with, AnalysisError, AnalysisResult};
use crate::cache::AnalysisCache;
use crate::market_data::MarketDataProvider;
use crate::ranker::{rank, top_n, ScanSummary};
use crate::runtime_config::{AnalysisParams, ScannerConfig};

/// An instrument that produced no result, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedInstrument {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of one scan run. Owns its results; nothing mutates them later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Unique identifier for this run (UUID v4).
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Ranked results.
    pub results: Vec<AnalysisResult>,
    pub skipped: Vec<SkippedInstrument>,
    pub summary: ScanSummary,
}

impl ScanReport {
    /// True when no instrument produced a result ("no data available").
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn top(&self, n: usize) -> &[AnalysisResult] {
        top_n(&self.results, n)
    }
}

/// Batch scan driver. Holds no per-scan state; `scan` can be called
/// repeatedly and concurrently.
pub struct Scanner {
    provider: Arc<dyn MarketDataProvider>,
    cache: Option<Arc<dyn AnalysisCache>>,
    params: AnalysisParams,
    concurrency: usize,
    lookback_days: u32,
    interval: String,
}

impl Scanner {
    pub fn new(provider: Arc<dyn MarketDataProvider>, params: AnalysisParams) -> Self {
        Self {
            provider,
            cache: None,
            params,
            concurrency: 8,
            lookback_days: 365,
            interval: "1d".to_string(),
        }
    }

    /// Build a scanner with the window, concurrency and thresholds of `config`.
    pub fn from_config(provider: Arc<dyn MarketDataProvider>, config: &ScannerConfig) -> Self {
        Self::new(provider, config.analysis.clone())
            .with_concurrency(config.max_concurrent_fetches)
            .with_window(config.lookback_days, config.interval.clone())
    }

    pub fn with_cache(mut self, cache: Arc<dyn AnalysisCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Maximum in-flight provider requests (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_window(mut self, lookback_days: u32, interval: impl Into<String>) -> Self {
        self.lookback_days = lookback_days;
        self.interval = interval.into();
        self
    }

    /// Analyse every symbol of `watchlist` and rank the survivors.
    pub async fn scan(&self, watchlist: &[String]) -> ScanReport {
        let started_at = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        info!(
            scan_id = %id,
            instruments = watchlist.len(),
            provider = self.provider.name(),
            concurrency = self.concurrency,
            "scan started"
        );

        let mut outcomes: Vec<(usize, &String, Result<AnalysisResult, AnalysisError>)> =
            stream::iter(watchlist.iter().enumerate())
                .map(move |(idx, symbol)| async move {
                    (idx, symbol, self.scan_one(symbol).await)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        let mut results = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (_, symbol, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    match &e {
                        AnalysisError::UpstreamDataFailure(_) => {
                            warn!(symbol = %symbol, error = %e, "instrument skipped")
                        }
                        _ => debug!(symbol = %symbol, error = %e, "instrument skipped"),
                    }
                    skipped.push(SkippedInstrument {
                        symbol: symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let ranked = rank(&results);
        let summary = ScanSummary::from_results(&ranked);

        if ranked.is_empty() {
            warn!(scan_id = %id, skipped = skipped.len(), "scan produced no results");
        } else {
            info!(
                scan_id = %id,
                analyzed = summary.analyzed,
                buys = summary.buys,
                sells = summary.sells,
                holds = summary.holds,
                skipped = skipped.len(),
                "scan complete"
            );
        }

        ScanReport {
            id,
            started_at,
            finished_at: Utc::now(),
            results: ranked,
            skipped,
            summary,
        }
    }

    /// Cache key for `symbol` under this scanner's thresholds and window.
    fn cache_key(&self, symbol: &str) -> String {
        let mut hasher = DefaultHasher::new();
        format!("{:?}", self.params).hash(&mut hasher);
        self.lookback_days.hash(&mut hasher);
        self.interval.hash(&mut hasher);
        format!("{symbol}#{:016x}", hasher.finish())
    }

    /// Cache lookup, then fetch and analyse one symbol.
    async fn scan_one(&self, symbol: &str) -> Result<AnalysisResult, AnalysisError> {
        let key = self.cache_key(symbol);
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            debug!(symbol, "cache hit");
            return Ok(cached);
        }

        let series = self
            .provider
            .fetch_series(symbol, self.lookback_days, &self.interval)
            .await
            .map_err(|e| AnalysisError::UpstreamDataFailure(format!("{e:#}")))?;

        if series.is_empty() {
            return Err(AnalysisError::UpstreamDataFailure(
                "provider returned no bars".to_string(),
            ));
        }

        let result = analyze_with(&series, &self.params)?;

        if let Some(cache) = &self.cache {
            cache.put(&key, result.clone());
        }

        Ok(result)
    }
}
