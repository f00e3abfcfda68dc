// =============================================================================
// kscan — K-Score swing-trade signal engine
// =============================================================================
//
// Core: `analyze` (one series → one result) and `rank` (results → ordered
// results). Both are pure. Data acquisition, caching and batch scanning sit
// around the core in `market_data`, `cache` and `scanner`.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
pub mod analysis;
pub mod cache;
pub mod indicators;
pub mod market_data;
pub mod ranker;
pub mod resistance;
pub mod risk;
pub mod runtime_config;
pub mod scanner;
pub mod signals;
pub mod types;

pub use analysis::{analyze, analyze_with, AnalysisError, AnalysisResult};
pub use cache::{AnalysisCache, TtlCache};
pub use indicators::IndicatorSnapshot;
pub use market_data::{
    DirectoryProvider, MarketDataProvider, PricePoint, PriceSeries, PriceSeriesError, YahooClient,
};
pub use ranker::{filter_by_signal, rank, top_n, ScanSummary};
pub use resistance::{ResistanceTarget, TargetSource};
pub use risk::RiskPlan;
pub use runtime_config::{AnalysisParams, DataSource, KScoreWeights, ScannerConfig};
pub use scanner::{ScanReport, Scanner, SkippedInstrument};
pub use signals::{KScore, ScoreComponent, SignalConditions};
pub use types::{Signal, Trend};
