// =============================================================================
// Runtime Configuration — scanner settings and analysis thresholds
// =============================================================================
//
// Every tunable constant of the analysis pipeline lives in `AnalysisParams`
// so that thresholds can be changed without touching the rule code.
//
// Persistence uses an atomic tmp + rename pattern.  All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an
// older config file.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_watchlist() -> Vec<String> {
    [
        "NOD.OL", "SATS.OL", "KID.OL", "VAR.OL", "PROT.OL", "AKSO.OL", "NEL.OL", "BGBIO.OL",
        "TEL.OL", "ORK.OL", "FRO.OL", "GOGL.OL", "NAS.OL", "DNB.OL", "EQNR.OL", "YAR.OL",
        "NHY.OL", "MOWI.OL", "SUBC.OL", "TGS.OL", "AKRBP.OL", "PGS.OL", "ADE.OL", "IDEX.OL",
        "AUTO.OL", "LSG.OL", "SALM.OL", "BAKK.OL", "TOM.OL", "GRIEG.OL", "ELK.OL", "MPCC.OL",
        "KOG.OL", "BORR.OL", "RANA.OL", "SCATC.OL", "VOW.OL", "OKEA.OL", "HAFNI.OL", "BWE.OL",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// About a century of daily bars; far beyond any provider's history.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

fn default_lookback_days() -> u32 {
    365
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    1800
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_top_n() -> usize {
    3
}

fn default_min_history() -> usize {
    50
}

fn default_rsi_period() -> usize {
    14
}

fn default_sma_short() -> usize {
    20
}

fn default_sma_long() -> usize {
    50
}

fn default_ema_fast() -> usize {
    12
}

fn default_ema_slow() -> usize {
    26
}

fn default_atr_period() -> usize {
    14
}

fn default_buy_rsi_max() -> f64 {
    55.0
}

fn default_sell_rsi_min() -> f64 {
    75.0
}

fn default_return_lookback() -> usize {
    5
}

fn default_atr_stop_multiplier() -> f64 {
    2.0
}

fn default_resistance_lookback() -> usize {
    60
}

fn default_fallback_target_multiplier() -> f64 {
    1.08
}

fn default_momentum_lookback() -> usize {
    60
}

fn default_momentum_weight() -> f64 {
    40.0
}

fn default_sweet_spot_low() -> f64 {
    30.0
}

fn default_sweet_spot_high() -> f64 {
    55.0
}

fn default_sweet_spot_bonus() -> f64 {
    25.0
}

fn default_above_sma_long_bonus() -> f64 {
    15.0
}

fn default_ema_bullish_bonus() -> f64 {
    10.0
}

fn default_buy_bonus() -> f64 {
    25.0
}

fn default_overbought_rsi() -> f64 {
    65.0
}

fn default_overbought_penalty() -> f64 {
    200.0
}

// =============================================================================
// KScoreWeights
// =============================================================================

/// Weights of the composite K-Score ranking index.
///
/// These are a ranking heuristic, not a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KScoreWeights {
    /// Multiplier applied to the fractional momentum return.
    #[serde(default = "default_momentum_weight")]
    pub momentum_weight: f64,

    /// RSI sweet spot, exclusive on both ends.
    #[serde(default = "default_sweet_spot_low")]
    pub sweet_spot_low: f64,
    #[serde(default = "default_sweet_spot_high")]
    pub sweet_spot_high: f64,
    #[serde(default = "default_sweet_spot_bonus")]
    pub sweet_spot_bonus: f64,

    #[serde(default = "default_above_sma_long_bonus")]
    pub above_sma_long_bonus: f64,

    #[serde(default = "default_ema_bullish_bonus")]
    pub ema_bullish_bonus: f64,

    #[serde(default = "default_buy_bonus")]
    pub buy_bonus: f64,

    /// RSI above this level subtracts `overbought_penalty`.
    #[serde(default = "default_overbought_rsi")]
    pub overbought_rsi: f64,
    #[serde(default = "default_overbought_penalty")]
    pub overbought_penalty: f64,
}

impl Default for KScoreWeights {
    fn default() -> Self {
        Self {
            momentum_weight: default_momentum_weight(),
            sweet_spot_low: default_sweet_spot_low(),
            sweet_spot_high: default_sweet_spot_high(),
            sweet_spot_bonus: default_sweet_spot_bonus(),
            above_sma_long_bonus: default_above_sma_long_bonus(),
            ema_bullish_bonus: default_ema_bullish_bonus(),
            buy_bonus: default_buy_bonus(),
            overbought_rsi: default_overbought_rsi(),
            overbought_penalty: default_overbought_penalty(),
        }
    }
}

// =============================================================================
// AnalysisParams
// =============================================================================

/// Indicator periods and rule thresholds for one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Minimum number of bars required before any indicator is read.
    #[serde(default = "default_min_history")]
    pub min_history: usize,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_sma_short")]
    pub sma_short: usize,
    #[serde(default = "default_sma_long")]
    pub sma_long: usize,
    #[serde(default = "default_ema_fast")]
    pub ema_fast: usize,
    #[serde(default = "default_ema_slow")]
    pub ema_slow: usize,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// BUY requires RSI strictly below this level.
    #[serde(default = "default_buy_rsi_max")]
    pub buy_rsi_max: f64,

    /// RSI strictly above this level forces SELL (unless BUY matched).
    #[serde(default = "default_sell_rsi_min")]
    pub sell_rsi_min: f64,

    /// Bars back for the short trailing return used by the BUY rule.
    #[serde(default = "default_return_lookback")]
    pub return_lookback: usize,

    /// Stop distance below the close, in ATRs.
    #[serde(default = "default_atr_stop_multiplier")]
    pub atr_stop_multiplier: f64,

    /// Number of trailing highs scanned for local peaks.
    #[serde(default = "default_resistance_lookback")]
    pub resistance_lookback: usize,

    /// Target = close × this when no peak sits above the close.
    #[serde(default = "default_fallback_target_multiplier")]
    pub fallback_target_multiplier: f64,

    /// Bars back for the K-Score momentum return.
    #[serde(default = "default_momentum_lookback")]
    pub momentum_lookback: usize,

    #[serde(default)]
    pub k_score: KScoreWeights,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            min_history: default_min_history(),
            rsi_period: default_rsi_period(),
            sma_short: default_sma_short(),
            sma_long: default_sma_long(),
            ema_fast: default_ema_fast(),
            ema_slow: default_ema_slow(),
            atr_period: default_atr_period(),
            buy_rsi_max: default_buy_rsi_max(),
            sell_rsi_min: default_sell_rsi_min(),
            return_lookback: default_return_lookback(),
            atr_stop_multiplier: default_atr_stop_multiplier(),
            resistance_lookback: default_resistance_lookback(),
            fallback_target_multiplier: default_fallback_target_multiplier(),
            momentum_lookback: default_momentum_lookback(),
            k_score: KScoreWeights::default(),
        }
    }
}

impl AnalysisParams {
    /// Number of bars needed for every indicator to produce a value at the
    /// latest point.
    pub fn warm_up_bars(&self) -> usize {
        [
            self.rsi_period + 1,
            self.sma_short,
            self.sma_long,
            self.ema_fast,
            self.ema_slow,
            self.atr_period + 1,
            self.return_lookback + 1,
            2,
        ]
        .into_iter()
        .max()
        .unwrap_or(2)
    }

    /// Reject parameter sets that would let a snapshot be taken before the
    /// indicators are warm, or that make the rules meaningless.
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("atr_period", self.atr_period),
            ("return_lookback", self.return_lookback),
            ("momentum_lookback", self.momentum_lookback),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            anyhow::bail!("{name} must be at least 1");
        }
        if self.resistance_lookback < 3 {
            anyhow::bail!("resistance_lookback must be at least 3 to contain a local peak");
        }
        let warm_up = self.warm_up_bars();
        if self.min_history < warm_up {
            anyhow::bail!(
                "min_history {} is below the {} bars the indicators need",
                self.min_history,
                warm_up
            );
        }
        if self.atr_stop_multiplier.is_nan() || self.atr_stop_multiplier <= 0.0 {
            anyhow::bail!("atr_stop_multiplier must be positive");
        }
        if self.fallback_target_multiplier.is_nan() || self.fallback_target_multiplier <= 1.0 {
            anyhow::bail!("fallback_target_multiplier must be above 1.0");
        }
        Ok(())
    }
}

// =============================================================================
// ScannerConfig
// =============================================================================

/// Where the scan driver gets its price series from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Yahoo Finance chart endpoint.
    Yahoo,
    /// Local directory holding `<SYMBOL>.json` files.
    Directory(PathBuf),
}

impl Default for DataSource {
    fn default() -> Self {
        Self::Yahoo
    }
}

/// Top-level configuration for a scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Instruments to scan, in presentation order.
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,

    /// Calendar days of history requested per instrument.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Bar interval passed to the provider (e.g. "1d").
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Time-to-live for memoised analysis results.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Upper bound on in-flight provider requests.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    #[serde(default)]
    pub data_source: DataSource,

    /// How many leaders to log as top opportunities.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub analysis: AnalysisParams,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            watchlist: default_watchlist(),
            lookback_days: default_lookback_days(),
            interval: default_interval(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            data_source: DataSource::default(),
            top_n: default_top_n(),
            analysis: AnalysisParams::default(),
        }
    }
}

impl ScannerConfig {
    /// Reject settings the scan driver cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            anyhow::bail!(
                "lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            );
        }
        if self.interval.trim().is_empty() {
            anyhow::bail!("interval must not be empty");
        }
        if self.max_concurrent_fetches == 0 {
            anyhow::bail!("max_concurrent_fetches must be at least 1");
        }
        self.analysis.validate().context("invalid analysis params")
    }

    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing file is an error so the caller can fall back to defaults
    /// with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scanner config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse scanner config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid scanner config in {}", path.display()))?;

        info!(
            path = %path.display(),
            instruments = config.watchlist.len(),
            source = ?config.data_source,
            "scanner config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise scanner config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "scanner config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = ScannerConfig::default();
        assert_eq!(cfg.watchlist.len(), 40);
        assert_eq!(cfg.watchlist[0], "NOD.OL");
        assert_eq!(cfg.cache_ttl_secs, 1800);
        assert_eq!(cfg.data_source, DataSource::Yahoo);
        assert_eq!(cfg.analysis.min_history, 50);
        assert!((cfg.analysis.fallback_target_multiplier - 1.08).abs() < f64::EPSILON);
        assert!((cfg.analysis.k_score.overbought_penalty - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_params_are_valid() {
        let params = AnalysisParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.warm_up_bars(), 50);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: ScannerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.lookback_days, 365);
        assert_eq!(cfg.interval, "1d");
        assert_eq!(cfg.analysis, AnalysisParams::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "watchlist": ["EQNR.OL"],
            "data_source": { "directory": "/tmp/bars" },
            "analysis": { "buy_rsi_max": 60.0, "k_score": { "buy_bonus": 30.0 } }
        }"#;
        let cfg: ScannerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.watchlist, vec!["EQNR.OL"]);
        assert_eq!(cfg.data_source, DataSource::Directory(PathBuf::from("/tmp/bars")));
        assert!((cfg.analysis.buy_rsi_max - 60.0).abs() < f64::EPSILON);
        assert!((cfg.analysis.sell_rsi_min - 75.0).abs() < f64::EPSILON);
        assert!((cfg.analysis.k_score.buy_bonus - 30.0).abs() < f64::EPSILON);
        assert!((cfg.analysis.k_score.momentum_weight - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_short_min_history() {
        let params = AnalysisParams {
            min_history: 30,
            ..AnalysisParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_period_and_bad_multipliers() {
        let zero = AnalysisParams {
            ema_fast: 0,
            ..AnalysisParams::default()
        };
        assert!(zero.validate().is_err());

        let stop = AnalysisParams {
            atr_stop_multiplier: f64::NAN,
            ..AnalysisParams::default()
        };
        assert!(stop.validate().is_err());

        let target = AnalysisParams {
            fallback_target_multiplier: 1.0,
            ..AnalysisParams::default()
        };
        assert!(target.validate().is_err());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("kscan-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kscan_config.json");

        let mut cfg = ScannerConfig::default();
        cfg.watchlist = vec!["DNB.OL".into()];
        cfg.save(&path).unwrap();

        let loaded = ScannerConfig::load(&path).unwrap();
        assert_eq!(loaded.watchlist, vec!["DNB.OL"]);
        assert!(!path.with_extension("json.tmp").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn validate_bounds_lookback_days() {
        let mut cfg = ScannerConfig::default();
        assert!(cfg.validate().is_ok());

        cfg.lookback_days = u32::MAX;
        assert!(cfg.validate().is_err());
        cfg.lookback_days = 0;
        assert!(cfg.validate().is_err());
        cfg.lookback_days = MAX_LOOKBACK_DAYS;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_covers_analysis_params() {
        let mut cfg = ScannerConfig::default();
        cfg.analysis.min_history = 10;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_rejects_out_of_range_lookback() {
        let dir = std::env::temp_dir().join(format!("kscan-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kscan_config.json");
        std::fs::write(&path, r#"{ "lookback_days": 4294967295 }"#).unwrap();

        let err = ScannerConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("lookback_days"), "got {err:#}");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_missing_file_is_error() {
        assert!(ScannerConfig::load("/nonexistent/kscan_config.json").is_err());
    }
}
