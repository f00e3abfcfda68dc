// =============================================================================
// Indicator Snapshot — every indicator read at the latest bar
// =============================================================================

use serde::{Deserialize, Serialize};

use super::{atr::calculate_atr, ema::latest_ema, rsi::latest_rsi, sma::latest_sma};
use crate::analysis::AnalysisError;
use crate::market_data::PriceSeries;
use crate::runtime_config::AnalysisParams;

/// Indicator values at the most recent bar of a series.
///
/// Only constructed by [`compute_snapshot`], so every field is finite.
/// With default params the periods are RSI(14), SMA(20)/SMA(50),
/// EMA(12)/EMA(26) and ATR(14).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub atr: f64,
}

impl IndicatorSnapshot {
    pub fn ema_bullish(&self) -> bool {
        self.ema_fast > self.ema_slow
    }
}

/// Compute the snapshot at the last bar of `series`.
///
/// Fails with `InsufficientHistory` below `params.min_history` bars and with
/// `UndefinedIndicator` when any indicator has no finite value at the last
/// bar.
pub fn compute_snapshot(
    series: &PriceSeries,
    params: &AnalysisParams,
) -> Result<IndicatorSnapshot, AnalysisError> {
    if series.len() < params.min_history {
        return Err(AnalysisError::InsufficientHistory {
            required: params.min_history,
            available: series.len(),
        });
    }

    let closes = series.closes();

    let rsi = latest_rsi(&closes, params.rsi_period)
        .ok_or(AnalysisError::UndefinedIndicator("rsi"))?;
    let sma_short = latest_sma(&closes, params.sma_short)
        .ok_or(AnalysisError::UndefinedIndicator("sma_short"))?;
    let sma_long = latest_sma(&closes, params.sma_long)
        .ok_or(AnalysisError::UndefinedIndicator("sma_long"))?;
    let ema_fast = latest_ema(&closes, params.ema_fast)
        .ok_or(AnalysisError::UndefinedIndicator("ema_fast"))?;
    let ema_slow = latest_ema(&closes, params.ema_slow)
        .ok_or(AnalysisError::UndefinedIndicator("ema_slow"))?;
    let atr = calculate_atr(series.points(), params.atr_period)
        .ok_or(AnalysisError::UndefinedIndicator("atr"))?;

    Ok(IndicatorSnapshot {
        rsi,
        sma_short,
        sma_long,
        ema_fast,
        ema_slow,
        atr,
    })
}
