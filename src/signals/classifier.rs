// =============================================================================
// Signal Classifier — deterministic BUY / SELL / HOLD rules
// =============================================================================
//
//   BUY  = rsi < buy_rsi_max AND close > sma_short AND close > sma_long
//          AND ema_fast > ema_slow AND trailing return > 0
//   SELL = rsi > sell_rsi_min OR (close < sma_short AND close < sma_long)
//   HOLD = otherwise
//
// BUY is evaluated first and wins. With the default thresholds the two rule
// sets cannot both match: BUY needs rsi < 55 and close above both SMAs.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSnapshot;
use crate::runtime_config::AnalysisParams;
use crate::types::Signal;

/// Every boolean the rules look at, so callers can explain a decision
/// without re-deriving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConditions {
    pub rsi_below_buy_max: bool,
    pub above_sma_short: bool,
    pub above_sma_long: bool,
    pub ema_bullish: bool,
    pub positive_trailing_return: bool,
    pub rsi_overbought: bool,
    pub below_both_smas: bool,
}

impl SignalConditions {
    pub fn evaluate(
        snapshot: &IndicatorSnapshot,
        close: f64,
        trailing_return: f64,
        params: &AnalysisParams,
    ) -> Self {
        Self {
            rsi_below_buy_max: snapshot.rsi < params.buy_rsi_max,
            above_sma_short: close > snapshot.sma_short,
            above_sma_long: close > snapshot.sma_long,
            ema_bullish: snapshot.ema_bullish(),
            positive_trailing_return: trailing_return > 0.0,
            rsi_overbought: snapshot.rsi > params.sell_rsi_min,
            below_both_smas: close < snapshot.sma_short && close < snapshot.sma_long,
        }
    }

    pub fn buy_matched(&self) -> bool {
        self.rsi_below_buy_max
            && self.above_sma_short
            && self.above_sma_long
            && self.ema_bullish
            && self.positive_trailing_return
    }

    pub fn sell_matched(&self) -> bool {
        self.rsi_overbought || self.below_both_smas
    }

    /// Apply the rule order: BUY, then SELL, then HOLD.
    pub fn signal(&self) -> Signal {
        if self.buy_matched() {
            Signal::Buy
        } else if self.sell_matched() {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

/// Classify the latest bar. Total: always returns exactly one signal.
pub fn classify(
    snapshot: &IndicatorSnapshot,
    close: f64,
    trailing_return: f64,
    params: &AnalysisParams,
) -> (Signal, SignalConditions) {
    let conditions = SignalConditions::evaluate(snapshot, close, trailing_return, params);
    (conditions.signal(), conditions)
}
