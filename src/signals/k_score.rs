// =============================================================================
// K-Score — composite opportunity index used for ranking
// =============================================================================
//
//   score = momentum × 40
//         + 25   if 30 < rsi < 55
//         + 15   if close > sma_long
//         + 10   if ema_fast > ema_slow
//         + 25   if signal == BUY
//         − 200  if rsi > 65
//
// A ranking heuristic, not a probability. Weights come from `KScoreWeights`.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSnapshot;
use crate::runtime_config::KScoreWeights;
use crate::types::Signal;

/// The contribution of a single term to the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub name: String,
    pub contribution: f64,
}

/// Result of the K-Score computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KScore {
    pub total: f64,
    /// Fractional return used for the momentum term.
    pub momentum: f64,
    pub components: Vec<ScoreComponent>,
}

/// Fractional return from `closes[len - lookback]` to the last close.
///
/// Falls back to the first close when the series is shorter than `lookback`.
/// Returns `None` on an empty slice or a non-positive / non-finite base.
pub fn momentum_return(closes: &[f64], lookback: usize) -> Option<f64> {
    let last = *closes.last()?;
    let base = if lookback > 0 && closes.len() >= lookback {
        closes[closes.len() - lookback]
    } else {
        closes[0]
    };
    if !(base.is_finite() && base > 0.0) {
        return None;
    }
    let ret = last / base - 1.0;
    ret.is_finite().then_some(ret)
}

/// Score one instrument from its latest indicators and signal.
pub fn compute_k_score(
    snapshot: &IndicatorSnapshot,
    close: f64,
    momentum: f64,
    signal: Signal,
    weights: &KScoreWeights,
) -> KScore {
    let rsi = snapshot.rsi;
    let terms = [
        ("momentum", momentum * weights.momentum_weight),
        (
            "rsi_sweet_spot",
            if rsi > weights.sweet_spot_low && rsi < weights.sweet_spot_high {
                weights.sweet_spot_bonus
            } else {
                0.0
            },
        ),
        (
            "above_sma_long",
            if close > snapshot.sma_long {
                weights.above_sma_long_bonus
            } else {
                0.0
            },
        ),
        (
            "ema_bullish",
            if snapshot.ema_bullish() {
                weights.ema_bullish_bonus
            } else {
                0.0
            },
        ),
        (
            "buy_signal",
            if signal == Signal::Buy {
                weights.buy_bonus
            } else {
                0.0
            },
        ),
        (
            "overbought_penalty",
            if rsi > weights.overbought_rsi {
                -weights.overbought_penalty
            } else {
                0.0
            },
        ),
    ];

    let mut total = 0.0;
    let mut components = Vec::with_capacity(terms.len());
    for (name, contribution) in terms {
        total += contribution;
        components.push(ScoreComponent {
            name: name.to_string(),
            contribution,
        });
    }

    KScore {
        total,
        momentum,
        components,
    }
}
