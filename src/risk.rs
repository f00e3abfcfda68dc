// =============================================================================
// Risk Planner — volatility stop, resistance target, reward/risk
// =============================================================================
//
//   stop_loss      = close − atr_multiplier × ATR
//   gain           = target − close
//   risk           = close − stop_loss
//   reward / risk  = gain / risk        (only when risk > 0)
//
// The stop is never clamped at zero: a low-priced, high-ATR instrument can get
// a negative stop, which callers should read as "no meaningful stop".
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::resistance::ResistanceTarget;

/// Risk levels derived for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPlan {
    pub stop_loss: f64,
    pub target: ResistanceTarget,
    pub potential_gain: f64,
    pub potential_gain_pct: f64,
    pub potential_risk: f64,
    pub potential_risk_pct: f64,
    /// `None` when the downside is zero or negative: there is no meaningful
    /// ratio, which is distinct from a ratio of 0.
    pub risk_reward_ratio: Option<f64>,
}

impl RiskPlan {
    /// True when the stop sits above zero and below the close.
    pub fn has_meaningful_stop(&self) -> bool {
        self.stop_loss > 0.0 && self.potential_risk > 0.0
    }
}

/// Build the plan from the last close, ATR and the detected target.
pub fn plan_risk(close: f64, atr: f64, atr_multiplier: f64, target: ResistanceTarget) -> RiskPlan {
    let stop_loss = close - atr_multiplier * atr;

    let potential_gain = target.price - close;
    let potential_risk = close - stop_loss;

    let pct_of_close = |amount: f64| {
        if close != 0.0 {
            amount / close * 100.0
        } else {
            0.0
        }
    };

    let risk_reward_ratio = if potential_risk > 0.0 {
        let ratio = potential_gain / potential_risk;
        ratio.is_finite().then_some(ratio)
    } else {
        None
    };

    RiskPlan {
        stop_loss,
        target,
        potential_gain,
        potential_gain_pct: pct_of_close(potential_gain),
        potential_risk,
        potential_risk_pct: pct_of_close(potential_risk),
        risk_reward_ratio,
    }
}
