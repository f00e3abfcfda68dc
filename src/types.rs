// =============================================================================
// Shared types used across the K-Scan engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Trading signal emitted by the classifier for one analysis pass.
///
/// Signals are recomputed from scratch on every scan; nothing is carried over
/// between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Ranking priority: BUY first, then HOLD, then SELL.
    pub fn priority(self) -> u8 {
        match self {
            Self::Buy => 0,
            Self::Hold => 1,
            Self::Sell => 2,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Coarse trend label: price relative to the long moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    pub fn from_close_and_sma(close: f64, sma_long: f64) -> Self {
        if close > sma_long {
            Self::Bullish
        } else {
            Self::Bearish
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
        }
    }
}
