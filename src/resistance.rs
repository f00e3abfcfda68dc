// =============================================================================
// Resistance Detector — nearest local peak above the current close
// =============================================================================
//
// A bar is a local peak when its high is strictly greater than the highs of
// both immediate neighbours. The first and last bars of the window have only
// one neighbour and are never peaks.
//
// target = min { peak | peak > close }      (nearest ceiling)
//        = close × fallback_multiplier      (when no peak sits above close)
// =============================================================================

use serde::{Deserialize, Serialize};

/// Where the upside target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSource {
    /// A local peak in the trailing highs.
    Resistance,
    /// Fixed percentage above the close.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistanceTarget {
    pub price: f64,
    pub source: TargetSource,
}

/// Highs that exceed both neighbours, in window order.
pub fn local_peaks(highs: &[f64]) -> Vec<f64> {
    highs
        .windows(3)
        .filter(|w| w[1] > w[0] && w[1] > w[2])
        .map(|w| w[1])
        .collect()
}

/// Nearest resistance above `close` within `highs` (the trailing window,
/// oldest first), or the fallback target when none qualifies.
pub fn detect_target(highs: &[f64], close: f64, fallback_multiplier: f64) -> ResistanceTarget {
    let nearest = local_peaks(highs)
        .into_iter()
        .filter(|&peak| peak > close)
        .min_by(f64::total_cmp);

    match nearest {
        Some(price) => ResistanceTarget {
            price,
            source: TargetSource::Resistance,
        },
        None => ResistanceTarget {
            price: close * fallback_multiplier,
            source: TargetSource::Fallback,
        },
    }
}
