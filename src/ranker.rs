// =============================================================================
// Ranker — order scan results for presentation
// =============================================================================
//
// Composite key: signal priority (BUY, HOLD, SELL) then descending K-Score.
// The sort is stable, so ties keep their input order.
// =============================================================================

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::types::{Signal, Trend};

fn compare(a: &AnalysisResult, b: &AnalysisResult) -> Ordering {
    a.signal
        .priority()
        .cmp(&b.signal.priority())
        .then_with(|| b.score().total_cmp(&a.score()))
}

/// Return a new, ranked sequence. The input is left untouched.
pub fn rank(results: &[AnalysisResult]) -> Vec<AnalysisResult> {
    let mut ranked = results.to_vec();
    ranked.sort_by(compare);
    ranked
}

/// Keep only results whose signal is in `signals`, preserving order.
pub fn filter_by_signal(results: &[AnalysisResult], signals: &[Signal]) -> Vec<AnalysisResult> {
    results
        .iter()
        .filter(|r| signals.contains(&r.signal))
        .cloned()
        .collect()
}

/// The first `n` entries of an already ranked list.
pub fn top_n(ranked: &[AnalysisResult], n: usize) -> &[AnalysisResult] {
    &ranked[..n.min(ranked.len())]
}

/// Market overview counts for a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub analyzed: usize,
    pub buys: usize,
    pub sells: usize,
    pub holds: usize,
    pub bullish: usize,
}

impl ScanSummary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.analyzed += 1;
            match r.signal {
                Signal::Buy => acc.buys += 1,
                Signal::Sell => acc.sells += 1,
                Signal::Hold => acc.holds += 1,
            }
            if r.trend == Trend::Bullish {
                acc.bullish += 1;
            }
            acc
        })
    }
}
