// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================

/// Rolling SMA of `closes`; element `i` covers `closes[i..i + period]`.
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }
    closes
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Unweighted mean of the trailing `period` closes.
///
/// Returns `None` for a short input, a zero period, or a non-finite mean.
pub fn latest_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    mean.is_finite().then_some(mean)
}
