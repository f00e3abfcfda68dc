// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
//   alpha = 2 / (period + 1)
//   EMA_t = EMA_{t-1} + alpha × (close_t − EMA_{t-1})
//
// Seeded with the plain mean of the first `period` closes. The scanner
// compares EMA-12 against EMA-26 as its momentum cross.
// =============================================================================

/// EMA series; element `i` belongs to `closes[i + period - 1]`.
///
/// Empty for a zero period or fewer than `period` closes. Stops at the first
/// non-finite value.
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    let (window, rest) = closes.split_at(period);
    let seed = window.iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return Vec::new();
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let smoothed = rest
        .iter()
        .scan(seed, |prev, &close| {
            *prev += alpha * (close - *prev);
            prev.is_finite().then_some(*prev)
        });

    std::iter::once(seed).chain(smoothed).collect()
}

/// EMA at the most recent close, or `None` if the series never reached it.
pub fn latest_ema(closes: &[f64], period: usize) -> Option<f64> {
    let series = calculate_ema(closes, period);
    let last = *series.last()?;
    (series.len() + period - 1 == closes.len()).then_some(last)
}
