// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
//   TR      = max(H - L, |H - prevClose|, |L - prevClose|)
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// The risk planner places the stop `2 × ATR(14)` below the last close.
// =============================================================================

use crate::market_data::PricePoint;

/// True range of `bar` given the previous bar's close.
pub fn true_range(bar: &PricePoint, prev_close: f64) -> f64 {
    let hl = bar.high - bar.low;
    let hc = (bar.high - prev_close).abs();
    let lc = (bar.low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Compute the most recent ATR value from `points` (oldest first).
///
/// Returns `None` when:
/// - `period` is zero.
/// - There are fewer than `period + 1` points (each TR needs a previous close).
/// - Any high, low or close in `points` is non-finite, including bars long
///   before the latest one. Wilder smoothing carries every earlier true
///   range into the final value, so there is no clean restart point; callers
///   wanting a shorter memory should pass only the trailing slice.
pub fn calculate_atr(points: &[PricePoint], period: usize) -> Option<f64> {
    if period == 0 || points.len() < period + 1 {
        return None;
    }

    // f64::max ignores NaN operands, so check the inputs directly.
    if points
        .iter()
        .any(|p| !(p.high.is_finite() && p.low.is_finite() && p.close.is_finite()))
    {
        return None;
    }

    let tr_values: Vec<f64> = points
        .windows(2)
        .map(|w| true_range(&w[1], w[0].close))
        .collect();

    let period_f = period as f64;
    let mut atr = tr_values[..period].iter().sum::<f64>() / period_f;
    if !atr.is_finite() {
        return None;
    }

    for &tr in &tr_values[period..] {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
        if !atr.is_finite() {
            return None;
        }
    }

    Some(atr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(day: i64, open: f64, high: f64, low: f64, close: f64) -> PricePoint {
        let ts = Utc.timestamp_opt(1_600_000_000 + day * 86_400, 0).unwrap();
        PricePoint::new(ts, open, high, low, close, 100.0)
    }

    #[test]
    fn atr_period_zero() {
        let points: Vec<_> = (0..20).map(|i| bar(i, 100.0, 105.0, 95.0, 102.0)).collect();
        assert!(calculate_atr(&points, 0).is_none());
    }

    #[test]
    fn atr_insufficient_data() {
        let points: Vec<_> = (0..14).map(|i| bar(i, 100.0, 105.0, 95.0, 102.0)).collect();
        assert!(calculate_atr(&points, 14).is_none());
    }

    #[test]
    fn atr_exact_minimum_data() {
        let points = vec![
            bar(0, 100.0, 102.0, 98.0, 101.0),
            bar(1, 101.0, 104.0, 99.0, 103.0),
            bar(2, 103.0, 106.0, 100.0, 105.0),
            bar(3, 105.0, 108.0, 102.0, 107.0),
        ];
        // TRs: 5, 6, 6 => seed 17/3.
        let atr = calculate_atr(&points, 3).unwrap();
        assert!((atr - 17.0 / 3.0).abs() < 1e-10, "got {atr}");
    }

    #[test]
    fn atr_flat_series_is_zero() {
        let points: Vec<_> = (0..30).map(|i| bar(i, 50.0, 50.0, 50.0, 50.0)).collect();
        let atr = calculate_atr(&points, 14).unwrap();
        assert!(atr.abs() < 1e-12);
    }

    #[test]
    fn atr_constant_range_converges() {
        let points: Vec<_> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.1;
                bar(i, base, base + 5.0, base - 5.0, base)
            })
            .collect();
        let atr = calculate_atr(&points, 14).unwrap();
        assert!((atr - 10.0).abs() < 1.0, "expected ATR near 10.0, got {atr}");
    }

    #[test]
    fn true_range_uses_prev_close_on_gap() {
        // Gap up: |115 - 95| = 20 beats H - L = 7.
        let tr = true_range(&bar(1, 110.0, 115.0, 108.0, 112.0), 95.0);
        assert!((tr - 20.0).abs() < 1e-10);
    }

    #[test]
    fn atr_nan_anywhere_in_input_returns_none() {
        let mut points: Vec<_> = (0..60).map(|i| bar(i, 100.0, 105.0, 95.0, 100.0)).collect();
        points[2].low = f64::NAN;
        assert!(calculate_atr(&points, 14).is_none());
        // The finite tail on its own is fine.
        let atr = calculate_atr(&points[3..], 14).unwrap();
        assert!((atr - 10.0).abs() < 1e-10, "got {atr}");
    }

    #[test]
    fn atr_nan_returns_none() {
        let mut points: Vec<_> = (0..5).map(|i| bar(i, 100.0, 105.0, 95.0, 100.0)).collect();
        points[1].high = f64::NAN;
        assert!(calculate_atr(&points, 3).is_none());
    }
}
