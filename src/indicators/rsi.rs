// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
//   seed:    avg_up / avg_down = plain mean of the first `period` moves
//   step:    avg = (avg × (period − 1) + move) / period
//   value:   RSI = 100 − 100 / (1 + avg_up / avg_down)
//
// Flat window → 50, only up-moves → 100, only down-moves → 0.
// The classifier reads RSI < 55 as room to run and RSI > 75 as exhausted.
// =============================================================================

/// Running Wilder averages of up- and down-moves.
#[derive(Debug, Clone, Copy)]
struct WilderAverages {
    up: f64,
    down: f64,
    period: f64,
}

impl WilderAverages {
    fn seed(moves: &[f64]) -> Self {
        let period = moves.len() as f64;
        let up = moves.iter().map(|m| m.max(0.0)).sum::<f64>() / period;
        let down = moves.iter().map(|m| (-m).max(0.0)).sum::<f64>() / period;
        Self { up, down, period }
    }

    fn step(&mut self, delta: f64) {
        let keep = self.period - 1.0;
        self.up = (self.up * keep + delta.max(0.0)) / self.period;
        self.down = (self.down * keep + (-delta).max(0.0)) / self.period;
    }

    /// `None` when either average is non-finite.
    fn rsi(&self) -> Option<f64> {
        if !(self.up.is_finite() && self.down.is_finite()) {
            return None;
        }
        let value = match (self.up == 0.0, self.down == 0.0) {
            (true, true) => 50.0,
            (false, true) => 100.0,
            _ => 100.0 - 100.0 / (1.0 + self.up / self.down),
        };
        Some(value)
    }
}

/// RSI series for `closes`; element `i` belongs to `closes[i + period]`.
///
/// Empty when `period` is zero or there are fewer than `period + 1` closes.
/// A non-finite move ends the series early, so a shorter-than-expected
/// result means the tail is undefined.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }

    let moves: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed_moves, rest) = moves.split_at(period);

    // f64::max drops NaN, so the seed window is checked up front.
    if seed_moves.iter().any(|m| !m.is_finite()) {
        return Vec::new();
    }

    let mut avg = WilderAverages::seed(seed_moves);
    let mut out = Vec::with_capacity(rest.len() + 1);
    let Some(first) = avg.rsi() else {
        return out;
    };
    out.push(first);

    for &delta in rest {
        if !delta.is_finite() {
            break;
        }
        avg.step(delta);
        match avg.rsi() {
            Some(value) => out.push(value),
            None => break,
        }
    }

    out
}

/// RSI at the most recent close, or `None` if the series does not reach it.
pub fn latest_rsi(closes: &[f64], period: usize) -> Option<f64> {
    let series = calculate_rsi(closes, period);
    if series.len() + period != closes.len() {
        return None;
    }
    series.last().copied()
}
