// =============================================================================
// Analysis — one price series in, one immutable result out
// =============================================================================
//
// Pipeline per instrument:
//   1. Indicator snapshot at the last bar (fails on short / unwarmed series)
//   2. BUY / SELL / HOLD classification
//   3. Resistance target over the trailing highs
//   4. Stop-loss, gain / risk and reward-to-risk ratio
//   5. K-Score
//
// Pure: no I/O, no clock, no shared state. The same series always yields the
// same result, so instruments can be analysed concurrently in any order.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::{compute_snapshot, IndicatorSnapshot};
use crate::market_data::PriceSeries;
use crate::resistance::detect_target;
use crate::risk::{plan_risk, RiskPlan};
use crate::runtime_config::AnalysisParams;
use crate::signals::{classify, compute_k_score, momentum_return, KScore, SignalConditions};
use crate::types::{Signal, Trend};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an instrument produced no result. Every variant means "skip this
/// instrument"; none of them is fatal to a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Fewer bars than the longest indicator window needs.
    InsufficientHistory { required: usize, available: usize },
    /// An indicator or input price has no finite value at the last bar.
    UndefinedIndicator(&'static str),
    /// The market-data provider failed or returned nothing usable.
    UpstreamDataFailure(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientHistory {
                required,
                available,
            } => write!(
                f,
                "insufficient history: {available} bars, need {required}"
            ),
            Self::UndefinedIndicator(name) => {
                write!(f, "indicator '{name}' is undefined at the latest bar")
            }
            Self::UpstreamDataFailure(msg) => write!(f, "upstream data failure: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}

// ---------------------------------------------------------------------------
// Result record
// ---------------------------------------------------------------------------

/// Everything the scanner knows about one instrument after one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    /// Timestamp of the bar the result describes.
    pub as_of: DateTime<Utc>,
    pub last_price: f64,
    pub daily_change_pct: f64,
    /// Fractional return over the classifier's short look-back.
    pub trailing_return: f64,
    pub indicators: IndicatorSnapshot,
    pub signal: Signal,
    pub conditions: SignalConditions,
    pub trend: Trend,
    pub risk: RiskPlan,
    pub k_score: KScore,
}

impl AnalysisResult {
    pub fn score(&self) -> f64 {
        self.k_score.total
    }

    pub fn stop_loss(&self) -> f64 {
        self.risk.stop_loss
    }

    pub fn target(&self) -> f64 {
        self.risk.target.price
    }

    pub fn risk_reward_ratio(&self) -> Option<f64> {
        self.risk.risk_reward_ratio
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Analyse `series` with the default thresholds.
pub fn analyze(series: &PriceSeries) -> Result<AnalysisResult, AnalysisError> {
    analyze_with(series, &AnalysisParams::default())
}

/// Analyse `series` with explicit thresholds.
pub fn analyze_with(
    series: &PriceSeries,
    params: &AnalysisParams,
) -> Result<AnalysisResult, AnalysisError> {
    let indicators = compute_snapshot(series, params)?;

    let points = series.points();
    let (last, prev) = match points {
        [.., prev, last] => (last, prev),
        _ => {
            return Err(AnalysisError::InsufficientHistory {
                required: params.min_history.max(2),
                available: points.len(),
            })
        }
    };

    let close = last.close;
    if !(close.is_finite() && close > 0.0) {
        return Err(AnalysisError::UndefinedIndicator("close"));
    }
    if !(prev.close.is_finite() && prev.close > 0.0) {
        return Err(AnalysisError::UndefinedIndicator("previous_close"));
    }
    let daily_change_pct = (close - prev.close) / prev.close * 100.0;

    let closes = series.closes();

    // `return_lookback` bars back is index len - 1 - lookback.
    let trailing_return = momentum_return(&closes, params.return_lookback + 1)
        .ok_or(AnalysisError::UndefinedIndicator("trailing_return"))?;

    let (signal, conditions) = classify(&indicators, close, trailing_return, params);

    let highs = series.trailing_highs(params.resistance_lookback);
    let target = detect_target(&highs, close, params.fallback_target_multiplier);
    let risk = plan_risk(close, indicators.atr, params.atr_stop_multiplier, target);

    let momentum = momentum_return(&closes, params.momentum_lookback)
        .ok_or(AnalysisError::UndefinedIndicator("momentum"))?;
    let k_score = compute_k_score(&indicators, close, momentum, signal, &params.k_score);

    Ok(AnalysisResult {
        symbol: series.symbol().to_string(),
        as_of: last.timestamp,
        last_price: close,
        daily_change_pct,
        trailing_return,
        indicators,
        signal,
        conditions,
        trend: Trend::from_close_and_sma(close, indicators.sma_long),
        risk,
        k_score,
    })
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::market_data::PricePoint;
    use crate::resistance::TargetSource;
    use chrono::TimeZone;

    /// Build a series from closes with a fixed ±`half_range` high/low band.
    pub(crate) fn series_with_band(symbol: &str, closes: &[f64], half_range: f64) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap();
                PricePoint::new(ts, c, c + half_range, c - half_range, c, 10_000.0)
            })
            .collect();
        PriceSeries::new(symbol, points).unwrap()
    }

    /// Zig-zag uptrend: alternating +1.0 / -0.9 moves ending on an up move.
    /// RSI settles in the low 50s while the trend stays positive.
    pub(crate) fn zigzag_uptrend(len: usize) -> Vec<f64> {
        let mut closes = Vec::with_capacity(len);
        let mut price = 100.0;
        // Start so that the last delta is an up move.
        let first_up = len % 2 == 0;
        for i in 0..len {
            if i > 0 {
                let up = (i % 2 == 1) == first_up;
                price += if up { 1.0 } else { -0.9 };
            }
            closes.push(price);
        }
        closes
    }

    #[test]
    fn forty_nine_points_is_insufficient() {
        let series = series_with_band("X", &vec![100.0; 49], 0.0);
        assert_eq!(
            analyze(&series).unwrap_err(),
            AnalysisError::InsufficientHistory {
                required: 50,
                available: 49
            }
        );
    }

    #[test]
    fn fifty_points_succeeds() {
        let series = series_with_band("X", &zigzag_uptrend(50), 0.05);
        let result = analyze(&series).unwrap();
        assert_eq!(result.symbol, "X");
        assert_eq!(result.as_of, series.last().unwrap().timestamp);
    }

    #[test]
    fn empty_series_is_insufficient() {
        let series = PriceSeries::new("EMPTY", Vec::new()).unwrap();
        assert!(matches!(
            analyze(&series),
            Err(AnalysisError::InsufficientHistory { available: 0, .. })
        ));
    }

    #[test]
    fn analysis_is_deterministic() {
        let series = series_with_band("DET", &zigzag_uptrend(120), 0.5);
        assert_eq!(analyze(&series).unwrap(), analyze(&series).unwrap());
    }

    #[test]
    fn zigzag_uptrend_is_buy() {
        let series = series_with_band("UP", &zigzag_uptrend(120), 0.05);
        let result = analyze(&series).unwrap();

        assert!(
            result.indicators.rsi > 40.0 && result.indicators.rsi < 55.0,
            "rsi {}",
            result.indicators.rsi
        );
        assert!(result.indicators.ema_bullish());
        assert_eq!(result.signal, Signal::Buy, "conditions {:?}", result.conditions);
        assert_eq!(result.trend, Trend::Bullish);
        assert!(result.score() > 0.0, "k_score {}", result.score());
        let ratio = result.risk_reward_ratio().expect("ratio should be defined");
        assert!(ratio > 0.0);
        assert!(result.stop_loss() < result.last_price);
        assert!(result.target() > result.last_price);
        // Every earlier zig-zag peak sits below the latest close.
        assert_eq!(result.risk.target.source, TargetSource::Fallback);
    }

    #[test]
    fn flat_series_is_hold_without_ratio() {
        let series = series_with_band("FLAT", &vec![100.0; 60], 0.0);
        let result = analyze(&series).unwrap();

        assert!((result.indicators.rsi - 50.0).abs() < 1e-9);
        assert!((result.indicators.sma_short - 100.0).abs() < 1e-9);
        assert!((result.indicators.sma_long - 100.0).abs() < 1e-9);
        assert!(result.indicators.atr.abs() < 1e-12);
        assert!((result.stop_loss() - 100.0).abs() < 1e-9);
        assert_eq!(result.risk_reward_ratio(), None);
        assert_eq!(result.signal, Signal::Hold);
        assert_eq!(result.risk.target.source, TargetSource::Fallback);
        assert!((result.target() - 108.0).abs() < 1e-9);
        assert!(result.daily_change_pct.abs() < 1e-12);
    }

    #[test]
    fn overbought_rally_is_sell() {
        // Straight-line rally: RSI pinned at 100, trend otherwise bullish.
        let closes: Vec<f64> = (0..80).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let result = analyze(&series_with_band("HOT", &closes, 0.5)).unwrap();
        assert!(result.indicators.rsi > 75.0);
        assert!(result.conditions.above_sma_short && result.conditions.ema_bullish);
        assert_eq!(result.signal, Signal::Sell);
        // RSI > 65 penalty drives the score negative.
        assert!(result.score() < 0.0);
    }

    #[test]
    fn sharp_drop_below_both_smas_is_sell() {
        let mut closes = vec![100.0; 70];
        for (k, c) in closes.iter_mut().rev().take(5).enumerate() {
            *c = 80.0 + k as f64; // last five bars fall to 80
        }
        let result = analyze(&series_with_band("DROP", &closes, 0.5)).unwrap();
        assert!(result.conditions.below_both_smas);
        assert_eq!(result.signal, Signal::Sell);
        assert_eq!(result.trend, Trend::Bearish);
    }

    /// Flat closes at 100 with a ±0.5 band, plus single-bar spikes in the
    /// highs at the given `(index, high)` positions.
    fn flat_with_spikes(len: usize, spikes: &[(usize, f64)]) -> PriceSeries {
        let points = (0..len)
            .map(|i| {
                let ts = Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap();
                let high = spikes
                    .iter()
                    .find(|(at, _)| *at == i)
                    .map_or(100.5, |(_, h)| *h);
                PricePoint::new(ts, 100.0, high, 99.5, 100.0, 10_000.0)
            })
            .collect();
        PriceSeries::new("PEAKS", points).unwrap()
    }

    #[test]
    fn resistance_peak_inside_window_is_target() {
        // Bar 10 is outside the trailing 60 bars (70..130); bar 100 is inside.
        let series = flat_with_spikes(130, &[(10, 150.0), (100, 120.0)]);
        let result = analyze(&series).unwrap();

        assert_eq!(result.risk.target.source, TargetSource::Resistance);
        assert!((result.target() - 120.0).abs() < 1e-10, "target {}", result.target());
        assert!((result.risk.potential_gain - 20.0).abs() < 1e-10);
        assert!(result.risk_reward_ratio().is_some());
    }

    #[test]
    fn peaks_older_than_window_are_ignored() {
        // The nearer ceiling at 110 sits outside the window, so 120 wins.
        let series = flat_with_spikes(130, &[(10, 110.0), (100, 120.0)]);
        let result = analyze(&series).unwrap();
        assert!((result.target() - 120.0).abs() < 1e-10, "target {}", result.target());

        // Widening the window to the whole series brings 110 back in.
        let wide = AnalysisParams {
            resistance_lookback: 130,
            ..AnalysisParams::default()
        };
        let result = analyze_with(&series, &wide).unwrap();
        assert_eq!(result.risk.target.source, TargetSource::Resistance);
        assert!((result.target() - 110.0).abs() < 1e-10, "target {}", result.target());
    }

    #[test]
    fn only_old_peaks_falls_back() {
        let series = flat_with_spikes(130, &[(10, 150.0)]);
        let result = analyze(&series).unwrap();
        assert_eq!(result.risk.target.source, TargetSource::Fallback);
        assert!((result.target() - 108.0).abs() < 1e-9);
    }

    #[test]
    fn nan_tail_is_undefined_indicator() {
        let mut closes = vec![100.0; 60];
        closes[59] = f64::NAN;
        let err = analyze(&series_with_band("NAN", &closes, 0.5)).unwrap_err();
        assert!(matches!(err, AnalysisError::UndefinedIndicator(_)));
    }

    #[test]
    fn custom_params_change_the_outcome() {
        let series = series_with_band("UP", &zigzag_uptrend(120), 0.05);
        let strict = AnalysisParams {
            buy_rsi_max: 40.0,
            ..AnalysisParams::default()
        };
        let result = analyze_with(&series, &strict).unwrap();
        assert_ne!(result.signal, Signal::Buy);
    }

    #[test]
    fn error_messages_are_readable() {
        let err = AnalysisError::InsufficientHistory {
            required: 50,
            available: 12,
        };
        assert_eq!(err.to_string(), "insufficient history: 12 bars, need 50");
        assert!(AnalysisError::UndefinedIndicator("rsi")
            .to_string()
            .contains("rsi"));
    }
}
