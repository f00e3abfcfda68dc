use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl PricePoint {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Rejection reasons for a malformed series.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceSeriesError {
    /// `points[index]` is not strictly after `points[index - 1]`.
    NotIncreasing { index: usize },
}

impl std::fmt::Display for PriceSeriesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotIncreasing { index } => write!(
                f,
                "timestamp at index {index} is not strictly after its predecessor"
            ),
        }
    }
}

impl std::error::Error for PriceSeriesError {}

// ---------------------------------------------------------------------------
// PriceSeries -- time-ordered, read-only bars for one instrument
// ---------------------------------------------------------------------------

/// Time-ordered bars for one instrument (oldest first).
///
/// Timestamps are strictly increasing; this is checked once at construction
/// and the points are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        points: Vec<PricePoint>,
    ) -> Result<Self, PriceSeriesError> {
        if let Some(i) = points
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(PriceSeriesError::NotIncreasing { index: i + 1 });
        }
        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    /// Build a series from bars in arbitrary order: sorts by timestamp and
    /// keeps the last bar seen for any duplicated timestamp.
    pub fn from_unordered(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.timestamp == p.timestamp => *last = p,
                _ => deduped.push(p),
            }
        }
        Self {
            symbol: symbol.into(),
            points: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Closing prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// The most recent `count` highs (oldest first).
    pub fn trailing_highs(&self, count: usize) -> Vec<f64> {
        let start = self.points.len().saturating_sub(count);
        self.points[start..].iter().map(|p| p.high).collect()
    }
}
