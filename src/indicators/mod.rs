// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator functions over a read-only price series.
// Series functions return `Vec<f64>`, "latest" helpers return `Option<f64>` so
// callers must handle warm-up shortfalls and non-finite inputs.

pub mod atr;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod snapshot;

pub use snapshot::{compute_snapshot, IndicatorSnapshot};
