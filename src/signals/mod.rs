// =============================================================================
// Signals Module
// =============================================================================
//
// Per-instrument decision logic:
// - Rule-based BUY / SELL / HOLD classification
// - K-Score composite ranking index

pub mod classifier;
pub mod k_score;

pub use classifier::{classify, SignalConditions};
pub use k_score::{compute_k_score, momentum_return, KScore, ScoreComponent};
