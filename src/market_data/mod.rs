pub mod price_series;
pub mod provider;
pub mod yahoo;

// Re-export the core series types (e.g. `use crate::market_data::PriceSeries`).
pub use price_series::{PricePoint, PriceSeries, PriceSeriesError};
pub use provider::{DirectoryProvider, MarketDataProvider};
pub use yahoo::YahooClient;
