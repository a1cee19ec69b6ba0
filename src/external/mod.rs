pub mod price_provider;
pub mod yahoo;

pub use price_provider::{PriceBar, PriceHistory, PriceProvider, PriceProviderError};
pub use yahoo::YahooProvider;
