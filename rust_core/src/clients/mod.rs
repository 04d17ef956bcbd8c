pub mod coingecko;
pub mod crypto_price;
pub mod static_catalog;

// Re-export commonly used types
pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use crypto_price::{AssetCatalog, PriceSource};
pub use static_catalog::StaticCatalog;
