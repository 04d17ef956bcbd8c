//! Price Source and Asset Catalog Traits
//!
//! Defines the interfaces the tracker needs from its collaborators.
//! Implementations include the CoinGecko HTTP client and the static
//! offline catalog.

use crate::error::{CatalogError, PriceSourceError};
use crate::types::{Asset, PriceObservation, PriceQuery};
use async_trait::async_trait;

/// Source of current asset prices
///
/// Implementations must be Send + Sync so per-asset fetches can run
/// concurrently against a shared instance.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Get the provider's display name (e.g., "CoinGecko")
    fn provider_name(&self) -> &str;

    /// Fetch the current price for one asset
    ///
    /// # Returns
    /// * `Ok(PriceObservation)` - price in `query.currency`, plus the provider's
    ///   last-update timestamp when `query.include_last_updated` is set
    /// * `Err` - transport, status, decode or missing-field failure for this asset
    async fn fetch_price(&self, query: &PriceQuery) -> Result<PriceObservation, PriceSourceError>;
}

/// Ordered list of trackable assets
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn list_assets(&self) -> Result<Vec<Asset>, CatalogError>;
}
