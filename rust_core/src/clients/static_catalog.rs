//! Offline asset catalog
//!
//! Answers catalog requests from an in-process list. Used in restricted mode
//! where fetching the full coin list from the API is not allowed.

use super::crypto_price::AssetCatalog;
use crate::error::CatalogError;
use crate::types::Asset;
use async_trait::async_trait;

pub struct StaticCatalog {
    assets: Vec<Asset>,
}

impl StaticCatalog {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    /// The five default tracked coins
    pub fn default_assets() -> Vec<Asset> {
        vec![
            Asset::new("bitcoin", "btc", "Bitcoin"),
            Asset::new("ethereum", "eth", "Ethereum"),
            Asset::new("ripple", "xrp", "XRP"),
            Asset::new("tether", "usdt", "Tether"),
            Asset::new("solana", "sol", "Solana"),
        ]
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(Self::default_assets())
    }
}

#[async_trait]
impl AssetCatalog for StaticCatalog {
    async fn list_assets(&self) -> Result<Vec<Asset>, CatalogError> {
        Ok(self.assets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_catalog_order() {
        let catalog = StaticCatalog::default();
        let assets = catalog.list_assets().await.unwrap();

        let ids: Vec<&str> = assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "ethereum", "ripple", "tether", "solana"]);
        assert_eq!(assets[2].symbol, "xrp");
        assert_eq!(assets[3].name, "Tether");
    }
}
