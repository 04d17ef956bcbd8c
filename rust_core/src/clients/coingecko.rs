//! CoinGecko API Client
//!
//! Fetches spot prices from the `/simple/price` endpoint and the full coin
//! list from `/coins/list`. An API key, when configured, is attached to every
//! request as a header.

use super::crypto_price::{AssetCatalog, PriceSource};
use crate::error::{CatalogError, PriceSourceError};
use crate::types::{Asset, PriceObservation, PriceQuery};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_API_KEY_HEADER: &str = "x-cg-pro-api-key";
const LAST_UPDATED_FIELD: &str = "last_updated_at";

/// Connection settings for [`CoinGeckoClient`]
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_header: String,
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// CoinGecko HTTP client
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_key_header: String,
}

/// `/simple/price` response: asset id -> { currency or attribute -> value }
type SimplePriceResponse = HashMap<String, Map<String, Value>>;

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Result<Self, PriceSourceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("Pricewatch/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            api_key_header: config.api_key_header,
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.get(url);
        match &self.api_key {
            Some(key) => request.header(self.api_key_header.as_str(), key.as_str()),
            None => request,
        }
    }

    /// Query parameters for `/simple/price`
    fn price_params(query: &PriceQuery) -> Vec<(&'static str, String)> {
        vec![
            ("ids", query.asset_id.clone()),
            ("vs_currencies", query.currency.clone()),
            ("include_24hr_vol", query.include_volume.to_string()),
            ("include_24hr_change", query.include_change.to_string()),
            ("include_last_updated_at", query.include_last_updated.to_string()),
        ]
    }
}

/// Extract one asset's price (and timestamp, if requested) from a `/simple/price` body
pub fn parse_simple_price(body: &str, query: &PriceQuery) -> Result<PriceObservation, PriceSourceError> {
    let mut response: SimplePriceResponse = serde_json::from_str(body)?;

    let missing = |field: &str| PriceSourceError::MissingField {
        asset_id: query.asset_id.clone(),
        field: field.to_string(),
    };

    let fields = response
        .remove(&query.asset_id)
        .ok_or_else(|| missing(&query.asset_id))?;

    let price = fields
        .get(&query.currency)
        .and_then(Value::as_f64)
        .ok_or_else(|| missing(&query.currency))?;

    let observed_at = if query.include_last_updated {
        let ts = fields
            .get(LAST_UPDATED_FIELD)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .ok_or_else(|| missing(LAST_UPDATED_FIELD))?;
        Some(ts)
    } else {
        None
    };

    Ok(PriceObservation {
        asset_id: query.asset_id.clone(),
        price,
        observed_at,
    })
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    fn provider_name(&self) -> &str {
        "CoinGecko"
    }

    async fn fetch_price(&self, query: &PriceQuery) -> Result<PriceObservation, PriceSourceError> {
        debug!(asset_id = %query.asset_id, currency = %query.currency, "Fetching price from CoinGecko");

        let response = self
            .get("/simple/price")
            .query(&Self::price_params(query))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PriceSourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_simple_price(&body, query)
    }
}

#[async_trait]
impl AssetCatalog for CoinGeckoClient {
    async fn list_assets(&self) -> Result<Vec<Asset>, CatalogError> {
        debug!("Fetching coin list from CoinGecko");

        let response = self.get("/coins/list").send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Entries are `{id, symbol, name}` objects
        let assets: Vec<Asset> = serde_json::from_str(&body)?;
        if assets.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(assets)
    }
}
