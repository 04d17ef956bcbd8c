//! Core data model for price polling and change detection.

use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// A tracked tradable item (identity is `id`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

impl Asset {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Parameters for a single price lookup, built per fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceQuery {
    pub asset_id: String,
    pub currency: String,
    pub include_volume: bool,
    pub include_change: bool,
    pub include_last_updated: bool,
}

impl PriceQuery {
    /// Query for the asset's price only
    pub fn new(asset_id: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            currency: currency.into(),
            include_volume: false,
            include_change: false,
            include_last_updated: false,
        }
    }

    pub fn with_last_updated(mut self, include: bool) -> Self {
        self.include_last_updated = include;
        self
    }
}

/// Result of one successful price fetch
#[derive(Clone, Debug, PartialEq)]
pub struct PriceObservation {
    pub asset_id: String,
    pub price: f64,
    /// Provider-reported last update (unix seconds)
    pub observed_at: Option<i64>,
}

impl PriceObservation {
    /// Seconds between `observed_at` and `now`.
    ///
    /// `None` when no timestamp was reported or the difference overflows.
    pub fn age_secs(&self, now: i64) -> Option<i64> {
        self.observed_at.and_then(|ts| now.checked_sub(ts))
    }
}

/// Current prices after one polling round: asset id -> price
pub type PriceSnapshot = HashMap<String, f64>;

/// Last accepted price per asset.
///
/// Owned by the tracking loop. Entries are only ever inserted or overwritten,
/// never removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceHistory {
    prices: HashMap<String, f64>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every entry from a snapshot, overwriting anything present
    pub fn seed(&mut self, snapshot: &PriceSnapshot) {
        for (asset_id, price) in snapshot {
            self.prices.insert(asset_id.clone(), *price);
        }
    }

    pub fn get(&self, asset_id: &str) -> Option<f64> {
        self.prices.get(asset_id).copied()
    }

    /// Record the latest accepted price for an asset
    pub fn record(&mut self, asset_id: &str, price: f64) {
        match self.prices.get_mut(asset_id) {
            Some(slot) => *slot = price,
            None => {
                self.prices.insert(asset_id.to_string(), price);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<String, f64> {
        &self.prices
    }
}

/// Classification of a percentage price move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    Up,
    Down,
    Suppressed,
}

impl Classification {
    /// Whether this change should reach the display sink
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Classification::Suppressed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Up => "up",
            Classification::Down => "down",
            Classification::Suppressed => "suppressed",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reportable change detected in one round
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedChange {
    pub asset_id: String,
    pub previous_price: f64,
    pub current_price: f64,
    pub percent_change: f64,
    pub classification: Classification,
}

/// Current wall-clock time in unix seconds
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
