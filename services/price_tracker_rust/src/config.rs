//! Configuration for price_tracker_rust

use anyhow::{anyhow, Result};
use pricewatch_core::clients::coingecko::{DEFAULT_API_KEY_HEADER, DEFAULT_BASE_URL};
use pricewatch_core::{CoinGeckoConfig, ConsoleDisplay, Thresholds, TrackerSettings};
use std::env;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    // Polling
    pub refresh_interval_secs: u64,
    pub freshness_window_secs: u64,
    pub max_assets: usize,
    pub currency: String,

    // Classification, in percent
    pub min_change_pct: f64,
    pub alert_change_pct: f64,

    // Data source
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub api_key_header: String,
    pub http_timeout_secs: u64,
    pub offline: bool,

    // Monitoring
    pub stats_every_rounds: u64,
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup. Missing variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let refresh_interval_secs = parse_u64(&lookup, "PRICEWATCH_REFRESH_INTERVAL_SECS", 100)?;
        let freshness_window_secs =
            parse_u64(&lookup, "PRICEWATCH_FRESHNESS_WINDOW_SECS", refresh_interval_secs)?;
        let min_change_pct = parse_f64(&lookup, "PRICEWATCH_MIN_CHANGE_PCT", 0.001)?;
        let alert_change_pct = parse_f64(&lookup, "PRICEWATCH_ALERT_CHANGE_PCT", 0.01)?;
        let max_assets = parse_usize(&lookup, "PRICEWATCH_MAX_ASSETS", 5)?;
        let currency = lookup("PRICEWATCH_CURRENCY")
            .map(|c| c.trim().to_lowercase())
            .unwrap_or_else(|| "usd".to_string());

        // Validate
        if refresh_interval_secs == 0 {
            return Err(anyhow!("PRICEWATCH_REFRESH_INTERVAL_SECS must be > 0"));
        }
        if freshness_window_secs == 0 {
            return Err(anyhow!("PRICEWATCH_FRESHNESS_WINDOW_SECS must be > 0"));
        }
        if max_assets == 0 {
            return Err(anyhow!("PRICEWATCH_MAX_ASSETS must be > 0"));
        }
        if currency.is_empty() {
            return Err(anyhow!("PRICEWATCH_CURRENCY must not be empty"));
        }
        if min_change_pct < 0.0 || alert_change_pct < 0.0 {
            return Err(anyhow!(
                "PRICEWATCH_MIN_CHANGE_PCT and PRICEWATCH_ALERT_CHANGE_PCT must be >= 0"
            ));
        }
        if min_change_pct >= alert_change_pct {
            return Err(anyhow!(
                "PRICEWATCH_MIN_CHANGE_PCT must be < PRICEWATCH_ALERT_CHANGE_PCT"
            ));
        }

        Ok(Self {
            refresh_interval_secs,
            freshness_window_secs,
            max_assets,
            currency,

            min_change_pct,
            alert_change_pct,

            api_base_url: lookup("PRICEWATCH_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: lookup("PRICEWATCH_API_KEY")
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            api_key_header: lookup("PRICEWATCH_API_KEY_HEADER")
                .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
            http_timeout_secs: parse_u64(&lookup, "PRICEWATCH_HTTP_TIMEOUT_SECS", 30)?,
            offline: parse_bool(&lookup, "PRICEWATCH_OFFLINE", true)?,

            stats_every_rounds: parse_u64(&lookup, "PRICEWATCH_STATS_EVERY_ROUNDS", 12)?,
        })
    }

    pub fn thresholds(&self) -> Result<Thresholds> {
        Ok(Thresholds::new(self.min_change_pct, self.alert_change_pct)?)
    }

    pub fn tracker_settings(&self) -> Result<TrackerSettings> {
        Ok(TrackerSettings {
            interval: Duration::from_secs(self.refresh_interval_secs),
            freshness_window_secs: i64::try_from(self.freshness_window_secs)
                .map_err(|_| anyhow!("PRICEWATCH_FRESHNESS_WINDOW_SECS is too large"))?,
            max_assets: self.max_assets,
            thresholds: self.thresholds()?,
            stats_every_rounds: self.stats_every_rounds,
        })
    }

    /// Console sink labelling prices with the configured currency
    pub fn console_display<W: Write + Send>(&self, out: W, colored: bool) -> ConsoleDisplay<W> {
        ConsoleDisplay::with_writer(out, &self.currency, colored)
    }

    pub fn coingecko_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url: self.api_base_url.clone(),
            api_key: self.api_key.clone(),
            api_key_header: self.api_key_header.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }
}

/// Parse variable as f64 with default fallback
fn parse_f64<F: Fn(&str) -> Option<String>>(lookup: &F, var_name: &str, default: f64) -> Result<f64> {
    match lookup(var_name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid f64", var_name)),
        None => Ok(default),
    }
}

/// Parse variable as u64 with default fallback
fn parse_u64<F: Fn(&str) -> Option<String>>(lookup: &F, var_name: &str, default: u64) -> Result<u64> {
    match lookup(var_name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        None => Ok(default),
    }
}

/// Parse variable as usize with default fallback
fn parse_usize<F: Fn(&str) -> Option<String>>(lookup: &F, var_name: &str, default: usize) -> Result<usize> {
    match lookup(var_name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid usize", var_name)),
        None => Ok(default),
    }
}

/// Parse variable as bool (`true`/`false`, any case) with default fallback
fn parse_bool<F: Fn(&str) -> Option<String>>(lookup: &F, var_name: &str, default: bool) -> Result<bool> {
    match lookup(var_name) {
        Some(val) => val
            .trim()
            .to_lowercase()
            .parse()
            .map_err(|_| anyhow!("{} must be true or false", var_name)),
        None => Ok(default),
    }
}
