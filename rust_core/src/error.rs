//! Error taxonomy for the price tracker.
//!
//! Per-asset errors (`PriceSourceError`) never escape the snapshot builder.
//! Only catalog and configuration errors are allowed to stop the process.

use crate::types::Classification;
use thiserror::Error;

/// Failure of a single price request
#[derive(Error, Debug)]
pub enum PriceSourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price api returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode price response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing field '{field}' for asset {asset_id}")]
    MissingField { asset_id: String, field: String },
}

/// Failure to obtain the tracked-asset list
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog api returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode catalog: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("catalog is empty")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("thresholds must be non-negative (min={min}, max={max})")]
    NegativeThreshold { min: f64, max: f64 },

    #[error("noise floor must be below alert floor (min={min}, max={max})")]
    ThresholdOrder { min: f64, max: f64 },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("currency must not be empty")]
    EmptyCurrency,
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("classification '{0}' cannot be displayed")]
    Unreportable(Classification),

    #[error("display write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the tracking loop
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("failed to fetch asset catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("display failed: {0}")]
    Display(#[from] DisplayError),
}
