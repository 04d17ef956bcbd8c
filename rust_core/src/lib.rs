//! Pricewatch Core - periodic crypto price tracking and change classification.
//!
//! This crate provides:
//! - Concurrent per-asset price snapshots with staleness filtering
//! - Three-way change classification (Up / Down / Suppressed)
//! - The prime-then-poll tracking loop with cooperative shutdown
//! - CoinGecko and static asset catalog collaborators
//! - Console display sink

pub mod classifier;
pub mod clients;
pub mod display;
pub mod error;
pub mod shutdown;
pub mod snapshot;
pub mod tracker;
pub mod types;

pub use classifier::{classify, percent_change, Thresholds};
pub use clients::{AssetCatalog, CoinGeckoClient, CoinGeckoConfig, PriceSource, StaticCatalog};
pub use display::{ConsoleDisplay, DisplaySink};
pub use error::{CatalogError, ConfigError, DisplayError, PriceSourceError, TrackerError};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use snapshot::{OmitReason, SnapshotBuilder, SnapshotReport};
pub use tracker::{PriceTracker, TrackerSettings, TrackerState, TrackerStats};
pub use types::*;
