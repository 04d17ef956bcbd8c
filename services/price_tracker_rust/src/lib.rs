//! price_tracker_rust - polls crypto prices and prints significant moves

pub mod config;

pub use config::TrackerConfig;
