//! Price Tracker: the poll-fetch-diff-classify loop
//!
//! Lifecycle:
//! - Priming: fetch the catalog and seed the price history from an
//!   unfiltered snapshot. A catalog failure here is fatal.
//! - Polling: every interval, build a fresh-only snapshot, diff it against
//!   history, display reportable changes and advance history. A failed
//!   round is logged and the loop carries on.
//!
//! History updates of a round are staged and applied only once the round's
//! display calls have all succeeded, so an aborted round leaves history as
//! it was.

use crate::classifier::{percent_change, Thresholds};
use crate::clients::AssetCatalog;
use crate::display::DisplaySink;
use crate::error::{ConfigError, TrackerError};
use crate::shutdown::Shutdown;
use crate::snapshot::SnapshotBuilder;
use crate::types::{now_unix, ClassifiedChange, PriceHistory, PriceSnapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Time between polling rounds
    pub interval: Duration,
    /// Maximum provider timestamp age accepted while polling
    pub freshness_window_secs: i64,
    /// Only the first `max_assets` catalog entries are tracked
    pub max_assets: usize,
    pub thresholds: Thresholds,
    /// Log a stats line every N rounds (0 disables)
    pub stats_every_rounds: u64,
}

impl TrackerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::NotPositive("interval"));
        }
        if self.max_assets == 0 {
            return Err(ConfigError::NotPositive("max_assets"));
        }
        if self.freshness_window_secs <= 0 {
            return Err(ConfigError::NotPositive("freshness_window_secs"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Priming,
    Polling,
}

#[derive(Debug, Default)]
pub struct TrackerStats {
    pub rounds_completed: AtomicU64,
    pub rounds_failed: AtomicU64,
    pub changes_reported: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub stale_omissions: AtomicU64,
}

impl TrackerStats {
    pub fn snapshot(&self) -> TrackerStatsSnapshot {
        TrackerStatsSnapshot {
            rounds_completed: self.rounds_completed.load(Ordering::Relaxed),
            rounds_failed: self.rounds_failed.load(Ordering::Relaxed),
            changes_reported: self.changes_reported.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            stale_omissions: self.stale_omissions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerStatsSnapshot {
    pub rounds_completed: u64,
    pub rounds_failed: u64,
    pub changes_reported: u64,
    pub fetch_failures: u64,
    pub stale_omissions: u64,
}

/// Changes to report and history entries to advance for one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundDiff {
    pub changes: Vec<ClassifiedChange>,
    pub updates: Vec<(String, f64)>,
}

/// Diff a snapshot against history.
///
/// Only assets present in both are considered; every one of them gets a
/// history update whether or not its change is reportable. Output is ordered
/// by asset id.
pub fn diff_snapshot(
    history: &PriceHistory,
    snapshot: &PriceSnapshot,
    thresholds: &Thresholds,
) -> RoundDiff {
    let mut ids: Vec<&String> = snapshot.keys().collect();
    ids.sort();

    let mut diff = RoundDiff::default();
    for asset_id in ids {
        let Some(previous) = history.get(asset_id) else {
            continue; // no baseline yet
        };
        let current = snapshot[asset_id];
        let pct = percent_change(previous, current);
        let classification = thresholds.classify(pct);

        if classification.is_reportable() {
            diff.changes.push(ClassifiedChange {
                asset_id: asset_id.clone(),
                previous_price: previous,
                current_price: current,
                percent_change: pct,
                classification,
            });
        }
        diff.updates.push((asset_id.clone(), current));
    }
    diff
}

/// Result of one completed polling round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub round: u64,
    pub changes: Vec<ClassifiedChange>,
    pub history_updates: usize,
    pub fetch_failures: usize,
    pub stale_omissions: usize,
}

pub struct PriceTracker {
    catalog: Arc<dyn AssetCatalog>,
    builder: SnapshotBuilder,
    display: Box<dyn DisplaySink>,
    settings: TrackerSettings,
    history: PriceHistory,
    state: TrackerState,
    stats: Arc<TrackerStats>,
    round: u64,
}

impl PriceTracker {
    pub fn new(
        catalog: Arc<dyn AssetCatalog>,
        builder: SnapshotBuilder,
        display: Box<dyn DisplaySink>,
        settings: TrackerSettings,
    ) -> Result<Self, TrackerError> {
        settings.validate()?;
        if builder.currency().is_empty() {
            return Err(ConfigError::EmptyCurrency.into());
        }

        Ok(Self {
            catalog,
            builder,
            display,
            settings,
            history: PriceHistory::new(),
            state: TrackerState::Priming,
            stats: Arc::new(TrackerStats::default()),
            round: 0,
        })
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn stats(&self) -> Arc<TrackerStats> {
        self.stats.clone()
    }

    /// Seed history from an unfiltered snapshot. Returns the number of seeded assets.
    pub async fn prime(&mut self) -> Result<usize, TrackerError> {
        let assets = self.catalog.list_assets().await?;

        let snapshot = self
            .builder
            .build_snapshot(
                &assets,
                self.settings.max_assets,
                false,
                self.settings.freshness_window_secs,
                now_unix(),
            )
            .await;

        self.history.seed(&snapshot);

        info!(
            catalog = assets.len(),
            seeded = snapshot.len(),
            "Price history primed"
        );
        Ok(snapshot.len())
    }

    /// Run one polling round: fetch, diff, display, then advance history.
    pub async fn poll_round(&mut self) -> Result<RoundSummary, TrackerError> {
        self.state = TrackerState::Polling;
        self.round += 1;
        let round = self.round;

        let assets = self.catalog.list_assets().await?;
        let report = self
            .builder
            .build_report(
                &assets,
                self.settings.max_assets,
                true,
                self.settings.freshness_window_secs,
                now_unix(),
            )
            .await;

        let fetch_failures = report.failed_count();
        let stale_omissions = report.stale_count();
        self.stats
            .fetch_failures
            .fetch_add(fetch_failures as u64, Ordering::Relaxed);
        self.stats
            .stale_omissions
            .fetch_add(stale_omissions as u64, Ordering::Relaxed);

        let diff = diff_snapshot(&self.history, &report.snapshot, &self.settings.thresholds);

        for change in &diff.changes {
            debug!(
                round,
                asset_id = %change.asset_id,
                previous = change.previous_price,
                current = change.current_price,
                pct = change.percent_change,
                classification = %change.classification,
                "Reportable price change"
            );
            self.display.display(
                &change.asset_id,
                change.classification,
                change.current_price,
                change.percent_change,
            )?;
        }

        let history_updates = diff.updates.len();
        for (asset_id, price) in &diff.updates {
            self.history.record(asset_id, *price);
        }

        self.stats
            .changes_reported
            .fetch_add(diff.changes.len() as u64, Ordering::Relaxed);

        Ok(RoundSummary {
            round,
            changes: diff.changes,
            history_updates,
            fetch_failures,
            stale_omissions,
        })
    }

    /// Prime, then poll at the configured interval until `shutdown` fires.
    ///
    /// Only a catalog failure while priming is returned as an error.
    pub async fn run(&mut self, mut shutdown: Shutdown) -> Result<(), TrackerError> {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            freshness_window_secs = self.settings.freshness_window_secs,
            max_assets = self.settings.max_assets,
            min_threshold = self.settings.thresholds.min(),
            max_threshold = self.settings.thresholds.max(),
            "Starting price tracker"
        );

        if shutdown.is_triggered() {
            return Ok(());
        }

        let primed = tokio::select! {
            biased;
            _ = shutdown.wait() => None,
            res = self.prime() => Some(res),
        };
        match primed {
            Some(res) => {
                res?;
            }
            None => {
                info!("Shutdown requested while priming");
                return Ok(());
            }
        }

        let mut ticker = interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; the next one is a full interval after priming
        ticker.tick().await;

        loop {
            let stop = tokio::select! {
                biased;
                _ = shutdown.wait() => true,
                _ = ticker.tick() => false,
            };
            if stop {
                break;
            }

            let outcome = tokio::select! {
                biased;
                _ = shutdown.wait() => None,
                res = self.poll_round() => Some(res),
            };

            match outcome {
                None => {
                    info!(round = self.round, "Shutdown requested mid-round, discarding round");
                    break;
                }
                Some(Ok(summary)) => {
                    self.stats.rounds_completed.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        round = summary.round,
                        reported = summary.changes.len(),
                        updated = summary.history_updates,
                        failed = summary.fetch_failures,
                        stale = summary.stale_omissions,
                        "Round complete"
                    );
                    if summary.fetch_failures > 0 {
                        warn!(
                            round = summary.round,
                            failed = summary.fetch_failures,
                            "Some assets could not be fetched this round"
                        );
                    }
                }
                Some(Err(e)) => {
                    self.stats.rounds_failed.fetch_add(1, Ordering::Relaxed);
                    error!(round = self.round, error = %e, "Error during update round");
                }
            }

            let every = self.settings.stats_every_rounds;
            if every > 0 && self.round % every == 0 {
                self.log_stats();
            }
        }

        self.log_stats();
        info!("Price tracker stopped");
        Ok(())
    }

    fn log_stats(&self) {
        let s = self.stats.snapshot();
        info!(
            rounds = s.rounds_completed,
            failed_rounds = s.rounds_failed,
            reported = s.changes_reported,
            fetch_failures = s.fetch_failures,
            stale = s.stale_omissions,
            tracked = self.history.len(),
            "Price tracker stats"
        );
    }
}
