//! Snapshot Builder
//!
//! Fans out one price query per tracked asset, waits for all of them, and
//! keeps the prices that were fetched successfully and (optionally) are
//! fresh. A failure for one asset only removes that asset from the snapshot.

use crate::clients::PriceSource;
use crate::types::{Asset, PriceObservation, PriceQuery, PriceSnapshot};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why an asset is missing from a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum OmitReason {
    /// Transport, protocol or decode failure
    Failed(String),
    /// Provider timestamp older than the freshness window
    Stale { age_secs: i64 },
}

/// Outcome of fetching one asset
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Accepted(PriceObservation),
    Omitted { asset_id: String, reason: OmitReason },
}

/// Snapshot plus the assets left out of it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotReport {
    pub snapshot: PriceSnapshot,
    pub omitted: Vec<(String, OmitReason)>,
}

impl SnapshotReport {
    pub fn failed_count(&self) -> usize {
        self.omitted
            .iter()
            .filter(|(_, r)| matches!(r, OmitReason::Failed(_)))
            .count()
    }

    pub fn stale_count(&self) -> usize {
        self.omitted
            .iter()
            .filter(|(_, r)| matches!(r, OmitReason::Stale { .. }))
            .count()
    }
}

pub struct SnapshotBuilder {
    source: Arc<dyn PriceSource>,
    currency: String,
}

impl SnapshotBuilder {
    pub fn new(source: Arc<dyn PriceSource>, currency: impl Into<String>) -> Self {
        Self {
            source,
            currency: currency.into(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Fetch the first `max_count` assets concurrently and collect every outcome.
    ///
    /// `now` is the reference time (unix seconds) for the staleness check.
    pub async fn build_report(
        &self,
        assets: &[Asset],
        max_count: usize,
        require_fresh: bool,
        freshness_window_secs: i64,
        now: i64,
    ) -> SnapshotReport {
        let mut seen = HashSet::new();
        let tracked: Vec<&Asset> = assets
            .iter()
            .take(max_count)
            .filter(|asset| seen.insert(asset.id.clone()))
            .collect();

        let fetches = tracked
            .iter()
            .map(|asset| self.fetch_one(asset, require_fresh, freshness_window_secs, now));
        let outcomes = join_all(fetches).await;

        let mut report = SnapshotReport::default();
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Accepted(obs) => {
                    report.snapshot.insert(obs.asset_id, obs.price);
                }
                FetchOutcome::Omitted { asset_id, reason } => {
                    report.omitted.push((asset_id, reason));
                }
            }
        }

        debug!(
            provider = self.source.provider_name(),
            requested = tracked.len(),
            accepted = report.snapshot.len(),
            failed = report.failed_count(),
            stale = report.stale_count(),
            "Snapshot built"
        );

        report
    }

    /// Like [`build_report`](Self::build_report), returning only the prices
    pub async fn build_snapshot(
        &self,
        assets: &[Asset],
        max_count: usize,
        require_fresh: bool,
        freshness_window_secs: i64,
        now: i64,
    ) -> PriceSnapshot {
        self.build_report(assets, max_count, require_fresh, freshness_window_secs, now)
            .await
            .snapshot
    }

    async fn fetch_one(
        &self,
        asset: &Asset,
        require_fresh: bool,
        freshness_window_secs: i64,
        now: i64,
    ) -> FetchOutcome {
        let query = PriceQuery::new(asset.id.as_str(), self.currency.as_str())
            .with_last_updated(require_fresh);

        let omitted = |reason: OmitReason| FetchOutcome::Omitted {
            asset_id: asset.id.clone(),
            reason,
        };

        let obs = match self.source.fetch_price(&query).await {
            Ok(obs) => obs,
            Err(e) => {
                warn!(
                    provider = self.source.provider_name(),
                    asset_id = %asset.id,
                    error = %e,
                    "Failed to fetch price, omitting asset"
                );
                return omitted(OmitReason::Failed(e.to_string()));
            }
        };

        if obs.asset_id != asset.id {
            warn!(
                asset_id = %asset.id,
                returned = %obs.asset_id,
                "Price source answered for a different asset, omitting"
            );
            return omitted(OmitReason::Failed(format!(
                "response for unexpected asset {}",
                obs.asset_id
            )));
        }

        if require_fresh {
            match (obs.observed_at, obs.age_secs(now)) {
                (None, _) => {
                    warn!(asset_id = %asset.id, "Missing last-updated timestamp, omitting asset");
                    return omitted(OmitReason::Failed("missing last-updated timestamp".to_string()));
                }
                (Some(observed_at), None) => {
                    warn!(asset_id = %asset.id, observed_at, "Unusable last-updated timestamp, omitting asset");
                    return omitted(OmitReason::Failed(format!(
                        "unusable last-updated timestamp {}",
                        observed_at
                    )));
                }
                (Some(_), Some(age_secs)) if age_secs > freshness_window_secs => {
                    debug!(asset_id = %asset.id, age_secs, "Stale price, omitting asset");
                    return omitted(OmitReason::Stale { age_secs });
                }
                (Some(_), Some(_)) => {}
            }
        }

        FetchOutcome::Accepted(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PriceSourceError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const NOW: i64 = 1_700_000_000;

    /// Scripted source: asset id -> (price, observed_at); missing ids fail
    struct MockSource {
        prices: HashMap<String, (f64, Option<i64>)>,
        queries: Mutex<Vec<PriceQuery>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockSource {
        fn new(entries: &[(&str, f64, Option<i64>)]) -> Self {
            Self {
                prices: entries
                    .iter()
                    .map(|(id, p, ts)| (id.to_string(), (*p, *ts)))
                    .collect(),
                queries: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceSource for MockSource {
        fn provider_name(&self) -> &str {
            "mock"
        }

        async fn fetch_price(&self, query: &PriceQuery) -> Result<PriceObservation, PriceSourceError> {
            self.queries.lock().unwrap().push(query.clone());
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.prices.get(&query.asset_id) {
                Some((price, ts)) => Ok(PriceObservation {
                    asset_id: query.asset_id.clone(),
                    price: *price,
                    observed_at: *ts,
                }),
                None => Err(PriceSourceError::Status {
                    status: 500,
                    body: "boom".to_string(),
                }),
            }
        }
    }

    fn assets(ids: &[&str]) -> Vec<Asset> {
        ids.iter().map(|id| Asset::new(*id, *id, *id)).collect()
    }

    fn builder(source: MockSource) -> (SnapshotBuilder, Arc<MockSource>) {
        let source = Arc::new(source);
        (SnapshotBuilder::new(source.clone(), "usd"), source)
    }

    #[tokio::test]
    async fn test_truncates_to_max_count() {
        let (builder, source) = builder(MockSource::new(&[
            ("a", 1.0, None),
            ("b", 2.0, None),
            ("c", 3.0, None),
        ]));

        let snapshot = builder
            .build_snapshot(&assets(&["a", "b", "c"]), 2, false, 100, NOW)
            .await;

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("a") && snapshot.contains_key("b"));
        assert_eq!(source.queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_asset_is_omitted() {
        let (builder, _) = builder(MockSource::new(&[
            ("a", 1.0, None),
            ("c", 3.0, None),
        ]));

        let report = builder
            .build_report(&assets(&["a", "b", "c"]), 5, false, 100, NOW)
            .await;

        assert_eq!(report.snapshot.len(), 2);
        assert!(!report.snapshot.contains_key("b"));
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.omitted[0].0, "b");
    }

    #[tokio::test]
    async fn test_staleness_window() {
        let (builder, _) = builder(MockSource::new(&[
            ("old", 1.0, Some(NOW - 150)),
            ("new", 2.0, Some(NOW - 50)),
            ("edge", 3.0, Some(NOW - 100)),
        ]));

        let report = builder
            .build_report(&assets(&["old", "new", "edge"]), 5, true, 100, NOW)
            .await;

        assert!(!report.snapshot.contains_key("old"));
        assert_eq!(report.snapshot.get("new"), Some(&2.0));
        assert_eq!(report.snapshot.get("edge"), Some(&3.0));
        assert_eq!(
            report.omitted,
            vec![("old".to_string(), OmitReason::Stale { age_secs: 150 })]
        );
        assert_eq!(report.failed_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_prices_kept_when_freshness_not_required() {
        let (builder, source) = builder(MockSource::new(&[("old", 1.0, Some(NOW - 10_000))]));

        let snapshot = builder
            .build_snapshot(&assets(&["old"]), 5, false, 100, NOW)
            .await;

        assert_eq!(snapshot.get("old"), Some(&1.0));
        let queries = source.queries.lock().unwrap();
        assert!(!queries[0].include_last_updated);
        assert_eq!(queries[0].currency, "usd");
    }

    #[tokio::test]
    async fn test_missing_timestamp_when_fresh_required() {
        let (builder, source) = builder(MockSource::new(&[("a", 1.0, None)]));

        let report = builder
            .build_report(&assets(&["a"]), 5, true, 100, NOW)
            .await;

        assert!(report.snapshot.is_empty());
        assert_eq!(report.failed_count(), 1);
        assert!(source.queries.lock().unwrap()[0].include_last_updated);
    }

    #[tokio::test]
    async fn test_overflowing_timestamp_is_omitted() {
        let (builder, _) = builder(MockSource::new(&[
            ("garbled", 1.0, Some(i64::MIN)),
            ("fine", 2.0, Some(NOW - 10)),
        ]));

        let report = builder
            .build_report(&assets(&["garbled", "fine"]), 5, true, 100, NOW)
            .await;

        assert_eq!(report.snapshot.len(), 1);
        assert_eq!(report.snapshot.get("fine"), Some(&2.0));
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.omitted[0].0, "garbled");
    }

    #[tokio::test]
    async fn test_duplicate_ids_fetched_once() {
        let (builder, source) = builder(MockSource::new(&[("a", 1.0, None)]));

        let snapshot = builder
            .build_snapshot(&assets(&["a", "a"]), 5, false, 100, NOW)
            .await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(source.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let (builder, source) = builder(MockSource::new(&[
            ("a", 1.0, None),
            ("b", 2.0, None),
            ("c", 3.0, None),
        ]));

        builder
            .build_snapshot(&assets(&["a", "b", "c"]), 5, false, 100, NOW)
            .await;

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let (builder, _) = builder(MockSource::new(&[]));
        let report = builder.build_report(&[], 5, true, 100, NOW).await;
        assert_eq!(report, SnapshotReport::default());
    }
}
