//! Travel estimation
//!
//! Road duration and distance between two points, fetched from the
//! OpenRouteService directions API and memoized. A failed lookup never
//! raises: it yields an estimate with both values absent and the engine
//! applies the configured missing-estimate policy.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::algorithms::geometry::{pair_key, Coordinate};
use crate::algorithms::travel::{SpeculativeLookup, TravelLeg, TravelLookup, TravelTable};
use crate::cache::TravelCache;
use crate::config::{EngineConfig, MissingEstimatePolicy, TravelProviderConfig};

/// Number of estimates requested concurrently
const ESTIMATE_BATCH_SIZE: usize = 8;

/// Estimate returned by a provider. Both fields are `None` on failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelEstimate {
    pub duration_hours: Option<f64>,
    pub distance_km: Option<f64>,
}

impl TravelEstimate {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn leg(&self) -> Option<TravelLeg> {
        match (self.duration_hours, self.distance_km) {
            (Some(duration), Some(distance)) => Some(TravelLeg::new(duration, distance)),
            _ => None,
        }
    }
}

impl From<TravelLeg> for TravelEstimate {
    fn from(leg: TravelLeg) -> Self {
        Self {
            duration_hours: Some(leg.duration_hours),
            distance_km: Some(leg.distance_km),
        }
    }
}

#[async_trait]
pub trait TravelEstimator: Send + Sync {
    async fn estimate(&self, origin: Coordinate, destination: Coordinate) -> TravelEstimate;
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    summary: DirectionsSummary,
}

/// Zero-length routes come back without duration or distance
#[derive(Debug, Deserialize)]
struct DirectionsSummary {
    /// Seconds
    #[serde(default)]
    duration: f64,
    /// Kilometers, as requested through `units`
    #[serde(default)]
    distance: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// OpenRouteService directions client
pub struct OrsDirectionsClient {
    api_key: Option<String>,
    base_url: String,
    profile: String,
    client: Client,
}

impl OrsDirectionsClient {
    pub fn new(config: &TravelProviderConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        if config.api_key.is_none() {
            log::warn!("⚠️ ORS_API_KEY not set, every travel estimate will be missing");
        }

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
            client,
        })
    }

    async fn request(&self, api_key: &str, origin: Coordinate, destination: Coordinate) -> anyhow::Result<TravelLeg> {
        let url = format!("{}/v2/directions/{}", self.base_url, self.profile);
        let body = json!({
            "coordinates": [
                [origin.longitude, origin.latitude],
                [destination.longitude, destination.latitude]
            ],
            "units": "km"
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("directions API returned {}: {}", status, text);
        }

        let payload: DirectionsResponse = response.json().await?;
        let summary = payload
            .routes
            .into_iter()
            .next()
            .map(|route| route.summary)
            .ok_or_else(|| anyhow::anyhow!("directions API returned no route"))?;

        Ok(TravelLeg::new(round2(summary.duration / 3600.0), round2(summary.distance)))
    }
}

#[async_trait]
impl TravelEstimator for OrsDirectionsClient {
    async fn estimate(&self, origin: Coordinate, destination: Coordinate) -> TravelEstimate {
        let Some(api_key) = self.api_key.as_deref() else {
            return TravelEstimate::unavailable();
        };

        match self.request(api_key, origin, destination).await {
            Ok(leg) => {
                log::debug!(
                    "🗺️ {} -> {}: {:.2} h, {:.2} km",
                    origin.key(),
                    destination.key(),
                    leg.duration_hours,
                    leg.distance_km
                );
                leg.into()
            }
            Err(e) => {
                log::error!(
                    "❌ Travel estimate {} -> {} failed: {}",
                    origin.key(),
                    destination.key(),
                    e
                );
                TravelEstimate::unavailable()
            }
        }
    }
}

/// Memoizing wrapper around another estimator
pub struct CachedTravelEstimator<E> {
    inner: E,
    cache: TravelCache,
}

impl<E: TravelEstimator> CachedTravelEstimator<E> {
    pub fn new(inner: E, cache: TravelCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &TravelCache {
        &self.cache
    }
}

#[async_trait]
impl<E: TravelEstimator> TravelEstimator for CachedTravelEstimator<E> {
    async fn estimate(&self, origin: Coordinate, destination: Coordinate) -> TravelEstimate {
        let key = pair_key(origin, destination);
        if let Some(leg) = self.cache.get(&key).await {
            return leg.into();
        }

        let estimate = self.inner.estimate(origin, destination).await;
        if let Some(leg) = estimate.leg() {
            self.cache.put(&key, leg).await;
        }
        estimate
    }
}

/// Fetches travel legs on demand for a planning run.
///
/// Planners run against a [`SpeculativeLookup`]; the legs they ask for are
/// estimated and the run is replayed until it needs nothing new. Only legs
/// a run actually reads are ever requested. Missing estimates follow the
/// configured policy: remembered as unavailable (`Skip`) or replaced by the
/// placeholder estimate (`Default`).
pub struct LegResolver<'a> {
    estimator: &'a dyn TravelEstimator,
    config: &'a EngineConfig,
    table: TravelTable,
    unavailable: HashSet<String>,
    requested: usize,
    missing: usize,
}

impl<'a> LegResolver<'a> {
    pub fn new(estimator: &'a dyn TravelEstimator, config: &'a EngineConfig) -> Self {
        Self {
            estimator,
            config,
            table: TravelTable::new(),
            unavailable: HashSet::new(),
            requested: 0,
            missing: 0,
        }
    }

    /// Legs sent to the estimator so far
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Estimate the given legs, skipping any already resolved
    pub async fn fetch(&mut self, pairs: impl IntoIterator<Item = (Coordinate, Coordinate)>) {
        let mut seen = HashSet::new();
        let pending: Vec<(Coordinate, Coordinate)> = pairs
            .into_iter()
            .filter(|&(from, to)| from.key() != to.key())
            .filter(|&(from, to)| {
                let key = pair_key(from, to);
                !self.unavailable.contains(&key) && self.table.leg(from, to).is_none() && seen.insert(key)
            })
            .collect();

        for batch in pending.chunks(ESTIMATE_BATCH_SIZE) {
            let estimates = join_all(
                batch
                    .iter()
                    .map(|&(from, to)| self.estimator.estimate(from, to)),
            )
            .await;

            for (&(from, to), estimate) in batch.iter().zip(estimates) {
                self.requested += 1;
                match (estimate.leg(), self.config.missing_estimate) {
                    (Some(leg), _) => self.table.insert(from, to, leg),
                    (None, MissingEstimatePolicy::Default) => {
                        self.missing += 1;
                        self.table
                            .insert(from, to, self.config.default_estimate.as_placeholder());
                    }
                    (None, MissingEstimatePolicy::Skip) => {
                        self.missing += 1;
                        self.unavailable.insert(pair_key(from, to));
                    }
                }
            }
        }
    }

    /// Replay `plan` until every leg it reads is resolved
    pub async fn resolve<T>(&mut self, mut plan: impl FnMut(&SpeculativeLookup<'_>) -> T) -> T {
        let mut passes = 0usize;
        loop {
            passes += 1;
            let wanted = {
                let lookup = SpeculativeLookup::new(&self.table, &self.unavailable, self.config.speed_kmh);
                let result = plan(&lookup);
                let wanted = lookup.into_wanted();
                if wanted.is_empty() {
                    log::debug!("🧭 Legs resolved after {} passes", passes);
                    return result;
                }
                wanted
            };
            // Later requests depend on the guesses made for earlier ones
            self.fetch(wanted.into_iter().take(ESTIMATE_BATCH_SIZE)).await;
        }
    }

    /// The resolved legs, ready for the real run
    pub fn into_table(self) -> TravelTable {
        log::info!(
            "🧭 Resolved {} travel legs with {} requests",
            self.table.len(),
            self.requested
        );
        if self.missing > 0 {
            log::warn!(
                "⚠️ {} of {} travel legs had no estimate ({:?} policy)",
                self.missing,
                self.requested,
                self.config.missing_estimate
            );
        }
        self.table
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::algorithms::sweep::test_support::{around_depot, date, demand, vehicle};
    use crate::algorithms::sweep::SweepClusterer;

    struct CountingEstimator {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TravelEstimator for CountingEstimator {
        async fn estimate(&self, _origin: Coordinate, _destination: Coordinate) -> TravelEstimate {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                TravelEstimate::unavailable()
            } else {
                TravelLeg::new(0.2, 8.0).into()
            }
        }
    }

    fn counting(fail: bool) -> CountingEstimator {
        CountingEstimator {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    #[tokio::test]
    async fn test_cache_memoizes_successes_only() {
        let a = Coordinate::new(-7.7, 110.3);
        let b = Coordinate::new(-7.8, 110.4);

        let cached = CachedTravelEstimator::new(counting(false), TravelCache::in_memory());
        cached.estimate(a, b).await;
        let second = cached.estimate(a, b).await;
        assert_eq!(second.leg(), Some(TravelLeg::new(0.2, 8.0)));
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);

        let failing = CachedTravelEstimator::new(counting(true), TravelCache::in_memory());
        assert_eq!(failing.estimate(a, b).await.leg(), None);
        assert_eq!(failing.estimate(a, b).await.leg(), None);
        assert_eq!(failing.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolver_never_requests_a_leg_twice() {
        let a = Coordinate::new(-7.7, 110.3);
        let b = Coordinate::new(-7.8, 110.4);
        let config = EngineConfig::default();

        let estimator = counting(false);
        let mut resolver = LegResolver::new(&estimator, &config);
        resolver.fetch([(a, b), (a, b), (a, a)]).await;
        resolver.fetch([(a, b), (b, a)]).await;

        assert_eq!(estimator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.requested(), 2);
        let table = resolver.into_table();
        assert_eq!(table.leg(b, a), Some(TravelLeg::new(0.2, 8.0)));
    }

    #[tokio::test]
    async fn test_missing_policy_decides_clustering() {
        let day = date(2025, 3, 3);
        let truck = vehicle(1, 100);

        let skip = EngineConfig {
            missing_estimate: MissingEstimatePolicy::Skip,
            ..EngineConfig::default()
        };
        let demands = vec![demand(&skip, 1, around_depot(&skip, 90.0, 4.0), 10.0, day)];
        let estimator = counting(true);
        let mut resolver = LegResolver::new(&estimator, &skip);
        let draft = resolver
            .resolve(|lookup| SweepClusterer::new(&skip, lookup).build_cluster(&demands, &truck, day))
            .await;
        assert!(draft.is_empty());
        assert_eq!(estimator.calls.load(Ordering::SeqCst), 2);

        let fallback = EngineConfig::default();
        let estimator = counting(true);
        let mut resolver = LegResolver::new(&estimator, &fallback);
        let draft = resolver
            .resolve(|lookup| SweepClusterer::new(&fallback, lookup).build_cluster(&demands, &truck, day))
            .await;
        assert_eq!(draft.stops.len(), 1);
        assert!(draft.stops[0].leg.placeholder);
        // Placeholder legs cost their full 15 minutes each way
        assert!((draft.total_hours - (0.25 + 0.75 + 0.25)).abs() < 1e-9);
        assert!((draft.total_distance_km - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_ors_without_key_is_unavailable() {
        let client = OrsDirectionsClient::new(&TravelProviderConfig::default()).unwrap();
        let estimate = client
            .estimate(Coordinate::new(-7.7, 110.3), Coordinate::new(-7.8, 110.4))
            .await;
        assert_eq!(estimate, TravelEstimate::unavailable());
    }

    #[test]
    fn test_directions_summary_defaults() {
        let payload: DirectionsResponse =
            serde_json::from_str(r#"{"routes":[{"summary":{}}]}"#).unwrap();
        assert_eq!(payload.routes[0].summary.duration, 0.0);
        assert_eq!(round2(1234.5 / 3600.0), 0.34);
    }
}
