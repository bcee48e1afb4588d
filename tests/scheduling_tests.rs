//! Clustering and routing services over an in-memory schedule store

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use collection_routing::algorithms::scheduler::{ClusterUsage, DemandUpdate, EmptyInput};
use collection_routing::algorithms::tour::SequenceMode;
use collection_routing::algorithms::{bearing, Coordinate, ScheduleOutcome, TravelLeg};
use collection_routing::config::{EngineConfig, MinimumPickup, ThresholdPolicy, UnloadModel};
use collection_routing::models::cluster::{ClusterAssignment, NewCluster};
use collection_routing::models::cluster_route::{NewClusterRoute, RouteReportRow};
use collection_routing::models::daily_demand::{DailyDemand, DemandStatus};
use collection_routing::models::vehicle::Vehicle;
use collection_routing::services::clustering_service::{ClusteringResult, ClusteringService};
use collection_routing::services::route_service::RouteService;
use collection_routing::services::schedule_store::{ScheduleStore, ScheduleTransaction};
use collection_routing::services::travel_estimator::{TravelEstimate, TravelEstimator};
use collection_routing::utils::{AppError, AppResult};

const KM_PER_DEGREE: f64 = 111.0;

#[derive(Default)]
struct Tables {
    demand: Vec<DailyDemand>,
    vehicles: Vec<Vehicle>,
    clusters: Vec<NewCluster>,
    routes: Vec<NewClusterRoute>,
    collected: HashSet<i64>,
    commits: usize,
}

enum Write {
    Reset(NaiveDate),
    Cluster(NewCluster),
    Update(DemandUpdate),
    Advance(i64, NaiveDate),
    DeleteRoutes(NaiveDate, bool),
    Route(NewClusterRoute),
    Collected(i64),
}

#[derive(Clone, Default)]
struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    /// Cluster writes for this date fail
    fail_on: Arc<Mutex<Option<NaiveDate>>>,
}

impl MemoryStore {
    fn add_vehicle(&self, id: i64, capacity: i32) {
        self.tables.lock().unwrap().vehicles.push(Vehicle {
            id,
            name: format!("Truck {}", id),
            capacity,
            created_at: Utc::now(),
        });
    }

    fn add_demand(&self, id: i64, date: NaiveDate, coordinate: Coordinate, quantity: f64) {
        let depot = EngineConfig::default().depot;
        self.tables.lock().unwrap().demand.push(DailyDemand {
            id,
            location_id: id * 10,
            origin_date: date,
            cluster_date: date,
            name: format!("Pengepul {}", id),
            address: format!("Jalan {}", id),
            latitude: Decimal::try_from(coordinate.latitude).unwrap(),
            longitude: Decimal::try_from(coordinate.longitude).unwrap(),
            bearing: bearing(depot, coordinate),
            expected_quantity: quantity,
            start_quantity: quantity,
            remaining_quantity: quantity,
            status: DemandStatus::Pending,
            created_at: Utc::now(),
        });
    }

    fn fail_clusters_on(&self, date: NaiveDate) {
        *self.fail_on.lock().unwrap() = Some(date);
    }

    fn snapshot<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        f(&self.tables.lock().unwrap())
    }

    fn assignment(tables: &Tables, index: usize, cluster: &NewCluster) -> Option<ClusterAssignment> {
        let demand = tables.demand.iter().find(|d| d.id == cluster.daily_demand_id)?;
        let vehicle = tables.vehicles.iter().find(|v| v.id == cluster.vehicle_id)?;
        Some(ClusterAssignment {
            id: index as i64 + 1,
            cluster_id: cluster.cluster_id,
            cluster_date: cluster.cluster_date,
            vehicle_id: vehicle.id,
            vehicle_name: vehicle.name.clone(),
            daily_demand_id: demand.id,
            location_id: demand.location_id,
            name: demand.name.clone(),
            address: demand.address.clone(),
            latitude: demand.latitude,
            longitude: demand.longitude,
            bearing: demand.bearing,
            expected_quantity: demand.expected_quantity,
            carried_quantity: cluster.carried_quantity,
            start_quantity: cluster.start_quantity,
            remaining_quantity: cluster.remaining_quantity,
            travel_hours: cluster.travel_hours,
            unload_hours: cluster.unload_hours,
            distance_km: cluster.distance_km,
            status: demand.status,
        })
    }

    fn assignments_where(&self, keep: impl Fn(&NewCluster, &DailyDemand) -> bool) -> Vec<ClusterAssignment> {
        let tables = self.tables.lock().unwrap();
        tables
            .clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                tables
                    .demand
                    .iter()
                    .find(|d| d.id == c.daily_demand_id)
                    .map_or(false, |d| keep(c, d))
            })
            .filter_map(|(i, c)| Self::assignment(&tables, i, c))
            .collect()
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn load_pending_demand(&self, date: NaiveDate) -> AppResult<Vec<DailyDemand>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<DailyDemand> = tables
            .demand
            .iter()
            .filter(|d| d.status == DemandStatus::Pending && (d.origin_date == date || d.cluster_date == date))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.bearing.total_cmp(&a.bearing).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn load_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let mut vehicles = self.tables.lock().unwrap().vehicles.clone();
        vehicles.sort_by(|a, b| b.capacity.cmp(&a.capacity).then(a.id.cmp(&b.id)));
        Ok(vehicles)
    }

    async fn cluster_usage(&self, dates: &[NaiveDate]) -> AppResult<BTreeMap<NaiveDate, ClusterUsage>> {
        let tables = self.tables.lock().unwrap();
        let mut usage = BTreeMap::new();
        for date in dates {
            let ids: HashSet<i32> = tables
                .clusters
                .iter()
                .filter(|c| c.cluster_date == *date)
                .map(|c| c.cluster_id)
                .collect();
            if let Some(last) = ids.iter().max() {
                usage.insert(
                    *date,
                    ClusterUsage {
                        count: ids.len() as u32,
                        last_cluster_id: *last,
                    },
                );
            }
        }
        Ok(usage)
    }

    async fn assignments_for_origin(&self, date: NaiveDate) -> AppResult<Vec<ClusterAssignment>> {
        Ok(self.assignments_where(|_, d| d.origin_date == date))
    }

    async fn has_new_demand(&self, date: NaiveDate) -> AppResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.demand.iter().any(|d| {
            d.origin_date == date && !tables.clusters.iter().any(|c| c.daily_demand_id == d.id)
        }))
    }

    async fn assignments_on(&self, date: NaiveDate) -> AppResult<Vec<ClusterAssignment>> {
        Ok(self.assignments_where(|c, _| c.cluster_date == date))
    }

    async fn report_routes(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<Vec<RouteReportRow>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<RouteReportRow> = tables
            .routes
            .iter()
            .filter(|r| start.map_or(true, |s| r.cluster_date >= s) && end.map_or(true, |e| r.cluster_date <= e))
            .filter_map(|r| {
                let demand = tables.demand.iter().find(|d| d.id == r.daily_demand_id)?;
                let vehicle = tables.vehicles.iter().find(|v| v.id == r.vehicle_id)?;
                Some(RouteReportRow {
                    cluster_id: r.cluster_id,
                    cluster_date: r.cluster_date,
                    order_no: r.order_no,
                    vehicle_id: vehicle.id,
                    vehicle_name: vehicle.name.clone(),
                    daily_demand_id: demand.id,
                    name: demand.name.clone(),
                    address: demand.address.clone(),
                    expected_quantity: demand.expected_quantity,
                    carried_quantity: r.carried_quantity,
                    travel_hours: r.travel_hours,
                    unload_hours: r.unload_hours,
                    distance_km: r.distance_km,
                    optimized: r.optimized,
                })
            })
            .collect();
        rows.sort_by_key(|r| (r.cluster_date, !r.optimized, r.cluster_id, r.order_no));
        Ok(rows)
    }

    async fn begin(&self) -> AppResult<Box<dyn ScheduleTransaction>> {
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            writes: Vec::new(),
        }))
    }
}

struct MemoryTransaction {
    store: MemoryStore,
    writes: Vec<Write>,
}

#[async_trait]
impl ScheduleTransaction for MemoryTransaction {
    async fn reset_origin(&mut self, date: NaiveDate) -> AppResult<u64> {
        self.writes.push(Write::Reset(date));
        let count = self
            .store
            .snapshot(|t| t.demand.iter().filter(|d| d.origin_date == date).count());
        Ok(count as u64)
    }

    async fn save_cluster(&mut self, cluster: &NewCluster) -> AppResult<()> {
        if *self.store.fail_on.lock().unwrap() == Some(cluster.cluster_date) {
            return Err(AppError::Internal("disk full".to_string()));
        }
        self.writes.push(Write::Cluster(cluster.clone()));
        Ok(())
    }

    async fn update_demand(&mut self, update: &DemandUpdate) -> AppResult<()> {
        self.writes.push(Write::Update(update.clone()));
        Ok(())
    }

    async fn advance_demand_date(&mut self, demand_id: i64, date: NaiveDate) -> AppResult<()> {
        self.writes.push(Write::Advance(demand_id, date));
        Ok(())
    }

    async fn delete_routes(&mut self, date: NaiveDate, optimized: bool) -> AppResult<u64> {
        self.writes.push(Write::DeleteRoutes(date, optimized));
        let count = self.store.snapshot(|t| {
            t.routes
                .iter()
                .filter(|r| r.cluster_date == date && r.optimized == optimized)
                .count()
        });
        Ok(count as u64)
    }

    async fn save_route(&mut self, route: &NewClusterRoute) -> AppResult<()> {
        self.writes.push(Write::Route(route.clone()));
        Ok(())
    }

    async fn mark_collected(&mut self, location_id: i64) -> AppResult<()> {
        self.writes.push(Write::Collected(location_id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut tables = self.store.tables.lock().unwrap();
        for write in self.writes {
            apply(&mut tables, write);
        }
        tables.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

fn apply(tables: &mut Tables, write: Write) {
    match write {
        Write::Reset(date) => {
            let ids: HashSet<i64> = tables
                .demand
                .iter()
                .filter(|d| d.origin_date == date)
                .map(|d| d.id)
                .collect();
            let dates: HashSet<NaiveDate> = tables
                .clusters
                .iter()
                .filter(|c| ids.contains(&c.daily_demand_id))
                .map(|c| c.cluster_date)
                .collect();
            tables.routes.retain(|r| !dates.contains(&r.cluster_date));
            tables.clusters.retain(|c| !ids.contains(&c.daily_demand_id));
            for d in tables.demand.iter_mut().filter(|d| ids.contains(&d.id)) {
                d.start_quantity = d.expected_quantity;
                d.remaining_quantity = d.expected_quantity;
                d.cluster_date = d.origin_date;
                d.status = DemandStatus::Pending;
            }
        }
        Write::Cluster(cluster) => tables.clusters.push(cluster),
        Write::Update(update) => {
            if let Some(d) = tables.demand.iter_mut().find(|d| d.id == update.demand_id) {
                d.start_quantity = update.start_quantity;
                d.remaining_quantity = update.remaining_quantity;
                d.status = update.status;
                d.cluster_date = update.cluster_date;
            }
        }
        Write::Advance(id, date) => {
            if let Some(d) = tables.demand.iter_mut().find(|d| d.id == id) {
                d.cluster_date = date;
                d.start_quantity = d.remaining_quantity;
            }
        }
        Write::DeleteRoutes(date, optimized) => tables
            .routes
            .retain(|r| !(r.cluster_date == date && r.optimized == optimized)),
        Write::Route(route) => tables.routes.push(route),
        Write::Collected(location_id) => {
            tables.collected.insert(location_id);
        }
    }
}

/// Straight-line estimates on a flat grid at 40 km/h
struct GridEstimator;

#[async_trait]
impl TravelEstimator for GridEstimator {
    async fn estimate(&self, origin: Coordinate, destination: Coordinate) -> TravelEstimate {
        let dlat = (origin.latitude - destination.latitude) * KM_PER_DEGREE;
        let dlon = (origin.longitude - destination.longitude) * KM_PER_DEGREE;
        let km = (dlat * dlat + dlon * dlon).sqrt();
        TravelLeg::new(km / 40.0, km).into()
    }
}

/// Grid estimates that count every request
#[derive(Clone, Default)]
struct CountingEstimator {
    calls: Arc<AtomicUsize>,
}

impl CountingEstimator {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl TravelEstimator for CountingEstimator {
    async fn estimate(&self, origin: Coordinate, destination: Coordinate) -> TravelEstimate {
        self.calls.fetch_add(1, Ordering::SeqCst);
        GridEstimator.estimate(origin, destination).await
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A point `km` north-east-ish of the depot
fn near_depot(step: f64) -> Coordinate {
    let depot = EngineConfig::default().depot;
    Coordinate::new(depot.latitude + 0.01 * step, depot.longitude + 0.012 * step)
}

fn one_cluster_per_day() -> EngineConfig {
    EngineConfig {
        max_clusters_per_day: 1,
        ..EngineConfig::default()
    }
}

fn services(store: &MemoryStore, config: EngineConfig) -> (ClusteringService, RouteService) {
    services_with(store, config, Arc::new(GridEstimator))
}

fn services_with(
    store: &MemoryStore,
    config: EngineConfig,
    estimator: Arc<dyn TravelEstimator>,
) -> (ClusteringService, RouteService) {
    let store: Arc<dyn ScheduleStore> = Arc::new(store.clone());
    let config = Arc::new(config);
    (
        ClusteringService::new(store.clone(), estimator.clone(), config.clone()),
        RouteService::new(store, estimator, config),
    )
}

/// Monday with three pickups of 40 and one truck of 50
fn carry_over_store() -> (MemoryStore, NaiveDate) {
    let monday = date(2024, 6, 3);
    let store = MemoryStore::default();
    store.add_vehicle(1, 50);
    for id in 1..=3 {
        store.add_demand(id, monday, near_depot(id as f64), 40.0);
    }
    (store, monday)
}

#[tokio::test]
async fn test_run_carries_demand_over_three_days() {
    let (store, monday) = carry_over_store();
    let (clustering, _) = services(&store, one_cluster_per_day());

    let result = clustering.run_clustering(monday).await.unwrap();
    let ClusteringResult::Scheduled(report) = result else {
        panic!("expected a scheduling run");
    };

    assert!(report.persisted);
    assert_eq!(report.outcome, ScheduleOutcome::Completed);
    let dates: Vec<NaiveDate> = report.days.iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![monday, date(2024, 6, 4), date(2024, 6, 5)]);

    store.snapshot(|t| {
        assert_eq!(t.commits, 3);
        assert!(t.demand.iter().all(|d| d.status == DemandStatus::Done));
        assert!(t.demand.iter().all(|d| d.remaining_quantity == 0.0));
        assert!(t.clusters.iter().all(|c| c.cluster_id == 1));

        for demand in &t.demand {
            let carried: f64 = t
                .clusters
                .iter()
                .filter(|c| c.daily_demand_id == demand.id)
                .map(|c| c.carried_quantity)
                .sum();
            assert!((carried - 40.0).abs() < 1e-9);
        }
        for day in [monday, date(2024, 6, 4)] {
            let load: f64 = t
                .clusters
                .iter()
                .filter(|c| c.cluster_date == day)
                .map(|c| c.carried_quantity)
                .sum();
            assert!((load - 50.0).abs() < 1e-9);
        }
    });
}

#[tokio::test]
async fn test_saturday_leftover_skips_sunday() {
    let saturday = date(2024, 6, 8);
    let store = MemoryStore::default();
    store.add_vehicle(1, 30);
    store.add_demand(1, saturday, near_depot(1.0), 50.0);
    let (clustering, _) = services(&store, one_cluster_per_day());

    clustering.run_clustering(saturday).await.unwrap();

    store.snapshot(|t| {
        let dates: Vec<NaiveDate> = t.clusters.iter().map(|c| c.cluster_date).collect();
        assert_eq!(dates, vec![saturday, date(2024, 6, 10)]);
    });
}

#[tokio::test]
async fn test_second_run_returns_stored_clusters() {
    let (store, monday) = carry_over_store();
    let (clustering, _) = services(&store, one_cluster_per_day());

    clustering.run_clustering(monday).await.unwrap();
    let commits = store.snapshot(|t| t.commits);

    let again = clustering.run_clustering(monday).await.unwrap();
    let ClusteringResult::Stored(rows) = again else {
        panic!("expected stored clusters");
    };

    assert_eq!(rows.len(), store.snapshot(|t| t.clusters.len()));
    assert_eq!(store.snapshot(|t| t.commits), commits);
}

#[tokio::test]
async fn test_new_demand_resets_and_reclusters() {
    let (store, monday) = carry_over_store();
    let (clustering, _) = services(&store, EngineConfig::default());

    clustering.run_clustering(monday).await.unwrap();
    store.add_demand(4, monday, near_depot(4.0), 10.0);

    let result = clustering.run_clustering(monday).await.unwrap();
    assert!(!result.is_stored());

    store.snapshot(|t| {
        assert!(t.demand.iter().all(|d| d.status == DemandStatus::Done));
        let total: f64 = t.clusters.iter().map(|c| c.carried_quantity).sum();
        assert!((total - 130.0).abs() < 1e-9);
        assert!(t.clusters.iter().any(|c| c.daily_demand_id == 4));
    });
}

#[tokio::test]
async fn test_failed_day_rolls_back_and_keeps_earlier_days() {
    let (store, monday) = carry_over_store();
    store.fail_clusters_on(date(2024, 6, 4));
    let (clustering, _) = services(&store, one_cluster_per_day());

    let err = clustering.run_clustering(monday).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    store.snapshot(|t| {
        assert_eq!(t.commits, 1);
        assert!(t.clusters.iter().all(|c| c.cluster_date == monday));
        let remaining: f64 = t.demand.iter().map(|d| d.remaining_quantity).sum();
        assert!((remaining - 70.0).abs() < 1e-9);
        assert!(t
            .demand
            .iter()
            .filter(|d| d.status == DemandStatus::Pending)
            .all(|d| d.cluster_date == date(2024, 6, 4)));
    });
}

#[tokio::test]
async fn test_no_vehicles_is_nothing_to_do() {
    let monday = date(2024, 6, 3);
    let store = MemoryStore::default();
    store.add_demand(1, monday, near_depot(1.0), 10.0);
    let (clustering, _) = services(&store, EngineConfig::default());

    let ClusteringResult::Scheduled(report) = clustering.run_clustering(monday).await.unwrap() else {
        panic!("expected a scheduling run");
    };

    assert_eq!(
        report.outcome,
        ScheduleOutcome::NothingToDo {
            reason: EmptyInput::NoVehicles
        }
    );
    assert!(report.days.is_empty());
    assert_eq!(store.snapshot(|t| t.commits), 0);
}

#[tokio::test]
async fn test_preview_writes_nothing() {
    let (store, monday) = carry_over_store();
    let (clustering, _) = services(&store, one_cluster_per_day());

    let report = clustering.preview(monday).await.unwrap();

    assert!(!report.persisted);
    assert_eq!(report.days.len(), 3);
    store.snapshot(|t| {
        assert_eq!(t.commits, 0);
        assert!(t.clusters.is_empty());
        assert!(t.demand.iter().all(|d| d.remaining_quantity == 40.0));
    });
}

#[tokio::test]
async fn test_short_horizon_reports_unmet_demand() {
    let (store, monday) = carry_over_store();
    let config = EngineConfig {
        horizon_days: 2,
        ..one_cluster_per_day()
    };
    let (clustering, _) = services(&store, config);

    let ClusteringResult::Scheduled(report) = clustering.run_clustering(monday).await.unwrap() else {
        panic!("expected a scheduling run");
    };

    match report.outcome {
        ScheduleOutcome::Partial { unmet, .. } => {
            let left: f64 = unmet.iter().map(|u| u.remaining_quantity).sum();
            assert!((left - 20.0).abs() < 1e-9);
        }
        other => panic!("expected a partial outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_routes_stores_and_replaces_tours() {
    let (store, monday) = carry_over_store();
    let (clustering, routes) = services(&store, EngineConfig::default());
    clustering.run_clustering(monday).await.unwrap();

    let tours = routes
        .generate_routes(monday, SequenceMode::NearestNeighbor)
        .await
        .unwrap();
    let stops: usize = tours.iter().map(|t| t.stops.len()).sum();

    store.snapshot(|t| {
        assert_eq!(t.routes.len(), stops);
        assert!(t.routes.iter().all(|r| r.optimized));
        assert_eq!(t.collected, HashSet::from([10, 20, 30]));
    });
    for tour in &tours {
        let mut order: Vec<i32> = tour.plan.legs.iter().map(|l| l.order_no).collect();
        order.sort_unstable();
        assert_eq!(order, (1..=tour.stops.len() as i32).collect::<Vec<_>>());
    }

    routes
        .generate_routes(monday, SequenceMode::NearestNeighbor)
        .await
        .unwrap();
    routes
        .generate_routes(monday, SequenceMode::BearingSweep)
        .await
        .unwrap();

    store.snapshot(|t| {
        assert_eq!(t.routes.iter().filter(|r| r.optimized).count(), stops);
        assert_eq!(t.routes.iter().filter(|r| !r.optimized).count(), stops);
    });
}

#[tokio::test]
async fn test_generate_routes_without_clusters_is_not_found() {
    let store = MemoryStore::default();
    let (_, routes) = services(&store, EngineConfig::default());

    let err = routes
        .generate_routes(date(2024, 6, 3), SequenceMode::NearestNeighbor)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_report_filters_by_date_range() {
    let (store, monday) = carry_over_store();
    let (clustering, routes) = services(&store, one_cluster_per_day());
    clustering.run_clustering(monday).await.unwrap();
    for day in [monday, date(2024, 6, 4), date(2024, 6, 5)] {
        routes
            .generate_routes(day, SequenceMode::NearestNeighbor)
            .await
            .unwrap();
    }

    let all = routes.report(None, None).await.unwrap();
    let tuesday = routes
        .report(Some(date(2024, 6, 4)), Some(date(2024, 6, 4)))
        .await
        .unwrap();

    assert_eq!(all.len(), store.snapshot(|t| t.routes.len()));
    assert!(!tuesday.is_empty());
    assert!(tuesday.iter().all(|r| r.cluster_date == date(2024, 6, 4)));
    assert!(all.windows(2).all(|w| w[0].cluster_date <= w[1].cluster_date));
}

#[tokio::test]
async fn test_report_rejects_inverted_range() {
    let store = MemoryStore::default();
    let (_, routes) = services(&store, EngineConfig::default());

    let err = routes
        .report(Some(date(2024, 6, 5)), Some(date(2024, 6, 3)))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
}

/// Forty small pickups on a 3 km ring around the depot
fn ring_store(monday: NaiveDate) -> MemoryStore {
    let depot = EngineConfig::default().depot;
    let store = MemoryStore::default();
    store.add_vehicle(1, 1000);
    for id in 1..=40 {
        let radians = (id as f64 * 9.0).to_radians();
        let point = Coordinate::new(
            depot.latitude + 3.0 * radians.cos() / KM_PER_DEGREE,
            depot.longitude + 3.0 * radians.sin() / KM_PER_DEGREE,
        );
        store.add_demand(id, monday, point, 10.0);
    }
    store
}

fn quick_unload() -> EngineConfig {
    EngineConfig {
        unload: UnloadModel::Flat {
            hours_per_stop: 0.05,
        },
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_clustering_requests_only_legs_the_sweep_reads() {
    let monday = date(2024, 6, 3);
    let store = ring_store(monday);
    let estimator = CountingEstimator::default();
    let (clustering, _) = services_with(&store, quick_unload(), Arc::new(estimator.clone()));

    let ClusteringResult::Scheduled(report) = clustering.run_clustering(monday).await.unwrap() else {
        panic!("expected a scheduling run");
    };

    assert_eq!(report.outcome, ScheduleOutcome::Completed);
    assert_eq!(report.days.len(), 1);
    assert_eq!(report.days[0].clusters.len(), 1);
    assert_eq!(report.days[0].clusters[0].draft.stops.len(), 40);
    // Depot legs both ways plus the chain between consecutive stops
    assert!(estimator.calls() <= 2 * 40 + 39, "{} requests", estimator.calls());
}

#[tokio::test]
async fn test_generate_routes_requests_only_tour_legs() {
    let monday = date(2024, 6, 3);
    let store = ring_store(monday);
    let estimator = CountingEstimator::default();
    let (clustering, routes) = services_with(&store, quick_unload(), Arc::new(estimator.clone()));
    clustering.run_clustering(monday).await.unwrap();
    estimator.reset();

    let tours = routes
        .generate_routes(monday, SequenceMode::BearingSweep)
        .await
        .unwrap();

    assert_eq!(tours.len(), 1);
    assert_eq!(tours[0].plan.legs.len(), 40);
    assert!(tours[0].plan.legs.iter().all(|l| l.estimated));
    assert_eq!(estimator.calls(), 41);
}

#[tokio::test]
async fn test_set_aside_demand_is_stored_with_its_run_date() {
    let monday = date(2024, 6, 3);
    let store = MemoryStore::default();
    store.add_vehicle(1, 100);
    store.add_demand(1, monday, near_depot(1.0), 10.0);
    store.add_demand(2, monday, near_depot(2.0), 40.0);
    store.tables.lock().unwrap().demand[0].cluster_date = date(2024, 6, 1);
    let config = EngineConfig {
        minimum_pickup: Some(MinimumPickup {
            quantity: 25.0,
            policy: ThresholdPolicy::SkipPermanently,
        }),
        ..EngineConfig::default()
    };
    let (clustering, _) = services(&store, config);

    let ClusteringResult::Scheduled(report) = clustering.run_clustering(monday).await.unwrap() else {
        panic!("expected a scheduling run");
    };

    let ScheduleOutcome::Partial { unmet, .. } = report.outcome else {
        panic!("expected a partial outcome");
    };
    assert_eq!(unmet.len(), 1);
    assert_eq!(unmet[0].demand_id, 1);
    store.snapshot(|t| {
        let row = t.demand.iter().find(|d| d.id == 1).unwrap();
        assert_eq!(row.status, DemandStatus::Pending);
        assert_eq!(row.cluster_date, unmet[0].cluster_date);
        assert_eq!(row.cluster_date, monday);
    });
}
