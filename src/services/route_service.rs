//! Route service
//!
//! Sequences the stored clusters of a date into visiting orders, stores the
//! resulting legs and reports stored routes over a date range.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::clustering_service::rollback;
use super::schedule_store::{ScheduleStore, ScheduleTransaction};
use super::travel_estimator::{LegResolver, TravelEstimator};
use crate::algorithms::geometry::Coordinate;
use crate::algorithms::tour::{sequence, SequenceMode, TourPlan, Waypoint};
use crate::config::EngineConfig;
use crate::models::cluster::ClusterAssignment;
use crate::models::cluster_route::{NewClusterRoute, RouteReportRow};
use crate::utils::{AppError, AppResult};

/// A stored cluster stop placed on a tour
#[derive(Debug, Clone, Serialize)]
pub struct RouteStop {
    pub assignment: ClusterAssignment,
    pub coordinate: Coordinate,
}

impl Waypoint for RouteStop {
    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    fn bearing(&self) -> f64 {
        self.assignment.bearing
    }

    fn quantity(&self) -> f64 {
        self.assignment.carried_quantity
    }
}

/// The sequenced tour of one cluster
#[derive(Debug, Clone, Serialize)]
pub struct ClusterTour {
    pub cluster_id: i32,
    pub cluster_date: NaiveDate,
    pub vehicle_id: i64,
    pub vehicle_name: String,
    pub mode: SequenceMode,
    pub stops: Vec<RouteStop>,
    pub plan: TourPlan,
}

impl ClusterTour {
    pub fn total_load(&self) -> f64 {
        self.stops.iter().map(|s| s.assignment.carried_quantity).sum()
    }
}

pub struct RouteService {
    store: Arc<dyn ScheduleStore>,
    estimator: Arc<dyn TravelEstimator>,
    config: Arc<EngineConfig>,
}

impl RouteService {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        estimator: Arc<dyn TravelEstimator>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            estimator,
            config,
        }
    }

    /// Sequence and store the routes of every cluster running on `date`.
    ///
    /// Routes previously stored for the same date and mode are replaced and
    /// every visited location is marked collected, all in one transaction.
    pub async fn generate_routes(&self, date: NaiveDate, mode: SequenceMode) -> AppResult<Vec<ClusterTour>> {
        let assignments = self.store.assignments_on(date).await?;
        if assignments.is_empty() {
            return Err(AppError::NotFound(format!(
                "No clusters stored for {}. Run clustering first.",
                date
            )));
        }

        let mut grouped: BTreeMap<i32, Vec<RouteStop>> = BTreeMap::new();
        for assignment in assignments {
            let coordinate = assignment.coordinate()?;
            grouped
                .entry(assignment.cluster_id)
                .or_default()
                .push(RouteStop {
                    assignment,
                    coordinate,
                });
        }

        let config = self.config.as_ref();
        let mut tours = Vec::with_capacity(grouped.len());
        for (cluster_id, stops) in grouped {
            let Some(first) = stops.first().map(|s| s.assignment.clone()) else {
                continue;
            };
            let mut resolver = LegResolver::new(self.estimator.as_ref(), config);
            let plan = resolver
                .resolve(|lookup| sequence(&stops, mode, config, lookup))
                .await;
            log::debug!(
                "🧭 Cluster {}: {} stops sequenced with {} travel requests",
                cluster_id,
                stops.len(),
                resolver.requested()
            );

            tours.push(ClusterTour {
                cluster_id,
                cluster_date: date,
                vehicle_id: first.vehicle_id,
                vehicle_name: first.vehicle_name,
                mode,
                stops,
                plan,
            });
        }

        let mut tx = self.store.begin().await?;
        match write_routes(tx.as_mut(), date, mode, &tours).await {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                rollback(tx).await;
                return Err(e);
            }
        }

        log::info!(
            "🗺️ Stored {} {:?} routes for {}",
            tours.len(),
            mode,
            date
        );
        Ok(tours)
    }

    /// Stored routes between two optional dates, inclusive
    pub async fn report(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<Vec<RouteReportRow>> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AppError::BadRequest(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
        }
        self.store.report_routes(start, end).await
    }
}

async fn write_routes(
    tx: &mut dyn ScheduleTransaction,
    date: NaiveDate,
    mode: SequenceMode,
    tours: &[ClusterTour],
) -> AppResult<()> {
    let optimized = mode.is_optimized();
    let removed = tx.delete_routes(date, optimized).await?;
    if removed > 0 {
        log::info!("🧹 Replacing {} stored route stops for {}", removed, date);
    }

    for tour in tours {
        for leg in &tour.plan.legs {
            let stop = &tour.stops[leg.index].assignment;
            tx.save_route(&NewClusterRoute {
                cluster_id: tour.cluster_id,
                cluster_date: date,
                vehicle_id: tour.vehicle_id,
                daily_demand_id: stop.daily_demand_id,
                order_no: leg.order_no,
                carried_quantity: stop.carried_quantity,
                travel_hours: leg.travel_hours,
                unload_hours: leg.unload_hours,
                distance_km: leg.leg.distance_km,
                optimized,
            })
            .await?;
            tx.mark_collected(stop.location_id).await?;
        }
    }

    Ok(())
}
